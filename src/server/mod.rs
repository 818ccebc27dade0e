//! Contains the [`Server`](crate::Server) struct used to configure and control an FTP server
//! instance, plus the control channel, data channel and session machinery behind it.

mod chancomms;
pub(crate) mod controlchan;
mod datachan;
pub(crate) mod ftpserver;
mod net;
mod ports;
mod rate_limit;
mod session;
pub(crate) mod shutdown;
mod stream;
mod tls;

