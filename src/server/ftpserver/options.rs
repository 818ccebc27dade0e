//! Contains the setup options that can be given to the [`Server`](crate::Server).

use async_trait::async_trait;
use std::fmt::{self, Debug, Formatter};
use std::net::{IpAddr, Ipv4Addr};
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

pub(crate) const DEFAULT_GREETING: &str = "Welcome to the bucketftp FTP server";
pub(crate) const DEFAULT_IDLE_SESSION_TIMEOUT: Duration = Duration::from_secs(600);
pub(crate) const DEFAULT_PASSIVE_PORTS: RangeInclusive<u16> = 49152..=65535;
// Connects per client address per window, and commands per session per window.
pub(crate) const DEFAULT_CONNECT_LIMIT: (u32, Duration) = (30, Duration::from_secs(60));
pub(crate) const DEFAULT_COMMAND_LIMIT: (u32, Duration) = (300, Duration::from_secs(60));
// How long a graceful shutdown waits for sessions to drain.
pub(crate) const DEFAULT_SHUTDOWN_LINGER: Duration = Duration::from_secs(1);

/// Tells how the IP address communicated in the PASV reply is determined.
#[derive(Clone)]
pub enum PassiveHost {
    /// Use the IP address the control connection arrived on.
    FromConnection,
    /// Advertise this specific IP address.
    Ip(Ipv4Addr),
    /// Resolve this DNS name into an IPv4 address.
    Dns(String),
    /// Ask a WAN-IP discovery helper, passing it the client's address.
    Resolver(Arc<dyn WanIpResolver>),
}

impl Default for PassiveHost {
    fn default() -> Self {
        PassiveHost::FromConnection
    }
}

impl Debug for PassiveHost {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PassiveHost::FromConnection => write!(f, "FromConnection"),
            PassiveHost::Ip(ip) => write!(f, "Ip({})", ip),
            PassiveHost::Dns(name) => write!(f, "Dns({})", name),
            PassiveHost::Resolver(_) => write!(f, "Resolver"),
        }
    }
}

impl From<Ipv4Addr> for PassiveHost {
    fn from(ip: Ipv4Addr) -> Self {
        PassiveHost::Ip(ip)
    }
}

impl From<[u8; 4]> for PassiveHost {
    fn from(ip: [u8; 4]) -> Self {
        PassiveHost::Ip(ip.into())
    }
}

impl From<&str> for PassiveHost {
    fn from(dns_or_ip: &str) -> Self {
        match dns_or_ip.parse() {
            Ok(IpAddr::V4(ip)) => PassiveHost::Ip(ip),
            _ => PassiveHost::Dns(dns_or_ip.to_string()),
        }
    }
}

/// Discovers the WAN address the server should advertise in PASV replies. The host application
/// supplies an implementation, e.g. one that asks an external what-is-my-ip endpoint.
#[async_trait]
pub trait WanIpResolver: Send + Sync {
    /// Returns the address to advertise to the client connecting from `remote`.
    async fn wan_ip(&self, remote: IpAddr) -> Result<Ipv4Addr, crate::BoxError>;
}
