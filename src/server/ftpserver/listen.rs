//! Contains the code that listens for control channel connections.

use super::error::{ServerError, ServerErrorKind};
use crate::auth::UserDetail;
use crate::server::controlchan::{self, ControlParams};
use crate::server::rate_limit::IpRateLimiter;
use crate::server::shutdown;
use crate::storage::StorageBackend;

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

// What an over-eager client gets before we hang up on it.
const THROTTLE_NOTICE: &[u8] = b"421 Too many connections, try again later\r\n";

// Listener accepts control connections on a TCP port and spawns a control channel loop in a new
// task for each one, unless the per-address connection limiter objects.
pub(crate) struct Listener<Storage, User>
where
    Storage: StorageBackend<User> + 'static,
    User: UserDetail + 'static,
{
    pub bind_address: SocketAddr,
    pub params: ControlParams<Storage, User>,
    pub connection_limiter: Arc<IpRateLimiter>,
    pub shutdown_topic: Arc<shutdown::Notifier>,
    pub logger: slog::Logger,
}

impl<Storage, User> Listener<Storage, User>
where
    Storage: StorageBackend<User> + 'static,
    User: UserDetail + 'static,
{
    // Accepts until the shutdown topic fires. Returns an error only if the address cannot be
    // bound.
    pub async fn listen(self) -> Result<(), ServerError> {
        let Listener {
            bind_address,
            params,
            connection_limiter,
            shutdown_topic,
            logger,
        } = self;
        let listener = TcpListener::bind(bind_address).await.map_err(|e| ServerError::new(ServerErrorKind::Bind, e))?;
        slog::info!(logger, "listening on {}", bind_address);
        let mut shutdown_watcher = shutdown_topic.subscribe().await;
        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((tcp_stream, socket_addr)) => {
                        slog::info!(logger, "incoming control connection from {}", socket_addr);
                        if !connection_limiter.check(socket_addr.ip()) {
                            slog::warn!(logger, "connection rate limit hit for {}", socket_addr.ip());
                            let mut tcp_stream = tcp_stream;
                            let _ = tcp_stream.write_all(THROTTLE_NOTICE).await;
                            continue;
                        }
                        let session_shutdown = shutdown_topic.subscribe().await;
                        if let Err(err) = controlchan::spawn_control_channel_loop(params.clone(), tcp_stream, session_shutdown).await {
                            slog::error!(logger, "could not spawn control channel loop for {}: {:?}", socket_addr, err);
                        }
                    }
                    Err(err) => {
                        slog::error!(logger, "error accepting incoming control connection: {:?}", err);
                    }
                },
                _ = shutdown_watcher.listen() => {
                    slog::info!(logger, "stopped accepting connections");
                    return Ok(());
                }
            }
        }
    }
}
