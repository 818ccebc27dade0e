//! Contains code pertaining to the FTP *data* channel
//!
//! A data channel task is spawned when PASV/EPSV sets up a listener or PORT/EPRT connects out.
//! It establishes and validates exactly one connection, signals readiness, executes at most one
//! transfer command, reports the outcome to the control loop and tears itself down, releasing
//! any passive port it held.

use crate::auth::UserDetail;
use crate::server::chancomms::{ControlChanMsg, DataChanCmd};
use crate::server::net;
use crate::server::ports::PortGuard;
use crate::server::session::SharedSession;
use crate::server::stream::SwitchingStream;
use crate::storage::{Error, ErrorKind, PutParams, StorageBackend};

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};

// How long a passive listener waits for the client to connect.
const ACCEPT_TIMEOUT: Duration = Duration::from_secs(30);
// What goes out on the data socket when a transfer is aborted.
const ABORT_NOTICE: &[u8] = b"426 Connection closed; transfer aborted\r\n";

pub(crate) struct DataChanParams<Storage, User>
where
    Storage: StorageBackend<User> + 'static,
    User: UserDetail + 'static,
{
    pub session: SharedSession<Storage, User>,
    pub tx: mpsc::Sender<ControlChanMsg>,
    pub cmd_rx: mpsc::Receiver<DataChanCmd>,
    pub abort_rx: mpsc::Receiver<()>,
    pub ready_tx: watch::Sender<bool>,
    pub control_peer: IpAddr,
    pub tls_config: Option<Arc<rustls::ServerConfig>>,
    pub logger: slog::Logger,
}

/// Spawns the task for a passive data channel: wait for the client on `listener`, then serve
/// one transfer. The `guard` keeps the passive port reserved for as long as the task lives.
pub(crate) fn spawn_passive<Storage, User>(listener: TcpListener, guard: PortGuard, params: DataChanParams<Storage, User>)
where
    Storage: StorageBackend<User> + 'static,
    User: UserDetail + 'static,
{
    tokio::spawn(async move {
        let _guard = guard;
        let mut params = params;
        let accepted = tokio::select! {
            accepted = tokio::time::timeout(ACCEPT_TIMEOUT, listener.accept()) => accepted,
            _ = params.abort_rx.recv() => return,
        };
        let (socket, peer) = match accepted {
            Ok(Ok(pair)) => pair,
            Ok(Err(err)) => {
                report_failure(&params, format!("accept failed: {}", err)).await;
                return;
            }
            Err(_) => {
                report_failure(&params, "no connection within the accept timeout".to_string()).await;
                return;
            }
        };
        // Exactly one connection per passive setup.
        drop(listener);
        if !net::data_peer_allowed(params.control_peer, peer.ip()) {
            slog::warn!(params.logger, "data connection from {} refused, control peer is {}", peer, params.control_peer);
            report_failure(&params, format!("peer {} does not match the control connection", peer)).await;
            return;
        }
        run_connection(socket, params).await;
    });
}

/// Spawns the task for an active data channel on an already connected socket.
pub(crate) fn spawn_active<Storage, User>(socket: TcpStream, params: DataChanParams<Storage, User>)
where
    Storage: StorageBackend<User> + 'static,
    User: UserDetail + 'static,
{
    tokio::spawn(async move {
        run_connection(socket, params).await;
    });
}

async fn report_failure<Storage, User>(params: &DataChanParams<Storage, User>, reason: String)
where
    Storage: StorageBackend<User> + 'static,
    User: UserDetail + 'static,
{
    let _ = params.tx.send(ControlChanMsg::DataConnectionFailed { reason }).await;
}

async fn run_connection<Storage, User>(socket: TcpStream, mut params: DataChanParams<Storage, User>)
where
    Storage: StorageBackend<User> + 'static,
    User: UserDetail + 'static,
{
    let data_tls = { params.session.lock().await.data_tls };
    let mut stream = SwitchingStream::Plain(socket);
    if data_tls {
        let config = match params.tls_config.clone() {
            Some(config) => config,
            None => {
                report_failure(&params, "PROT P requested but TLS is not configured".to_string()).await;
                return;
            }
        };
        stream = match stream.upgrade_to_tls(config).await {
            Ok(stream) => stream,
            Err(err) => {
                report_failure(&params, format!("TLS handshake on the data channel failed: {}", err)).await;
                return;
            }
        };
    }

    let _ = params.ready_tx.send(true);

    let cmd = tokio::select! {
        cmd = params.cmd_rx.recv() => match cmd {
            Some(cmd) => cmd,
            // The session replaced or dropped this data channel.
            None => return,
        },
        _ = params.abort_rx.recv() => {
            abort_connection(stream).await;
            let _ = params.tx.send(ControlChanMsg::TransferAborted).await;
            return;
        }
    };

    execute(cmd, stream, &mut params).await;
}

async fn execute<Storage, User>(cmd: DataChanCmd, mut stream: SwitchingStream<TcpStream>, params: &mut DataChanParams<Storage, User>)
where
    Storage: StorageBackend<User> + 'static,
    User: UserDetail + 'static,
{
    let (storage, user_arc) = {
        let session = params.session.lock().await;
        match &session.storage {
            Some(storage) => (Arc::clone(storage), session.user.clone()),
            None => {
                report_failure(params, "no storage attached to the session".to_string()).await;
                return;
            }
        }
    };
    let user = match user_arc.as_ref() {
        Some(user) => user,
        None => {
            report_failure(params, "session is not authenticated".to_string()).await;
            return;
        }
    };
    let tx = params.tx.clone();
    let logger = params.logger.clone();

    match cmd {
        DataChanCmd::Retr { path, start_pos } => {
            let virtual_path = PathBuf::from(&path);
            match storage.get(user, &virtual_path, start_pos).await {
                Ok(mut reader) => {
                    tokio::select! {
                        copied = tokio::io::copy(&mut reader, &mut stream) => match copied {
                            Ok(bytes) => {
                                let _ = stream.shutdown().await;
                                let _ = tx.send(ControlChanMsg::SentData { path, bytes }).await;
                            }
                            Err(err) => {
                                slog::warn!(logger, "RETR of {} broke off: {}", path, err);
                                let _ = tx.send(ControlChanMsg::StorageError { error: Error::from(err), path }).await;
                            }
                        },
                        _ = params.abort_rx.recv() => {
                            abort_connection(stream).await;
                            let _ = tx.send(ControlChanMsg::TransferAborted).await;
                        }
                    }
                }
                Err(error) => {
                    let _ = tx.send(ControlChanMsg::StorageError { error, path }).await;
                }
            }
        }
        DataChanCmd::Stor { path, start_pos, append } => {
            let virtual_path = PathBuf::from(&path);
            let (read_half, mut write_half) = tokio::io::split(stream);
            tokio::select! {
                stored = storage.put(user, read_half, &virtual_path, PutParams { start_pos, append }) => match stored {
                    Ok(bytes) => {
                        let _ = write_half.shutdown().await;
                        let _ = tx.send(ControlChanMsg::WrittenData { path, bytes }).await;
                    }
                    Err(error) => {
                        slog::warn!(logger, "STOR to {} failed: {}", path, error);
                        let _ = tx.send(ControlChanMsg::StorageError { error, path }).await;
                    }
                },
                _ = params.abort_rx.recv() => {
                    let _ = write_half.write_all(ABORT_NOTICE).await;
                    let _ = write_half.shutdown().await;
                    let _ = tx.send(ControlChanMsg::TransferAborted).await;
                }
            }
        }
        DataChanCmd::SendBytes { payload } => {
            tokio::select! {
                written = stream.write_all(&payload) => match written {
                    Ok(()) => {
                        let _ = stream.shutdown().await;
                        let _ = tx.send(ControlChanMsg::DirectorySuccessfullyListed).await;
                    }
                    Err(err) => {
                        slog::warn!(logger, "could not send listing: {}", err);
                        let _ = tx.send(ControlChanMsg::StorageError {
                            error: Error::new(ErrorKind::ConnectionClosed, err),
                            path: String::new(),
                        }).await;
                    }
                },
                _ = params.abort_rx.recv() => {
                    abort_connection(stream).await;
                    let _ = tx.send(ControlChanMsg::TransferAborted).await;
                }
            }
        }
    }
}

// The 426 on the data socket is best effort: a client that aborted may be gone already.
async fn abort_connection(mut stream: SwitchingStream<TcpStream>) {
    let _ = stream.write_all(ABORT_NOTICE).await;
    let _ = stream.shutdown().await;
}
