//! The per-session control channel loop: frames the socket, greets the client, dispatches
//! parsed commands through the registry gate to their handlers, and folds data-channel outcomes
//! back into replies. Commands of one session run strictly one at a time, in arrival order.

use crate::auth::{Authenticator, UserDetail};
use crate::notification::{DataEvent, DataListener, PresenceEvent, PresenceListener};
use crate::server::chancomms::ControlChanMsg;
use crate::server::controlchan::command::{Command, ParsedCommand};
use crate::server::controlchan::handler::{CommandContext, CommandHandler, StorageFactory};
use crate::server::controlchan::{commands, registry, ControlChanError, ControlChanErrorKind, FtpCodec, Reply, ReplyCode};
use crate::server::ftpserver::options::PassiveHost;
use crate::server::ports::PassivePorts;
use crate::server::rate_limit::SlidingWindow;
use crate::server::session::{Session, SharedSession};
use crate::server::shutdown;
use crate::server::stream::SwitchingStream;
use crate::server::tls::FtpsConfig;
use crate::storage::{ListFormat, Metadata, StorageBackend};

use futures_util::{SinkExt, StreamExt};
use slog::o;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio_util::codec::Framed;

// The idle timer needs some value to sleep on even when idle timeouts are disabled.
const NO_TIMEOUT: Duration = Duration::from_secs(60 * 60 * 24 * 365);

pub(crate) struct ControlParams<Storage, User>
where
    Storage: StorageBackend<User> + 'static,
    User: UserDetail + 'static,
{
    pub storage_factory: Arc<StorageFactory<Storage, User>>,
    pub authenticator: Arc<dyn Authenticator<User>>,
    pub greeting: Vec<String>,
    pub passive_ports: Arc<PassivePorts>,
    pub passive_host: PassiveHost,
    pub tls: FtpsConfig,
    pub idle_timeout: Duration,
    pub command_limit: (u32, Duration),
    pub blacklist: Vec<String>,
    pub whitelist: Vec<String>,
    pub list_format: ListFormat,
    pub anonymous: bool,
    pub data_listener: Arc<dyn DataListener>,
    pub presence_listener: Arc<dyn PresenceListener>,
    pub logger: slog::Logger,
}

impl<Storage, User> Clone for ControlParams<Storage, User>
where
    Storage: StorageBackend<User> + 'static,
    User: UserDetail + 'static,
{
    fn clone(&self) -> Self {
        ControlParams {
            storage_factory: Arc::clone(&self.storage_factory),
            authenticator: Arc::clone(&self.authenticator),
            greeting: self.greeting.clone(),
            passive_ports: Arc::clone(&self.passive_ports),
            passive_host: self.passive_host.clone(),
            tls: self.tls.clone(),
            idle_timeout: self.idle_timeout,
            command_limit: self.command_limit,
            blacklist: self.blacklist.clone(),
            whitelist: self.whitelist.clone(),
            list_format: self.list_format,
            anonymous: self.anonymous,
            data_listener: Arc::clone(&self.data_listener),
            presence_listener: Arc::clone(&self.presence_listener),
            logger: self.logger.clone(),
        }
    }
}

/// Greets the client and runs the control channel loop for one accepted connection in its own
/// task.
pub(crate) async fn spawn_control_channel_loop<Storage, User>(
    params: ControlParams<Storage, User>,
    tcp_stream: TcpStream,
    mut shutdown_listener: shutdown::Listener,
) -> Result<(), ControlChanError>
where
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
    User: UserDetail + 'static,
{
    let peer_addr = tcp_stream.peer_addr()?;
    let local_addr = tcp_stream.local_addr()?;

    let mut session = Session::new(peer_addr, params.list_format);
    session.blacklist = params.blacklist.iter().map(|d| d.to_ascii_uppercase()).collect();
    session.whitelist = params.whitelist.iter().map(|d| d.to_ascii_uppercase()).collect();
    let logger = params.logger.new(o!("session" => session.id.clone(), "peer" => peer_addr.to_string()));
    let session: SharedSession<Storage, User> = Arc::new(Mutex::new(session));

    let mut framed = Framed::new(SwitchingStream::Plain(tcp_stream), FtpCodec::new());
    framed.send(greeting_reply(&params.greeting)).await?;

    let meta = { session.lock().await.event_meta() };
    params.presence_listener.receive_presence_event(PresenceEvent::Connected, meta).await;

    let (tx, mut rx) = mpsc::channel::<ControlChanMsg>(8);
    let mut command_limiter = SlidingWindow::new(params.command_limit.0, params.command_limit.1);
    let idle_timeout = if params.idle_timeout.is_zero() { NO_TIMEOUT } else { params.idle_timeout };

    tokio::spawn(async move {
        loop {
            let idle = tokio::time::sleep(idle_timeout);
            tokio::pin!(idle);
            tokio::select! {
                incoming = framed.next() => match incoming {
                    Some(Ok(parsed)) => {
                        if !command_limiter.check() {
                            slog::warn!(logger, "session exceeded its command rate limit");
                            let _ = framed.send(Reply::new(ReplyCode::ServiceNotAvailable, "Too many commands, closing control connection")).await;
                            break;
                        }
                        slog::debug!(logger, "processing {}", parsed.directive);
                        let reply = dispatch_command(parsed.clone(), &params, &session, &tx, local_addr, &logger).await;
                        {
                            session.lock().await.previous_command = Some(parsed);
                        }
                        // A reply that can't be written is never retried.
                        if framed.send(reply).await.is_err() {
                            slog::warn!(logger, "could not write reply, closing session");
                            break;
                        }
                    }
                    Some(Err(err)) => {
                        let (reply, fatal) = error_reply(&err);
                        slog::info!(logger, "control channel error: {}", err);
                        if framed.send(reply).await.is_err() {
                            break;
                        }
                        if fatal {
                            break;
                        }
                    }
                    None => {
                        slog::info!(logger, "client closed the control connection");
                        break;
                    }
                },
                msg = rx.recv() => match msg {
                    Some(ControlChanMsg::Quit) => {
                        let meta = { session.lock().await.event_meta() };
                        params.presence_listener.receive_presence_event(PresenceEvent::LoggedOut, meta).await;
                        break;
                    }
                    Some(ControlChanMsg::SecureControlChannel) => {
                        let config = match params.tls.config() {
                            Some(config) => config,
                            None => {
                                slog::error!(logger, "TLS upgrade requested but no TLS configuration present");
                                break;
                            }
                        };
                        let io = framed.into_inner();
                        match io.upgrade_to_tls(config).await {
                            Ok(io) => {
                                slog::info!(logger, "control channel upgraded to TLS");
                                framed = Framed::new(io, FtpCodec::new());
                                session.lock().await.cmd_tls = true;
                            }
                            Err(err) => {
                                slog::warn!(logger, "TLS handshake failed: {}", err);
                                break;
                            }
                        }
                    }
                    Some(msg) => {
                        let reply = handle_internal_msg(msg, &params, &session, &logger).await;
                        if reply != Reply::None && framed.send(reply).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                },
                _ = &mut idle => {
                    slog::info!(logger, "session idle timeout");
                    let _ = framed.send(Reply::new(ReplyCode::ServiceNotAvailable, "Session timed out, closing control connection")).await;
                    break;
                },
                _ = shutdown_listener.listen() => {
                    let _ = framed.send(Reply::new(ReplyCode::ServiceNotAvailable, "Service is shutting down")).await;
                    break;
                }
            }
        }

        // Dropping the channel senders makes any data channel task clean up after itself.
        {
            session.lock().await.clear_data_channel();
        }
        let meta = { session.lock().await.event_meta() };
        params.presence_listener.receive_presence_event(PresenceEvent::Disconnected, meta).await;
        slog::info!(logger, "session ended");
    });

    Ok(())
}

fn greeting_reply(greeting: &[String]) -> Reply {
    match greeting.len() {
        0 => Reply::new(ReplyCode::ServiceReady, super::super::ftpserver::options::DEFAULT_GREETING),
        1 => Reply::new_with_string(ReplyCode::ServiceReady, greeting[0].clone()),
        _ => Reply::new_multiline(ReplyCode::ServiceReady, greeting.to_vec()),
    }
}

async fn dispatch_command<Storage, User>(
    parsed: ParsedCommand,
    params: &ControlParams<Storage, User>,
    session: &SharedSession<Storage, User>,
    tx: &mpsc::Sender<ControlChanMsg>,
    local_addr: std::net::SocketAddr,
    logger: &slog::Logger,
) -> Reply
where
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
    User: UserDetail + 'static,
{
    let spec = match registry::lookup(&parsed.directive) {
        Some(spec) => spec,
        None => return Reply::new_with_string(ReplyCode::CommandNotImplemented, format!("Command not allowed: {}", parsed.directive)),
    };
    {
        let session = session.lock().await;
        let canonical = spec.directive.to_string();
        if session.blacklist.contains(&canonical) || (!session.whitelist.is_empty() && !session.whitelist.contains(&canonical)) {
            return Reply::new_with_string(ReplyCode::CommandNotImplemented, format!("Command not allowed: {}", parsed.directive));
        }
        if !spec.no_auth && session.state != crate::server::session::SessionState::WaitCmd {
            return Reply::new(ReplyCode::NotLoggedIn, "Please login with USER and PASS");
        }
    }

    let handler: Box<dyn CommandHandler<Storage, User>> = match &parsed.cmd {
        Command::User { .. } => Box::new(commands::User),
        Command::Pass { .. } => Box::new(commands::Pass),
        Command::Acct => Box::new(commands::Acct),
        Command::Syst => Box::new(commands::Syst),
        Command::Stat { .. } => Box::new(commands::Stat),
        Command::Type { .. } => Box::new(commands::Type),
        Command::Stru { .. } => Box::new(commands::Stru),
        Command::Mode { .. } => Box::new(commands::Mode),
        Command::Help { .. } => Box::new(commands::Help),
        Command::Noop => Box::new(commands::Noop),
        Command::Pasv => Box::new(commands::Pasv),
        Command::Epsv => Box::new(commands::Epsv),
        Command::Port { .. } => Box::new(commands::Port),
        Command::Eprt { .. } => Box::new(commands::Eprt),
        Command::Retr { .. } => Box::new(commands::Retr),
        Command::Stor { .. } => Box::new(commands::Stor),
        Command::Appe { .. } => Box::new(commands::Appe),
        Command::Stou { .. } => Box::new(commands::Stou),
        Command::List { .. } => Box::new(commands::List),
        Command::Nlst { .. } => Box::new(commands::Nlst),
        Command::Mlsd { .. } => Box::new(commands::Mlsd),
        Command::Mlst { .. } => Box::new(commands::Mlst),
        Command::Feat => Box::new(commands::Feat),
        Command::Pwd => Box::new(commands::Pwd),
        Command::Cwd { .. } => Box::new(commands::Cwd),
        Command::Cdup => Box::new(commands::Cdup),
        Command::Opts { .. } => Box::new(commands::Opts),
        Command::Dele { .. } => Box::new(commands::Dele),
        Command::Rmd { .. } => Box::new(commands::Rmd),
        Command::Quit => Box::new(commands::Quit),
        Command::Mkd { .. } => Box::new(commands::Mkd),
        Command::Allo => Box::new(commands::Allo),
        Command::Abor => Box::new(commands::Abor),
        Command::Rnfr { .. } => Box::new(commands::Rnfr),
        Command::Rnto { .. } => Box::new(commands::Rnto),
        Command::Auth { .. } => Box::new(commands::Auth),
        Command::Pbsz { .. } => Box::new(commands::Pbsz),
        Command::Prot { .. } => Box::new(commands::Prot),
        Command::Size { .. } => Box::new(commands::Size),
        Command::Rest { .. } => Box::new(commands::Rest),
        Command::Mdtm { .. } | Command::MdtmSet { .. } => Box::new(commands::Mdtm),
        Command::Site { .. } => Box::new(commands::Site),
        Command::Other { directive } => {
            return Reply::new_with_string(ReplyCode::CommandNotImplemented, format!("Command not allowed: {}", directive));
        }
    };

    let context = CommandContext {
        parsed_command: parsed,
        session: session.clone(),
        authenticator: Arc::clone(&params.authenticator),
        storage_factory: Arc::clone(&params.storage_factory),
        tls: params.tls.clone(),
        passive_ports: Arc::clone(&params.passive_ports),
        passive_host: params.passive_host.clone(),
        tx_control_chan: tx.clone(),
        local_addr,
        data_listener: Arc::clone(&params.data_listener),
        presence_listener: Arc::clone(&params.presence_listener),
        anonymous: params.anonymous,
        logger: logger.clone(),
    };

    match handler.handle(context).await {
        Ok(reply) => reply,
        Err(err) => {
            slog::warn!(logger, "handler failed: {}", err);
            match err.kind() {
                ControlChanErrorKind::InvalidCommand => Reply::new(ReplyCode::ParameterSyntaxError, "Invalid parameter"),
                ControlChanErrorKind::IllegalState => Reply::new(ReplyCode::BadCommandSequence, "Bad sequence of commands"),
                _ => Reply::new(ReplyCode::LocalError, "Local error in processing"),
            }
        }
    }
}

// Folds a data channel outcome into the session and the reply owed on the control channel.
async fn handle_internal_msg<Storage, User>(
    msg: ControlChanMsg,
    params: &ControlParams<Storage, User>,
    session: &SharedSession<Storage, User>,
    logger: &slog::Logger,
) -> Reply
where
    Storage: StorageBackend<User> + 'static,
    User: UserDetail + 'static,
{
    // Every transfer outcome consumes the REST offset and the data channel.
    let meta = {
        let mut locked = session.lock().await;
        locked.start_pos = 0;
        locked.clear_data_channel();
        locked.event_meta()
    };
    match msg {
        ControlChanMsg::SentData { path, bytes } => {
            params.data_listener.receive_data_event(DataEvent::Got { path, bytes }, meta).await;
            Reply::new(ReplyCode::ClosingDataConnection, "Closing data connection")
        }
        ControlChanMsg::WrittenData { path, bytes } => {
            params
                .data_listener
                .receive_data_event(DataEvent::Put { path: path.clone(), bytes }, meta)
                .await;
            Reply::new_with_string(ReplyCode::ClosingDataConnection, path)
        }
        ControlChanMsg::DirectorySuccessfullyListed => Reply::new(ReplyCode::ClosingDataConnection, "Closing data connection"),
        ControlChanMsg::TransferAborted => Reply::None,
        ControlChanMsg::DataConnectionFailed { reason } => {
            slog::info!(logger, "data connection failed: {}", reason);
            Reply::None
        }
        ControlChanMsg::StorageError { error, path } => {
            slog::info!(logger, "transfer of {:?} failed: {}", path, error);
            if !path.is_empty() {
                params.data_listener.receive_data_event(DataEvent::TransferFailed { path }, meta).await;
            }
            super::reply::storage_error_reply(error.kind())
        }
        // Handled directly in the loop.
        ControlChanMsg::Quit | ControlChanMsg::SecureControlChannel => Reply::None,
    }
}

// Maps a framing/parse error onto its reply; the bool tells the loop to close afterwards.
fn error_reply(err: &ControlChanError) -> (Reply, bool) {
    match err.kind() {
        ControlChanErrorKind::BadCommandLine | ControlChanErrorKind::Utf8Error => {
            (Reply::new(ReplyCode::CommandSyntaxError, "Syntax error, command unrecognized"), false)
        }
        ControlChanErrorKind::InvalidCommand => (Reply::new(ReplyCode::ParameterSyntaxError, "Syntax error in parameters or arguments"), false),
        ControlChanErrorKind::ControlChannelTimeout => (
            Reply::new(ReplyCode::ServiceNotAvailable, "Session timed out, closing control connection"),
            true,
        ),
        ControlChanErrorKind::RateLimitExceeded => (Reply::new(ReplyCode::ServiceNotAvailable, "Too many requests"), true),
        ControlChanErrorKind::IoError => (Reply::None, true),
        _ => (Reply::new(ReplyCode::LocalError, "Unknown internal server error, please try again later"), false),
    }
}
