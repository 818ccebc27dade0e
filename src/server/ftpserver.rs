//! Contains the [`Server`] struct that is used to configure and start an FTP(S) server
//! instance.

pub mod error;
mod listen;
pub mod options;

use super::{
    controlchan::ControlParams,
    ftpserver::error::{ServerError, ServerErrorKind},
    ports::PassivePorts,
    rate_limit::IpRateLimiter,
    shutdown,
    tls::FtpsConfig,
};
use crate::{
    auth::{AnonymousAuthenticator, Authenticator, DefaultUser, UserDetail},
    notification::{nop::NopListener, DataListener, PresenceListener},
    storage::{ListFormat, ObjectStorage, StorageBackend},
};
pub use super::controlchan::handler::StorageFactory;

use options::PassiveHost;
use slog::{o, Drain};
use std::{future::Future, net::SocketAddr, ops::RangeInclusive, path::PathBuf, pin::Pin, sync::Arc, time::Duration};

/// An instance of an FTP(S) server. It aggregates an [`Authenticator`](crate::auth::Authenticator)
/// that decides who may log in and a factory producing the [`StorageBackend`](crate::storage::StorageBackend)
/// each login lands in.
///
/// The server is started with the [`listen`](Server::listen) method.
///
/// # Example
///
/// ```no_run
/// use bucketftp::Server;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let server = Server::with_object_store(
///         "http://localhost:8000/storage/v1",
///         "service-key",
///         "my-bucket/ftp-home",
///     )
///     .greeting("Welcome to my object store")
///     .passive_ports(50000..=51000);
///
///     server.listen("127.0.0.1:2121").await.unwrap();
/// }
/// ```
pub struct Server<Storage, User>
where
    Storage: StorageBackend<User> + 'static,
    User: UserDetail + 'static,
{
    storage_factory: Arc<StorageFactory<Storage, User>>,
    authenticator: Arc<dyn Authenticator<User>>,
    greeting: Vec<String>,
    passive_ports: RangeInclusive<u16>,
    passive_host: PassiveHost,
    ftps: FtpsConfig,
    idle_timeout: Duration,
    anonymous: bool,
    list_format: ListFormat,
    blacklist: Vec<String>,
    whitelist: Vec<String>,
    connect_limit: (u32, Duration),
    command_limit: (u32, Duration),
    data_listener: Arc<dyn DataListener>,
    presence_listener: Arc<dyn PresenceListener>,
    shutdown_signal: Option<Pin<Box<dyn Future<Output = ()> + Send>>>,
    shutdown_linger: Duration,
    logger: slog::Logger,
}

impl<Storage, User> Server<Storage, User>
where
    Storage: StorageBackend<User> + 'static,
    User: UserDetail + 'static,
{
    /// Creates a server around the given storage factory and authenticator. The factory runs
    /// once per successful login and receives the login grant, so different users can land in
    /// different storage roots.
    pub fn new(storage_factory: Box<StorageFactory<Storage, User>>, authenticator: Arc<dyn Authenticator<User>>) -> Self {
        Server {
            storage_factory: Arc::from(storage_factory),
            authenticator,
            greeting: vec![options::DEFAULT_GREETING.to_string()],
            passive_ports: options::DEFAULT_PASSIVE_PORTS,
            passive_host: PassiveHost::default(),
            ftps: FtpsConfig::Off,
            idle_timeout: options::DEFAULT_IDLE_SESSION_TIMEOUT,
            anonymous: false,
            list_format: ListFormat::Ls,
            blacklist: Vec::new(),
            whitelist: Vec::new(),
            connect_limit: options::DEFAULT_CONNECT_LIMIT,
            command_limit: options::DEFAULT_COMMAND_LIMIT,
            data_listener: Arc::new(NopListener),
            presence_listener: Arc::new(NopListener),
            shutdown_signal: None,
            shutdown_linger: options::DEFAULT_SHUTDOWN_LINGER,
            logger: slog::Logger::root(slog_stdlog::StdLog.fuse(), o!()),
        }
    }

    /// Sets the one-line greeting sent with the 220 banner.
    pub fn greeting<S: Into<String>>(mut self, greeting: S) -> Self {
        self.greeting = vec![greeting.into()];
        self
    }

    /// Sets a multi-line greeting; the lines are sent as one 220 block.
    pub fn greeting_lines<I: IntoIterator<Item = String>>(mut self, lines: I) -> Self {
        self.greeting = lines.into_iter().collect();
        self
    }

    /// Sets the inclusive port range used for passive data connections. The low end must be
    /// above the well-known ports.
    pub fn passive_ports(mut self, range: RangeInclusive<u16>) -> Self {
        self.passive_ports = range;
        self
    }

    /// Sets how the address in PASV replies is determined.
    pub fn passive_host<H: Into<PassiveHost>>(mut self, host: H) -> Self {
        self.passive_host = host.into();
        self
    }

    /// Enables FTPS with the given PEM certificate chain and private key. Clients can then
    /// upgrade the control channel with `AUTH TLS` and protect data channels with `PROT P`.
    pub fn ftps<P: Into<PathBuf>>(mut self, certs_file: P, key_file: P) -> Self {
        self.ftps = FtpsConfig::Building {
            certs_file: certs_file.into(),
            key_file: key_file.into(),
        };
        self
    }

    /// Sets the session idle timeout. Zero disables it.
    pub fn idle_session_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Advertises anonymous access in FEAT. The authenticator still decides who gets in.
    pub fn anonymous(mut self, anonymous: bool) -> Self {
        self.anonymous = anonymous;
        self
    }

    /// Sets the default LIST output format for new sessions.
    pub fn list_format(mut self, format: ListFormat) -> Self {
        self.list_format = format;
        self
    }

    /// Directives to refuse server-wide, e.g. `["DELE", "RMD"]` for a read-only server.
    pub fn blacklist<I: IntoIterator<Item = S>, S: Into<String>>(mut self, directives: I) -> Self {
        self.blacklist = directives.into_iter().map(Into::into).collect();
        self
    }

    /// If set, only these directives are accepted.
    pub fn whitelist<I: IntoIterator<Item = S>, S: Into<String>>(mut self, directives: I) -> Self {
        self.whitelist = directives.into_iter().map(Into::into).collect();
        self
    }

    /// Limits how many times one address may connect per time window.
    pub fn connection_rate_limit(mut self, max: u32, window: Duration) -> Self {
        self.connect_limit = (max, window);
        self
    }

    /// Limits how many commands one session may issue per time window.
    pub fn command_rate_limit(mut self, max: u32, window: Duration) -> Self {
        self.command_limit = (max, window);
        self
    }

    /// Registers a listener for storage change events.
    pub fn notify_data<L: DataListener + 'static>(mut self, listener: L) -> Self {
        self.data_listener = Arc::new(listener);
        self
    }

    /// Registers a listener for connection and login events.
    pub fn notify_presence<L: PresenceListener + 'static>(mut self, listener: L) -> Self {
        self.presence_listener = Arc::new(listener);
        self
    }

    /// Makes [`listen`](Server::listen) return gracefully when the given future completes. The
    /// host decides what feeds it, typically the process signals.
    pub fn shutdown_indicator<F: Future<Output = ()> + Send + 'static>(mut self, signal: F) -> Self {
        self.shutdown_signal = Some(Box::pin(signal));
        self
    }

    /// Sets how long a graceful shutdown waits for sessions to drain.
    pub fn shutdown_linger(mut self, linger: Duration) -> Self {
        self.shutdown_linger = linger;
        self
    }

    /// Sets the logger. By default everything is forwarded to the `log` crate.
    pub fn logger(mut self, logger: slog::Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Binds the control port and serves clients until the shutdown indicator completes, or
    /// forever if none was given. Returns an error only when the server cannot start.
    pub async fn listen<S: AsRef<str>>(mut self, bind_address: S) -> Result<(), ServerError> {
        let bind_address: SocketAddr = bind_address
            .as_ref()
            .parse()
            .map_err(|e| ServerError::new(ServerErrorKind::Bind, format!("invalid bind address: {}", e)))?;
        if *self.passive_ports.start() < 1024 {
            return Err(ServerError::config("the passive port range must start above the well-known ports"));
        }
        if self.passive_ports.is_empty() {
            return Err(ServerError::config("the passive port range is empty"));
        }
        self.ftps.materialize().map_err(|e| ServerError::new(ServerErrorKind::Tls, e))?;

        let params = ControlParams {
            storage_factory: Arc::clone(&self.storage_factory),
            authenticator: Arc::clone(&self.authenticator),
            greeting: self.greeting.clone(),
            passive_ports: Arc::new(PassivePorts::new(self.passive_ports.clone())),
            passive_host: self.passive_host.clone(),
            tls: self.ftps.clone(),
            idle_timeout: self.idle_timeout,
            command_limit: self.command_limit,
            blacklist: self.blacklist.clone(),
            whitelist: self.whitelist.clone(),
            list_format: self.list_format,
            anonymous: self.anonymous,
            data_listener: Arc::clone(&self.data_listener),
            presence_listener: Arc::clone(&self.presence_listener),
            logger: self.logger.clone(),
        };
        let shutdown_topic = Arc::new(shutdown::Notifier::new());
        let listener = listen::Listener {
            bind_address,
            params,
            connection_limiter: Arc::new(IpRateLimiter::new(self.connect_limit.0, self.connect_limit.1)),
            shutdown_topic: Arc::clone(&shutdown_topic),
            logger: self.logger.clone(),
        };

        match self.shutdown_signal.take() {
            None => listener.listen().await,
            Some(signal) => {
                let logger = self.logger.clone();
                tokio::select! {
                    result = listener.listen() => result,
                    _ = signal => {
                        slog::info!(logger, "shutting down");
                        shutdown_topic.notify().await;
                        let _ = tokio::time::timeout(self.shutdown_linger, shutdown_topic.linger()).await;
                        slog::info!(logger, "shutdown complete");
                        Ok(())
                    }
                }
            }
        }
    }
}

impl Server<ObjectStorage, DefaultUser> {
    /// Creates a server that drops every login into the same root of an HTTP object store,
    /// accepting any credentials. For authenticated setups use [`Server::new`] with your own
    /// [`Authenticator`].
    pub fn with_object_store(base_url: &str, service_key: &str, root: &str) -> Self {
        let base_url_owned = base_url.to_string();
        let service_key_owned = service_key.to_string();
        Server::new(
            Box::new(move |grant| ObjectStorage::new(base_url_owned.clone(), &grant.root, service_key_owned.clone())),
            Arc::new(AnonymousAuthenticator::new(root)),
        )
        .anonymous(true)
    }
}
