use crate::{
    auth::{Authenticator, LoginGrant, UserDetail},
    notification::{DataListener, PresenceListener},
    server::{
        chancomms::ControlChanMsg,
        controlchan::{command::ParsedCommand, error::ControlChanError, Reply},
        ftpserver::options::PassiveHost,
        ports::PassivePorts,
        session::SharedSession,
        tls::FtpsConfig,
    },
    storage::{Error, Metadata, StorageBackend},
};
use async_trait::async_trait;
use std::{fmt, net::SocketAddr, sync::Arc};
use tokio::sync::mpsc::Sender;

/// Builds a storage back-end for a freshly authenticated session from its login grant.
pub type StorageFactory<Storage, User> = dyn (Fn(&LoginGrant<User>) -> Result<Storage, Error>) + Send + Sync;

// Common interface for all handlers of `Commands`
#[async_trait]
pub(crate) trait CommandHandler<Storage, User>: Send + Sync
where
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
    User: UserDetail,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError>;
}

/// Represents arguments passed to a `CommandHandler`
pub(crate) struct CommandContext<Storage, User>
where
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata + Sync,
    User: UserDetail + 'static,
{
    pub parsed_command: ParsedCommand,
    pub session: SharedSession<Storage, User>,
    pub authenticator: Arc<dyn Authenticator<User>>,
    pub storage_factory: Arc<StorageFactory<Storage, User>>,
    pub tls: FtpsConfig,
    pub passive_ports: Arc<PassivePorts>,
    pub passive_host: PassiveHost,
    pub tx_control_chan: Sender<ControlChanMsg>,
    pub local_addr: SocketAddr,
    pub data_listener: Arc<dyn DataListener>,
    pub presence_listener: Arc<dyn PresenceListener>,
    pub anonymous: bool,
    pub logger: slog::Logger,
}

impl<Storage, User> fmt::Debug for CommandContext<Storage, User>
where
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata + Sync,
    User: UserDetail + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("parsed_command", &self.parsed_command)
            .field("local_addr", &self.local_addr)
            .finish()
    }
}
