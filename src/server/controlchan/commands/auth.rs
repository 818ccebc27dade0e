//! The RFC 2228 Authentication/Security Mechanism (`AUTH`) command
//
// `AUTH TLS` upgrades the control channel: the 234 goes out in plaintext, then the socket is
// wrapped. The actual wrapping is done by the control loop when it sees our message.

use crate::{
    auth::UserDetail,
    server::{
        chancomms::ControlChanMsg,
        controlchan::{
            command::Command,
            error::ControlChanError,
            handler::{CommandContext, CommandHandler},
            Reply, ReplyCode,
        },
        tls::FtpsConfig,
    },
    storage::{Metadata, StorageBackend},
};
use async_trait::async_trait;

/// The security mechanisms a client can ask for.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AuthParam {
    Tls,
    Ssl,
}

#[derive(Debug)]
pub struct Auth;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Auth
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let protocol = match args.parsed_command.cmd {
            Command::Auth { protocol } => protocol,
            _ => return Err(crate::server::controlchan::ControlChanErrorKind::InternalServerError.into()),
        };
        let tls_configured = !matches!(args.tls, FtpsConfig::Off);
        match (tls_configured, protocol) {
            (true, AuthParam::Tls) => {
                let tx = args.tx_control_chan.clone();
                let logger = args.logger;
                tokio::spawn(async move {
                    if let Err(err) = tx.send(ControlChanMsg::SecureControlChannel).await {
                        slog::warn!(logger, "AUTH: could not notify the control loop: {}", err);
                    }
                });
                Ok(Reply::new(ReplyCode::AuthOkayNoDataNeeded, "AUTH TLS OK"))
            }
            (true, AuthParam::Ssl) => Ok(Reply::new(ReplyCode::CommandNotImplementedForParameter, "AUTH SSL not implemented, use TLS")),
            (false, _) => Ok(Reply::new(ReplyCode::PolicyRequiresTls, "TLS is not configured on this server")),
        }
    }
}
