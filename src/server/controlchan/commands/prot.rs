//! The RFC 2228 Data Channel Protection Level (`PROT`) command
//
// `C` keeps data channels clear, `P` makes them private (TLS). The in-between levels of the RFC
// are refused.

use crate::{
    auth::UserDetail,
    server::controlchan::{
        command::Command,
        error::ControlChanError,
        handler::{CommandContext, CommandHandler},
        Reply, ReplyCode,
    },
    storage::{Metadata, StorageBackend},
};
use async_trait::async_trait;

/// The protection levels of RFC 2228.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ProtParam {
    Clear,
    Safe,
    Confidential,
    Private,
}

#[derive(Debug)]
pub struct Prot;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Prot
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let param = match args.parsed_command.cmd {
            Command::Prot { param } => param,
            _ => return Err(crate::server::controlchan::ControlChanErrorKind::InternalServerError.into()),
        };
        let mut session = args.session.lock().await;
        match param {
            ProtParam::Clear => {
                session.data_tls = false;
                Ok(Reply::new(ReplyCode::CommandOkay, "PROT C OK, data channel will be in clear text"))
            }
            ProtParam::Private => {
                session.data_tls = true;
                Ok(Reply::new(ReplyCode::CommandOkay, "PROT P OK, data channel will be protected"))
            }
            _ => Ok(Reply::new(ReplyCode::ProtLevelNotSupported, "Only C and P protection levels are supported")),
        }
    }
}
