//! The RFC 959 Transfer Mode (`MODE`) command
//
// Only stream mode is supported; block and compressed mode get refused.

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

/// The transfer modes of RFC 959.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ModeParam {
    /// Stream mode, the only one we support.
    Stream,
    /// Block mode.
    Block,
    /// Compressed mode.
    Compressed,
}

#[derive(Debug)]
pub struct Mode;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Mode
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        match args.parsed_command.cmd {
            Command::Mode { mode: ModeParam::Stream } => Ok(Reply::new(ReplyCode::CommandOkay, "Using stream mode")),
            _ => Ok(Reply::new(ReplyCode::CommandNotImplementedForParameter, "Only stream mode is supported")),
        }
    }
}
