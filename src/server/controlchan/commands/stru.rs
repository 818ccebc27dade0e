//! The RFC 959 File Structure (`STRU`) command
//
// Only the default file structure is supported; record and page structure get refused.

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

/// The file structures of RFC 959.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum StruParam {
    /// File, no record structure. The only one we support.
    File,
    /// Record structure.
    Record,
    /// Page structure.
    Page,
}

#[derive(Debug)]
pub struct Stru;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Stru
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        match args.parsed_command.cmd {
            Command::Stru { structure: StruParam::File } => Ok(Reply::new(ReplyCode::CommandOkay, "Structure set to file")),
            _ => Ok(Reply::new(ReplyCode::CommandNotImplementedForParameter, "Only file structure is supported")),
        }
    }
}
