//! The RFC 3659 Restart of Interrupted Transfer (`REST`) command
//
// To avoid having to resend a whole file, both sides agree on a byte offset at which the next
// transfer restarts. The offset applies to exactly one following STOR/RETR/APPE.

use crate::{
    auth::UserDetail,
    server::controlchan::{
        command::Command,
        error::ControlChanError,
        handler::{CommandContext, CommandHandler},
        Reply, ReplyCode,
    },
    storage::{Metadata, StorageBackend, FEATURE_RESTART},
};
use async_trait::async_trait;

#[derive(Debug)]
pub struct Rest;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Rest
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let offset = match args.parsed_command.cmd {
            Command::Rest { offset } => offset,
            _ => return Err(crate::server::controlchan::ControlChanErrorKind::InternalServerError.into()),
        };
        let mut session = args.session.lock().await;
        if let Some(storage) = &session.storage {
            if storage.supported_features() & FEATURE_RESTART == 0 {
                return Ok(Reply::new(ReplyCode::CommandNotImplemented, "Restarts are not supported by the storage back-end"));
            }
        }
        session.start_pos = offset;
        Ok(Reply::new_with_string(
            ReplyCode::FileActionPending,
            format!("Restarting next transfer at {}", offset),
        ))
    }
}
