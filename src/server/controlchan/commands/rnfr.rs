//! The RFC 959 Rename From (`RNFR`) command
//
// Verifies the source exists and remembers it for the RNTO that must follow.

use crate::{
    auth::UserDetail,
    server::controlchan::{
        command::Command,
        error::ControlChanError,
        handler::{CommandContext, CommandHandler},
        Reply, ReplyCode,
    },
    storage::{normalize_virtual, Metadata, StorageBackend},
};
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug)]
pub struct Rnfr;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Rnfr
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let path = match &args.parsed_command.cmd {
            Command::Rnfr { path } => path.clone(),
            _ => return Err(crate::server::controlchan::ControlChanErrorKind::InternalServerError.into()),
        };
        let (storage, user_arc, cwd) = {
            let session = args.session.lock().await;
            match &session.storage {
                Some(storage) => (Arc::clone(storage), session.user.clone(), session.cwd.clone()),
                None => return Ok(Reply::new(ReplyCode::NotLoggedIn, "Please authenticate")),
            }
        };
        let user = match user_arc.as_ref() {
            Some(user) => user,
            None => return Ok(Reply::new(ReplyCode::NotLoggedIn, "Please authenticate")),
        };
        let target = normalize_virtual(cwd.join(&path));
        match storage.metadata(user, &target).await {
            Ok(_) => {
                let mut session = args.session.lock().await;
                session.rename_from = Some(target);
                Ok(Reply::new(ReplyCode::FileActionPending, "Tell me the new name with RNTO"))
            }
            Err(err) => {
                slog::info!(args.logger, "RNFR {:?} failed: {}", target, err);
                Ok(Reply::new(ReplyCode::FileError, "File or directory does not exist"))
            }
        }
    }
}
