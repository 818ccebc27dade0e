//! The RFC 959 Change Working Directory (`CWD`) command

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
pub struct Cwd;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Cwd
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let path = match &args.parsed_command.cmd {
            Command::Cwd { path } => path.clone(),
            _ => return Err(crate::server::controlchan::ControlChanErrorKind::InternalServerError.into()),
        };
        chdir(args, &path).await
    }
}

// Shared between CWD and CDUP.
pub(super) async fn chdir<Storage, User>(args: CommandContext<Storage, User>, path: &str) -> Result<Reply, ControlChanError>
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
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
    let target = normalize_virtual(cwd.join(path));
    match storage.cwd(user, &target).await {
        Ok(()) => {
            let quoted = target.to_string_lossy().replace('"', "\"\"");
            let mut session = args.session.lock().await;
            session.cwd = target.clone();
            Ok(Reply::new_with_string(ReplyCode::FileActionOkay, format!("\"{}\" is the current directory", quoted)))
        }
        Err(err) => {
            slog::info!(args.logger, "CWD to {:?} refused: {}", target, err);
            Ok(Reply::new(ReplyCode::FileError, "Directory does not exist"))
        }
    }
}
