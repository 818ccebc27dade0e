//! The RFC 3659 Machine List Single (`MLST`) command
//
// Reports the facts of one file or directory on the control connection. The fact set honors
// what was selected with `OPTS MLST`.

use crate::{
    auth::UserDetail,
    server::controlchan::{
        command::Command,
        error::ControlChanError,
        handler::{CommandContext, CommandHandler},
        Reply, ReplyCode,
    },
    storage::{format_mlsd, normalize_virtual, Fileinfo, Metadata, StorageBackend},
};
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug)]
pub struct Mlst;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Mlst
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let path = match &args.parsed_command.cmd {
            Command::Mlst { path } => path.clone(),
            _ => return Err(crate::server::controlchan::ControlChanErrorKind::InternalServerError.into()),
        };
        let (storage, user_arc, cwd, facts) = {
            let session = args.session.lock().await;
            match &session.storage {
                Some(storage) => (Arc::clone(storage), session.user.clone(), session.cwd.clone(), session.mlst_facts.clone()),
                None => return Ok(Reply::new(ReplyCode::NotLoggedIn, "Please authenticate")),
            }
        };
        let user = match user_arc.as_ref() {
            Some(user) => user,
            None => return Ok(Reply::new(ReplyCode::NotLoggedIn, "Please authenticate")),
        };
        let target = match path {
            Some(path) => normalize_virtual(cwd.join(path)),
            None => cwd,
        };
        match storage.metadata(user, &target).await {
            Ok(metadata) => {
                let client_path = target.to_string_lossy().to_string();
                let line = format_mlsd(&Fileinfo { path: target, metadata }, &facts);
                let lines = vec![format!("Listing {}", client_path), format!(" {}", line), "End".to_string()];
                Ok(Reply::new_multiline(ReplyCode::FileActionOkay, lines))
            }
            Err(err) => {
                slog::info!(args.logger, "MLST {:?} failed: {}", target, err);
                Ok(Reply::new(ReplyCode::FileError, "File or directory does not exist"))
            }
        }
    }
}
