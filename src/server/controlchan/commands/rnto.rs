//! The RFC 959 Rename To (`RNTO`) command
//
// Completes the rename started by RNFR. The remembered source is forgotten whatever the
// outcome.

use crate::{
    auth::{StoragePermissions, UserDetail},
    notification::DataEvent,
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
pub struct Rnto;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Rnto
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let path = match &args.parsed_command.cmd {
            Command::Rnto { path } => path.clone(),
            _ => return Err(crate::server::controlchan::ControlChanErrorKind::InternalServerError.into()),
        };
        let (storage, user_arc, cwd, rename_from) = {
            let mut session = args.session.lock().await;
            let rename_from = session.rename_from.take();
            match &session.storage {
                Some(storage) => (Arc::clone(storage), session.user.clone(), session.cwd.clone(), rename_from),
                None => return Ok(Reply::new(ReplyCode::NotLoggedIn, "Please authenticate")),
            }
        };
        let user = match user_arc.as_ref() {
            Some(user) => user,
            None => return Ok(Reply::new(ReplyCode::NotLoggedIn, "Please authenticate")),
        };
        if !user.storage_permissions().contains(StoragePermissions::RENAME) {
            return Ok(Reply::new(ReplyCode::FileError, "Permission denied"));
        }
        let from = match rename_from {
            Some(from) => from,
            None => return Ok(Reply::new(ReplyCode::BadCommandSequence, "Tell me what to rename first with RNFR")),
        };
        let to = normalize_virtual(cwd.join(&path));
        match storage.rename(user, &from, &to).await {
            Ok(()) => {
                let meta = { args.session.lock().await.event_meta() };
                args.data_listener
                    .receive_data_event(
                        DataEvent::Renamed {
                            from: from.to_string_lossy().to_string(),
                            to: to.to_string_lossy().to_string(),
                        },
                        meta,
                    )
                    .await;
                Ok(Reply::new(ReplyCode::FileActionOkay, "Rename successful"))
            }
            Err(err) => {
                slog::info!(args.logger, "RNTO {:?} -> {:?} failed: {}", from, to, err);
                Ok(crate::server::controlchan::reply::storage_error_reply(err.kind()))
            }
        }
    }
}
