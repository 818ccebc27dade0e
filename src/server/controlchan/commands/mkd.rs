//! The RFC 959 Make Directory (`MKD`) command
//
// On the object store this plants the directory's placeholder object.

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
pub struct Mkd;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Mkd
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let path = match &args.parsed_command.cmd {
            Command::Mkd { path } => path.clone(),
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
        if !user.storage_permissions().contains(StoragePermissions::MK_DIR) {
            return Ok(Reply::new(ReplyCode::FileError, "Permission denied"));
        }
        let target = normalize_virtual(cwd.join(&path));
        match storage.mkd(user, &target).await {
            Ok(()) => {
                let client_path = target.to_string_lossy().to_string();
                let meta = { args.session.lock().await.event_meta() };
                args.data_listener.receive_data_event(DataEvent::MadeDir { path: client_path.clone() }, meta).await;
                let quoted = client_path.replace('"', "\"\"");
                Ok(Reply::new_with_string(ReplyCode::DirCreated, format!("\"{}\" directory created", quoted)))
            }
            Err(err) => {
                slog::info!(args.logger, "MKD {:?} failed: {}", target, err);
                Ok(Reply::new(ReplyCode::FileError, "Failed to create directory"))
            }
        }
    }
}
