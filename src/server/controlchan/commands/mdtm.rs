//! The RFC 3659 Modification Time (`MDTM`) command
//
// The query form reports when a file was last modified. The set form is acknowledged for client
// compatibility but the object store keeps its own timestamps.

use crate::{
    auth::UserDetail,
    server::controlchan::{
        command::Command,
        error::ControlChanError,
        handler::{CommandContext, CommandHandler},
        Reply, ReplyCode,
    },
    storage::{mdtm_timestamp, normalize_virtual, Metadata, StorageBackend},
};
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug)]
pub struct Mdtm;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Mdtm
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let path = match &args.parsed_command.cmd {
            Command::Mdtm { path } => path.clone(),
            Command::MdtmSet { .. } => {
                return Ok(Reply::new(ReplyCode::CommandOkay, "Modification times are kept by the storage back-end"));
            }
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
            Ok(metadata) => match metadata.modified() {
                Ok(modified) => Ok(Reply::new_with_string(ReplyCode::FileStatus, mdtm_timestamp(modified))),
                Err(err) => {
                    slog::info!(args.logger, "MDTM {:?}: no modification time: {}", target, err);
                    Ok(Reply::new(ReplyCode::FileError, "Could not get modification time"))
                }
            },
            Err(err) => {
                slog::info!(args.logger, "MDTM {:?} failed: {}", target, err);
                Ok(Reply::new(ReplyCode::FileError, "File does not exist"))
            }
        }
    }
}
