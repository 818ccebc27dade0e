//! The RFC 959 Retrieve (`RETR`) command
//
// Sends a file to the client over the data connection. The 150 only goes out once the data
// connection is up and the path turned out to be a retrievable file.

use crate::{
    auth::{StoragePermissions, UserDetail},
    server::{
        chancomms::DataChanCmd,
        controlchan::{
            command::Command,
            error::ControlChanError,
            handler::{CommandContext, CommandHandler},
            Reply, ReplyCode,
        },
    },
    storage::{normalize_virtual, Metadata, StorageBackend},
};
use async_trait::async_trait;
use std::sync::Arc;

use super::transfer::{acquire_data_channel, dispatch_to_data_channel, DataChannel};

#[derive(Debug)]
pub struct Retr;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Retr
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let path = match &args.parsed_command.cmd {
            Command::Retr { path } => path.clone(),
            _ => return Err(crate::server::controlchan::ControlChanErrorKind::InternalServerError.into()),
        };
        let (storage, user_arc, cwd, start_pos) = {
            let session = args.session.lock().await;
            match &session.storage {
                Some(storage) => (Arc::clone(storage), session.user.clone(), session.cwd.clone(), session.start_pos),
                None => return Ok(Reply::new(ReplyCode::NotLoggedIn, "Please authenticate")),
            }
        };
        let user = match user_arc.as_ref() {
            Some(user) => user,
            None => return Ok(Reply::new(ReplyCode::NotLoggedIn, "Please authenticate")),
        };
        if !user.storage_permissions().contains(StoragePermissions::GET) {
            return Ok(Reply::new(ReplyCode::FileError, "Permission denied"));
        }
        let target = normalize_virtual(cwd.join(&path));

        match storage.metadata(user, &target).await {
            Ok(metadata) if metadata.is_dir() => {
                return Ok(Reply::new(ReplyCode::FileError, "Cannot retrieve a directory"));
            }
            Ok(_) => {}
            Err(err) => {
                slog::info!(args.logger, "RETR {:?} failed: {}", target, err);
                return Ok(crate::server::controlchan::reply::storage_error_reply(err.kind()));
            }
        }

        match acquire_data_channel(&args).await {
            DataChannel::Ready(tx) => {
                dispatch_to_data_channel(
                    tx,
                    DataChanCmd::Retr {
                        path: target.to_string_lossy().to_string(),
                        start_pos,
                    },
                    args.logger.clone(),
                );
                Ok(Reply::new(ReplyCode::FileStatusOkay, "Opening data connection"))
            }
            DataChannel::NotSetUp | DataChannel::TimedOut => {
                let mut session = args.session.lock().await;
                session.start_pos = 0;
                Ok(Reply::new(ReplyCode::CantOpenDataConnection, "No connection established"))
            }
        }
    }
}
