//! The RFC 959 Store (`STOR`) command
//
// This command causes the server-DTP to accept the data transferred via the data connection and
// to store the data as a file at the server site. An existing file is replaced; a new file is
// created otherwise.

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

use super::transfer::{acquire_data_channel, dispatch_to_data_channel, DataChannel};

#[derive(Debug)]
pub struct Stor;

/// Drives a store-style transfer; STOR, APPE and STOU all end up here.
pub(super) async fn store<Storage, User>(args: CommandContext<Storage, User>, path: String, append: bool) -> Result<Reply, ControlChanError>
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    let (user_arc, cwd, start_pos) = {
        let session = args.session.lock().await;
        if session.storage.is_none() {
            return Ok(Reply::new(ReplyCode::NotLoggedIn, "Please authenticate"));
        }
        (session.user.clone(), session.cwd.clone(), session.start_pos)
    };
    match user_arc.as_ref() {
        Some(user) if user.storage_permissions().contains(StoragePermissions::PUT) => {}
        Some(_) => return Ok(Reply::new(ReplyCode::FileError, "Permission denied")),
        None => return Ok(Reply::new(ReplyCode::NotLoggedIn, "Please authenticate")),
    }
    let target = normalize_virtual(cwd.join(&path));

    match acquire_data_channel(&args).await {
        DataChannel::Ready(tx) => {
            dispatch_to_data_channel(
                tx,
                DataChanCmd::Stor {
                    path: target.to_string_lossy().to_string(),
                    start_pos,
                    append,
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

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Stor
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let path = match &args.parsed_command.cmd {
            Command::Stor { path } => path.clone(),
            _ => return Err(crate::server::controlchan::ControlChanErrorKind::InternalServerError.into()),
        };
        store(args, path, false).await
    }
}
