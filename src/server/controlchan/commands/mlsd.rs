//! The RFC 3659 Machine List Directory (`MLSD`) command
//
// Sends the directory contents over the data connection, one fact line per entry. The fact set
// honors what was selected with `OPTS MLST`.

use crate::{
    auth::UserDetail,
    server::{
        chancomms::DataChanCmd,
        controlchan::{
            command::Command,
            error::ControlChanError,
            handler::{CommandContext, CommandHandler},
            Reply, ReplyCode,
        },
    },
    storage::{format_mlsd, normalize_virtual, Metadata, StorageBackend},
};
use async_trait::async_trait;
use std::sync::Arc;

use super::transfer::{acquire_data_channel, dispatch_to_data_channel, DataChannel};

#[derive(Debug)]
pub struct Mlsd;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Mlsd
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let path = match &args.parsed_command.cmd {
            Command::Mlsd { path } => path.clone(),
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

        let entries = match storage.list(user, &target, false).await {
            Ok(entries) => entries,
            Err(err) => {
                slog::info!(args.logger, "MLSD {:?} failed: {}", target, err);
                return Ok(crate::server::controlchan::reply::storage_error_reply(err.kind()));
            }
        };

        let mut payload = String::new();
        for entry in &entries {
            payload.push_str(&format_mlsd(entry, &facts));
            payload.push_str("\r\n");
        }

        match acquire_data_channel(&args).await {
            DataChannel::Ready(tx) => {
                dispatch_to_data_channel(tx, DataChanCmd::SendBytes { payload: payload.into_bytes() }, args.logger.clone());
                Ok(Reply::new_with_string(
                    ReplyCode::FileStatusOkay,
                    format!("Accepted data connection, returning {} file(s)", entries.len()),
                ))
            }
            DataChannel::NotSetUp | DataChannel::TimedOut => Ok(Reply::new(ReplyCode::CantOpenDataConnection, "No connection established")),
        }
    }
}
