//! The RFC 959 List (`LIST`) command
//
// The listing is rendered on the control side, so the 150 can announce how many entries follow,
// and then streamed over the data connection. `-a` includes dot-files; the line format follows
// the session's list format, switchable with `OPTS LIST`.

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
    storage::{format_entry, normalize_virtual, Fileinfo, Metadata, StorageBackend},
};
use async_trait::async_trait;
use std::sync::Arc;

use super::transfer::{acquire_data_channel, dispatch_to_data_channel, DataChannel};

#[derive(Debug)]
pub struct List;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for List
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let path = match &args.parsed_command.cmd {
            Command::List { path } => path.clone(),
            _ => return Err(crate::server::controlchan::ControlChanErrorKind::InternalServerError.into()),
        };
        let show_hidden = args.parsed_command.has_flag('a');
        let (storage, user_arc, cwd, format, facts) = {
            let session = args.session.lock().await;
            match &session.storage {
                Some(storage) => (
                    Arc::clone(storage),
                    session.user.clone(),
                    session.cwd.clone(),
                    session.list_format,
                    session.mlst_facts.clone(),
                ),
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

        // Listing a single file produces its one line; anything else lists the directory.
        let entries = match storage.metadata(user, &target).await {
            Ok(metadata) if metadata.is_file() => vec![Fileinfo { path: target.clone(), metadata }],
            _ => match storage.list(user, &target, show_hidden).await {
                Ok(entries) => entries,
                Err(err) => {
                    slog::info!(args.logger, "LIST {:?} failed: {}", target, err);
                    return Ok(crate::server::controlchan::reply::storage_error_reply(err.kind()));
                }
            },
        };

        let mut payload = String::new();
        for entry in &entries {
            payload.push_str(&format_entry(entry, format, &facts));
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
