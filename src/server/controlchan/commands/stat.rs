//! The RFC 959 Status (`STAT`) command
//
// Without a path this reports on the session over the control connection. With a path it works
// like LIST, but the listing travels on the control connection: 212 for a single file, 213 for
// a directory block.

use crate::{
    auth::UserDetail,
    server::{
        controlchan::{
            command::Command,
            commands::TransferType,
            error::ControlChanError,
            handler::{CommandContext, CommandHandler},
            Reply, ReplyCode,
        },
        session::Encoding,
    },
    storage::{format_ls, normalize_virtual, Fileinfo, Metadata, StorageBackend},
};
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug)]
pub struct Stat;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Stat
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let path = match &args.parsed_command.cmd {
            Command::Stat { path } => path.clone(),
            _ => return Err(crate::server::controlchan::ControlChanErrorKind::InternalServerError.into()),
        };
        let (storage, user_arc, cwd, username, transfer_type, encoding) = {
            let session = args.session.lock().await;
            match &session.storage {
                Some(storage) => (
                    Arc::clone(storage),
                    session.user.clone(),
                    session.cwd.clone(),
                    session.username.clone().unwrap_or_default(),
                    session.transfer_type,
                    session.encoding,
                ),
                None => return Ok(Reply::new(ReplyCode::NotLoggedIn, "Please authenticate")),
            }
        };
        let user = match user_arc.as_ref() {
            Some(user) => user,
            None => return Ok(Reply::new(ReplyCode::NotLoggedIn, "Please authenticate")),
        };

        let path = match path {
            None => {
                let lines = vec![
                    "Server status:".to_string(),
                    format!("Logged in as {}", username),
                    format!("Working directory is {}", cwd.to_string_lossy()),
                    format!(
                        "TYPE {}, encoding {}",
                        match transfer_type {
                            TransferType::Ascii => "A",
                            TransferType::Binary => "I",
                        },
                        match encoding {
                            Encoding::Utf8 => "UTF-8",
                            Encoding::Ascii => "ASCII",
                        }
                    ),
                    "End of status".to_string(),
                ];
                return Ok(Reply::new_multiline(ReplyCode::SystemStatus, lines));
            }
            Some(path) => path,
        };

        let target = normalize_virtual(cwd.join(&path));
        match storage.metadata(user, &target).await {
            Ok(metadata) if metadata.is_file() => {
                let line = format_ls(&Fileinfo { path: target, metadata });
                Ok(Reply::new_multiline(ReplyCode::DirectoryStatus, vec!["Status follows:".to_string(), line, "End of status".to_string()]))
            }
            Ok(_) => match storage.list(user, &target, false).await {
                Ok(entries) => {
                    let mut lines = vec![format!("Status of {}:", target.to_string_lossy())];
                    lines.extend(entries.iter().map(format_ls));
                    lines.push("End of status".to_string());
                    Ok(Reply::new_multiline(ReplyCode::FileStatus, lines))
                }
                Err(err) => {
                    slog::info!(args.logger, "STAT {:?} failed: {}", target, err);
                    Ok(Reply::new(ReplyCode::FileError, "Could not list directory"))
                }
            },
            Err(err) => {
                slog::info!(args.logger, "STAT {:?} failed: {}", target, err);
                Ok(Reply::new(ReplyCode::FileError, "File or directory does not exist"))
            }
        }
    }
}
