//! The RFC 959 Site Parameters (`SITE`) command
//
// The only subcommand here is CHMOD. The object store has no permission bits, so the mode is
// accepted and dropped at the storage layer.

use crate::{
    auth::UserDetail,
    server::controlchan::{
        command::Command,
        error::ControlChanError,
        handler::{CommandContext, CommandHandler},
        reply::storage_error_reply,
        Reply, ReplyCode,
    },
    storage::{normalize_virtual, Metadata, StorageBackend},
};
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug)]
pub struct Site;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Site
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let params = match &args.parsed_command.cmd {
            Command::Site { params } => params.clone(),
            _ => return Err(crate::server::controlchan::ControlChanErrorKind::InternalServerError.into()),
        };
        let mut words = params.splitn(3, ' ');
        let subcommand = words.next().unwrap_or("").to_ascii_uppercase();
        match subcommand.as_str() {
            "CHMOD" => {
                let mode = match words.next().and_then(|m| u32::from_str_radix(m, 8).ok()) {
                    Some(mode) => mode,
                    None => return Ok(Reply::new(ReplyCode::ParameterSyntaxError, "SITE CHMOD needs an octal mode")),
                };
                let target = match words.next() {
                    Some(target) if !target.is_empty() => target.to_string(),
                    _ => return Ok(Reply::new(ReplyCode::ParameterSyntaxError, "SITE CHMOD needs a path")),
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
                let path = normalize_virtual(cwd.join(target));
                match storage.chmod(user, path, mode).await {
                    Ok(()) => Ok(Reply::new(ReplyCode::CommandOkay, "SITE CHMOD command successful")),
                    Err(err) => Ok(storage_error_reply(err.kind())),
                }
            }
            "HELP" => Ok(Reply::new_multiline(ReplyCode::HelpMessage, vec!["SITE commands:", "CHMOD <octal-mode> <path>"])),
            _ => Ok(Reply::new(ReplyCode::CommandSyntaxError, "SITE subcommand not understood")),
        }
    }
}
