//! The RFC 959 Store Unique (`STOU`) command
//
// Behaves like STOR, except the file lands under a name the server makes unique: a timestamp
// and a random tag are folded into the given name, in front of the extension.

use crate::{
    auth::UserDetail,
    server::controlchan::{
        command::Command,
        error::ControlChanError,
        handler::{CommandContext, CommandHandler},
        Reply, ReplyCode,
    },
    storage::{Metadata, StorageBackend},
};
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug)]
pub struct Stou;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Stou
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let path = match &args.parsed_command.cmd {
            Command::Stou { path } => path.clone().unwrap_or_else(|| "file".to_string()),
            _ => return Err(crate::server::controlchan::ControlChanErrorKind::InternalServerError.into()),
        };
        let storage = {
            let session = args.session.lock().await;
            match &session.storage {
                Some(storage) => Arc::clone(storage),
                None => return Ok(Reply::new(ReplyCode::NotLoggedIn, "Please authenticate")),
            }
        };
        // Only the final segment gets the unique treatment; any directory part stays.
        let (dir, name) = match path.rsplit_once('/') {
            Some((dir, name)) => (Some(dir.to_string()), name.to_string()),
            None => (None, path),
        };
        let unique = storage.unique_name(&name);
        let target = match dir {
            Some(dir) => format!("{}/{}", dir, unique),
            None => unique,
        };
        super::stor::store(args, target, false).await
    }
}
