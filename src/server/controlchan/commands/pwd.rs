//! The RFC 959 Print Working Directory (`PWD`) command
//
// This command causes the name of the current working directory to be returned in the reply.
// Double quotes inside the path are doubled, per RFC 959 appendix II.

use crate::{
    auth::UserDetail,
    server::controlchan::{
        error::ControlChanError,
        handler::{CommandContext, CommandHandler},
        Reply, ReplyCode,
    },
    storage::{Metadata, StorageBackend},
};
use async_trait::async_trait;

#[derive(Debug)]
pub struct Pwd;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Pwd
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let session = args.session.lock().await;
        let cwd = session.cwd.to_string_lossy().replace('"', "\"\"");
        Ok(Reply::new_with_string(ReplyCode::DirCreated, format!("\"{}\"", cwd)))
    }
}
