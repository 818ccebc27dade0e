//! The RFC 2389 Feature (`FEAT`) command

use crate::{
    auth::UserDetail,
    server::controlchan::{
        error::ControlChanError,
        handler::{CommandContext, CommandHandler},
        registry, Reply, ReplyCode,
    },
    storage::{Metadata, StorageBackend},
};
use async_trait::async_trait;

#[derive(Debug)]
pub struct Feat;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Feat
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        // Each feature line must be indented by a space, per the RFC.
        let mut feat_text: Vec<String> = registry::feat_lines().iter().map(|feat| format!(" {}", feat)).collect();
        if args.anonymous {
            feat_text.push(" ANON".to_string());
        }
        feat_text.sort();
        feat_text.insert(0, "Extensions supported:".to_string());
        feat_text.push("END".to_string());
        Ok(Reply::new_multiline(ReplyCode::SystemStatus, feat_text))
    }
}
