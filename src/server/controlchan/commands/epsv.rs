//! The RFC 2428 Extended Passive (`EPSV`) command
//
// Like PASV, but the reply carries only the port so it works for IPv6 and through NAT.

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

use super::passive_common;

#[derive(Debug)]
pub struct Epsv;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Epsv
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let port = match passive_common::setup_passive(&args).await {
            Ok(port) => port,
            Err(reply) => return Ok(reply),
        };
        Ok(Reply::new_with_string(ReplyCode::EnteringExtendedPassiveMode, format!("EPSV OK (|||{}|)", port)))
    }
}
