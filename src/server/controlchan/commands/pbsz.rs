//! The RFC 2228 Protection Buffer Size (`PBSZ`) command
//
// On a TLS control channel only `PBSZ 0` is meaningful; without TLS the command is superfluous.

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
pub struct Pbsz;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Pbsz
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let mut session = args.session.lock().await;
        if session.cmd_tls {
            session.pbsz = Some(0);
            Ok(Reply::new(ReplyCode::CommandOkay, "PBSZ=0"))
        } else {
            Ok(Reply::new(ReplyCode::CommandOkayNotImplemented, "PBSZ not needed without TLS"))
        }
    }
}
