//! The RFC 959 Abort (`ABOR`) command
//
// Tells the server to abort the transfer in progress. The data channel gets the final 426, the
// control channel confirms, and the control connection stays open.

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
pub struct Abor;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Abor
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let mut session = args.session.lock().await;
        let abort_tx = session.data_abort_tx.take();
        session.clear_data_channel();
        drop(session);
        match abort_tx {
            Some(tx) => {
                let logger = args.logger;
                tokio::spawn(async move {
                    if let Err(err) = tx.send(()).await {
                        slog::warn!(logger, "ABOR: data channel was already gone: {}", err);
                    }
                });
                Ok(Reply::new(
                    ReplyCode::ClosingDataConnection,
                    "Closing data connection. Requested file action successful (file transfer aborted)",
                ))
            }
            None => Ok(Reply::new(ReplyCode::DataConnectionOpen, "ABOR command successful; no transfer in progress")),
        }
    }
}
