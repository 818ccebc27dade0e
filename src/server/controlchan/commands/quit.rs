//! The RFC 959 Quit (`QUIT`) command
//
// This command terminates a USER and, if file transfer is not in progress, closes the control
// connection.

use crate::{
    auth::UserDetail,
    server::{
        chancomms::ControlChanMsg,
        controlchan::{
            error::ControlChanError,
            handler::{CommandContext, CommandHandler},
            Reply, ReplyCode,
        },
    },
    storage::{Metadata, StorageBackend},
};
use async_trait::async_trait;

#[derive(Debug)]
pub struct Quit;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Quit
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let tx = args.tx_control_chan.clone();
        let logger = args.logger;
        // The 221 goes out first; the message then makes the control loop close the connection.
        tokio::spawn(async move {
            if let Err(err) = tx.send(ControlChanMsg::Quit).await {
                slog::warn!(logger, "QUIT: could not notify the control loop: {}", err);
            }
        });
        Ok(Reply::new(ReplyCode::ClosingControlConnection, "Goodbye"))
    }
}
