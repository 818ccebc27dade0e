//! Shared plumbing for the commands that move bytes over the data channel.

use crate::{
    auth::UserDetail,
    server::{chancomms::DataChanCmd, controlchan::handler::CommandContext},
    storage::{Metadata, StorageBackend},
};
use std::time::Duration;
use tokio::sync::mpsc;

// How long a transfer command waits for the data connection to be established.
const CONNECT_WAIT: Duration = Duration::from_secs(5);

pub(super) enum DataChannel {
    /// The connection is up and validated; send the command here.
    Ready(mpsc::Sender<DataChanCmd>),
    /// PASV/PORT never happened, or the channel was already consumed.
    NotSetUp,
    /// A channel was set up but no client connected in time.
    TimedOut,
}

/// Claims the session's data channel and waits for its connection to be established. Claiming
/// takes the sender out of the session, so a session never runs two transfers at once.
pub(super) async fn acquire_data_channel<Storage, User>(args: &CommandContext<Storage, User>) -> DataChannel
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    let (tx, ready) = {
        let mut session = args.session.lock().await;
        (session.data_cmd_tx.take(), session.data_conn_ready.clone())
    };
    let (tx, mut ready) = match (tx, ready) {
        (Some(tx), Some(ready)) => (tx, ready),
        _ => return DataChannel::NotSetUp,
    };
    let connected = matches!(
        tokio::time::timeout(CONNECT_WAIT, ready.wait_for(|connected| *connected)).await,
        Ok(Ok(_))
    );
    if connected {
        DataChannel::Ready(tx)
    } else {
        let mut session = args.session.lock().await;
        session.clear_data_channel();
        DataChannel::TimedOut
    }
}

/// Sends the claimed command to the data channel task without blocking the reply.
pub(super) fn dispatch_to_data_channel(tx: mpsc::Sender<DataChanCmd>, cmd: DataChanCmd, logger: slog::Logger) {
    tokio::spawn(async move {
        if let Err(err) = tx.send(cmd).await {
            slog::warn!(logger, "could not hand command to the data channel: {}", err);
        }
    });
}
