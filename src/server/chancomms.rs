//! Contains code pertaining to the communication between the data and control channels.

use crate::storage::Error;

/// Commands the control channel sends to the data channel task. One data channel executes at
/// most one of these and then tears itself down.
#[derive(Debug)]
pub enum DataChanCmd {
    /// Send a file to the client.
    Retr {
        /// The resolved virtual path of the file.
        path: String,
        /// The byte offset to start reading at, from a preceding REST.
        start_pos: u64,
    },
    /// Receive a file from the client.
    Stor {
        /// The resolved virtual path of the file.
        path: String,
        /// The byte offset to restart at, from a preceding REST.
        start_pos: u64,
        /// Whether to append (APPE) instead of replace (STOR).
        append: bool,
    },
    /// Send pre-rendered bytes, used for the directory listing commands.
    SendBytes {
        /// The listing payload, rendered on the control side.
        payload: Vec<u8>,
    },
}

/// Status messages from the data channel task (and some handlers) to the control loop of one
/// session.
#[derive(Debug)]
pub enum ControlChanMsg {
    /// A RETR finished; the data socket has been closed.
    SentData {
        /// The virtual path that was retrieved.
        path: String,
        /// The number of bytes sent to the client.
        bytes: u64,
    },
    /// A STOR/APPE finished; the storage back-end confirmed the write.
    WrittenData {
        /// The virtual path that was stored.
        path: String,
        /// The number of bytes written.
        bytes: u64,
    },
    /// A listing was sent over the data channel.
    DirectorySuccessfullyListed,
    /// The transfer was torn down after an ABOR; the 426 already went out on the data socket.
    TransferAborted,
    /// The data connection never materialized or its peer was refused; no reply is owed because
    /// the transfer handlers reply 425 themselves when they time out.
    DataConnectionFailed {
        /// What went wrong, for the log.
        reason: String,
    },
    /// The storage back-end failed mid-transfer.
    StorageError {
        /// The failure as reported by the back-end.
        error: Error,
        /// The virtual path the transfer was for.
        path: String,
    },
    /// The client asked to end the session.
    Quit,
    /// AUTH TLS was accepted; the control socket must be wrapped now.
    SecureControlChannel,
}
