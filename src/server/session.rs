//! The session module implements per-connection state: who is logged in, where in the virtual
//! filesystem they are, and the channels to the currently established data connection.

use super::chancomms::DataChanCmd;
use crate::auth::UserDetail;
use crate::notification::EventMeta;
use crate::server::controlchan::command::ParsedCommand;
use crate::server::controlchan::commands::TransferType;
use crate::storage::{ListFormat, MlstFact, StorageBackend};

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SessionState {
    /// Connected, nothing sent yet or greeting sent.
    New,
    /// USER was accepted, waiting for PASS.
    WaitPass,
    /// Logged in, processing commands.
    WaitCmd,
}

/// The character encoding of paths on the control channel.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Encoding {
    Utf8,
    Ascii,
}

pub type SharedSession<S, U> = Arc<Mutex<Session<S, U>>>;

// This is where we keep the state for an FTP session.
#[derive(Debug)]
pub struct Session<Storage, User>
where
    Storage: StorageBackend<User>,
    User: UserDetail,
{
    /// Random id identifying this session in logs and events.
    pub id: String,
    pub state: SessionState,
    pub username: Option<String>,
    pub user: Arc<Option<User>>,
    /// The filesystem attached at login; None before that.
    pub storage: Option<Arc<Storage>>,
    pub cwd: PathBuf,
    pub rename_from: Option<PathBuf>,
    /// The address of the control connection peer.
    pub peer_addr: SocketAddr,
    // True once AUTH TLS upgraded the control channel.
    pub cmd_tls: bool,
    // True once PROT P asked for protected data channels.
    pub data_tls: bool,
    /// The protection buffer size set with PBSZ; only 0 is meaningful.
    pub pbsz: Option<u64>,
    pub transfer_type: TransferType,
    pub encoding: Encoding,
    pub list_format: ListFormat,
    /// The MLST/MLSD facts currently switched on.
    pub mlst_facts: Vec<MlstFact>,
    // The restart offset for the next STOR/RETR/APPE, set by REST and cleared by every transfer
    // outcome.
    pub start_pos: u64,
    /// Directives refused for this session, canonical uppercase.
    pub blacklist: Vec<String>,
    /// If non-empty, the only directives allowed for this session.
    pub whitelist: Vec<String>,
    /// Where transfer commands are sent once a data channel is set up.
    pub data_cmd_tx: Option<mpsc::Sender<DataChanCmd>>,
    /// Signalled by ABOR to tear down the data channel.
    pub data_abort_tx: Option<mpsc::Sender<()>>,
    /// Becomes true when the data connection is established and validated.
    pub data_conn_ready: Option<watch::Receiver<bool>>,
    pub previous_command: Option<ParsedCommand>,
    notify_seq: u64,
}

impl<Storage, User> Session<Storage, User>
where
    Storage: StorageBackend<User>,
    User: UserDetail,
{
    pub(super) fn new(peer_addr: SocketAddr, list_format: ListFormat) -> Self {
        Session {
            id: uuid::Uuid::new_v4().simple().to_string()[..16].to_string(),
            state: SessionState::New,
            username: None,
            user: Arc::new(None),
            storage: None,
            cwd: PathBuf::from("/"),
            rename_from: None,
            peer_addr,
            cmd_tls: false,
            data_tls: false,
            pbsz: None,
            transfer_type: TransferType::Binary,
            encoding: Encoding::Utf8,
            list_format,
            mlst_facts: MlstFact::all(),
            start_pos: 0,
            blacklist: Vec::new(),
            whitelist: Vec::new(),
            data_cmd_tx: None,
            data_abort_tx: None,
            data_conn_ready: None,
            previous_command: None,
            notify_seq: 0,
        }
    }

    /// Forgets the current data channel. The task behind it notices its channels closing and
    /// cleans up after itself, releasing any passive port it held.
    pub fn clear_data_channel(&mut self) {
        self.data_cmd_tx = None;
        self.data_abort_tx = None;
        self.data_conn_ready = None;
    }

    /// True when a data channel has been set up and not yet consumed.
    pub fn has_data_channel(&self) -> bool {
        self.data_cmd_tx.is_some()
    }

    /// Builds the metadata attached to an emitted event, advancing the sequence number.
    pub fn event_meta(&mut self) -> EventMeta {
        self.notify_seq += 1;
        EventMeta {
            username: self.username.clone().unwrap_or_default(),
            trace_id: self.id.clone(),
            sequence_number: self.notify_seq,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::DefaultUser;
    use crate::storage::ObjectStorage;

    fn session() -> Session<ObjectStorage, DefaultUser> {
        Session::new("127.0.0.1:50000".parse().unwrap(), ListFormat::Ls)
    }

    #[test]
    fn session_ids_are_sixteen_hex_chars() {
        let s = session();
        assert_eq!(s.id.len(), 16);
        assert!(s.id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn event_meta_sequence_increments() {
        let mut s = session();
        assert_eq!(s.event_meta().sequence_number, 1);
        assert_eq!(s.event_meta().sequence_number, 2);
        assert_eq!(s.event_meta().trace_id, s.id);
    }

    #[test]
    fn fresh_sessions_start_at_the_root_unauthenticated() {
        let s = session();
        assert_eq!(s.state, SessionState::New);
        assert_eq!(s.cwd, PathBuf::from("/"));
        assert!(!s.has_data_channel());
    }
}
