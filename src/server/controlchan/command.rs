use crate::auth::Password;
use crate::server::controlchan::commands::{AuthParam, ModeParam, Opt, ProtParam, StruParam, TransferType};

use std::fmt;

/// One sanitized and tokenized control channel line: the canonical directive, the raw line it
/// came from, the argument and flags, and the typed command. Lives for one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// The uppercased 3-4 letter directive token.
    pub directive: String,
    /// The sanitized line as received.
    pub raw: String,
    /// Everything after the directive that wasn't classified as a flag, space-joined.
    pub argument: Option<String>,
    /// Short-form flags such as `-a` and `-l`.
    pub flags: Vec<String>,
    /// The typed command.
    pub cmd: Command,
}

impl ParsedCommand {
    /// True when the given single-character flag was passed.
    pub fn has_flag(&self, flag: char) -> bool {
        self.flags.iter().any(|f| f.len() == 2 && f.ends_with(flag))
    }
}

impl fmt::Display for ParsedCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.directive)
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Command {
    User {
        /// The username the client wants to log in as.
        username: String,
    },
    Pass {
        /// The password belonging to the username given before.
        password: Password,
    },
    Acct,
    Syst,
    Stat {
        /// The path about which information is requested, if given.
        path: Option<String>,
    },
    Type {
        /// The representation type the client wants to switch to.
        transfer_type: TransferType,
    },
    Stru {
        /// The structure to which the client would like to switch. Only the `File` structure is
        /// supported.
        structure: StruParam,
    },
    Mode {
        /// The transfer mode to which the client would like to switch. Only the `Stream` mode is
        /// supported.
        mode: ModeParam,
    },
    Help {
        /// The directive the client wants help on, if any.
        topic: Option<String>,
    },
    Noop,
    Pasv,
    Epsv,
    Port {
        /// The `h1,h2,h3,h4,p1,p2` endpoint the client listens on.
        addr: String,
    },
    Eprt {
        /// The `|proto|addr|port|` endpoint the client listens on.
        addr: String,
    },
    Retr {
        /// The path to the file the client would like to retrieve.
        path: String,
    },
    Stor {
        /// The path to the file the client would like to store.
        path: String,
    },
    Appe {
        /// The path to the file the client would like to append to.
        path: String,
    },
    Stou {
        /// The name to derive a unique name from, if given.
        path: Option<String>,
    },
    List {
        /// The path of the file/directory the client wants to list.
        path: Option<String>,
    },
    Nlst {
        /// The path of the file/directory the client wants name-only listed.
        path: Option<String>,
    },
    /// Machine List Directory (MLSD), RFC 3659.
    Mlsd {
        /// The path of the directory to list.
        path: Option<String>,
    },
    /// Machine List Single (MLST), RFC 3659.
    Mlst {
        /// The path of the file/directory to report on.
        path: Option<String>,
    },
    Feat,
    Pwd,
    Cwd {
        /// The path the client would like to change directory to.
        path: String,
    },
    Cdup,
    Opts {
        /// The option the client wants to set
        option: Opt,
    },
    Dele {
        /// The file (or, on this server, directory tree) to delete.
        path: String,
    },
    Rmd {
        /// The directory to delete.
        path: String,
    },
    Quit,
    Mkd {
        /// The path to the directory the client wants to create.
        path: String,
    },
    Allo,
    Abor,
    Rnfr {
        /// The file to be renamed.
        path: String,
    },
    Rnto {
        /// The name to rename to.
        path: String,
    },
    Auth {
        /// The security mechanism, only TLS is supported.
        protocol: AuthParam,
    },
    Pbsz {
        /// The protection buffer size; only 0 is meaningful.
        size: u64,
    },
    Prot {
        /// The protection level for the data channel.
        param: ProtParam,
    },
    Size {
        /// The file to report the byte count of.
        path: String,
    },
    Rest {
        /// The byte offset at which the next transfer should start.
        offset: u64,
    },
    /// Modification Time (MDTM), RFC 3659: report when a file was last modified.
    Mdtm {
        path: String,
    },
    /// The set-mtime form of MDTM. Acknowledged but not applied.
    MdtmSet {
        timestamp: String,
        path: String,
    },
    Site {
        /// The raw SITE parameters; the handler interprets the subcommand.
        params: String,
    },
    /// A well-formed directive this server doesn't know.
    Other {
        directive: String,
    },
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
