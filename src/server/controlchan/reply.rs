/// A reply to the FTP client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Nothing is written to the client.
    None,
    /// A single line: `<code> <msg>`.
    CodeAndMsg { code: ReplyCode, msg: String },
    /// An RFC 959 multi-line reply: all but the last line formatted `<code>-<line>`, the last
    /// `<code> <line>`.
    MultiLine { code: ReplyCode, lines: Vec<String> },
}

/// The reply codes according to RFC 959, plus the extension codes from RFCs 2228, 2428 and 3659.
///
/// The three digits form a code. Codes between 100 and 199 indicate marks; codes between 200 and
/// 399 indicate acceptance; codes between 400 and 599 indicate rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
#[allow(dead_code)]
pub enum ReplyCode {
    FileStatusOkay = 150,

    CommandOkay = 200,
    CommandOkayNotImplemented = 202,
    SystemStatus = 211,
    DirectoryStatus = 212,
    FileStatus = 213,
    HelpMessage = 214,
    SystemType = 215,
    ServiceReady = 220,
    ClosingControlConnection = 221,
    DataConnectionOpen = 225,
    ClosingDataConnection = 226,
    EnteringPassiveMode = 227,
    EnteringExtendedPassiveMode = 229,
    UserLoggedIn = 230,
    AuthOkayNoDataNeeded = 234,
    FileActionOkay = 250,
    DirCreated = 257,

    NeedPassword = 331,
    NeedAccount = 332,
    FileActionPending = 350,

    ServiceNotAvailable = 421,
    CantOpenDataConnection = 425,
    ConnectionClosed = 426,
    TransientFileError = 450,
    LocalError = 451,
    OutOfSpace = 452,

    CommandSyntaxError = 500,
    ParameterSyntaxError = 501,
    CommandNotImplemented = 502,
    BadCommandSequence = 503,
    CommandNotImplementedForParameter = 504,
    UnsupportedNetworkProtocol = 522,
    NotLoggedIn = 530,
    NeedAccountToStore = 532,
    ProtLevelDenied = 533,
    PolicyRequiresTls = 534,
    FailedSecurityCheck = 535,
    ProtLevelNotSupported = 536,
    ProtLevelNotImplemented = 537,
    FileError = 550,
    PageTypeUnknown = 551,
    ExceededStorageAllocation = 552,
    BadFileName = 553,
}

impl ReplyCode {
    /// The message used when a reply is built without one.
    pub fn default_message(&self) -> &'static str {
        use ReplyCode::*;
        match self {
            FileStatusOkay => "File status okay; about to open data connection",
            CommandOkay => "Command okay",
            CommandOkayNotImplemented => "Command okay, not implemented",
            SystemStatus => "System status",
            HelpMessage => "Help message",
            SystemType => "UNIX Type: L8",
            ServiceReady => "Service ready",
            ClosingControlConnection => "Goodbye",
            DataConnectionOpen => "Data connection open; no transfer in progress",
            ClosingDataConnection => "Closing data connection",
            UserLoggedIn => "User logged in, proceed",
            FileActionOkay => "Requested file action okay, completed",
            NeedPassword => "User name okay, need password",
            FileActionPending => "Requested file action pending further information",
            ServiceNotAvailable => "Service not available, closing control connection",
            CantOpenDataConnection => "Can't open data connection",
            ConnectionClosed => "Connection closed; transfer aborted",
            TransientFileError => "Requested file action not taken",
            LocalError => "Requested action aborted. Local error in processing",
            OutOfSpace => "Insufficient storage space in system",
            CommandSyntaxError => "Syntax error, command unrecognized",
            ParameterSyntaxError => "Syntax error in parameters or arguments",
            CommandNotImplemented => "Command not implemented",
            BadCommandSequence => "Bad sequence of commands",
            CommandNotImplementedForParameter => "Command not implemented for that parameter",
            NotLoggedIn => "Not logged in",
            FileError => "Requested action not taken",
            BadFileName => "Requested action not taken. File name not allowed",
            _ => "",
        }
    }
}

/// Maps a storage failure onto the reply owed to the client. The storage error messages stay in
/// the logs; clients only see the generic texts.
pub(crate) fn storage_error_reply(kind: crate::storage::ErrorKind) -> Reply {
    use crate::storage::ErrorKind::*;
    match kind {
        TransientFileNotAvailable => Reply::new(ReplyCode::TransientFileError, "File not available, try again later"),
        PermanentFileNotAvailable | PermanentDirectoryNotAvailable => Reply::new(ReplyCode::FileError, "File not available"),
        PermissionDenied => Reply::new(ReplyCode::FileError, "Permission denied"),
        ConnectionClosed => Reply::new(ReplyCode::ConnectionClosed, "Connection closed, transfer aborted"),
        LocalError => Reply::new(ReplyCode::LocalError, "Local error in processing"),
        InsufficientStorageSpaceError => Reply::new(ReplyCode::OutOfSpace, "Insufficient storage space"),
        ExceededStorageAllocationError => Reply::new(ReplyCode::ExceededStorageAllocation, "Exceeded storage allocation"),
        FileNameNotAllowedError => Reply::new(ReplyCode::BadFileName, "File name not allowed"),
        CommandNotImplemented => Reply::new(ReplyCode::CommandNotImplemented, "Not implemented by the storage back-end"),
    }
}

impl Reply {
    pub fn new(code: ReplyCode, message: &str) -> Self {
        Reply::CodeAndMsg {
            code,
            msg: message.to_string(),
        }
    }

    pub fn new_with_string(code: ReplyCode, msg: String) -> Self {
        Reply::CodeAndMsg { code, msg }
    }

    pub fn new_multiline<I>(code: ReplyCode, lines: I) -> Self
    where
        I: IntoIterator,
        I::Item: std::fmt::Display,
    {
        Reply::MultiLine {
            code,
            lines: lines.into_iter().map(|item| format!("{}", item)).collect(),
        }
    }

    // A no-reply
    pub fn none() -> Self {
        Reply::None
    }
}
