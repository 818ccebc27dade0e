//! The RFC 2389 Options (`OPTS`) command
//
// The OPTS command allows a client to tune the behavior of another command: the path encoding
// (`UTF8`), the fact set of MLST/MLSD, and the LIST output format.

use crate::{
    auth::UserDetail,
    server::{
        controlchan::{
            command::Command,
            error::ControlChanError,
            handler::{CommandContext, CommandHandler},
            Reply, ReplyCode,
        },
        session::Encoding,
    },
    storage::{ListFormat, Metadata, MlstFact, StorageBackend},
};
use async_trait::async_trait;

/// The options a client can set, specifying the target command's behavior.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Opt {
    /// Switch the path encoding between UTF-8 and ASCII.
    Utf8 { on: bool },
    /// Narrow the facts MLST/MLSD emit. Unknown facts are ignored, per the RFC.
    MlstFacts { facts: Vec<String> },
    /// Switch LIST output between the `ls` long format and EPLF.
    ListFormat { ep: bool },
}

#[derive(Debug)]
pub struct Opts;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Opts
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let option = match &args.parsed_command.cmd {
            Command::Opts { option } => option.clone(),
            _ => return Err(crate::server::controlchan::ControlChanErrorKind::InternalServerError.into()),
        };
        let mut session = args.session.lock().await;
        match option {
            Opt::Utf8 { on } => {
                session.encoding = if on { Encoding::Utf8 } else { Encoding::Ascii };
                Ok(Reply::new_with_string(ReplyCode::CommandOkay, format!("UTF8 set to {}", if on { "on" } else { "off" })))
            }
            Opt::MlstFacts { facts } => {
                let selected: Vec<MlstFact> = facts.iter().filter_map(|name| MlstFact::from_name(name)).collect();
                let listing = selected.iter().map(|fact| fact.name()).collect::<Vec<_>>().join(";");
                session.mlst_facts = selected;
                Ok(Reply::new_with_string(ReplyCode::CommandOkay, format!("MLST OPTS {};", listing)))
            }
            Opt::ListFormat { ep } => {
                session.list_format = if ep { ListFormat::Ep } else { ListFormat::Ls };
                Ok(Reply::new(ReplyCode::CommandOkay, "LIST format changed"))
            }
        }
    }
}
