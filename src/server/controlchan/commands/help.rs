//! The RFC 959 Help (`HELP`) command
//
// With a parameter we briefly explain the syntax of that verb; without one we list every verb we
// know, a handful per line.

use crate::{
    auth::UserDetail,
    server::controlchan::{
        command::Command,
        error::ControlChanError,
        handler::{CommandContext, CommandHandler},
        registry, Reply, ReplyCode,
    },
    storage::{Metadata, StorageBackend},
};
use async_trait::async_trait;

const COLUMNS: usize = 6;

#[derive(Debug)]
pub struct Help;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Help
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let topic = match &args.parsed_command.cmd {
            Command::Help { topic } => topic.clone(),
            _ => None,
        };
        match topic {
            Some(topic) => match registry::lookup(&topic.to_ascii_uppercase()) {
                Some(spec) => {
                    let syntax = spec.syntax.replace("{{cmd}}", spec.directive);
                    let mut description = spec.description.to_string();
                    if spec.obsolete {
                        description.push_str(" (obsolete)");
                    }
                    let lines = vec![format!("Syntax: {}", syntax), description];
                    Ok(Reply::new_multiline(ReplyCode::HelpMessage, lines))
                }
                None => Ok(Reply::new_with_string(
                    ReplyCode::CommandNotImplemented,
                    format!("Unknown command: {}", topic.to_ascii_uppercase()),
                )),
            },
            None => {
                let mut lines = vec!["The following commands are recognized:".to_string()];
                let directives: Vec<&str> = registry::all().map(|spec| spec.directive).collect();
                for row in directives.chunks(COLUMNS) {
                    lines.push(row.iter().map(|d| format!("{:<6}", d)).collect::<String>().trim_end().to_string());
                }
                lines.push("HELP command successful".to_string());
                Ok(Reply::new_multiline(ReplyCode::SystemStatus, lines))
            }
        }
    }
}
