//! The RFC 959 Representation Type (`TYPE`) command
//
// Clients switch between ASCII and binary (image) representation with this command. Like many
// servers we transmit ASCII data byte for byte, so the chosen type only changes the reply text.

use crate::{
    auth::UserDetail,
    server::controlchan::{
        command::Command,
        error::ControlChanError,
        handler::{CommandContext, CommandHandler},
        Reply, ReplyCode,
    },
    storage::{Metadata, StorageBackend},
};
use async_trait::async_trait;

/// The representation types we understand.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TransferType {
    /// `TYPE A`: text. Transmitted verbatim anyway.
    Ascii,
    /// `TYPE I` and `TYPE L 8`: raw bytes.
    Binary,
}

#[derive(Debug)]
pub struct Type;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Type
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let transfer_type = match args.parsed_command.cmd {
            Command::Type { transfer_type } => transfer_type,
            _ => return Err(ControlChanError::new(crate::server::controlchan::ControlChanErrorKind::InternalServerError)),
        };
        let mut session = args.session.lock().await;
        session.transfer_type = transfer_type;
        let reply = match transfer_type {
            TransferType::Ascii => "Switching to ASCII mode",
            TransferType::Binary => "Switching to Binary mode",
        };
        Ok(Reply::new(ReplyCode::CommandOkay, reply))
    }
}
