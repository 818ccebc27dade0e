//! The RFC 959 User Name (`USER`) command
//
// Names the user to authenticate as. A USER while logged in drops the session back to the
// password step for the new name.

use crate::{
    auth::UserDetail,
    server::{
        controlchan::{
            command::Command,
            error::ControlChanError,
            handler::{CommandContext, CommandHandler},
            Reply, ReplyCode,
        },
        session::SessionState,
    },
    storage::{Metadata, StorageBackend},
};
use async_trait::async_trait;

#[derive(Debug)]
pub struct User;

#[async_trait]
impl<Storage, UserDet> CommandHandler<Storage, UserDet> for User
where
    UserDet: UserDetail + 'static,
    Storage: StorageBackend<UserDet> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, UserDet>) -> Result<Reply, ControlChanError> {
        let username = match &args.parsed_command.cmd {
            Command::User { username } => username.clone(),
            _ => return Err(crate::server::controlchan::ControlChanErrorKind::InternalServerError.into()),
        };
        let mut session = args.session.lock().await;
        // A second USER restarts the login conversation, also when already authenticated.
        session.username = Some(username.clone());
        session.state = SessionState::WaitPass;
        session.user = std::sync::Arc::new(None);
        session.storage = None;
        Ok(Reply::new_with_string(
            ReplyCode::NeedPassword,
            format!("Password required for {}", username),
        ))
    }
}
