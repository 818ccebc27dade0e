//! The RFC 959 Password (`PASS`) command
//
// Completes the login conversation: the authenticator decides, and on success the session gets
// its storage back-end attached, rooted where the login grant says.

use crate::{
    auth::{LoginRequest, UserDetail},
    notification::PresenceEvent,
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
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug)]
pub struct Pass;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Pass
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let password = match &args.parsed_command.cmd {
            Command::Pass { password } => password.clone(),
            _ => return Err(crate::server::controlchan::ControlChanErrorKind::InternalServerError.into()),
        };

        let (state, username, session_id, peer_ip, secure) = {
            let session = args.session.lock().await;
            (
                session.state,
                session.username.clone(),
                session.id.clone(),
                session.peer_addr.ip(),
                session.cmd_tls,
            )
        };
        let username = match (state, username) {
            (SessionState::WaitPass, Some(username)) => username,
            _ => return Ok(Reply::new(ReplyCode::BadCommandSequence, "Please give me a USER first")),
        };

        let request = LoginRequest {
            username: username.clone(),
            password,
            source_ip: peer_ip,
            session_id,
            secure,
        };
        match args.authenticator.login(request).await {
            Ok(grant) => {
                let storage = match (args.storage_factory)(&grant) {
                    Ok(storage) => storage,
                    Err(err) => {
                        slog::error!(args.logger, "PASS: could not attach storage for {}: {}", username, err);
                        let mut session = args.session.lock().await;
                        session.state = SessionState::New;
                        return Ok(Reply::new(ReplyCode::LocalError, "Could not attach your storage, try again later"));
                    }
                };
                let meta = {
                    let mut session = args.session.lock().await;
                    session.user = Arc::new(Some(grant.user));
                    session.storage = Some(Arc::new(storage));
                    session.cwd = grant.cwd.unwrap_or_else(|| PathBuf::from("/"));
                    session.blacklist.extend(grant.blacklist.iter().map(|d| d.to_ascii_uppercase()));
                    session.whitelist.extend(grant.whitelist.iter().map(|d| d.to_ascii_uppercase()));
                    session.state = SessionState::WaitCmd;
                    session.event_meta()
                };
                args.presence_listener.receive_presence_event(PresenceEvent::LoggedIn, meta).await;
                Ok(Reply::new(ReplyCode::UserLoggedIn, "User logged in, proceed"))
            }
            Err(err) => {
                slog::info!(args.logger, "PASS: authentication failed for {}: {}", username, err);
                let mut session = args.session.lock().await;
                session.state = SessionState::New;
                session.username = None;
                Ok(Reply::new(ReplyCode::NotLoggedIn, "Authentication failed"))
            }
        }
    }
}
