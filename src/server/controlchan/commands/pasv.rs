//! The RFC 959 Passive (`PASV`) command
//
// This command requests the server-DTP to "listen" on a data port and to wait for a connection
// rather than initiate one upon receipt of a transfer command. The response includes the host
// and port address this server is listening on.

use crate::{
    auth::UserDetail,
    server::controlchan::{
        error::ControlChanError,
        handler::{CommandContext, CommandHandler},
        Reply, ReplyCode,
    },
    storage::{Metadata, StorageBackend},
};
use async_trait::async_trait;

use super::passive_common;

#[derive(Debug)]
pub struct Pasv;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Pasv
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let ip = match passive_common::advertised_ip(&args).await {
            Ok(ip) => ip,
            Err(reply) => return Ok(reply),
        };
        let port = match passive_common::setup_passive(&args).await {
            Ok(port) => port,
            Err(reply) => return Ok(reply),
        };
        let octets = ip.octets();
        let p1 = port >> 8;
        let p2 = port & 0xff;
        Ok(Reply::new_with_string(
            ReplyCode::EnteringPassiveMode,
            format!("PASV OK ({},{},{},{},{},{})", octets[0], octets[1], octets[2], octets[3], p1, p2),
        ))
    }
}
