//! The RFC 959 Data Port (`PORT`) command
//
// The client tells us where it listens for the data connection and we connect out to it. The
// given address must belong to the control connection peer.

use crate::{
    auth::UserDetail,
    server::{
        controlchan::{
            command::Command,
            error::ControlChanError,
            handler::{CommandContext, CommandHandler},
            Reply, ReplyCode,
        },
        datachan::{self, DataChanParams},
        net,
    },
    storage::{Metadata, StorageBackend},
};
use async_trait::async_trait;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};

#[derive(Debug)]
pub struct Port;

/// Parses the `h1,h2,h3,h4,p1,p2` argument of PORT.
pub(super) fn parse_port_argument(addr: &str) -> Option<(Ipv4Addr, u16)> {
    let mut parts = [0u8; 6];
    let mut count = 0;
    for part in addr.split(',') {
        if count == 6 {
            return None;
        }
        parts[count] = part.trim().parse().ok()?;
        count += 1;
    }
    if count != 6 {
        return None;
    }
    let ip = Ipv4Addr::new(parts[0], parts[1], parts[2], parts[3]);
    let port = u16::from(parts[4]) << 8 | u16::from(parts[5]);
    Some((ip, port))
}

/// Connects to the client-supplied endpoint and spawns the data channel task. Shared between
/// PORT and EPRT.
pub(super) async fn setup_active<Storage, User>(args: &CommandContext<Storage, User>, ip: IpAddr, port: u16) -> Result<Reply, ControlChanError>
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    let control_peer = {
        let mut session = args.session.lock().await;
        session.clear_data_channel();
        session.peer_addr.ip()
    };
    if !net::data_peer_allowed(control_peer, ip) {
        slog::warn!(args.logger, "active data address {} refused, control peer is {}", ip, control_peer);
        return Ok(Reply::new(ReplyCode::CommandSyntaxError, "Data address must match the control connection"));
    }

    let socket = match TcpStream::connect(SocketAddr::new(ip, port)).await {
        Ok(socket) => socket,
        Err(err) => {
            slog::warn!(args.logger, "could not connect to {}:{}: {}", ip, port, err);
            return Ok(Reply::new(ReplyCode::CantOpenDataConnection, "Can't open data connection"));
        }
    };

    let (cmd_tx, cmd_rx) = mpsc::channel(1);
    let (abort_tx, abort_rx) = mpsc::channel(1);
    let (ready_tx, ready_rx) = watch::channel(false);
    {
        let mut session = args.session.lock().await;
        session.data_cmd_tx = Some(cmd_tx);
        session.data_abort_tx = Some(abort_tx);
        session.data_conn_ready = Some(ready_rx);
    }

    datachan::spawn_active(
        socket,
        DataChanParams {
            session: args.session.clone(),
            tx: args.tx_control_chan.clone(),
            cmd_rx,
            abort_rx,
            ready_tx,
            control_peer,
            tls_config: args.tls.config(),
            logger: args.logger.clone(),
        },
    );

    Ok(Reply::new(ReplyCode::CommandOkay, "PORT command successful"))
}

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Port
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let addr = match &args.parsed_command.cmd {
            Command::Port { addr } => addr.clone(),
            _ => return Err(crate::server::controlchan::ControlChanErrorKind::InternalServerError.into()),
        };
        let (ip, port) = match parse_port_argument(&addr) {
            Some(endpoint) => endpoint,
            None => return Ok(Reply::new(ReplyCode::ParameterSyntaxError, "Could not parse the PORT address")),
        };
        setup_active(&args, IpAddr::V4(ip), port).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_the_six_byte_form() {
        assert_eq!(parse_port_argument("132,235,1,2,24,131"), Some((Ipv4Addr::new(132, 235, 1, 2), 6275)));
    }

    #[test]
    fn rejects_malformed_arguments() {
        for bad in ["1,2,3,4,5", "1,2,3,4,5,6,7", "a,b,c,d,e,f", "300,1,1,1,1,1", ""] {
            assert_eq!(parse_port_argument(bad), None, "{:?} should not parse", bad);
        }
    }
}
