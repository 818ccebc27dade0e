//! Shared setup for PASV and EPSV: allocate a port, start listening, wire the channels and
//! spawn the data channel task. The handlers only differ in how they word the reply.

use crate::{
    auth::UserDetail,
    server::{
        controlchan::{
            handler::CommandContext,
            Reply, ReplyCode,
        },
        datachan::{self, DataChanParams},
        ftpserver::options::PassiveHost,
    },
    storage::{Metadata, StorageBackend},
};
use std::net::{IpAddr, Ipv4Addr};
use tokio::sync::{mpsc, watch};

/// Sets up a passive data channel and returns the port it listens on, or a ready error reply.
pub(super) async fn setup_passive<Storage, User>(args: &CommandContext<Storage, User>) -> Result<u16, Reply>
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    // A new PASV/EPSV replaces whatever data channel came before it.
    {
        let mut session = args.session.lock().await;
        session.clear_data_channel();
    }

    let (listener, guard) = match args.passive_ports.bind(args.local_addr.ip()).await {
        Ok(bound) => bound,
        Err(err) => {
            slog::warn!(args.logger, "no free passive port: {}", err);
            return Err(Reply::new(ReplyCode::CantOpenDataConnection, "No free passive port"));
        }
    };
    let port = guard.port();

    let (cmd_tx, cmd_rx) = mpsc::channel(1);
    let (abort_tx, abort_rx) = mpsc::channel(1);
    let (ready_tx, ready_rx) = watch::channel(false);
    let control_peer = {
        let mut session = args.session.lock().await;
        session.data_cmd_tx = Some(cmd_tx);
        session.data_abort_tx = Some(abort_tx);
        session.data_conn_ready = Some(ready_rx);
        session.peer_addr.ip()
    };

    datachan::spawn_passive(
        listener,
        guard,
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

    Ok(port)
}

/// Resolves the IPv4 address a PASV reply should advertise.
pub(super) async fn advertised_ip<Storage, User>(args: &CommandContext<Storage, User>) -> Result<Ipv4Addr, Reply>
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    match &args.passive_host {
        PassiveHost::FromConnection => match args.local_addr.ip() {
            IpAddr::V4(ip) => Ok(ip),
            IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
                Some(ip) => Ok(ip),
                None => Err(Reply::new(ReplyCode::CantOpenDataConnection, "PASV needs IPv4, use EPSV instead")),
            },
        },
        PassiveHost::Ip(ip) => Ok(*ip),
        PassiveHost::Dns(name) => {
            let addrs = tokio::net::lookup_host((name.as_str(), 0)).await.map_err(|err| {
                slog::warn!(args.logger, "could not resolve passive hostname {}: {}", name, err);
                Reply::new(ReplyCode::CantOpenDataConnection, "Could not resolve the passive hostname")
            })?;
            addrs
                .filter_map(|addr| match addr.ip() {
                    IpAddr::V4(ip) => Some(ip),
                    IpAddr::V6(_) => None,
                })
                .next()
                .ok_or_else(|| Reply::new(ReplyCode::CantOpenDataConnection, "The passive hostname has no IPv4 address"))
        }
        PassiveHost::Resolver(resolver) => {
            let remote = { args.session.lock().await.peer_addr.ip() };
            resolver.wan_ip(remote).await.map_err(|err| {
                slog::warn!(args.logger, "WAN IP discovery failed: {}", err);
                Reply::new(ReplyCode::CantOpenDataConnection, "Could not determine the address to advertise")
            })
        }
    }
}
