//! The RFC 2428 Extended Data Port (`EPRT`) command
//
// `EPRT |proto|addr|port|` names the endpoint the client listens on; protocol 1 is IPv4 and 2
// is IPv6.

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
use std::net::IpAddr;

#[derive(Debug)]
pub struct Eprt;

enum EprtParseError {
    BadSyntax,
    UnknownProtocol,
    ProtocolMismatch,
}

fn parse_eprt_argument(arg: &str) -> Result<(IpAddr, u16), EprtParseError> {
    let mut chars = arg.chars();
    let delimiter = chars.next().ok_or(EprtParseError::BadSyntax)?;
    let rest: String = chars.collect();
    let mut fields = rest.split(delimiter);
    let proto = fields.next().ok_or(EprtParseError::BadSyntax)?;
    let addr = fields.next().ok_or(EprtParseError::BadSyntax)?;
    let port = fields.next().ok_or(EprtParseError::BadSyntax)?;

    let ip: IpAddr = addr.parse().map_err(|_| EprtParseError::BadSyntax)?;
    let port: u16 = port.parse().map_err(|_| EprtParseError::BadSyntax)?;
    match proto {
        "1" if ip.is_ipv4() => Ok((ip, port)),
        "2" if ip.is_ipv6() => Ok((ip, port)),
        "1" | "2" => Err(EprtParseError::ProtocolMismatch),
        _ => Err(EprtParseError::UnknownProtocol),
    }
}

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Eprt
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Storage::Metadata: Metadata,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let addr = match &args.parsed_command.cmd {
            Command::Eprt { addr } => addr.clone(),
            _ => return Err(crate::server::controlchan::ControlChanErrorKind::InternalServerError.into()),
        };
        match parse_eprt_argument(&addr) {
            Ok((ip, port)) => super::port::setup_active(&args, ip, port).await,
            Err(EprtParseError::UnknownProtocol) => Ok(Reply::new(
                ReplyCode::UnsupportedNetworkProtocol,
                "Network protocol not supported, use (1,2)",
            )),
            Err(EprtParseError::ProtocolMismatch) => Ok(Reply::new(ReplyCode::ParameterSyntaxError, "Address does not match the protocol")),
            Err(EprtParseError::BadSyntax) => Ok(Reply::new(ReplyCode::ParameterSyntaxError, "Could not parse the EPRT argument")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ipv4_and_ipv6_forms() {
        let (ip, port) = parse_eprt_argument("|1|132.235.1.2|6275|").ok().unwrap();
        assert_eq!(ip, "132.235.1.2".parse::<IpAddr>().unwrap());
        assert_eq!(port, 6275);
        let (ip, _) = parse_eprt_argument("|2|::1|6275|").ok().unwrap();
        assert!(ip.is_ipv6());
    }

    #[test]
    fn refuses_unknown_protocols_and_bad_syntax() {
        assert!(matches!(parse_eprt_argument("|3|1.2.3.4|6275|"), Err(EprtParseError::UnknownProtocol)));
        assert!(matches!(parse_eprt_argument("|2|1.2.3.4|6275|"), Err(EprtParseError::ProtocolMismatch)));
        assert!(matches!(parse_eprt_argument("nonsense"), Err(EprtParseError::BadSyntax)));
    }
}
