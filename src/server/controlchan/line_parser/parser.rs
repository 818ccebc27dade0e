use super::error::{ParseErrorKind, Result};
use crate::auth::Password;
use crate::server::controlchan::{
    command::{Command, ParsedCommand},
    commands::{AuthParam, ModeParam, Opt, ProtParam, StruParam, TransferType},
};

use std::str;

/// The longest control channel line we accept, terminator included.
pub const MAX_LINE_LEN: usize = 512;

// These directives take an argument that may legitimately look like a flag, so no flag
// classification happens for them.
const KEEPS_FLAGS_IN_ARG: [&str; 3] = ["RETR", "STOR", "SIZE"];

/// Parses one control channel line into a [`ParsedCommand`].
///
/// Control characters are stripped, the directive is validated as a 3-4 letter word and
/// uppercased, and everything after it is split into flags (`-X`) and the argument.
pub fn parse<T: AsRef<[u8]>>(line: T) -> Result<ParsedCommand> {
    let bytes = line.as_ref();
    if bytes.len() > MAX_LINE_LEN {
        return Err(ParseErrorKind::LineTooLong.into());
    }
    // Drop CR/LF and everything else outside the printable range; multi-byte UTF-8 stays.
    let sanitized: Vec<u8> = bytes.iter().copied().filter(|b| *b >= 0x20 && *b != 0x7F).collect();
    let raw = str::from_utf8(&sanitized)?.to_string();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseErrorKind::EmptyLine.into());
    }

    let (token, rest) = match trimmed.split_once(' ') {
        Some((token, rest)) => (token, rest.trim()),
        None => (trimmed, ""),
    };
    if !(3..=4).contains(&token.len()) || !token.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ParseErrorKind::InvalidDirective.into());
    }
    let directive = token.to_ascii_uppercase();

    let mut flags: Vec<String> = Vec::new();
    let argument = if rest.is_empty() {
        None
    } else if KEEPS_FLAGS_IN_ARG.contains(&directive.as_str()) {
        Some(rest.to_string())
    } else {
        let mut arg_tokens: Vec<&str> = Vec::new();
        for token in rest.split_whitespace() {
            if is_flag(token) {
                flags.push(token.to_string());
            } else {
                arg_tokens.push(token);
            }
        }
        if arg_tokens.is_empty() {
            None
        } else {
            Some(arg_tokens.join(" "))
        }
    };

    let cmd = to_command(&directive, argument.as_deref(), &flags)?;
    Ok(ParsedCommand {
        directive,
        raw,
        argument,
        flags,
        cmd,
    })
}

// A flag is a dash followed by exactly one word character.
fn is_flag(token: &str) -> bool {
    let bytes = token.as_bytes();
    bytes.len() == 2 && bytes[0] == b'-' && (bytes[1].is_ascii_alphanumeric() || bytes[1] == b'_')
}

fn to_command(directive: &str, argument: Option<&str>, flags: &[String]) -> Result<Command> {
    let require = || argument.map(str::to_string).ok_or(ParseErrorKind::InvalidCommand);
    let optional = || argument.map(str::to_string);
    let reject_arg = || if argument.is_some() { Err(ParseErrorKind::InvalidCommand) } else { Ok(()) };

    let cmd = match directive {
        "USER" => Command::User { username: require()? },
        "PASS" => Command::Pass {
            password: Password::new(argument.unwrap_or("")),
        },
        "ACCT" => Command::Acct,
        "SYST" => Command::Syst,
        "STAT" => Command::Stat { path: optional() },
        "TYPE" => {
            let arg = argument.ok_or(ParseErrorKind::InvalidCommand)?;
            let transfer_type = match arg.chars().next().map(|c| c.to_ascii_uppercase()) {
                Some('A') => TransferType::Ascii,
                Some('I') | Some('L') => TransferType::Binary,
                _ => return Err(ParseErrorKind::InvalidCommand.into()),
            };
            Command::Type { transfer_type }
        }
        "STRU" => {
            let structure = match argument {
                Some("F") | Some("f") => StruParam::File,
                Some("R") | Some("r") => StruParam::Record,
                Some("P") | Some("p") => StruParam::Page,
                _ => return Err(ParseErrorKind::InvalidCommand.into()),
            };
            Command::Stru { structure }
        }
        "MODE" => {
            let mode = match argument {
                Some("S") | Some("s") => ModeParam::Stream,
                Some("B") | Some("b") => ModeParam::Block,
                Some("C") | Some("c") => ModeParam::Compressed,
                _ => return Err(ParseErrorKind::InvalidCommand.into()),
            };
            Command::Mode { mode }
        }
        "HELP" => Command::Help { topic: optional() },
        "NOOP" => {
            reject_arg()?;
            Command::Noop
        }
        "PASV" => {
            reject_arg()?;
            Command::Pasv
        }
        // EPSV may carry `ALL` or a protocol number; both leave our behavior unchanged.
        "EPSV" => Command::Epsv,
        "PORT" => Command::Port { addr: require()? },
        "EPRT" => Command::Eprt { addr: require()? },
        "RETR" => Command::Retr { path: require()? },
        "STOR" => Command::Stor { path: require()? },
        "APPE" => Command::Appe { path: require()? },
        "STOU" => Command::Stou { path: optional() },
        "LIST" => Command::List { path: optional() },
        "NLST" => Command::Nlst { path: optional() },
        "MLSD" => Command::Mlsd { path: optional() },
        "MLST" => Command::Mlst { path: optional() },
        "FEAT" => {
            reject_arg()?;
            Command::Feat
        }
        "PWD" | "XPWD" => {
            reject_arg()?;
            Command::Pwd
        }
        "CWD" | "XCWD" => Command::Cwd { path: require()? },
        "CDUP" | "XCUP" => {
            reject_arg()?;
            Command::Cdup
        }
        "OPTS" => Command::Opts {
            option: parse_opts(argument, flags)?,
        },
        "DELE" => Command::Dele { path: require()? },
        "RMD" | "XRMD" => Command::Rmd { path: require()? },
        "QUIT" => {
            reject_arg()?;
            Command::Quit
        }
        "MKD" | "XMKD" => Command::Mkd { path: require()? },
        "ALLO" => Command::Allo,
        "ABOR" => {
            reject_arg()?;
            Command::Abor
        }
        "RNFR" => Command::Rnfr { path: require()? },
        "RNTO" => Command::Rnto { path: require()? },
        "AUTH" => {
            let protocol = match argument.map(str::to_ascii_uppercase).as_deref() {
                Some("TLS") => AuthParam::Tls,
                Some("SSL") => AuthParam::Ssl,
                _ => return Err(ParseErrorKind::InvalidCommand.into()),
            };
            Command::Auth { protocol }
        }
        "PBSZ" => {
            let size = require()?.parse::<u64>().map_err(|_| ParseErrorKind::InvalidCommand)?;
            Command::Pbsz { size }
        }
        "PROT" => {
            let param = match argument.map(str::to_ascii_uppercase).as_deref() {
                Some("C") => ProtParam::Clear,
                Some("S") => ProtParam::Safe,
                Some("E") => ProtParam::Confidential,
                Some("P") => ProtParam::Private,
                _ => return Err(ParseErrorKind::InvalidCommand.into()),
            };
            Command::Prot { param }
        }
        "SIZE" => Command::Size { path: require()? },
        "REST" => {
            let offset = require()?.parse::<u64>().map_err(|_| ParseErrorKind::InvalidCommand)?;
            Command::Rest { offset }
        }
        "MDTM" => parse_mdtm(&require()?),
        "SITE" => Command::Site { params: require()? },
        _ => Command::Other {
            directive: directive.to_string(),
        },
    };
    Ok(cmd)
}

fn parse_opts(argument: Option<&str>, flags: &[String]) -> Result<Opt> {
    let argument = argument.ok_or(ParseErrorKind::InvalidCommand)?;
    let mut words = argument.split_whitespace();
    let target = words.next().map(str::to_ascii_uppercase).ok_or(ParseErrorKind::InvalidCommand)?;
    match target.as_str() {
        "UTF8" => match words.next().map(str::to_ascii_uppercase).as_deref() {
            Some("ON") => Ok(Opt::Utf8 { on: true }),
            Some("OFF") => Ok(Opt::Utf8 { on: false }),
            _ => Err(ParseErrorKind::InvalidCommand.into()),
        },
        "MLST" => {
            let facts = words
                .next()
                .unwrap_or("")
                .split(';')
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect();
            Ok(Opt::MlstFacts { facts })
        }
        "LIST" => match flags.first().map(|f| f.to_ascii_uppercase()).as_deref() {
            Some("-E") => Ok(Opt::ListFormat { ep: true }),
            Some("-L") => Ok(Opt::ListFormat { ep: false }),
            _ => Err(ParseErrorKind::InvalidCommand.into()),
        },
        _ => Err(ParseErrorKind::InvalidCommand.into()),
    }
}

// `MDTM <YYYYMMDDHHMMSS[.sss]> <path>` is the set-mtime form; everything else queries.
fn parse_mdtm(argument: &str) -> Command {
    if let Some((first, rest)) = argument.split_once(' ') {
        let (digits, millis) = match first.split_once('.') {
            Some((d, m)) => (d, Some(m)),
            None => (first, None),
        };
        let timestamp_like = digits.len() == 14 && digits.chars().all(|c| c.is_ascii_digit()) && millis.map_or(true, |m| m.chars().all(|c| c.is_ascii_digit()));
        if timestamp_like && !rest.trim().is_empty() {
            return Command::MdtmSet {
                timestamp: first.to_string(),
                path: rest.trim().to_string(),
            };
        }
    }
    Command::Mdtm {
        path: argument.to_string(),
    }
}
