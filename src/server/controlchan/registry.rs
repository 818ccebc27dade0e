//! The table of directives this server knows: per directive its aliases, syntax, description,
//! FEAT advertisement and dispatch gating flags. HELP and FEAT render from this table and the
//! dispatcher consults it before any handler runs.

use lazy_static::lazy_static;
use std::collections::HashMap;

/// Everything the server knows about one directive, apart from its handler.
#[derive(Debug)]
pub(crate) struct CommandSpec {
    /// The canonical directive.
    pub directive: &'static str,
    /// Alternative spellings that dispatch to the same handler.
    pub aliases: &'static [&'static str],
    /// Syntax template shown by HELP; `{{cmd}}` stands for the directive.
    pub syntax: &'static str,
    /// One-line description shown by HELP.
    pub description: &'static str,
    /// The capability string FEAT advertises for this directive, if any.
    pub feat: Option<&'static str>,
    /// Whether the directive may be used before authentication.
    pub no_auth: bool,
    /// Marks directives kept only for historic clients.
    pub obsolete: bool,
}

const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        directive: "ABOR",
        aliases: &[],
        syntax: "{{cmd}}",
        description: "Abort an active file transfer",
        feat: None,
        no_auth: false,
        obsolete: false,
    },
    CommandSpec {
        directive: "ACCT",
        aliases: &[],
        syntax: "{{cmd}} <account>",
        description: "Account information",
        feat: None,
        no_auth: true,
        obsolete: true,
    },
    CommandSpec {
        directive: "ALLO",
        aliases: &[],
        syntax: "{{cmd}} [<size>]",
        description: "Allocate sufficient storage space",
        feat: None,
        no_auth: false,
        obsolete: true,
    },
    CommandSpec {
        directive: "APPE",
        aliases: &[],
        syntax: "{{cmd}} <path>",
        description: "Append data to the end of a file",
        feat: None,
        no_auth: false,
        obsolete: false,
    },
    CommandSpec {
        directive: "AUTH",
        aliases: &[],
        syntax: "{{cmd}} <mechanism>",
        description: "Upgrade the control channel to TLS",
        feat: Some("AUTH TLS"),
        no_auth: true,
        obsolete: false,
    },
    CommandSpec {
        directive: "CDUP",
        aliases: &["XCUP"],
        syntax: "{{cmd}}",
        description: "Change to the parent of the current directory",
        feat: None,
        no_auth: false,
        obsolete: false,
    },
    CommandSpec {
        directive: "CWD",
        aliases: &["XCWD"],
        syntax: "{{cmd}} <path>",
        description: "Change working directory",
        feat: None,
        no_auth: false,
        obsolete: false,
    },
    CommandSpec {
        directive: "DELE",
        aliases: &[],
        syntax: "{{cmd}} <path>",
        description: "Delete a file or directory tree",
        feat: None,
        no_auth: false,
        obsolete: false,
    },
    CommandSpec {
        directive: "EPRT",
        aliases: &[],
        syntax: "{{cmd}} |<proto>|<addr>|<port>|",
        description: "Specify an extended address for the data connection",
        feat: Some("EPRT"),
        no_auth: false,
        obsolete: false,
    },
    CommandSpec {
        directive: "EPSV",
        aliases: &[],
        syntax: "{{cmd}} [<proto>]",
        description: "Enter extended passive mode",
        feat: Some("EPSV"),
        no_auth: false,
        obsolete: false,
    },
    CommandSpec {
        directive: "FEAT",
        aliases: &[],
        syntax: "{{cmd}}",
        description: "List server features",
        feat: None,
        no_auth: true,
        obsolete: false,
    },
    CommandSpec {
        directive: "HELP",
        aliases: &[],
        syntax: "{{cmd}} [<command>]",
        description: "Show help on a command, or list known commands",
        feat: None,
        no_auth: true,
        obsolete: false,
    },
    CommandSpec {
        directive: "LIST",
        aliases: &[],
        syntax: "{{cmd}} [<path>]",
        description: "List files in long form",
        feat: None,
        no_auth: false,
        obsolete: false,
    },
    CommandSpec {
        directive: "MDTM",
        aliases: &[],
        syntax: "{{cmd}} <path>",
        description: "Report the last modification time of a file",
        feat: Some("MDTM"),
        no_auth: false,
        obsolete: false,
    },
    CommandSpec {
        directive: "MKD",
        aliases: &["XMKD"],
        syntax: "{{cmd}} <path>",
        description: "Make a directory",
        feat: None,
        no_auth: false,
        obsolete: false,
    },
    CommandSpec {
        directive: "MLSD",
        aliases: &[],
        syntax: "{{cmd}} [<path>]",
        description: "List a directory in machine-readable form",
        feat: None,
        no_auth: false,
        obsolete: false,
    },
    CommandSpec {
        directive: "MLST",
        aliases: &[],
        syntax: "{{cmd}} [<path>]",
        description: "Report on a single object in machine-readable form",
        feat: Some("MLST Type*;Size*;Modify*;Perm*;UNIX.mode*;"),
        no_auth: false,
        obsolete: false,
    },
    CommandSpec {
        directive: "MODE",
        aliases: &[],
        syntax: "{{cmd}} <mode>",
        description: "Set the transfer mode; only stream mode is supported",
        feat: None,
        no_auth: false,
        obsolete: false,
    },
    CommandSpec {
        directive: "NLST",
        aliases: &[],
        syntax: "{{cmd}} [<path>]",
        description: "List file names only",
        feat: None,
        no_auth: false,
        obsolete: false,
    },
    CommandSpec {
        directive: "NOOP",
        aliases: &[],
        syntax: "{{cmd}}",
        description: "Do nothing",
        feat: None,
        no_auth: true,
        obsolete: false,
    },
    CommandSpec {
        directive: "OPTS",
        aliases: &[],
        syntax: "{{cmd}} <option> [<value>]",
        description: "Set options for another command",
        feat: Some("UTF8"),
        no_auth: true,
        obsolete: false,
    },
    CommandSpec {
        directive: "PASS",
        aliases: &[],
        syntax: "{{cmd}} <password>",
        description: "Authenticate with a password",
        feat: None,
        no_auth: true,
        obsolete: false,
    },
    CommandSpec {
        directive: "PASV",
        aliases: &[],
        syntax: "{{cmd}}",
        description: "Enter passive mode",
        feat: Some("PASV"),
        no_auth: false,
        obsolete: false,
    },
    CommandSpec {
        directive: "PBSZ",
        aliases: &[],
        syntax: "{{cmd}} <size>",
        description: "Set the protection buffer size",
        feat: Some("PBSZ"),
        no_auth: true,
        obsolete: false,
    },
    CommandSpec {
        directive: "PORT",
        aliases: &[],
        syntax: "{{cmd}} <h1,h2,h3,h4,p1,p2>",
        description: "Specify an address for the data connection",
        feat: None,
        no_auth: false,
        obsolete: false,
    },
    CommandSpec {
        directive: "PROT",
        aliases: &[],
        syntax: "{{cmd}} <level>",
        description: "Set the data channel protection level",
        feat: Some("PROT"),
        no_auth: true,
        obsolete: false,
    },
    CommandSpec {
        directive: "PWD",
        aliases: &["XPWD"],
        syntax: "{{cmd}}",
        description: "Print the current working directory",
        feat: None,
        no_auth: false,
        obsolete: false,
    },
    CommandSpec {
        directive: "QUIT",
        aliases: &[],
        syntax: "{{cmd}}",
        description: "End the session",
        feat: None,
        no_auth: true,
        obsolete: false,
    },
    CommandSpec {
        directive: "REST",
        aliases: &[],
        syntax: "{{cmd}} <offset>",
        description: "Restart the next transfer at a byte offset",
        feat: Some("REST STREAM"),
        no_auth: false,
        obsolete: false,
    },
    CommandSpec {
        directive: "RETR",
        aliases: &[],
        syntax: "{{cmd}} <path>",
        description: "Retrieve a file",
        feat: None,
        no_auth: false,
        obsolete: false,
    },
    CommandSpec {
        directive: "RMD",
        aliases: &["XRMD"],
        syntax: "{{cmd}} <path>",
        description: "Remove a directory tree",
        feat: None,
        no_auth: false,
        obsolete: false,
    },
    CommandSpec {
        directive: "RNFR",
        aliases: &[],
        syntax: "{{cmd}} <path>",
        description: "Name the file to rename",
        feat: None,
        no_auth: false,
        obsolete: false,
    },
    CommandSpec {
        directive: "RNTO",
        aliases: &[],
        syntax: "{{cmd}} <path>",
        description: "Rename the file named by RNFR",
        feat: None,
        no_auth: false,
        obsolete: false,
    },
    CommandSpec {
        directive: "SITE",
        aliases: &[],
        syntax: "{{cmd}} <subcommand> [<parameters>]",
        description: "Site specific commands",
        feat: None,
        no_auth: false,
        obsolete: false,
    },
    CommandSpec {
        directive: "SIZE",
        aliases: &[],
        syntax: "{{cmd}} <path>",
        description: "Report the size of a file in bytes",
        feat: Some("SIZE"),
        no_auth: false,
        obsolete: false,
    },
    CommandSpec {
        directive: "STAT",
        aliases: &[],
        syntax: "{{cmd}} [<path>]",
        description: "Report server status or list a path on the control channel",
        feat: None,
        no_auth: false,
        obsolete: false,
    },
    CommandSpec {
        directive: "STOR",
        aliases: &[],
        syntax: "{{cmd}} <path>",
        description: "Store a file",
        feat: None,
        no_auth: false,
        obsolete: false,
    },
    CommandSpec {
        directive: "STOU",
        aliases: &[],
        syntax: "{{cmd}} [<path>]",
        description: "Store a file under a unique name",
        feat: None,
        no_auth: false,
        obsolete: false,
    },
    CommandSpec {
        directive: "STRU",
        aliases: &[],
        syntax: "{{cmd}} <structure>",
        description: "Set the file structure; only file structure is supported",
        feat: None,
        no_auth: false,
        obsolete: false,
    },
    CommandSpec {
        directive: "SYST",
        aliases: &[],
        syntax: "{{cmd}}",
        description: "Report the operating system type",
        feat: None,
        no_auth: false,
        obsolete: false,
    },
    CommandSpec {
        directive: "TYPE",
        aliases: &[],
        syntax: "{{cmd}} <type>",
        description: "Set the representation type",
        feat: None,
        no_auth: false,
        obsolete: false,
    },
    CommandSpec {
        directive: "USER",
        aliases: &[],
        syntax: "{{cmd}} <username>",
        description: "Name the user to log in as",
        feat: None,
        no_auth: true,
        obsolete: false,
    },
];

lazy_static! {
    static ref BY_NAME: HashMap<&'static str, &'static CommandSpec> = {
        let mut map = HashMap::new();
        for spec in COMMANDS {
            map.insert(spec.directive, spec);
            for alias in spec.aliases {
                map.insert(*alias, spec);
            }
        }
        map
    };
}

/// Looks up a directive or one of its aliases.
pub(crate) fn lookup(directive: &str) -> Option<&'static CommandSpec> {
    BY_NAME.get(directive).copied()
}

/// All canonical directives, in alphabetical order.
pub(crate) fn all() -> impl Iterator<Item = &'static CommandSpec> {
    COMMANDS.iter()
}

/// The capability strings FEAT advertises, one per directive that has one.
pub(crate) fn feat_lines() -> Vec<&'static str> {
    COMMANDS.iter().filter_map(|spec| spec.feat).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::controlchan::{command::Command, line_parser::parse};

    #[test]
    fn aliases_resolve_to_their_canonical_spec() {
        for (alias, canonical) in [("XCWD", "CWD"), ("XCUP", "CDUP"), ("XPWD", "PWD"), ("XMKD", "MKD"), ("XRMD", "RMD")] {
            assert_eq!(lookup(alias).unwrap().directive, canonical);
        }
    }

    #[test]
    fn unknown_directives_are_absent() {
        assert!(lookup("FROB").is_none());
    }

    #[test]
    fn pre_auth_set_matches_the_protocol() {
        let pre_auth: Vec<&str> = all().filter(|c| c.no_auth).map(|c| c.directive).collect();
        for directive in ["USER", "PASS", "QUIT", "HELP", "FEAT", "AUTH", "NOOP", "PBSZ", "PROT", "OPTS"] {
            assert!(pre_auth.contains(&directive), "{} should not require auth", directive);
        }
        for directive in ["RETR", "STOR", "LIST", "CWD", "PASV"] {
            assert!(!pre_auth.contains(&directive), "{} should require auth", directive);
        }
    }

    // Every directive that FEAT advertises must actually be dispatchable: present here and
    // understood by the parser.
    #[test]
    fn advertised_directives_are_dispatchable() {
        for spec in all().filter(|c| c.feat.is_some()) {
            let probe = format!("{} x\r\n", spec.directive);
            let parsed = parse(probe.as_bytes())
                .or_else(|_| parse(format!("{}\r\n", spec.directive).as_bytes()))
                .or_else(|_| parse(format!("{} 0\r\n", spec.directive).as_bytes()))
                .or_else(|_| parse(format!("{} TLS\r\n", spec.directive).as_bytes()))
                .or_else(|_| parse(format!("{} P\r\n", spec.directive).as_bytes()))
                .or_else(|_| parse(format!("{} UTF8 ON\r\n", spec.directive).as_bytes()))
                .unwrap_or_else(|e| panic!("{} does not parse: {:?}", spec.directive, e));
            assert!(
                !matches!(parsed.cmd, Command::Other { .. }),
                "{} advertised by FEAT but parses as unknown",
                spec.directive
            );
        }
    }
}
