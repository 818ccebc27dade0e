use super::error::{ParseError, ParseErrorKind};
use super::parser::parse;
use crate::server::controlchan::{
    command::Command,
    commands::{AuthParam, Opt, StruParam, TransferType},
};

use pretty_assertions::assert_eq;

#[test]
fn user_cmd_crnl() {
    let parsed = parse("USER Dolores\r\n").unwrap();
    assert_eq!(parsed.directive, "USER");
    assert_eq!(
        parsed.cmd,
        Command::User {
            username: "Dolores".to_string()
        }
    );
}

// According to RFC 959, verbs are interpreted without regard to case.
#[test]
fn user_cmd_mixed_case() {
    let parsed = parse("uSeR Dolores\r\n").unwrap();
    assert_eq!(parsed.directive, "USER");
    assert_eq!(
        parsed.cmd,
        Command::User {
            username: "Dolores".to_string()
        }
    );
}

// Not all clients include the (actually mandatory) '\r'.
#[test]
fn user_cmd_nl_only() {
    assert_eq!(
        parse("USER Dolores\n").unwrap().cmd,
        Command::User {
            username: "Dolores".to_string()
        }
    );
}

#[test]
fn argument_with_spaces_is_joined() {
    assert_eq!(
        parse("CWD my holiday pictures\r\n").unwrap().cmd,
        Command::Cwd {
            path: "my holiday pictures".to_string()
        }
    );
}

#[test]
fn directive_shape_is_validated() {
    assert_eq!(parse("U\r\n"), Err(ParseError::from(ParseErrorKind::InvalidDirective)));
    assert_eq!(parse("USERS1 x\r\n"), Err(ParseError::from(ParseErrorKind::InvalidDirective)));
    assert_eq!(parse("US3R x\r\n"), Err(ParseError::from(ParseErrorKind::InvalidDirective)));
}

#[test]
fn empty_lines_are_rejected() {
    assert_eq!(parse("\r\n"), Err(ParseError::from(ParseErrorKind::EmptyLine)));
    assert_eq!(parse("   \r\n"), Err(ParseError::from(ParseErrorKind::EmptyLine)));
}

#[test]
fn overlong_lines_are_rejected() {
    let line = format!("STOR {}\r\n", "x".repeat(600));
    assert_eq!(parse(line), Err(ParseError::from(ParseErrorKind::LineTooLong)));
}

#[test]
fn control_characters_are_stripped() {
    assert_eq!(
        parse("DELE fi\x01le.txt\r\n").unwrap().cmd,
        Command::Dele {
            path: "file.txt".to_string()
        }
    );
}

#[test]
fn unknown_but_well_formed_directives_parse_as_other() {
    assert_eq!(
        parse("FROB\r\n").unwrap().cmd,
        Command::Other {
            directive: "FROB".to_string()
        }
    );
}

#[test]
fn list_flags_are_split_from_the_argument() {
    let parsed = parse("LIST -a -l pictures\r\n").unwrap();
    assert_eq!(parsed.flags, vec!["-a".to_string(), "-l".to_string()]);
    assert_eq!(
        parsed.cmd,
        Command::List {
            path: Some("pictures".to_string())
        }
    );
    assert!(parsed.has_flag('a'));
    assert!(!parsed.has_flag('R'));
}

// A RETR/STOR/SIZE argument may legitimately start with a dash.
#[test]
fn retr_keeps_dashed_names_in_the_argument() {
    let parsed = parse("RETR -a\r\n").unwrap();
    assert!(parsed.flags.is_empty());
    assert_eq!(parsed.cmd, Command::Retr { path: "-a".to_string() });
}

#[test]
fn type_selects_representation() {
    assert_eq!(parse("TYPE I\r\n").unwrap().cmd, Command::Type { transfer_type: TransferType::Binary });
    assert_eq!(parse("TYPE A N\r\n").unwrap().cmd, Command::Type { transfer_type: TransferType::Ascii });
    assert_eq!(parse("TYPE L 8\r\n").unwrap().cmd, Command::Type { transfer_type: TransferType::Binary });
    assert_eq!(parse("TYPE X\r\n"), Err(ParseError::from(ParseErrorKind::InvalidCommand)));
}

#[test]
fn stru_accepts_all_structures_for_the_handler_to_refuse() {
    assert_eq!(parse("STRU F\r\n").unwrap().cmd, Command::Stru { structure: StruParam::File });
    assert_eq!(parse("STRU P\r\n").unwrap().cmd, Command::Stru { structure: StruParam::Page });
}

#[test]
fn rest_parses_the_offset() {
    assert_eq!(parse("REST 1024\r\n").unwrap().cmd, Command::Rest { offset: 1024 });
    assert_eq!(parse("REST nope\r\n"), Err(ParseError::from(ParseErrorKind::InvalidCommand)));
}

#[test]
fn auth_mechanisms() {
    assert_eq!(parse("AUTH TLS\r\n").unwrap().cmd, Command::Auth { protocol: AuthParam::Tls });
    assert_eq!(parse("AUTH tls\r\n").unwrap().cmd, Command::Auth { protocol: AuthParam::Tls });
    assert_eq!(parse("AUTH KERBEROS\r\n"), Err(ParseError::from(ParseErrorKind::InvalidCommand)));
}

#[test]
fn aliases_map_to_their_canonical_commands() {
    assert_eq!(parse("XPWD\r\n").unwrap().cmd, Command::Pwd);
    assert_eq!(parse("XCUP\r\n").unwrap().cmd, Command::Cdup);
    assert_eq!(
        parse("XMKD photos\r\n").unwrap().cmd,
        Command::Mkd {
            path: "photos".to_string()
        }
    );
}

#[test]
fn opts_variants() {
    assert_eq!(parse("OPTS UTF8 ON\r\n").unwrap().cmd, Command::Opts { option: Opt::Utf8 { on: true } });
    assert_eq!(parse("OPTS UTF8 OFF\r\n").unwrap().cmd, Command::Opts { option: Opt::Utf8 { on: false } });
    assert_eq!(parse("OPTS LIST -E\r\n").unwrap().cmd, Command::Opts { option: Opt::ListFormat { ep: true } });
    assert_eq!(
        parse("OPTS MLST Type;Size;Modify\r\n").unwrap().cmd,
        Command::Opts {
            option: Opt::MlstFacts {
                facts: vec!["Type".to_string(), "Size".to_string(), "Modify".to_string()]
            }
        }
    );
}

#[test]
fn mdtm_query_and_set_forms() {
    assert_eq!(
        parse("MDTM a.txt\r\n").unwrap().cmd,
        Command::Mdtm {
            path: "a.txt".to_string()
        }
    );
    assert_eq!(
        parse("MDTM 20240102030405.123 a.txt\r\n").unwrap().cmd,
        Command::MdtmSet {
            timestamp: "20240102030405.123".to_string(),
            path: "a.txt".to_string()
        }
    );
}

#[test]
fn pbsz_and_prot() {
    assert_eq!(parse("PBSZ 0\r\n").unwrap().cmd, Command::Pbsz { size: 0 });
    assert_eq!(
        parse("PROT P\r\n").unwrap().cmd,
        Command::Prot {
            param: crate::server::controlchan::commands::ProtParam::Private
        }
    );
}
