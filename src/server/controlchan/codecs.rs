use super::{command::ParsedCommand, error::ControlChanError, line_parser, Reply};

use bytes::BytesMut;
use std::io::Write;
use tokio_util::codec::{Decoder, Encoder};

// FtpCodec implements tokio's `Decoder` and `Encoder` traits for the control channel. We use it
// to decode FTP commands and encode their replies.
pub struct FtpCodec {
    // Stored index of the next index to examine for a '\n' character. This is used to optimize
    // searching. For example, if `decode` was called with `abc`, it would hold `3`, because that
    // is the next index to examine. The next time `decode` is called with `abcde\n`, we will
    // only look at `de\n` before returning.
    next_index: usize,
}

impl FtpCodec {
    pub fn new() -> Self {
        FtpCodec { next_index: 0 }
    }
}

impl Decoder for FtpCodec {
    type Item = ParsedCommand;
    type Error = ControlChanError;

    // Decodes the incoming bytes into a parsed command by splitting on newlines and running the
    // line parser on each complete line.
    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<ParsedCommand>, Self::Error> {
        if let Some(newline_offset) = buf[self.next_index..].iter().position(|b| *b == b'\n') {
            let newline_index = newline_offset + self.next_index;
            let line = buf.split_to(newline_index + 1);
            self.next_index = 0;
            Ok(Some(line_parser::parse(line)?))
        } else if buf.len() > line_parser::MAX_LINE_LEN {
            // Drop the runaway line so the session can go on after the error reply.
            buf.clear();
            self.next_index = 0;
            Err(line_parser::ParseError::from(line_parser::ParseErrorKind::LineTooLong).into())
        } else {
            self.next_index = buf.len();
            Ok(None)
        }
    }
}

impl Encoder<Reply> for FtpCodec {
    type Error = ControlChanError;

    // Encodes the outgoing reply. Missing messages are filled in from the default message table;
    // multi-line replies use the RFC 959 continuation style.
    fn encode(&mut self, reply: Reply, buf: &mut BytesMut) -> Result<(), Self::Error> {
        let mut buffer = vec![];
        match reply {
            Reply::None => {
                return Ok(());
            }
            Reply::CodeAndMsg { code, msg } => {
                let msg = if msg.is_empty() { code.default_message().to_string() } else { msg };
                if msg.is_empty() {
                    write!(buffer, "{}\r\n", code as u32)?;
                } else {
                    write!(buffer, "{} {}\r\n", code as u32, msg)?;
                }
            }
            Reply::MultiLine { code, mut lines } => {
                let last = match lines.pop() {
                    Some(last) => last,
                    None => code.default_message().to_string(),
                };
                for line in lines {
                    write!(buffer, "{}-{}\r\n", code as u32, line)?;
                }
                write!(buffer, "{} {}\r\n", code as u32, last)?;
            }
        }
        buf.extend(&buffer);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::controlchan::ReplyCode;
    use pretty_assertions::assert_eq;

    fn encode(reply: Reply) -> String {
        let mut codec = FtpCodec::new();
        let mut buf = BytesMut::new();
        codec.encode(reply, &mut buf).unwrap();
        String::from_utf8(buf.to_vec()).unwrap()
    }

    #[test]
    fn single_line_reply() {
        assert_eq!(encode(Reply::new(ReplyCode::CommandOkay, "Okay then")), "200 Okay then\r\n");
    }

    #[test]
    fn empty_messages_come_from_the_default_table() {
        assert_eq!(encode(Reply::new(ReplyCode::CommandOkay, "")), "200 Command okay\r\n");
    }

    #[test]
    fn multi_line_replies_use_dash_continuation() {
        let reply = Reply::new_multiline(ReplyCode::SystemStatus, vec!["Extensions supported:", "UTF8", "END"]);
        assert_eq!(encode(reply), "211-Extensions supported:\r\n211-UTF8\r\n211 END\r\n");
    }

    #[test]
    fn none_writes_nothing() {
        assert_eq!(encode(Reply::none()), "");
    }

    #[test]
    fn decodes_a_complete_line() {
        let mut codec = FtpCodec::new();
        let mut buf = BytesMut::from("NOOP\r\n".as_bytes());
        let parsed = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(parsed.directive, "NOOP");
    }

    #[test]
    fn waits_for_the_line_terminator() {
        let mut codec = FtpCodec::new();
        let mut buf = BytesMut::from("NO".as_bytes());
        assert!(codec.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(b"OP\r\n");
        let parsed = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(parsed.directive, "NOOP");
    }
}
