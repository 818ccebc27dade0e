//! Contains code pertaining to the FTP *control* channel

pub mod command;

pub(crate) mod handler;

pub(crate) mod control_loop;
pub(crate) use control_loop::{spawn_control_channel_loop, ControlParams};

pub(super) mod commands;

pub(crate) mod registry;

pub(crate) mod line_parser;

pub(crate) mod codecs;
pub(crate) use codecs::FtpCodec;

pub(crate) mod reply;
pub(crate) use reply::{Reply, ReplyCode};

mod error;
pub(crate) use error::{ControlChanError, ControlChanErrorKind};
