//! This crate implements the wire protocol spoken between the debugger and
//! the IDE.
//!
//! Every message is made of two `\n`-terminated lines: the decimal
//! [MessageId], followed by the JSON payload of the message.
//!
//! The [MessageCodec] decodes the [Request]s sent by the IDE, and encodes the
//! [Notification]s sent by the debugger. Lines longer than
//! [MAX_LINE_LENGTH] are rejected.

mod codec;
mod error;

/// Module containing the message definitions.
pub mod message;

pub use self::codec::{MAX_LINE_LENGTH, MessageCodec};
pub use self::error::{Error, Result};
pub use self::message::{MessageId, Notification, Request};
