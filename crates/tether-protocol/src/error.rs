use crate::message::MessageId;

/// Protocol error.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O error on the underlying stream.
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// The message ID line is not a decimal integer.
    #[error("malformed message header: {0:?}")]
    BadHeader(String),

    /// A message line exceeds the maximum line length.
    #[error("message line longer than {limit} bytes")]
    LineTooLong {
        /// Maximum line length, in bytes.
        limit: usize,
    },

    /// The payload line of a message is not valid JSON.
    #[error("malformed {id:?} payload")]
    BadPayload {
        /// ID of the malformed message.
        id: MessageId,

        /// JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A message could not be serialized.
    #[error("failed to serialize {id:?} message")]
    Serialize {
        /// ID of the message.
        id: MessageId,

        /// JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Protocol result.
pub type Result<T> = core::result::Result<T, Error>;
