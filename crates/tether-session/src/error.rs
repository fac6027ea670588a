/// Session error.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The async runtime of the session could not be created.
    #[error("failed to create session runtime")]
    Runtime(#[source] std::io::Error),

    /// The connection to the IDE could not be established.
    #[error("failed to connect to the IDE at {addr}")]
    Connect {
        /// Address of the IDE.
        addr: String,

        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Debugger engine error.
    #[error(transparent)]
    Engine(#[from] tether_engine::Error),
}

/// Session result.
pub type Result<T> = core::result::Result<T, Error>;
