/// Error type of this crate.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The one-time helper code failed to run on an attached thread.
    ///
    /// This is the only error that should abort a debugging session.
    #[error("failed to run helper code on thread {thread_id}: {message}")]
    Helper {
        /// ID of the thread the helper was run on.
        thread_id: u64,

        /// Error reported by the scripting host.
        message: String,
    },

    /// A thread requested a pause while another thread is already paused.
    #[error("thread {paused} is already paused, rejecting pause of thread {requested}")]
    PauseBusy {
        /// ID of the thread currently paused.
        paused: u64,

        /// ID of the thread whose pause was rejected.
        requested: u64,
    },

    /// A command requiring a paused thread arrived while none is paused.
    #[error("no thread is paused")]
    NotPaused,
}

/// Result type of this crate.
pub type Result<T> = core::result::Result<T, Error>;
