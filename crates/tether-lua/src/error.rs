/// Error type of this crate.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The Lua state was created without the `debug` library.
    #[error("the `debug` library is not loaded")]
    MissingDebugLibrary,

    /// No call frame exists at the requested level.
    #[error("no call frame at level {0}")]
    NoFrame(usize),

    /// Error raised by the Lua state.
    #[error(transparent)]
    Lua(#[from] mlua::Error),
}

/// Result type of this crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Returns the message of a Lua error, as reported by the interpreter.
///
/// The stack traceback appended to runtime errors is stripped.
pub(crate) fn lua_message(error: &mlua::Error) -> String {
    let message = match error {
        mlua::Error::SyntaxError { message, .. } | mlua::Error::RuntimeError(message) => {
            message.clone()
        }
        mlua::Error::CallbackError { cause, .. } => return lua_message(cause),
        e => e.to_string(),
    };

    match message.split_once("\nstack traceback:") {
        Some((message, _)) => message.to_owned(),
        None => message,
    }
}
