//! This crate connects the debugger engine to an IDE.
//!
//! A [Session] dials the IDE over TCP, then serves its requests (breakpoint
//! registration, execution control, expression evaluation) until the
//! connection is closed, at which point every attached script thread is
//! detached.
//!
//! ```no_run
//! use tether_session::{Session, SessionConfig};
//!
//! # fn main() -> tether_session::Result<()> {
//! let session = Session::connect(&SessionConfig::default())?;
//!
//! // breakpoints are registered once the IDE is ready
//! session.wait_for_ide();
//! # Ok(())
//! # }
//! ```

mod config;
mod convert;
mod error;
mod session;

pub use self::config::{DEFAULT_HOST, DEFAULT_PORT, SessionConfig};
pub use self::error::{Error, Result};
pub use self::session::{Notifier, Session};
