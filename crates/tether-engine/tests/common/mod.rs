mod handler;
mod host;

pub use self::handler::{DebugEvent, RecordingHandler, next_break, next_eval};
pub use self::host::{FakeThread, FakeValue};
