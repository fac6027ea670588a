mod thread;
mod value;

pub use self::thread::{FrameInfo, ScriptThread};
pub use self::value::{ScriptValue, ValueKind};

/// Event reported by the scripting host to the trace hook.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceEvent {
    /// A function is being called.
    Call,

    /// A function is returning.
    Return,

    /// The interpreter reached a new source line.
    Line(i64),

    /// The instruction counter expired.
    Count,
}

impl TraceEvent {
    /// Returns whether this event is selected by the given mask.
    pub const fn is_selected_by(&self, mask: TraceMask) -> bool {
        match self {
            Self::Call => mask.call,
            Self::Return => mask.ret,
            Self::Line(_) => mask.line,
            Self::Count => mask.count.is_some(),
        }
    }
}

/// Selection of trace events a scripting host reports to the trace hook.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TraceMask {
    /// Report function calls.
    pub call: bool,

    /// Report function returns.
    pub ret: bool,

    /// Report new source lines.
    pub line: bool,

    /// Report every `count` executed instructions.
    pub count: Option<u32>,
}

impl TraceMask {
    /// Tracing disabled.
    pub const NONE: Self = Self {
        call: false,
        ret: false,
        line: false,
        count: None,
    };

    /// Line events only (used while a thread is being stepped).
    pub const LINE: Self = Self {
        call: false,
        ret: false,
        line: true,
        count: None,
    };

    /// Call, return and line events (installed on attach).
    pub const ALL: Self = Self {
        call: true,
        ret: true,
        line: true,
        count: None,
    };

    /// Returns whether no event is selected.
    pub const fn is_empty(&self) -> bool {
        !self.call && !self.ret && !self.line && self.count.is_none()
    }
}
