use crate::host::ScriptThread;

/// Execution control action requested by the IDE.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Pause on the next executed line.
    Break,

    /// Resume execution.
    Continue,

    /// Run until the next line of the current function.
    StepOver,

    /// Run until the next executed line.
    StepIn,

    /// Run until the current function returns.
    StepOut,

    /// Detach the debugger and let the script run to completion.
    Stop,
}

/// Source position of a frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    /// Source of the frame's function.
    pub file: String,

    /// Executed line.
    pub line: i64,
}

/// Call depth of a thread, tracked between line events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepthTracker {
    /// Depth when the step started.
    pub origin: usize,

    /// Depth at the last line event.
    pub current: usize,
}

impl DepthTracker {
    fn new<T: ScriptThread>(thread: &T) -> Self {
        let depth = stack_depth(thread, 0);

        Self {
            origin: depth,
            current: depth,
        }
    }

    /// Recomputes the current depth, starting from the last known one.
    fn update<T: ScriptThread>(&mut self, thread: &T) -> usize {
        let floor = (0..=self.current + 1)
            .rev()
            .find(|&level| thread.has_frame(level))
            .map_or(0, |level| level + 1);

        self.current = stack_depth(thread, floor);
        self.current
    }
}

fn stack_depth<T: ScriptThread>(thread: &T, from: usize) -> usize {
    (from..)
        .find(|&level| !thread.has_frame(level))
        .unwrap_or(from)
}

/// Execution control state of the engine.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ExecutionState {
    /// The engine was not started: trace events are ignored.
    #[default]
    Idle,

    /// Only breakpoints pause execution.
    Running,

    /// The next line event of any thread pauses execution.
    Break,

    /// Stepping over calls made from the origin line.
    StepOver {
        /// Stepped thread.
        thread_id: u64,

        /// Call depth of the stepped thread.
        depth: DepthTracker,

        /// Position of the stepped thread when the step started.
        origin: Location,
    },

    /// Stepping into the next executed line.
    StepIn {
        /// Stepped thread.
        thread_id: u64,

        /// Position of the stepped thread when the step started.
        origin: Location,
    },

    /// Stepping out of the current function.
    StepOut {
        /// Stepped thread.
        thread_id: u64,

        /// Call depth of the stepped thread.
        depth: DepthTracker,
    },

    /// The debugger detaches from the next traced thread.
    Stopped,
}

impl ExecutionState {
    /// Creates the stepping state of an action, from the current position of
    /// a paused thread.
    ///
    /// Returns `None` for actions that are not steps, or if the thread's
    /// position cannot be retrieved.
    pub(crate) fn start_step<T: ScriptThread>(action: Action, thread: &mut T) -> Option<Self> {
        let thread_id = thread.id();

        let state = match action {
            Action::StepOver => Self::StepOver {
                thread_id,
                depth: DepthTracker::new(thread),
                origin: location(thread, None)?,
            },
            Action::StepIn => Self::StepIn {
                thread_id,
                origin: location(thread, None)?,
            },
            Action::StepOut => Self::StepOut {
                thread_id,
                depth: DepthTracker::new(thread),
            },
            _ => return None,
        };

        Some(state)
    }

    /// Processes a line event and returns whether the thread must pause.
    pub(crate) fn process_line<T: ScriptThread>(&mut self, thread: &mut T, line: i64) -> bool {
        match self {
            Self::Idle | Self::Running | Self::Stopped => false,
            Self::Break => true,
            Self::StepIn { thread_id, origin } => {
                *thread_id == thread.id()
                    && location(thread, Some(line)).is_some_and(|loc| loc != *origin)
            }
            Self::StepOut { thread_id, depth } => {
                *thread_id == thread.id() && depth.update(thread) < depth.origin
            }
            Self::StepOver {
                thread_id,
                depth,
                origin,
            } => {
                if *thread_id != thread.id() {
                    return false;
                }

                let current = depth.update(thread);

                if current < depth.origin {
                    return true;
                }

                current == depth.origin
                    && line != origin.line
                    && (origin.line < 0
                        || location(thread, Some(line)).is_some_and(|loc| loc.file == origin.file))
            }
        }
    }

    /// Returns the label of the state.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Break => "break",
            Self::StepOver { .. } => "step-over",
            Self::StepIn { .. } => "step-in",
            Self::StepOut { .. } => "step-out",
            Self::Stopped => "stopped",
        }
    }
}

fn location<T: ScriptThread>(thread: &mut T, line: Option<i64>) -> Option<Location> {
    match thread.frame_info(0) {
        Ok(info) => Some(Location {
            line: line.unwrap_or(info.current_line),
            file: info.source,
        }),
        Err(e) => {
            tracing::warn!(error = %e, "failed to retrieve current position");
            None
        }
    }
}
