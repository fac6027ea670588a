mod builder;

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

pub use self::builder::{Builder, DEFAULT_VARIABLE_DEPTH};
use self::builder::NeedsHandler;
use crate::breakpoint::{BreakPoint, BreakPointRegistry};
use crate::error::{Error, Result};
use crate::eval::{self, EvalContext};
use crate::handler::EventHandler;
use crate::host::{ScriptThread, TraceEvent, TraceMask};
use crate::inspect::{self, collect_stack};
use crate::pause::{PauseController, PauseSignal};
use crate::stepping::{Action, ExecutionState};

/// Trace mask of the threads attached before the engine is started.
///
/// Their attachment completes on the first trace event following
/// [start](Engine::start).
pub const DEFERRED_ATTACH_MASK: TraceMask = TraceMask {
    call: false,
    ret: false,
    line: false,
    count: Some(1000),
};

/// Debugger engine.
///
/// The engine is shared between the script threads, which report their
/// trace events through [hook](Self::hook), and the IDE session, which
/// drives it through [do_action](Self::do_action),
/// [evaluate](Self::evaluate) and the breakpoint functions.
pub struct Engine<H> {
    /// Debug event handler.
    handler: H,

    /// Expansion depth of the variables reported on pause.
    variable_depth: u32,

    breakpoints: BreakPointRegistry,
    state: Mutex<ExecutionState>,
    pause: PauseController,

    /// Helper code run by attached threads (set on start).
    helper: Mutex<Option<String>>,

    /// IDs of the threads attached before start.
    deferred: Mutex<HashSet<u64>>,
}

impl Engine<()> {
    /// Creates an engine builder.
    pub const fn builder() -> Builder<NeedsHandler> {
        Builder::new()
    }
}

impl<H: EventHandler> Engine<H> {
    fn new(handler: H, variable_depth: u32) -> Self {
        Self {
            handler,
            variable_depth,
            breakpoints: BreakPointRegistry::default(),
            state: Mutex::new(ExecutionState::Idle),
            pause: PauseController::default(),
            helper: Mutex::new(None),
            deferred: Mutex::new(HashSet::new()),
        }
    }

    fn helper(&self) -> Option<String> {
        self.helper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lock_deferred(&self) -> MutexGuard<'_, HashSet<u64>> {
        self.deferred.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_state(&self) -> MutexGuard<'_, ExecutionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the event handler of the engine.
    pub const fn handler(&self) -> &H {
        &self.handler
    }

    /// Returns a snapshot of the execution state.
    pub fn state(&self) -> ExecutionState {
        self.lock_state().clone()
    }

    /// Returns the ID of the paused thread, if any.
    pub fn paused_thread(&self) -> Option<u64> {
        self.pause.paused_thread()
    }

    /// Starts the engine.
    ///
    /// `helper` is the code run by every thread on [attach](Self::attach),
    /// and `extensions` are the file extensions tried when matching chunk
    /// names against breakpoints.
    #[tracing::instrument(name = "Start", skip_all, fields(extensions = ?extensions))]
    pub fn start(&self, helper: impl Into<String>, extensions: Vec<String>) {
        *self.helper.lock().unwrap_or_else(PoisonError::into_inner) = Some(helper.into());
        self.breakpoints.set_extensions(extensions);

        let mut state = self.lock_state();

        if *state == ExecutionState::Idle {
            *state = ExecutionState::Running;
        }

        tracing::info!("debugger started");
    }

    /// Attaches a script thread to the engine.
    ///
    /// The helper code is run within the thread, and its trace events are
    /// enabled. On an engine that is not started yet, the thread is traced
    /// with [DEFERRED_ATTACH_MASK] and its attachment completes on its first
    /// trace event once the engine is started.
    #[tracing::instrument(name = "Attach", skip_all, fields(thread_id = thread.id()))]
    pub fn attach<T: ScriptThread>(&self, thread: &mut T) -> Result<()> {
        let Some(helper) = self.helper() else {
            self.lock_deferred().insert(thread.id());
            thread.set_trace_mask(DEFERRED_ATTACH_MASK);

            tracing::info!("debugger not started, attach deferred");
            return Ok(());
        };

        self.attach_with(thread, &helper)
    }

    fn attach_with<T: ScriptThread>(&self, thread: &mut T, helper: &str) -> Result<()> {
        thread.run_helper(helper).map_err(|e| Error::Helper {
            thread_id: thread.id(),
            message: e.to_string(),
        })?;

        thread.set_trace_mask(TraceMask::ALL);

        tracing::info!("thread attached");

        Ok(())
    }

    /// Completes the attachment of a thread attached before start.
    ///
    /// Returns `false` if the thread is not waiting for its attachment.
    fn complete_deferred_attach<T: ScriptThread>(&self, thread: &mut T) -> bool {
        let thread_id = thread.id();

        if !self.lock_deferred().contains(&thread_id) {
            return false;
        }

        let Some(helper) = self.helper() else {
            return true;
        };

        self.lock_deferred().remove(&thread_id);

        let _span = tracing::info_span!("Attach", thread_id).entered();

        if let Err(e) = self.attach_with(thread, &helper) {
            // the thread runs untraced
            tracing::error!(error = %e, "deferred attach failed, thread detached");
            thread.set_trace_mask(TraceMask::NONE);
        }

        true
    }

    /// Processes a trace event of a script thread.
    ///
    /// If the event pauses the thread, this function blocks until the IDE
    /// resumes it.
    pub fn hook<T: ScriptThread>(&self, thread: &mut T, event: TraceEvent) {
        if self.complete_deferred_attach(thread) {
            return;
        }

        let TraceEvent::Line(line) = event else {
            return;
        };

        {
            let mut state = self.lock_state();

            match *state {
                ExecutionState::Idle => return,
                ExecutionState::Stopped => {
                    thread.set_trace_mask(TraceMask::NONE);
                    *state = ExecutionState::Running;

                    tracing::info!(thread_id = thread.id(), "thread detached");
                    return;
                }
                _ => (),
            }
        }

        // breakpoints take precedence over stepping
        let should_break =
            self.hits_breakpoint(thread, line) || self.lock_state().process_line(thread, line);

        if should_break {
            self.handle_break(thread);
        }
    }

    fn hits_breakpoint<T: ScriptThread>(&self, thread: &mut T, line: i64) -> bool {
        if !self.breakpoints.has_line(line) {
            return false;
        }

        let info = match thread.frame_info(0) {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!(error = %e, "failed to retrieve current position");
                return false;
            }
        };

        let file = inspect::frame_file(thread, &info);

        self.breakpoints.find(&file, line).is_some()
    }

    #[tracing::instrument(name = "Break", skip_all, fields(thread_id = thread.id()))]
    fn handle_break<T: ScriptThread>(&self, thread: &mut T) {
        let thread_id = thread.id();

        let pause = match self.pause.claim(thread_id) {
            Ok(pause) => pause,
            Err(e) => {
                tracing::warn!(error = %e, "pause rejected");
                return;
            }
        };

        thread.set_trace_mask(TraceMask::LINE);

        let stack = collect_stack(thread, self.variable_depth);

        tracing::info!(frames = stack.len(), "thread paused");

        self.handler.on_break(thread_id, stack);

        while let Some(signal) = pause.wait() {
            match signal {
                PauseSignal::Evaluate(mut ctx) => {
                    thread.set_trace_mask(TraceMask::NONE);
                    eval::evaluate(thread, &mut ctx);
                    thread.set_trace_mask(TraceMask::LINE);

                    self.handler.on_eval_result(ctx);
                }
                PauseSignal::Resume(action) => {
                    self.resume_with(thread, action);
                    break;
                }
            }
        }
    }

    /// Applies the action resuming the current (paused) thread.
    fn resume_with<T: ScriptThread>(&self, thread: &mut T, action: Action) {
        let next = match action {
            Action::Break | Action::Continue => ExecutionState::Running,
            Action::Stop => {
                thread.set_trace_mask(TraceMask::NONE);
                ExecutionState::Running
            }
            Action::StepOver | Action::StepIn | Action::StepOut => {
                ExecutionState::start_step(action, thread).unwrap_or_else(|| {
                    tracing::warn!(?action, "failed to start step, resuming");
                    ExecutionState::Running
                })
            }
        };

        tracing::info!(state = next.label(), "thread resumed");

        *self.lock_state() = next;
    }

    /// Executes an execution control action requested by the IDE.
    ///
    /// Except for [Action::Break], actions apply to the paused thread, if
    /// any.
    #[tracing::instrument(name = "Action", skip(self))]
    pub fn do_action(&self, action: Action) {
        if action == Action::Break {
            self.transition(ExecutionState::Break);
            return;
        }

        match self.pause.resume(action) {
            Ok(thread_id) => tracing::debug!(thread_id, "paused thread released"),
            Err(_) => match action {
                Action::Continue => self.transition(ExecutionState::Running),
                Action::Stop => self.transition(ExecutionState::Stopped),
                _ => tracing::warn!("no paused thread, action ignored"),
            },
        }
    }

    fn transition(&self, next: ExecutionState) {
        let mut state = self.lock_state();

        if *state == ExecutionState::Idle {
            tracing::warn!(state = next.label(), "debugger not started, state unchanged");
            return;
        }

        tracing::info!(from = state.label(), to = next.label(), "state changed");

        *state = next;
    }

    /// Queues the evaluation of an expression within the paused thread.
    ///
    /// The result is delivered to the event handler once evaluated.
    pub fn evaluate(&self, ctx: EvalContext) -> Result<()> {
        self.pause.evaluate(ctx)
    }

    /// Registers a breakpoint.
    pub fn add_breakpoint(&self, bp: BreakPoint) {
        self.breakpoints.add(bp);
    }

    /// Removes the first breakpoint registered at the given location.
    pub fn remove_breakpoint(&self, file: &str, line: i64) {
        self.breakpoints.remove(file, line);
    }

    /// Removes every breakpoint.
    pub fn remove_all_breakpoints(&self) {
        self.breakpoints.remove_all();
    }

    /// Finds the breakpoint matching the given location.
    pub fn find_breakpoint(&self, file: &str, line: i64) -> Option<BreakPoint> {
        self.breakpoints.find(file, line)
    }

    /// Returns every registered breakpoint.
    pub fn breakpoints(&self) -> Vec<BreakPoint> {
        self.breakpoints.list()
    }
}
