use crate::eval::EvalContext;
use crate::inspect::StackFrame;

/// Trait for implementing a debug event handler.
///
/// Handler functions are called from script threads, so they must not block
/// on IDE commands.
pub trait EventHandler: Send + Sync {
    /// Function called when a script thread pauses.
    ///
    /// `stack` starts with the innermost frame.
    fn on_break(&self, _thread_id: u64, _stack: Vec<StackFrame>) {}

    /// Function called when an expression was evaluated by a paused thread.
    fn on_eval_result(&self, _ctx: EvalContext) {}
}

impl<H: EventHandler> EventHandler for std::sync::Arc<H> {
    fn on_break(&self, thread_id: u64, stack: Vec<StackFrame>) {
        (**self).on_break(thread_id, stack)
    }

    fn on_eval_result(&self, ctx: EvalContext) {
        (**self).on_eval_result(ctx)
    }
}

impl EventHandler for () {}
