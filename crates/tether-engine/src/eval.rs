use indexmap::IndexMap;

use crate::host::{ScriptThread, ScriptValue};
use crate::inspect::{self, Variable};

/// Expression evaluation request, and its result once evaluated.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EvalContext {
    /// Expression to evaluate.
    pub expr: String,

    /// Correlation ID chosen by the IDE.
    pub seq: i64,

    /// Level of the frame whose variables are visible to the expression.
    pub stack_level: usize,

    /// Expansion depth of the result.
    pub depth: u32,

    /// Reserved for lazy expansion.
    pub cache_id: i64,

    /// Whether the evaluation succeeded.
    pub success: bool,

    /// Error message of a failed evaluation.
    pub error: String,

    /// Result of a successful evaluation.
    pub result: Option<Variable>,
}

impl EvalContext {
    /// Creates a new evaluation request.
    pub fn new(seq: i64, expr: impl Into<String>, stack_level: usize, depth: u32) -> Self {
        Self {
            expr: expr.into(),
            seq,
            stack_level,
            depth,
            ..Default::default()
        }
    }
}

/// Variables visible to an evaluated expression.
///
/// Names are resolved against the captured locals, then the captured
/// upvalues. Unresolved names are left to the host's global lookup.
#[derive(Clone, Debug)]
pub struct Scope<V> {
    locals: IndexMap<String, V>,
    upvalues: IndexMap<String, V>,
}

impl<V: ScriptValue> Scope<V> {
    /// Captures the locals and upvalues of the frame at the given level.
    ///
    /// Returns `None` if the thread has no such frame.
    pub fn capture<T>(thread: &T, level: usize) -> Option<Self>
    where
        T: ScriptThread<Value = V>,
    {
        if !thread.has_frame(level) {
            return None;
        }

        // later declarations shadow earlier ones
        let locals = inspect::locals(thread, level).collect();
        let upvalues = inspect::upvalues(thread, level).collect();

        Some(Self { locals, upvalues })
    }

    /// Resolves a name within the scope.
    pub fn get(&self, name: &str) -> Option<&V> {
        self.locals.get(name).or_else(|| self.upvalues.get(name))
    }

    /// Captured local variables.
    pub fn locals(&self) -> &IndexMap<String, V> {
        &self.locals
    }

    /// Captured upvalues.
    pub fn upvalues(&self) -> &IndexMap<String, V> {
        &self.upvalues
    }
}

impl<V> Default for Scope<V> {
    fn default() -> Self {
        Self {
            locals: IndexMap::new(),
            upvalues: IndexMap::new(),
        }
    }
}

/// Evaluates an expression in the scope of a thread's frame.
///
/// The outcome is stored in `ctx`. Compilation and runtime failures are
/// reported through [EvalContext::error], never as an engine error.
#[tracing::instrument(
    name = "Evaluate",
    skip_all,
    fields(thread_id = thread.id(), seq = ctx.seq, level = ctx.stack_level)
)]
pub fn evaluate<T: ScriptThread>(thread: &mut T, ctx: &mut EvalContext) -> bool {
    let Some(scope) = Scope::capture(thread, ctx.stack_level) else {
        return fail(ctx, format!("invalid stack level {}", ctx.stack_level));
    };

    let chunk = match thread.compile(&format!("return {}", ctx.expr)) {
        Ok(chunk) => chunk,
        Err(e) => return fail(ctx, e),
    };

    match thread.execute(chunk, &scope) {
        Ok(value) => {
            ctx.result = Some(Variable::build(ctx.expr.clone(), &value, ctx.depth));
            ctx.success = true;
            ctx.error.clear();
            true
        }
        Err(e) => fail(ctx, e),
    }
}

fn fail(ctx: &mut EvalContext, error: String) -> bool {
    tracing::debug!(error, "evaluation failed");

    ctx.success = false;
    ctx.error = error;
    ctx.result = None;
    false
}
