//! Conversions between engine types and wire messages.

use tether_engine::{Action, BreakPoint, EvalContext, StackFrame, Variable};
use tether_protocol::message::{self, DebugAction, EvalReq, EvalRsp};

pub fn action(action: DebugAction) -> Action {
    match action {
        DebugAction::Break => Action::Break,
        DebugAction::Continue => Action::Continue,
        DebugAction::StepOver => Action::StepOver,
        DebugAction::StepIn => Action::StepIn,
        DebugAction::StepOut => Action::StepOut,
        DebugAction::Stop => Action::Stop,
    }
}

/// Hit counts and conditions are not evaluated, the condition is only kept.
pub fn breakpoint(bp: message::BreakPoint) -> BreakPoint {
    BreakPoint::new(&bp.file, bp.line, bp.condition)
}

/// Converts an evaluation request.
///
/// A negative stack level is mapped to a level that does not exist, so that
/// the evaluation fails with an explanatory error. A negative depth is
/// treated as 0.
pub fn eval_context(req: EvalReq) -> EvalContext {
    let stack_level = usize::try_from(req.stack_level).unwrap_or(usize::MAX);
    let depth = u32::try_from(req.depth.max(0)).unwrap_or(u32::MAX);

    EvalContext {
        cache_id: req.cache_id,
        ..EvalContext::new(req.seq, req.expr, stack_level, depth)
    }
}

pub fn eval_response(ctx: EvalContext) -> EvalRsp {
    EvalRsp {
        seq: ctx.seq,
        success: ctx.success,
        error: ctx.error,
        value: ctx.result.map(variable),
    }
}

pub fn stack(frame: StackFrame) -> message::Stack {
    message::Stack {
        level: i64::try_from(frame.level).unwrap_or(i64::MAX),
        file: frame.file,
        function_name: frame.function_name,
        line: frame.line,
        local_variables: frame.locals.into_iter().map(variable).collect(),
        upvalue_variables: frame.upvalues.into_iter().map(variable).collect(),
    }
}

pub fn variable(var: Variable) -> message::Variable {
    message::Variable {
        name: var.name,
        name_type: var.name_kind.code(),
        value: var.value,
        value_type: var.value_kind.code(),
        value_type_name: var.value_kind.name().to_owned(),
        children: var.children.into_iter().map(variable).collect(),
        cache_id: var.cache_id,
    }
}
