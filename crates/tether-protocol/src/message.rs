use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::error::{Error, Result};

/// Identifier of a protocol message.
#[derive(Serialize_repr, Deserialize_repr, Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum MessageId {
    /// Unknown message.
    Unknown = 0,

    /// IDE handshake (helper code, file extensions).
    InitReq = 1,

    /// Response to [InitReq](Self::InitReq).
    InitRsp = 2,

    /// IDE ready, the scripts may run.
    ReadyReq = 3,

    /// Response to [ReadyReq](Self::ReadyReq).
    ReadyRsp = 4,

    /// Breakpoint registration.
    AddBreakPointReq = 5,

    /// Response to [AddBreakPointReq](Self::AddBreakPointReq).
    AddBreakPointRsp = 6,

    /// Breakpoint removal.
    RemoveBreakPointReq = 7,

    /// Response to [RemoveBreakPointReq](Self::RemoveBreakPointReq).
    RemoveBreakPointRsp = 8,

    /// Execution control action.
    ActionReq = 9,

    /// Response to [ActionReq](Self::ActionReq).
    ActionRsp = 10,

    /// Expression evaluation.
    EvalReq = 11,

    /// Result of an expression evaluation.
    EvalRsp = 12,

    /// A script thread paused.
    BreakNotify = 13,

    /// The debugger attached to a script thread.
    AttachedNotify = 14,

    /// Trace hook installation.
    StartHookReq = 15,

    /// Response to [StartHookReq](Self::StartHookReq).
    StartHookRsp = 16,

    /// Log message.
    LogNotify = 17,
}

impl MessageId {
    /// Returns the message ID with the given code.
    pub const fn from_code(code: i32) -> Option<Self> {
        let id = match code {
            0 => Self::Unknown,
            1 => Self::InitReq,
            2 => Self::InitRsp,
            3 => Self::ReadyReq,
            4 => Self::ReadyRsp,
            5 => Self::AddBreakPointReq,
            6 => Self::AddBreakPointRsp,
            7 => Self::RemoveBreakPointReq,
            8 => Self::RemoveBreakPointRsp,
            9 => Self::ActionReq,
            10 => Self::ActionRsp,
            11 => Self::EvalReq,
            12 => Self::EvalRsp,
            13 => Self::BreakNotify,
            14 => Self::AttachedNotify,
            15 => Self::StartHookReq,
            16 => Self::StartHookRsp,
            17 => Self::LogNotify,
            _ => return None,
        };

        Some(id)
    }

    /// Returns the code of the message ID.
    pub const fn code(self) -> i32 {
        self as i32
    }
}

/// Execution control action.
#[derive(Serialize_repr, Deserialize_repr, Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum DebugAction {
    /// Pause on the next executed line.
    Break = 0,

    /// Resume execution.
    Continue = 1,

    /// Step over the current line.
    StepOver = 2,

    /// Step into the next executed line.
    StepIn = 3,

    /// Step out of the current function.
    StepOut = 4,

    /// Detach the debugger.
    Stop = 5,
}

/// Payload of [MessageId::InitReq].
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InitReq {
    /// Helper code to run within every script thread.
    #[serde(default)]
    pub emmy_helper: String,

    /// File extensions of the script files.
    #[serde(default)]
    pub ext: Vec<String>,
}

/// Breakpoint location.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BreakPoint {
    /// File of the breakpoint.
    pub file: String,

    /// Line of the breakpoint.
    pub line: i64,

    /// Condition of the breakpoint (ignored).
    #[serde(default)]
    pub condition: String,

    /// Hit count of the breakpoint (ignored).
    #[serde(default)]
    pub hit_count: i64,
}

/// Payload of [MessageId::AddBreakPointReq].
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AddBreakPointReq {
    /// Whether the registered breakpoints are removed first.
    #[serde(default)]
    pub clear: bool,

    /// Breakpoints to register.
    #[serde(default)]
    pub break_points: Vec<BreakPoint>,
}

/// Payload of [MessageId::RemoveBreakPointReq].
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoveBreakPointReq {
    /// Breakpoints to remove.
    #[serde(default)]
    pub break_points: Vec<BreakPoint>,
}

/// Payload of [MessageId::ActionReq].
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ActionReq {
    /// Requested action.
    pub action: DebugAction,
}

/// Payload of [MessageId::EvalReq].
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EvalReq {
    /// Correlation ID of the evaluation.
    pub seq: i64,

    /// Expression to evaluate.
    pub expr: String,

    /// Level of the frame to evaluate the expression in.
    #[serde(default)]
    pub stack_level: i64,

    /// Expansion depth of the result.
    #[serde(default)]
    pub depth: i64,

    /// Reserved.
    #[serde(default)]
    pub cache_id: i64,
}

/// Inspected variable.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    /// Name of the variable.
    pub name: String,

    /// Type code of the name.
    pub name_type: i32,

    /// Rendered value.
    pub value: String,

    /// Type code of the value.
    pub value_type: i32,

    /// Type name of the value.
    pub value_type_name: String,

    /// Entries of a table value.
    pub children: Vec<Variable>,

    /// Reserved.
    pub cache_id: i64,
}

/// Call frame of a paused thread.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Stack {
    /// Level of the frame (0 is the innermost frame).
    pub level: i64,

    /// Source file of the frame.
    pub file: String,

    /// Function of the frame.
    pub function_name: String,

    /// Executed line.
    pub line: i64,

    /// Local variables of the frame.
    pub local_variables: Vec<Variable>,

    /// Upvalues of the frame's function.
    pub upvalue_variables: Vec<Variable>,
}

/// Payload of [MessageId::BreakNotify].
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct BreakNotify {
    /// Always [MessageId::BreakNotify].
    pub cmd: MessageId,

    /// Call stack of the paused thread, from the innermost frame.
    pub stacks: Vec<Stack>,
}

impl BreakNotify {
    /// Creates a break notification.
    pub const fn new(stacks: Vec<Stack>) -> Self {
        Self {
            cmd: MessageId::BreakNotify,
            stacks,
        }
    }
}

/// Payload of [MessageId::EvalRsp].
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct EvalRsp {
    /// Correlation ID of the evaluation.
    pub seq: i64,

    /// Whether the evaluation succeeded.
    pub success: bool,

    /// Error message of a failed evaluation.
    pub error: String,

    /// Result of a successful evaluation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Variable>,
}

/// Message sent by the IDE.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    /// Debugger initialization.
    Init(InitReq),

    /// The IDE is ready.
    Ready,

    /// Breakpoint registration.
    AddBreakPoint(AddBreakPointReq),

    /// Breakpoint removal.
    RemoveBreakPoint(RemoveBreakPointReq),

    /// Execution control action.
    Action(ActionReq),

    /// Expression evaluation.
    Eval(EvalReq),

    /// Message that is not a known request (skipped).
    Unknown(i32),
}

impl Request {
    /// Decodes a request from its ID code and JSON payload.
    pub fn decode(code: i32, payload: &[u8]) -> Result<Self> {
        let Some(id) = MessageId::from_code(code) else {
            return Ok(Self::Unknown(code));
        };

        let parse_err = |source| Error::BadPayload { id, source };

        let req = match id {
            MessageId::InitReq => Self::Init(serde_json::from_slice(payload).map_err(parse_err)?),
            MessageId::ReadyReq => Self::Ready,
            MessageId::AddBreakPointReq => {
                Self::AddBreakPoint(serde_json::from_slice(payload).map_err(parse_err)?)
            }
            MessageId::RemoveBreakPointReq => {
                Self::RemoveBreakPoint(serde_json::from_slice(payload).map_err(parse_err)?)
            }
            MessageId::ActionReq => Self::Action(serde_json::from_slice(payload).map_err(parse_err)?),
            MessageId::EvalReq => Self::Eval(serde_json::from_slice(payload).map_err(parse_err)?),
            _ => Self::Unknown(code),
        };

        Ok(req)
    }
}

/// Message sent by the debugger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    /// A script thread paused.
    Break(BreakNotify),

    /// Result of an expression evaluation.
    EvalRsp(EvalRsp),
}

impl Notification {
    /// Returns the ID of the message.
    pub const fn id(&self) -> MessageId {
        match self {
            Self::Break(_) => MessageId::BreakNotify,
            Self::EvalRsp(_) => MessageId::EvalRsp,
        }
    }

    pub(crate) fn to_json(&self) -> Result<Vec<u8>> {
        let res = match self {
            Self::Break(notify) => serde_json::to_vec(notify),
            Self::EvalRsp(rsp) => serde_json::to_vec(rsp),
        };

        res.map_err(|source| Error::Serialize {
            id: self.id(),
            source,
        })
    }
}
