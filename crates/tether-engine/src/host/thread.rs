use super::{ScriptValue, TraceMask};
use crate::eval::Scope;

/// Source location and name of a call frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameInfo {
    /// Source (chunk) name of the frame's function.
    pub source: String,

    /// Name of the frame's function (empty if unknown).
    pub function_name: String,

    /// Line currently executed by the frame.
    ///
    /// Negative for frames without source information (e.g., builtins).
    pub current_line: i64,
}

impl FrameInfo {
    /// Returns whether the frame executes script code.
    pub const fn is_script(&self) -> bool {
        self.current_line >= 0
    }
}

/// Trait implementing the introspection and execution logic of a scripting
/// host thread.
///
/// Frame levels start at 0 for the innermost script frame. Local variable
/// and upvalue indexes start at 1.
///
/// The implementor forwards every trace event selected by the current
/// [mask](Self::set_trace_mask) to [Engine::hook](crate::Engine::hook),
/// synchronously, on the thread running the script.
pub trait ScriptThread {
    /// Type of a script value.
    type Value: ScriptValue;

    /// Type of a compiled chunk.
    type Chunk;

    /// Error returned by introspection functions.
    type Error: std::error::Error;

    /// Returns the thread's ID.
    fn id(&self) -> u64;

    /// Returns whether a frame exists at the given level.
    fn has_frame(&self, level: usize) -> bool;

    /// Retrieves the source location of the frame at the given level.
    fn frame_info(&mut self, level: usize) -> Result<FrameInfo, Self::Error>;

    /// Retrieves the local variable at the given index of a frame.
    ///
    /// Returns `None` past the last local variable.
    fn local(&self, level: usize, index: usize) -> Option<(String, Self::Value)>;

    /// Retrieves the upvalue at the given index of a frame's function.
    ///
    /// Returns `None` past the last upvalue.
    fn upvalue(&self, level: usize, index: usize) -> Option<(String, Self::Value)>;

    /// Selects the trace events forwarded to the trace hook.
    fn set_trace_mask(&mut self, mask: TraceMask);

    /// Runs the debugger's helper code within the thread.
    fn run_helper(&mut self, code: &str) -> Result<(), Self::Error>;

    /// Maps a chunk source name to the file path reported to the IDE.
    ///
    /// Returns `None` when the host has no mapping for `source`.
    fn resolve_source(&mut self, _source: &str) -> Option<String> {
        None
    }

    /// Compiles a chunk of source code.
    ///
    /// On failure, the compiler's error message is returned.
    fn compile(&mut self, source: &str) -> Result<Self::Chunk, String>;

    /// Executes a compiled chunk with `scope` as its only visible environment
    /// (falling back to global lookup for names missing from `scope`).
    ///
    /// On success, the first returned value is returned. On failure, the
    /// runtime error message is returned.
    fn execute(
        &mut self,
        chunk: Self::Chunk,
        scope: &Scope<Self::Value>,
    ) -> Result<Self::Value, String>;
}
