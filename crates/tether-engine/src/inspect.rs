use crate::host::{FrameInfo, ScriptThread, ScriptValue, ValueKind};

/// Marker prefixing the names of compiler-generated variables.
const INTERNAL_NAME_MARKER: char = '(';

/// Inspected script value, as surfaced to the IDE.
#[derive(Clone, Debug, PartialEq)]
pub struct Variable {
    /// Name of the variable (or rendered key of a table entry).
    pub name: String,

    /// Type of the variable's name (or of the table entry's key).
    pub name_kind: ValueKind,

    /// Rendered value (empty for tables).
    pub value: String,

    /// Type of the value.
    pub value_kind: ValueKind,

    /// Entries of a table value, up to the requested depth.
    pub children: Vec<Variable>,

    /// Reserved for lazy expansion (always 0).
    pub cache_id: i64,
}

impl Variable {
    /// Builds the variable tree of a script value.
    ///
    /// Table entries are expanded in the value's iteration order, up to
    /// `depth` levels. A table at depth 0 has no children.
    pub fn build<V: ScriptValue>(name: impl Into<String>, value: &V, depth: u32) -> Self {
        Self::build_with_name_kind(name.into(), ValueKind::String, value, depth)
    }

    fn build_with_name_kind<V: ScriptValue>(
        name: String,
        name_kind: ValueKind,
        value: &V,
        depth: u32,
    ) -> Self {
        let value_kind = value.kind();

        let (rendered, children) = if value_kind.is_composite() {
            let children = if depth > 0 {
                value
                    .entries()
                    .iter()
                    .map(|(key, value)| {
                        Self::build_with_name_kind(key.render(), key.kind(), value, depth - 1)
                    })
                    .collect()
            } else {
                Vec::new()
            };

            (String::new(), children)
        } else {
            (value.render(), Vec::new())
        };

        Self {
            name,
            name_kind,
            value: rendered,
            value_kind,
            children,
            cache_id: 0,
        }
    }
}

/// Call frame snapshot, as surfaced to the IDE.
#[derive(Clone, Debug, PartialEq)]
pub struct StackFrame {
    /// Level of the frame (0 is the innermost frame).
    pub level: usize,

    /// Source file of the frame.
    pub file: String,

    /// Name of the frame's function.
    pub function_name: String,

    /// Line currently executed by the frame.
    pub line: i64,

    /// Local variables of the frame, in declaration order.
    pub locals: Vec<Variable>,

    /// Upvalues of the frame's function, in capture order.
    pub upvalues: Vec<Variable>,
}

/// Returns the file of a frame, as reported to the IDE.
pub(crate) fn frame_file<T: ScriptThread>(thread: &mut T, info: &FrameInfo) -> String {
    if info.is_script() {
        if let Some(file) = thread.resolve_source(&info.source) {
            return file;
        }
    }

    info.source.clone()
}

/// Iterates over the non-internal local variables of a frame.
pub(crate) fn locals<T: ScriptThread>(
    thread: &T,
    level: usize,
) -> impl Iterator<Item = (String, T::Value)> + '_ {
    (1..)
        .map_while(move |i| thread.local(level, i))
        .filter(|(name, _)| !name.starts_with(INTERNAL_NAME_MARKER))
}

/// Iterates over the upvalues of a frame's function.
pub(crate) fn upvalues<T: ScriptThread>(
    thread: &T,
    level: usize,
) -> impl Iterator<Item = (String, T::Value)> + '_ {
    (1..).map_while(move |i| thread.upvalue(level, i))
}

/// Walks the call stack of a thread, from the innermost frame.
///
/// Variables are expanded up to `depth` levels. If the metadata of a frame
/// cannot be retrieved, the frames collected so far are returned.
#[tracing::instrument(name = "CollectStack", skip(thread), fields(thread_id = thread.id()))]
pub fn collect_stack<T: ScriptThread>(thread: &mut T, depth: u32) -> Vec<StackFrame> {
    let mut frames = Vec::new();
    let mut level = 0;

    while thread.has_frame(level) {
        let info = match thread.frame_info(level) {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!(level, error = %e, "failed to retrieve frame info");
                break;
            }
        };

        let file = frame_file(thread, &info);

        let locals = locals(thread, level)
            .map(|(name, value)| Variable::build(name, &value, depth))
            .collect();

        let upvalues = upvalues(thread, level)
            .map(|(name, value)| Variable::build(name, &value, depth))
            .collect();

        frames.push(StackFrame {
            level,
            file,
            function_name: info.function_name,
            line: info.current_line,
            locals,
            upvalues,
        });

        level += 1;
    }

    frames
}
