use std::collections::HashMap;

use tether_engine::Scope;
use tether_engine::host::{FrameInfo, ScriptThread, ScriptValue, TraceMask, ValueKind};

#[derive(Clone, Debug, PartialEq)]
pub enum FakeValue {
    Nil,
    Bool(bool),
    Num(f64),
    Str(String),
    Table(Vec<(FakeValue, FakeValue)>),
}

impl ScriptValue for FakeValue {
    fn kind(&self) -> ValueKind {
        match self {
            Self::Nil => ValueKind::Nil,
            Self::Bool(_) => ValueKind::Boolean,
            Self::Num(_) => ValueKind::Number,
            Self::Str(_) => ValueKind::String,
            Self::Table(_) => ValueKind::Table,
        }
    }

    fn render(&self) -> String {
        match self {
            Self::Nil => "nil".into(),
            Self::Bool(b) => b.to_string(),
            Self::Num(n) => n.to_string(),
            Self::Str(s) => s.clone(),
            Self::Table(_) => "table".into(),
        }
    }

    fn entries(&self) -> Vec<(Self, Self)> {
        match self {
            Self::Table(entries) => entries.clone(),
            _ => Vec::new(),
        }
    }
}

#[derive(Default)]
struct FakeFrame {
    info: FrameInfo,
    locals: Vec<(String, FakeValue)>,
    upvalues: Vec<(String, FakeValue)>,
}

/// Script thread whose stack is driven by the test.
///
/// Evaluated expressions are single names, resolved through the scope then
/// the globals.
pub struct FakeThread {
    id: u64,
    frames: Vec<FakeFrame>,
    pub globals: HashMap<String, FakeValue>,
    pub mask: TraceMask,
    pub helper: Option<String>,
    pub fail_helper: bool,
}

impl FakeThread {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            frames: Vec::new(),
            globals: HashMap::new(),
            mask: TraceMask::NONE,
            helper: None,
            fail_helper: false,
        }
    }

    /// Pushes a new innermost frame.
    pub fn call(&mut self, source: &str, function_name: &str, line: i64) {
        self.frames.push(FakeFrame {
            info: FrameInfo {
                source: source.into(),
                function_name: function_name.into(),
                current_line: line,
            },
            ..Default::default()
        });
    }

    pub fn ret(&mut self) {
        self.frames.pop();
    }

    pub fn set_local(&mut self, name: &str, value: FakeValue) {
        if let Some(frame) = self.frames.last_mut() {
            frame.locals.push((name.into(), value));
        }
    }

    pub fn set_upvalue(&mut self, name: &str, value: FakeValue) {
        if let Some(frame) = self.frames.last_mut() {
            frame.upvalues.push((name.into(), value));
        }
    }

    pub fn goto(&mut self, line: i64) {
        if let Some(frame) = self.frames.last_mut() {
            frame.info.current_line = line;
        }
    }

    fn frame(&self, level: usize) -> Option<&FakeFrame> {
        self.frames.iter().rev().nth(level)
    }
}

impl ScriptThread for FakeThread {
    type Value = FakeValue;
    type Chunk = String;
    type Error = std::io::Error;

    fn id(&self) -> u64 {
        self.id
    }

    fn has_frame(&self, level: usize) -> bool {
        level < self.frames.len()
    }

    fn frame_info(&mut self, level: usize) -> Result<FrameInfo, Self::Error> {
        self.frame(level)
            .map(|frame| frame.info.clone())
            .ok_or_else(|| std::io::Error::other("no such frame"))
    }

    fn local(&self, level: usize, index: usize) -> Option<(String, FakeValue)> {
        self.frame(level)?.locals.get(index.checked_sub(1)?).cloned()
    }

    fn upvalue(&self, level: usize, index: usize) -> Option<(String, FakeValue)> {
        self.frame(level)?.upvalues.get(index.checked_sub(1)?).cloned()
    }

    fn set_trace_mask(&mut self, mask: TraceMask) {
        self.mask = mask;
    }

    fn run_helper(&mut self, code: &str) -> Result<(), Self::Error> {
        if self.fail_helper {
            return Err(std::io::Error::other("helper rejected"));
        }

        self.helper = Some(code.into());
        Ok(())
    }

    fn compile(&mut self, source: &str) -> Result<String, String> {
        let expr = source.strip_prefix("return ").unwrap_or(source).trim();

        if expr.is_empty() || !expr.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Err(format!("[string \"{expr}\"]:1: unexpected symbol"));
        }

        Ok(expr.into())
    }

    fn execute(&mut self, chunk: String, scope: &Scope<FakeValue>) -> Result<FakeValue, String> {
        scope
            .get(&chunk)
            .or_else(|| self.globals.get(&chunk))
            .cloned()
            .ok_or_else(|| format!("attempt to read undefined variable '{chunk}'"))
    }
}
