use std::cell::RefCell;
use std::rc::Rc;

use mlua::{DebugEvent, Function, HookTriggers, Lua, Table, Value, VmState};
use tether_engine::Scope;
use tether_engine::host::{FrameInfo, ScriptThread, TraceEvent, TraceMask};

use crate::error::{Error, Result, lua_message};
use crate::value::LuaValue;

/// Chunk name of evaluated expressions.
const EVAL_CHUNK: &str = "=eval";

/// Chunk name of the debugger helper code.
const HELPER_CHUNK: &str = "=helper";

/// Upvalue holding the environment of Lua 5.4 functions.
const ENV_UPVALUE: &str = "_ENV";

/// Levels passed to the `debug` functions are relative to their own frame.
const LEVEL_OFFSET: usize = 1;

/// Function receiving the trace events of a Lua state.
pub(crate) type TraceHook = dyn Fn(&mut LuaThread<'_>, TraceEvent);

/// Functions of the `debug` library, captured when the host is created.
pub(crate) struct Introspection {
    getinfo: Function,
    getlocal: Function,
    getupvalue: Function,
}

impl Introspection {
    pub fn capture(lua: &Lua) -> Result<Self> {
        let debug: Table = lua
            .globals()
            .get("debug")
            .map_err(|_| Error::MissingDebugLibrary)?;

        Ok(Self {
            getinfo: debug.get("getinfo")?,
            getlocal: debug.get("getlocal")?,
            getupvalue: debug.get("getupvalue")?,
        })
    }
}

/// State shared by a host and the hooks it installs.
pub(crate) struct Shared {
    pub id: u64,
    pub debug: Introspection,
    pub trace_hook: RefCell<Option<Rc<TraceHook>>>,
}

/// Script thread view of a Lua state.
///
/// Frame levels are relative to the function running when the trace hook
/// was called, so the introspection functions are only meaningful from
/// within the trace hook.
pub struct LuaThread<'lua> {
    lua: &'lua Lua,
    shared: Rc<Shared>,
}

impl<'lua> LuaThread<'lua> {
    pub(crate) fn new(lua: &'lua Lua, shared: Rc<Shared>) -> Self {
        Self { lua, shared }
    }

    /// Returns the Lua state.
    pub const fn lua(&self) -> &'lua Lua {
        self.lua
    }

    fn info(&self, level: usize, what: &str) -> Result<Option<Table>> {
        let info = self
            .shared
            .debug
            .getinfo
            .call((level + LEVEL_OFFSET, what))?;

        Ok(info)
    }

    fn frame_function(&self, level: usize) -> Option<Function> {
        self.info(level, "f").ok()??.get("func").ok()
    }
}

fn trace_event(kind: DebugEvent, line: i64) -> Option<TraceEvent> {
    match kind {
        DebugEvent::Call | DebugEvent::TailCall => Some(TraceEvent::Call),
        DebugEvent::Ret => Some(TraceEvent::Return),
        DebugEvent::Line => Some(TraceEvent::Line(line)),
        DebugEvent::Count => Some(TraceEvent::Count),
        _ => None,
    }
}

fn hook_triggers(mask: TraceMask) -> HookTriggers {
    let mut triggers = HookTriggers::new();

    if mask.call {
        triggers = triggers.on_calls();
    }
    if mask.ret {
        triggers = triggers.on_returns();
    }
    if mask.line {
        triggers = triggers.every_line();
    }
    if let Some(count) = mask.count {
        triggers = triggers.every_nth_instruction(count);
    }

    triggers
}

/// Strips the `@`/`=` prefix of a chunk name.
///
/// Chunks loaded from a string without a name are reported by their
/// shortened source.
fn chunk_name(source: &str, short_src: String) -> String {
    match source.strip_prefix(['@', '=']) {
        Some(name) => name.to_owned(),
        None => short_src,
    }
}

impl ScriptThread for LuaThread<'_> {
    type Value = LuaValue;
    type Chunk = String;
    type Error = Error;

    fn id(&self) -> u64 {
        self.shared.id
    }

    fn has_frame(&self, level: usize) -> bool {
        matches!(self.info(level, "l"), Ok(Some(_)))
    }

    fn frame_info(&mut self, level: usize) -> Result<FrameInfo> {
        let info = self.info(level, "nSl")?.ok_or(Error::NoFrame(level))?;

        let source: String = info.get("source")?;
        let what: String = info.get("what")?;
        let name: Option<String> = info.get("name")?;

        let function_name = match name {
            Some(name) => name,
            None if what == "main" => "main".into(),
            None => String::new(),
        };

        Ok(FrameInfo {
            source: chunk_name(&source, info.get("short_src")?),
            function_name,
            current_line: info.get("currentline")?,
        })
    }

    fn local(&self, level: usize, index: usize) -> Option<(String, LuaValue)> {
        let (name, value): (Option<String>, Value) = self
            .shared
            .debug
            .getlocal
            .call((level + LEVEL_OFFSET, index))
            .ok()?;

        Some((name?, LuaValue(value)))
    }

    /// Returns the upvalues of the frame's function, except `_ENV`.
    fn upvalue(&self, level: usize, index: usize) -> Option<(String, LuaValue)> {
        if index == 0 {
            return None;
        }

        let function = self.frame_function(level)?;
        let mut remaining = index;

        for raw_index in 1.. {
            let (name, value): (Option<String>, Value) = self
                .shared
                .debug
                .getupvalue
                .call((function.clone(), raw_index))
                .ok()?;

            let name = name?;

            if name == ENV_UPVALUE {
                continue;
            }

            remaining -= 1;

            if remaining == 0 {
                return Some((name, LuaValue(value)));
            }
        }

        None
    }

    fn set_trace_mask(&mut self, mask: TraceMask) {
        if mask.is_empty() {
            self.lua.remove_hook();
            return;
        }

        let shared = Rc::clone(&self.shared);

        self.lua.set_hook(hook_triggers(mask), move |lua, debug| {
            let Some(event) = trace_event(debug.event(), i64::from(debug.curr_line())) else {
                return Ok(VmState::Continue);
            };

            let trace_hook = shared.trace_hook.borrow().clone();

            if let Some(trace_hook) = trace_hook {
                trace_hook(&mut LuaThread::new(lua, Rc::clone(&shared)), event);
            }

            Ok(VmState::Continue)
        });
    }

    fn run_helper(&mut self, code: &str) -> Result<()> {
        self.lua.load(code).set_name(HELPER_CHUNK).exec()?;
        Ok(())
    }

    /// Calls the `emmy.fixPath` function defined by the helper code.
    fn resolve_source(&mut self, source: &str) -> Option<String> {
        let emmy: Table = self.lua.globals().get("emmy").ok()?;
        let fix_path: Function = emmy.get("fixPath").ok()?;

        match fix_path.call::<Option<String>>(source) {
            Ok(path) => path,
            Err(e) => {
                tracing::debug!(source, error = %e, "failed to fix source path");
                None
            }
        }
    }

    fn compile(&mut self, source: &str) -> core::result::Result<String, String> {
        self.lua
            .load(source)
            .set_name(EVAL_CHUNK)
            .into_function()
            .map_err(|e| lua_message(&e))?;

        Ok(source.to_owned())
    }

    fn execute(
        &mut self,
        chunk: String,
        scope: &Scope<LuaValue>,
    ) -> core::result::Result<LuaValue, String> {
        let env = scope_environment(self.lua, scope).map_err(|e| lua_message(&e))?;

        self.lua
            .load(chunk.as_str())
            .set_name(EVAL_CHUNK)
            .set_environment(env)
            .eval::<Value>()
            .map(LuaValue)
            .map_err(|e| lua_message(&e))
    }
}

/// Builds the environment of an evaluated chunk.
///
/// Locals shadow upvalues, and the other names are looked up in the
/// globals.
fn scope_environment(lua: &Lua, scope: &Scope<LuaValue>) -> mlua::Result<Table> {
    let env = lua.create_table()?;

    for (name, value) in scope.upvalues().iter().chain(scope.locals()) {
        env.raw_set(name.as_str(), value.0.clone())?;
    }

    let meta = lua.create_table()?;
    meta.raw_set("__index", lua.globals())?;
    env.set_metatable(Some(meta));

    Ok(env)
}
