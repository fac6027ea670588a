use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use mlua::{Lua, MultiValue};
use tether_engine::host::{ScriptValue, TraceEvent};

use crate::error::Result;
use crate::thread::{Introspection, LuaThread, Shared};
use crate::value::LuaValue;

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

/// Lua state debugged by the engine.
///
/// The host owns the Lua state, and hands out the [LuaThread] views the
/// engine works with.
pub struct LuaHost {
    lua: Lua,
    shared: Rc<Shared>,
}

impl LuaHost {
    /// Creates a Lua state with every standard library, the `debug` library
    /// included.
    pub fn new() -> Result<Self> {
        // SAFETY: scripts run by the host are trusted, the `debug` library is
        // required to inspect their frames.
        let lua = unsafe { Lua::unsafe_new() };

        Self::from_lua(lua)
    }

    /// Wraps an existing Lua state.
    ///
    /// The state must have the `debug` library loaded.
    pub fn from_lua(lua: Lua) -> Result<Self> {
        let debug = Introspection::capture(&lua)?;

        let shared = Rc::new(Shared {
            id: NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed),
            debug,
            trace_hook: RefCell::new(None),
        });

        Ok(Self { lua, shared })
    }

    /// Returns the Lua state.
    pub const fn lua(&self) -> &Lua {
        &self.lua
    }

    /// Returns the ID of the host's thread.
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    /// Returns the script thread view of the Lua state, to be attached to the
    /// engine.
    pub fn thread(&self) -> LuaThread<'_> {
        LuaThread::new(&self.lua, Rc::clone(&self.shared))
    }

    /// Installs the function receiving the trace events selected by the
    /// trace mask.
    ///
    /// The function is not called for the code it runs itself.
    pub fn set_trace_hook(&self, hook: impl Fn(&mut LuaThread<'_>, TraceEvent) + 'static) {
        *self.shared.trace_hook.borrow_mut() = Some(Rc::new(hook));
    }

    /// Redirects the output of `print`.
    pub fn set_output(&self, output: impl Write + 'static) -> Result<()> {
        let output = RefCell::new(output);

        let print = self.lua.create_function(move |_, args: MultiValue| {
            let line = args
                .into_iter()
                .map(|value| LuaValue(value).render())
                .collect::<Vec<_>>()
                .join("\t");

            writeln!(output.borrow_mut(), "{line}").map_err(mlua::Error::external)
        })?;

        self.lua.globals().set("print", print)?;

        Ok(())
    }

    /// Runs a chunk of source code, named after the file it was read from.
    #[tracing::instrument(name = "Run", skip(self, source), fields(thread_id = self.id()))]
    pub fn run(&self, source: &str, file: &str) -> Result<()> {
        self.lua.load(source).set_name(format!("@{file}")).exec()?;
        Ok(())
    }
}
