//! This crate implements the scripting host traits of `tether-engine` for
//! Lua 5.4 states, through `mlua`.
//!
//! The [LuaHost] owns the Lua state. Its [thread](LuaHost::thread) view is
//! attached to the engine, and the trace events of the state are forwarded
//! to the hook installed with [LuaHost::set_trace_hook], which typically
//! calls [Engine::hook](tether_engine::Engine::hook).
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tether_engine::Engine;
//! use tether_engine::handler::EventHandler;
//! use tether_lua::LuaHost;
//!
//! # fn run<H: EventHandler + Send + Sync + 'static>(handler: H) -> Result<(), Box<dyn std::error::Error>> {
//! let engine = Arc::new(Engine::builder().with_event_handler(handler).build());
//! engine.start("emmy = {}", vec![".lua".into()]);
//!
//! let host = LuaHost::new()?;
//!
//! let hook_engine = Arc::clone(&engine);
//! host.set_trace_hook(move |thread, event| hook_engine.hook(thread, event));
//!
//! engine.attach(&mut host.thread())?;
//! host.run("print('hello')", "hello.lua")?;
//! # Ok(())
//! # }
//! ```
//!
//! Local variables and upvalues are read through the `debug` library, so
//! the Lua state must have it loaded. The `_ENV` upvalue is not reported.

mod error;
mod host;
mod thread;
mod value;

pub use self::error::{Error, Result};
pub use self::host::LuaHost;
pub use self::thread::LuaThread;
pub use self::value::LuaValue;
