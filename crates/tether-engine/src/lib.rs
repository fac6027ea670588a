//! This crate implements a remote debugger engine for embedded scripting
//! runtimes.
//!
//! The engine is driven from two sides:
//! - The script threads, which report their trace events (calls, returns,
//!   executed lines) to [Engine::hook]. A thread hitting a breakpoint, or
//!   completing a step, is paused within this call.
//! - The IDE session, which registers breakpoints, evaluates expressions
//!   within the paused thread, and resumes it with an [Action].
//!
//! # Embedding a scripting runtime
//!
//! The [ScriptThread](self::host::ScriptThread)/[ScriptValue](self::host::ScriptValue)
//! traits describe the introspection and execution capabilities the engine
//! needs from the interpreter. The interpreter forwards its trace events to
//! the engine:
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use tether_engine::Engine;
//!
//! let engine = Arc::new(Engine::builder().with_event_handler(handler).build());
//!
//! // typically done once the IDE sent its helper code
//! engine.start(helper_code, vec![".lua".into()]);
//!
//! let hook_engine = Arc::clone(&engine);
//! host.set_trace_hook(move |thread, event| hook_engine.hook(thread, event));
//!
//! engine.attach(&mut host.thread())?;
//! host.run(source, "main.lua")?;
//! ```
//!
//! # Handling debug events
//!
//! The [EventHandler](self::handler::EventHandler) trait receives the call
//! stack of paused threads, and the results of evaluated expressions.

/// Module containing the traits implemented by a scripting host.
pub mod host;

/// Module containing traits for handling debug events.
pub mod handler;

mod breakpoint;
mod engine;
mod error;
mod eval;
mod inspect;
mod pause;
mod stepping;

pub use self::breakpoint::{BreakPoint, parse_path_parts};
pub use self::engine::{Builder, DEFAULT_VARIABLE_DEPTH, DEFERRED_ATTACH_MASK, Engine};
pub use self::error::{Error, Result};
pub use self::eval::{EvalContext, Scope, evaluate};
pub use self::inspect::{StackFrame, Variable, collect_stack};
pub use self::stepping::{Action, DepthTracker, ExecutionState, Location};
