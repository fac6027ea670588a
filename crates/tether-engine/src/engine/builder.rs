use super::Engine;
use crate::handler::EventHandler;

/// Default expansion depth of the variables reported on pause.
pub const DEFAULT_VARIABLE_DEPTH: u32 = 1;

/// Builder for [Engine].
///
/// It is usually created by calling [Engine::builder].
pub struct Builder<S> {
    state: S,
    variable_depth: u32,
}

impl Builder<NeedsHandler> {
    pub(super) const fn new() -> Self {
        Self {
            state: NeedsHandler,
            variable_depth: DEFAULT_VARIABLE_DEPTH,
        }
    }

    /// Specifies the handler of debug events (pauses, evaluation results).
    pub fn with_event_handler<H: EventHandler>(self, handler: H) -> Builder<Ready<H>> {
        Builder {
            state: Ready { handler },
            variable_depth: self.variable_depth,
        }
    }
}

impl<S> Builder<S> {
    /// Specifies how deep tables are expanded in the variables reported on
    /// pause.
    pub fn variable_depth(mut self, depth: u32) -> Self {
        self.variable_depth = depth;
        self
    }
}

impl<H: EventHandler> Builder<Ready<H>> {
    /// Builds the engine.
    pub fn build(self) -> Engine<H> {
        Engine::new(self.state.handler, self.variable_depth)
    }
}

pub struct NeedsHandler;

pub struct Ready<H> {
    handler: H,
}
