use std::sync::mpsc;
use std::time::Duration;

use tether_engine::handler::EventHandler;
use tether_engine::{EvalContext, StackFrame};

const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub enum DebugEvent {
    Break(u64, Vec<StackFrame>),
    Eval(EvalContext),
}

/// Handler forwarding debug events to the test.
pub struct RecordingHandler {
    events: mpsc::Sender<DebugEvent>,
}

impl RecordingHandler {
    pub fn new() -> (Self, mpsc::Receiver<DebugEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self { events: tx }, rx)
    }
}

impl EventHandler for RecordingHandler {
    fn on_break(&self, thread_id: u64, stack: Vec<StackFrame>) {
        self.events
            .send(DebugEvent::Break(thread_id, stack))
            .expect("send break");
    }

    fn on_eval_result(&self, ctx: EvalContext) {
        self.events.send(DebugEvent::Eval(ctx)).expect("send eval");
    }
}

pub fn next_break(events: &mpsc::Receiver<DebugEvent>) -> (u64, Vec<StackFrame>) {
    match events.recv_timeout(EVENT_TIMEOUT).expect("no event") {
        DebugEvent::Break(thread_id, stack) => (thread_id, stack),
        event => panic!("unexpected event: {event:?}"),
    }
}

pub fn next_eval(events: &mpsc::Receiver<DebugEvent>) -> EvalContext {
    match events.recv_timeout(EVENT_TIMEOUT).expect("no event") {
        DebugEvent::Eval(ctx) => ctx,
        event => panic!("unexpected event: {event:?}"),
    }
}
