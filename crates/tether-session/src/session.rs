use std::sync::{Arc, Condvar, Mutex, PoisonError};

use futures_util::{SinkExt, StreamExt};
use tether_engine::handler::EventHandler;
use tether_engine::host::ScriptThread;
use tether_engine::{Action, Engine, EvalContext, StackFrame};
use tether_protocol::message::BreakNotify;
use tether_protocol::{MessageCodec, Notification, Request};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite};

use crate::config::SessionConfig;
use crate::convert;
use crate::error::{Error, Result};

/// Debug session, connected to an IDE.
///
/// The session owns the network tasks decoding the IDE requests into
/// [Engine] calls, and encoding the debug events sent back to the IDE.
/// When the connection is closed, the attached threads are detached.
pub struct Session {
    engine: Arc<Engine<Notifier>>,
    gate: Arc<IdeGate>,
    wait_ide: bool,

    /// Runtime of the network tasks.
    _runtime: tokio::runtime::Runtime,
}

impl Session {
    /// Connects to the IDE.
    #[tracing::instrument(name = "Connect", skip_all, fields(addr = config.address()))]
    pub fn connect(config: &SessionConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("tether-session")
            .enable_io()
            .build()
            .map_err(Error::Runtime)?;

        let addr = config.address();

        let stream = runtime
            .block_on(TcpStream::connect(&addr))
            .map_err(|source| Error::Connect { addr, source })?;

        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(error = %e, "failed to disable Nagle's algorithm");
        }

        let (reader, writer) = stream.into_split();
        let (notifications_tx, notifications_rx) = mpsc::unbounded_channel();

        let engine = Arc::new(
            Engine::builder()
                .with_event_handler(Notifier {
                    notifications: notifications_tx,
                })
                .variable_depth(config.variable_depth)
                .build(),
        );

        let gate = Arc::new(IdeGate::default());

        runtime.spawn(write_notifications(
            FramedWrite::new(writer, MessageCodec::new()),
            notifications_rx,
        ));

        runtime.spawn(read_requests(
            FramedRead::new(reader, MessageCodec::new()),
            Arc::clone(&engine),
            Arc::clone(&gate),
        ));

        tracing::info!("connected to IDE");

        Ok(Self {
            engine,
            gate,
            wait_ide: config.wait_ide,
            _runtime: runtime,
        })
    }

    /// Returns the debugger engine driven by the IDE.
    ///
    /// Script threads must report their trace events to
    /// [Engine::hook].
    pub const fn engine(&self) -> &Arc<Engine<Notifier>> {
        &self.engine
    }

    /// Blocks until the IDE is ready, or the connection is closed.
    ///
    /// Returns immediately if the session is not configured to wait for the
    /// IDE.
    pub fn wait_for_ide(&self) {
        if !self.wait_ide {
            return;
        }

        tracing::info!("waiting for IDE");
        self.gate.wait();
    }

    /// Attaches a script thread to the session.
    ///
    /// A thread attached before the IDE initialized the session completes
    /// its attachment once the IDE did.
    pub fn attach<T: ScriptThread>(&self, thread: &mut T) -> Result<()> {
        self.engine.attach(thread).map_err(Error::from)
    }
}

/// Event handler forwarding debug events to the IDE.
pub struct Notifier {
    notifications: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    fn send(&self, notification: Notification) {
        if self.notifications.send(notification).is_err() {
            tracing::warn!("IDE connection closed, notification dropped");
        }
    }
}

impl EventHandler for Notifier {
    fn on_break(&self, _thread_id: u64, stack: Vec<StackFrame>) {
        let stacks = stack.into_iter().map(convert::stack).collect();
        self.send(Notification::Break(BreakNotify::new(stacks)));
    }

    fn on_eval_result(&self, ctx: EvalContext) {
        self.send(Notification::EvalRsp(convert::eval_response(ctx)));
    }
}

/// Latch opened once the IDE is ready.
#[derive(Default)]
struct IdeGate {
    ready: Mutex<bool>,
    cond: Condvar,
}

impl IdeGate {
    fn open(&self) {
        *self.ready.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.cond.notify_all();
    }

    fn wait(&self) {
        let ready = self.ready.lock().unwrap_or_else(PoisonError::into_inner);

        let _ready = self
            .cond
            .wait_while(ready, |ready| !*ready)
            .unwrap_or_else(PoisonError::into_inner);
    }
}

async fn write_notifications(
    mut sink: FramedWrite<OwnedWriteHalf, MessageCodec>,
    mut notifications: mpsc::UnboundedReceiver<Notification>,
) {
    while let Some(notification) = notifications.recv().await {
        let id = notification.id();

        if let Err(e) = sink.send(notification).await {
            tracing::warn!(error = %e, ?id, "failed to send notification");
            break;
        }
    }
}

async fn read_requests(
    mut requests: FramedRead<OwnedReadHalf, MessageCodec>,
    engine: Arc<Engine<Notifier>>,
    gate: Arc<IdeGate>,
) {
    loop {
        match requests.next().await {
            Some(Ok(request)) => dispatch(&engine, &gate, request),
            Some(Err(e)) => {
                tracing::error!(error = %e, "invalid request, closing connection");
                break;
            }
            None => {
                tracing::info!("IDE disconnected");
                break;
            }
        }
    }

    engine.do_action(Action::Stop);
    gate.open();
}

fn dispatch(engine: &Engine<Notifier>, gate: &IdeGate, request: Request) {
    match request {
        Request::Init(req) => engine.start(req.emmy_helper, req.ext),
        Request::Ready => {
            tracing::info!("IDE ready");
            gate.open();
        }
        Request::AddBreakPoint(req) => {
            if req.clear {
                engine.remove_all_breakpoints();
            }

            for bp in req.break_points {
                engine.add_breakpoint(convert::breakpoint(bp));
            }
        }
        Request::RemoveBreakPoint(req) => {
            for bp in req.break_points {
                engine.remove_breakpoint(&bp.file, bp.line);
            }
        }
        Request::Action(req) => engine.do_action(convert::action(req.action)),
        Request::Eval(req) => {
            let seq = req.seq;

            if let Err(e) = engine.evaluate(convert::eval_context(req)) {
                tracing::debug!(seq, error = %e, "evaluation rejected");
            }
        }
        Request::Unknown(code) => tracing::debug!(code, "skipped unknown message"),
    }
}
