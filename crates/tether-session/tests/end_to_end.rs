// Once clippy takes `clippy.toml` into account (for `tests` targets),
// we can remove these.
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(missing_docs)]

use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use indoc::indoc;
use serde_json::{Value, json};
use tether_lua::LuaHost;
use tether_session::{Error, Session, SessionConfig};
use test_log::test;

const IDE_TIMEOUT: Duration = Duration::from_secs(10);

const SCRIPT: &str = indoc! {"
    local function twice(v)
      return v * 2
    end
    local x = 10
    local y = twice(x)
    print(y)
"};

const COUNTING_SCRIPT: &str = indoc! {"
    local total = 0
    for i = 1, 3 do
      total = total + i
    end
    print(total)
"};

const LOOP_SCRIPT: &str = indoc! {"
    running = true
    function finish() running = false end
    local count = 0
    while running do
      count = count + 1
    end
"};

/// IDE side of a debug session.
struct Ide {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl Ide {
    fn accept(listener: &TcpListener) -> Self {
        let (stream, _) = listener.accept().expect("accept");
        stream.set_read_timeout(Some(IDE_TIMEOUT)).expect("set timeout");

        Self {
            reader: BufReader::new(stream.try_clone().expect("clone stream")),
            writer: stream,
        }
    }

    fn send(&mut self, id: i32, payload: Value) {
        write!(self.writer, "{id}\n{payload}\n").expect("send message");
    }

    fn send_raw(&mut self, data: &str) {
        self.writer.write_all(data.as_bytes()).expect("send data");
    }

    fn eval(&mut self, seq: i64, expr: &str, stack_level: i64) {
        self.send(11, json!({
            "seq": seq,
            "expr": expr,
            "stackLevel": stack_level,
            "depth": 1,
            "cacheId": 0,
        }));
    }

    fn init(&mut self, breakpoint_line: i64) {
        self.send(1, json!({ "emmyHelper": "emmy = {}", "ext": [".lua"] }));
        self.send(5, json!({
            "clear": true,
            "breakPoints": [{ "file": "script.lua", "line": breakpoint_line }],
        }));
    }

    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();

        match self.reader.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim_end().to_owned()),
            Err(e) if e.kind() == ErrorKind::ConnectionReset => None,
            Err(e) => panic!("failed to read line: {e}"),
        }
    }

    /// Returns the next message, or `None` once the session is closed.
    fn recv(&mut self) -> Option<(i32, Value)> {
        let id = self.read_line()?.parse().expect("message id");
        let payload = self.read_line().expect("message payload");

        Some((id, serde_json::from_str(&payload).expect("json payload")))
    }
}

fn listen() -> (TcpListener, SessionConfig) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("local addr").port();

    let config = SessionConfig {
        port,
        ..Default::default()
    };

    (listener, config)
}

fn spawn_ide<F>(listener: TcpListener, scenario: F) -> JoinHandle<Ide>
where
    F: FnOnce(&mut Ide) + Send + 'static,
{
    thread::spawn(move || {
        let mut ide = Ide::accept(&listener);
        scenario(&mut ide);
        ide
    })
}

/// Runs a script under a session, as an embedding application does.
fn run_script(config: &SessionConfig, source: &str) -> Result<(), String> {
    let session = Session::connect(config).map_err(|e| e.to_string())?;
    session.wait_for_ide();

    let host = LuaHost::new().map_err(|e| e.to_string())?;
    host.set_output(std::io::sink()).map_err(|e| e.to_string())?;

    let engine = Arc::clone(session.engine());
    host.set_trace_hook(move |thread, event| engine.hook(thread, event));

    session.attach(&mut host.thread()).map_err(|e| e.to_string())?;

    host.run(source, "script.lua").map_err(|e| e.to_string())
}

#[test]
fn break_evaluate_continue() {
    let (listener, config) = listen();

    let ide = spawn_ide(listener, |ide| {
        ide.init(5);

        // not requests: skipped
        ide.send(15, json!({}));
        ide.send(99, json!({ "whatever": 1 }));

        ide.send(3, json!({}));

        let (id, notify) = ide.recv().expect("break notification");
        assert_eq!(id, 13);
        assert_eq!(notify["cmd"], 13);

        let stacks = notify["stacks"].as_array().expect("stacks");
        assert_eq!(stacks.len(), 1);
        assert_eq!(stacks[0]["level"], 0);
        assert_eq!(stacks[0]["file"], "script.lua");
        assert_eq!(stacks[0]["functionName"], "main");
        assert_eq!(stacks[0]["line"], 5);

        let locals = &stacks[0]["localVariables"];
        assert_eq!(locals[0]["name"], "twice");
        assert_eq!(locals[0]["valueType"], 6);
        assert_eq!(locals[1]["name"], "x");
        assert_eq!(locals[1]["value"], "10");
        assert_eq!(locals[1]["valueType"], 3);
        assert_eq!(locals[1]["valueTypeName"], "number");
        assert_eq!(stacks[0]["upvalueVariables"], json!([]));

        ide.eval(1, "x + 1", 0);
        ide.eval(2, "x +", 0);
        ide.eval(3, "x", 4);

        let (id, rsp) = ide.recv().expect("eval response");
        assert_eq!(id, 12);
        assert_eq!(rsp["seq"], 1);
        assert_eq!(rsp["success"], true);
        assert_eq!(rsp["value"]["name"], "x + 1");
        assert_eq!(rsp["value"]["value"], "11");

        let (_, rsp) = ide.recv().expect("eval response");
        assert_eq!(rsp["seq"], 2);
        assert_eq!(rsp["success"], false);
        assert!(rsp.get("value").is_none());

        let (_, rsp) = ide.recv().expect("eval response");
        assert_eq!(rsp["seq"], 3);
        assert_eq!(rsp["success"], false);
        assert_eq!(rsp["error"], "invalid stack level 4");

        // continue
        ide.send(9, json!({ "action": 1 }));
    });

    assert_eq!(run_script(&config, SCRIPT), Ok(()));

    // the session is closed with no further notification
    let mut ide = ide.join().expect("join IDE");
    assert_eq!(ide.recv(), None);
}

#[test]
fn step_over_from_breakpoint() {
    let (listener, config) = listen();

    let ide = spawn_ide(listener, |ide| {
        ide.init(4);
        ide.send(3, json!({}));

        let (_, notify) = ide.recv().expect("break notification");
        assert_eq!(notify["stacks"][0]["line"], 4);

        // step over
        ide.send(9, json!({ "action": 2 }));
        let (_, notify) = ide.recv().expect("break notification");
        assert_eq!(notify["stacks"][0]["line"], 5);

        // step in
        ide.send(9, json!({ "action": 3 }));
        let (_, notify) = ide.recv().expect("break notification");
        assert_eq!(notify["stacks"][0]["functionName"], "twice");
        assert_eq!(notify["stacks"][0]["line"], 2);
        assert_eq!(notify["stacks"][1]["level"], 1);

        // stop
        ide.send(9, json!({ "action": 5 }));
    });

    assert_eq!(run_script(&config, SCRIPT), Ok(()));

    let mut ide = ide.join().expect("join IDE");
    assert_eq!(ide.recv(), None);
}

#[test]
fn removed_breakpoint_is_not_hit_again() {
    let (listener, config) = listen();

    let ide = spawn_ide(listener, |ide| {
        ide.init(3);
        ide.send(3, json!({}));

        let (_, notify) = ide.recv().expect("break notification");
        assert_eq!(notify["stacks"][0]["line"], 3);

        ide.send(7, json!({
            "breakPoints": [{ "file": "script.lua", "line": 3 }],
        }));
        ide.send(9, json!({ "action": 1 }));
    });

    // the loop runs line 3 twice more
    assert_eq!(run_script(&config, COUNTING_SCRIPT), Ok(()));

    let mut ide = ide.join().expect("join IDE");
    assert_eq!(ide.recv(), None);
}

#[test]
fn cleared_breakpoints_are_replaced() {
    let (listener, config) = listen();

    let ide = spawn_ide(listener, |ide| {
        ide.init(3);
        ide.send(3, json!({}));

        let (_, notify) = ide.recv().expect("break notification");
        assert_eq!(notify["stacks"][0]["line"], 3);

        ide.send(5, json!({
            "clear": true,
            "breakPoints": [{ "file": "script.lua", "line": 5 }],
        }));
        ide.send(9, json!({ "action": 1 }));

        let (_, notify) = ide.recv().expect("break notification");
        assert_eq!(notify["stacks"][0]["line"], 5);

        let locals = &notify["stacks"][0]["localVariables"];
        assert_eq!(locals[0]["name"], "total");
        assert_eq!(locals[0]["value"], "6");

        ide.send(9, json!({ "action": 1 }));
    });

    assert_eq!(run_script(&config, COUNTING_SCRIPT), Ok(()));

    let mut ide = ide.join().expect("join IDE");
    assert_eq!(ide.recv(), None);
}

#[test]
fn script_started_before_init() {
    let (listener, mut config) = listen();
    config.wait_ide = false;

    let ide = spawn_ide(listener, |ide| {
        // the script is already looping when the IDE initializes
        thread::sleep(Duration::from_millis(200));
        ide.init(5);

        let (id, notify) = ide.recv().expect("break notification");
        assert_eq!(id, 13);
        assert_eq!(notify["stacks"][0]["line"], 5);
        assert_eq!(notify["stacks"][0]["localVariables"][0]["name"], "count");

        ide.eval(1, "finish()", 0);

        let (_, rsp) = ide.recv().expect("eval response");
        assert_eq!(rsp["success"], true);

        ide.send(7, json!({
            "breakPoints": [{ "file": "script.lua", "line": 5 }],
        }));
        ide.send(9, json!({ "action": 1 }));
    });

    assert_eq!(run_script(&config, LOOP_SCRIPT), Ok(()));

    let mut ide = ide.join().expect("join IDE");
    assert_eq!(ide.recv(), None);
}

#[test]
fn disconnect_while_paused() {
    let (listener, config) = listen();

    let ide = spawn_ide(listener, |ide| {
        ide.init(5);
        ide.send(3, json!({}));

        let (id, _) = ide.recv().expect("break notification");
        assert_eq!(id, 13);
    });

    let script = thread::spawn(move || run_script(&config, SCRIPT));

    // the IDE goes away, the script resumes
    drop(ide.join().expect("join IDE"));

    assert_eq!(script.join().expect("join script"), Ok(()));
}

#[test]
fn malformed_message_closes_session() {
    let (listener, config) = listen();

    let ide = spawn_ide(listener, |ide| {
        ide.init(5);
        ide.send_raw("not an id\n{}\n");
    });

    assert_eq!(run_script(&config, SCRIPT), Ok(()));

    let mut ide = ide.join().expect("join IDE");
    assert_eq!(ide.recv(), None);
}

#[test]
fn connection_refused() {
    let (listener, config) = listen();
    drop(listener);

    let err = Session::connect(&config)
        .err()
        .expect("connection should fail");

    assert!(matches!(err, Error::Connect { .. }), "{err}");
}
