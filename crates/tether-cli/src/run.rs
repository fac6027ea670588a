use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use miette::IntoDiagnostic;
use tether_lua::LuaHost;
use tether_session::{Session, SessionConfig};

/// Runs the subcommand for running a script under the debugger.
pub fn evaluate_run(config: String, script: PathBuf) -> miette::Result<()> {
    let config = parse_run_config(config)?;

    let source = std::fs::read_to_string(&script).into_diagnostic()?;
    let chunk = script.display().to_string();

    let session = Session::connect(&config).into_diagnostic()?;
    session.wait_for_ide();

    let host = LuaHost::new().map_err(|e| miette::miette!("{e}"))?;

    let engine = Arc::clone(session.engine());
    host.set_trace_hook(move |thread, event| engine.hook(thread, event));

    session.attach(&mut host.thread()).into_diagnostic()?;

    tracing::info!(script = %chunk, "running script");

    host.run(&source, &chunk).map_err(|e| miette::miette!("{e}"))?;

    Ok(())
}

/// Parses the session configuration, either inline or from a `.kdl` file.
pub fn parse_run_config(config: String) -> miette::Result<SessionConfig> {
    let path = Path::new(&config);

    let config = if let Some((filename, "kdl")) = path
        .file_name()
        .and_then(OsStr::to_str)
        .zip(path.extension().and_then(OsStr::to_str))
    {
        let content = std::fs::read_to_string(path).into_diagnostic()?;
        knus::parse(filename, &content)?
    } else {
        knus::parse("<content>", &config)?
    };

    Ok(config)
}
