use std::path::PathBuf;

/// The Tether debugger.
#[derive(clap::Parser)]
pub struct CliOpts {
    /// The command to run.
    #[clap(subcommand)]
    pub action: CliAction,
}

/// The command to run.
#[derive(clap::Subcommand)]
pub enum CliAction {
    /// Command to run a script under the debugger, connected to an IDE.
    Run {
        /// Session configuration (KDL format).
        ///
        /// If it ends with `.kdl`, it is treated as a path to a configuration
        /// file for the debug session. Otherwise it is directly parsed as
        /// inline KDL-formatted configuration.
        #[clap(short, long, value_name = "CONTENT/PATH", default_value = "")]
        config: String,

        /// Path of the script to run.
        script: PathBuf,
    },
}

impl CliOpts {
    /// Parses the CLI from the command-line.
    ///
    /// # Warning
    ///
    /// Exits on error.
    pub fn parse_from_cmdline() -> Self {
        <Self as clap::Parser>::parse()
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{CliAction, CliOpts};

    #[test]
    fn parse_run() {
        let opts = CliOpts::try_parse_from(["tether", "run", "-c", "port 1", "main.lua"])
            .expect("parse cli");

        let CliAction::Run { config, script } = opts.action;
        assert_eq!(config, "port 1");
        assert_eq!(script.to_str(), Some("main.lua"));

        let opts = CliOpts::try_parse_from(["tether", "run", "main.lua"]).expect("parse cli");

        let CliAction::Run { config, .. } = opts.action;
        assert_eq!(config, "");

        assert!(CliOpts::try_parse_from(["tether", "run"]).is_err());
    }
}
