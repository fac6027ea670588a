use tether_engine::DEFAULT_VARIABLE_DEPTH;

/// Default address of the IDE.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default port of the IDE.
pub const DEFAULT_PORT: u16 = 9966;

/// Configuration of a debug session.
#[derive(Clone, Debug, PartialEq, Eq, knus::Decode)]
pub struct SessionConfig {
    /// Host name or address of the IDE.
    #[knus(child, default = DEFAULT_HOST.to_owned(), unwrap(argument))]
    pub host: String,

    /// TCP port of the IDE.
    #[knus(child, default = DEFAULT_PORT, unwrap(argument))]
    pub port: u16,

    /// Whether to block the script until the IDE is ready.
    #[knus(child, default = true, unwrap(argument))]
    pub wait_ide: bool,

    /// Expansion depth of the variables reported on pause.
    #[knus(child, default = DEFAULT_VARIABLE_DEPTH, unwrap(argument))]
    pub variable_depth: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            wait_ide: true,
            variable_depth: DEFAULT_VARIABLE_DEPTH,
        }
    }
}

impl SessionConfig {
    /// Returns the `host:port` address of the IDE.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::SessionConfig;

    #[test]
    fn parse_from_kdl_defaults() {
        let config = knus::parse::<SessionConfig>("<content>", "")
            .map_err(miette::Report::new)
            .expect("parse kdl");

        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.address(), "127.0.0.1:9966");
    }

    #[test]
    fn parse_from_kdl() {
        let config = knus::parse::<SessionConfig>(
            "<content>",
            indoc::indoc! {r#"
                host "10.0.0.2"
                port 8172
                wait-ide false
                variable-depth 3
            "#},
        )
        .map_err(miette::Report::new)
        .expect("parse kdl");

        assert_eq!(
            config,
            SessionConfig {
                host: "10.0.0.2".to_owned(),
                port: 8172,
                wait_ide: false,
                variable_depth: 3,
            }
        );

        let config = knus::parse::<SessionConfig>(
            "<content>",
            indoc::indoc! {r#"
                port 1
            "#},
        )
        .map_err(miette::Report::new)
        .expect("parse kdl");

        assert_eq!(config.port, 1);
        assert!(config.wait_ide);
    }

    #[test]
    fn parse_from_kdl_invalid() {
        assert!(knus::parse::<SessionConfig>("<content>", "port 70000").is_err());
        assert!(knus::parse::<SessionConfig>("<content>", "unknown 1").is_err());
    }
}
