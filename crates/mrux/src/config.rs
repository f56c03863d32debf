//! Command-line configuration.

use crate::error::MruResult;
use crate::plugins::PluginRegistry;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Extract MRUListEx entries from registry key exports.
#[derive(Debug, Parser)]
#[command(name = "mrux", version)]
pub struct Config {
    /// JSON key exports to scan.
    #[arg(required = true, value_name = "FILE")]
    pub inputs: Vec<PathBuf>,

    /// Run only the named plugin (repeatable).
    #[arg(long = "plugin", value_name = "NAME")]
    pub plugins: Vec<String>,

    /// Write a pretty-printed JSON array instead of JSON lines.
    #[arg(long)]
    pub pretty: bool,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, default_value = "info", value_name = "FILTER")]
    pub log_level: String,
}

impl Config {
    /// `RUST_LOG` wins over `--log-level`.
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.log_level))
    }

    /// Built-in plugins, narrowed by `--plugin` when given.
    pub fn plugin_registry(&self) -> MruResult<PluginRegistry> {
        let registry = PluginRegistry::with_defaults();
        if self.plugins.is_empty() {
            Ok(registry)
        } else {
            registry.restrict_to(&self.plugins)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MruError;

    #[test]
    fn test_parse_defaults() {
        let config = Config::try_parse_from(["mrux", "ntuser.json"]).unwrap();
        assert_eq!(config.inputs, vec![PathBuf::from("ntuser.json")]);
        assert!(config.plugins.is_empty());
        assert!(!config.pretty);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.plugin_registry().unwrap().len(), 1);
    }

    #[test]
    fn test_parse_flags() {
        let config = Config::try_parse_from([
            "mrux",
            "a.json",
            "b.json",
            "--plugin",
            "mrulistex",
            "--pretty",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(config.inputs.len(), 2);
        assert_eq!(config.plugins, vec!["mrulistex"]);
        assert!(config.pretty);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_inputs_required() {
        assert!(Config::try_parse_from(["mrux"]).is_err());
    }

    #[test]
    fn test_unknown_plugin_rejected() {
        let config = Config::try_parse_from(["mrux", "a.json", "--plugin", "nope"]).unwrap();
        assert!(matches!(
            config.plugin_registry(),
            Err(MruError::UnknownPlugin(_))
        ));
    }
}
