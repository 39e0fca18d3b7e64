//! Worker configuration.
//!
//! The host launches the worker with five positional values. Everything
//! else is optional and comes from, in increasing precedence:
//! 1. Default values
//! 2. `skiff-worker.toml` in the current directory (or `--config <path>`)
//! 3. Environment variables with the `SKIFF_WORKER_` prefix

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::session::WorkerIdentity;

const DEFAULT_SETTINGS_FILE: &str = "skiff-worker.toml";

/// Command line supplied by the host.
#[derive(Debug, Clone, Parser)]
#[command(name = "skiff-worker")]
#[command(about = "Runs function scripts on behalf of a serverless host")]
#[command(version)]
pub struct Args {
    /// Host address to connect to
    pub host: String,

    /// Host port
    pub port: u16,

    /// Identifier the host assigned to this worker
    pub worker_id: String,

    /// Session request identifier echoed on every outbound message
    pub request_id: String,

    /// Maximum message size in bytes
    pub max_message_length: usize,

    /// Settings file (defaults to ./skiff-worker.toml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Optional settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    /// Script engine settings.
    #[serde(default)]
    pub engine: EngineSettings,

    /// Stream settings.
    #[serde(default)]
    pub stream: StreamSettings,

    /// Logging settings.
    #[serde(default)]
    pub log: LogSettings,
}

/// Script engine settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineSettings {
    /// Program used to run function scripts, e.g. `pwsh`.
    ///
    /// When unset the script file is executed directly.
    pub interpreter: Option<PathBuf>,

    /// Arguments placed between the interpreter and the script path.
    #[serde(default)]
    pub interpreter_args: Vec<String>,

    /// Upper bound on a single invocation. Unbounded when unset.
    pub invocation_timeout_secs: Option<u64>,
}

impl EngineSettings {
    /// Returns the invocation timeout, if configured.
    #[must_use]
    pub fn invocation_timeout(&self) -> Option<Duration> {
        self.invocation_timeout_secs.map(Duration::from_secs)
    }
}

/// Stream settings.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamSettings {
    /// Capacity of the channel between the handler and the writer.
    #[serde(default = "default_outbound_capacity")]
    pub outbound_capacity: usize,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            outbound_capacity: default_outbound_capacity(),
        }
    }
}

const fn default_outbound_capacity() -> usize {
    16
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "skiff_worker=info".to_owned()
}

impl Settings {
    /// Load settings from the default sources.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_SETTINGS_FILE));
        Self::extract(
            Figment::new()
                .merge(Toml::file(path))
                .merge(Env::prefixed("SKIFF_WORKER_").split("__")),
        )
    }

    /// Extract settings from an explicit figment.
    pub fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let settings: Self = figment
            .extract()
            .map_err(|e| ConfigError::Settings(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.stream.outbound_capacity == 0 {
            return Err(ConfigError::Invalid(
                "stream.outbound_capacity must be greater than zero".to_owned(),
            ));
        }
        if self.engine.invocation_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "engine.invocation_timeout_secs must be greater than zero".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Complete worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Host address.
    pub host: String,

    /// Host port.
    pub port: u16,

    /// Worker and session identifiers.
    pub identity: WorkerIdentity,

    /// Maximum message size in bytes.
    pub max_message_size: usize,

    /// Optional settings.
    pub settings: Settings,
}

impl WorkerConfig {
    /// Combine the host-supplied arguments with the loaded settings.
    pub fn new(args: Args, settings: Settings) -> Result<Self, ConfigError> {
        if args.max_message_length == 0 {
            return Err(ConfigError::Invalid(
                "maximum message length must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            host: args.host,
            port: args.port,
            identity: WorkerIdentity::new(args.worker_id, args.request_id),
            max_message_size: args.max_message_length,
            settings,
        })
    }

    /// Returns the host address as `host:port`.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Result<Args, clap::Error> {
        let mut argv = vec!["skiff-worker"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv)
    }

    #[test]
    fn parses_positional_arguments() {
        let args = args(&["127.0.0.1", "50051", "worker-1", "req-1", "134217728"]).unwrap();
        assert_eq!(args.host, "127.0.0.1");
        assert_eq!(args.port, 50051);
        assert_eq!(args.worker_id, "worker-1");
        assert_eq!(args.request_id, "req-1");
        assert_eq!(args.max_message_length, 134_217_728);
        assert!(args.config.is_none());
    }

    #[test]
    fn rejects_missing_or_malformed_arguments() {
        assert!(args(&["127.0.0.1", "50051", "worker-1", "req-1"]).is_err());
        assert!(args(&["127.0.0.1", "not-a-port", "worker-1", "req-1", "1024"]).is_err());
        assert!(args(&["127.0.0.1", "50051", "worker-1", "req-1", "-5"]).is_err());
    }

    #[test]
    fn settings_defaults() {
        let settings = Settings::extract(Figment::new()).unwrap();
        assert!(settings.engine.interpreter.is_none());
        assert!(settings.engine.invocation_timeout().is_none());
        assert_eq!(settings.stream.outbound_capacity, 16);
        assert_eq!(settings.log.filter, "skiff_worker=info");
    }

    #[test]
    fn settings_from_toml() {
        let toml = r#"
            [engine]
            interpreter = "pwsh"
            interpreter_args = ["-NoProfile", "-File"]
            invocation_timeout_secs = 30

            [stream]
            outbound_capacity = 4
        "#;

        let settings = Settings::extract(Figment::new().merge(Toml::string(toml))).unwrap();
        assert_eq!(settings.engine.interpreter, Some(PathBuf::from("pwsh")));
        assert_eq!(settings.engine.interpreter_args, ["-NoProfile", "-File"]);
        assert_eq!(
            settings.engine.invocation_timeout(),
            Some(Duration::from_secs(30))
        );
        assert_eq!(settings.stream.outbound_capacity, 4);
    }

    #[test]
    fn settings_reject_zero_capacity() {
        let toml = "[stream]\noutbound_capacity = 0\n";
        let err = Settings::extract(Figment::new().merge(Toml::string(toml))).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn worker_config_from_args() {
        let args = args(&["localhost", "7071", "worker-1", "req-1", "1024"]).unwrap();
        let config = WorkerConfig::new(args, Settings::default()).unwrap();

        assert_eq!(config.address(), "localhost:7071");
        assert_eq!(config.identity.worker_id, "worker-1");
        assert_eq!(config.identity.request_id, "req-1");
        assert_eq!(config.max_message_size, 1024);
    }

    #[test]
    fn worker_config_rejects_zero_message_size() {
        let args = args(&["localhost", "7071", "worker-1", "req-1", "0"]).unwrap();
        assert!(WorkerConfig::new(args, Settings::default()).is_err());
    }
}
