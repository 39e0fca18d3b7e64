//! Script engine that runs each function as a child process.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use skiff_proto::HttpParams;
use tokio::process::Command;
use tracing::debug;

use super::ScriptEngine;
use crate::config::EngineSettings;
use crate::error::ExecutionError;

/// Runs function scripts as child processes.
///
/// The command line for the current invocation is built up in a pending
/// buffer: the optional interpreter and its arguments, the script path, and
/// the argument (as one JSON object) when present. Stdout lines are the
/// script's output; a non-zero exit fails the invocation with stderr as the
/// detail.
#[derive(Debug, Clone, Default)]
pub struct ProcessEngine {
    interpreter: Option<PathBuf>,
    interpreter_args: Vec<String>,
    pending: Vec<OsString>,
}

impl ProcessEngine {
    /// Creates an engine that executes scripts directly.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine that runs scripts through `program`.
    #[must_use]
    pub fn with_interpreter(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            interpreter: Some(program.into()),
            interpreter_args: args,
            pending: Vec::new(),
        }
    }

    /// Creates an engine from settings.
    #[must_use]
    pub fn from_settings(settings: &EngineSettings) -> Self {
        match &settings.interpreter {
            Some(program) => Self::with_interpreter(program, settings.interpreter_args.clone()),
            None => Self::new(),
        }
    }

    /// Returns the pending command line.
    #[must_use]
    pub fn pending(&self) -> &[OsString] {
        &self.pending
    }

    fn add_command(&mut self, script: &Path) {
        if let Some(interpreter) = &self.interpreter {
            self.pending.push(interpreter.clone().into_os_string());
            self.pending
                .extend(self.interpreter_args.iter().map(OsString::from));
        }
        self.pending.push(script.as_os_str().to_owned());
    }

    fn add_argument(&mut self, params: &HttpParams) -> Result<(), ExecutionError> {
        let object: serde_json::Map<String, serde_json::Value> = params
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();
        let json = serde_json::to_string(&object)
            .map_err(|e| ExecutionError::Argument(e.to_string()))?;
        self.pending.push(json.into());
        Ok(())
    }
}

#[async_trait]
impl ScriptEngine for ProcessEngine {
    async fn invoke(
        &mut self,
        script: &Path,
        argument: Option<&HttpParams>,
    ) -> Result<Vec<String>, ExecutionError> {
        self.add_command(script);
        if let Some(params) = argument {
            self.add_argument(params)?;
        }

        let Some((program, args)) = self.pending.split_first() else {
            return Err(ExecutionError::Argument("empty command line".to_owned()));
        };

        debug!(program = ?program, args = args.len(), "spawning script");

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ExecutionError::Spawn {
                program: program.to_string_lossy().into_owned(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_owned();
            return Err(ExecutionError::Failed {
                code: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_owned)
            .collect())
    }

    fn reset(&mut self) {
        self.pending.clear();
    }
}
