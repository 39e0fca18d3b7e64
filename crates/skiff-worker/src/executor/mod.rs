//! Contract to the engine that runs function scripts.

mod process;

use std::path::Path;

use async_trait::async_trait;
use skiff_proto::HttpParams;

use crate::error::ExecutionError;

pub use process::ProcessEngine;

/// An engine that runs one function script at a time.
///
/// Engines may accumulate per-invocation state (a pending command line, a
/// pipeline). [`reset`](ScriptEngine::reset) must clear it; callers go
/// through [`EngineSession`] so that happens on every exit path.
#[async_trait]
pub trait ScriptEngine: Send {
    /// Runs `script`, passing `argument` when present, and returns the
    /// script's output lines.
    ///
    /// `None` means the script receives no argument at all, which is not the
    /// same as an empty parameter set.
    async fn invoke(
        &mut self,
        script: &Path,
        argument: Option<&HttpParams>,
    ) -> Result<Vec<String>, ExecutionError>;

    /// Clears any state left by the previous invocation.
    fn reset(&mut self);
}

/// Exclusive use of an engine for one invocation.
///
/// The engine is reset when the session is dropped, whether the invocation
/// succeeded, failed, or was abandoned mid-flight.
pub struct EngineSession<'a, E: ScriptEngine + ?Sized> {
    engine: &'a mut E,
}

impl<'a, E: ScriptEngine + ?Sized> EngineSession<'a, E> {
    /// Takes the engine for one invocation.
    pub fn begin(engine: &'a mut E) -> Self {
        Self { engine }
    }

    /// Runs the script through the held engine.
    pub async fn invoke(
        &mut self,
        script: &Path,
        argument: Option<&HttpParams>,
    ) -> Result<Vec<String>, ExecutionError> {
        self.engine.invoke(script, argument).await
    }
}

impl<E: ScriptEngine + ?Sized> Drop for EngineSession<'_, E> {
    fn drop(&mut self) {
        self.engine.reset();
    }
}
