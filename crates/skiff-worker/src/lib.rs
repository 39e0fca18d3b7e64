//! Function worker for a serverless host.
//!
//! The host launches the worker and drives it over one long-lived
//! bidirectional stream. The worker announces itself, acknowledges the
//! host's init request, registers function metadata as it is loaded and
//! runs invocations one at a time through a [`ScriptEngine`], replying to
//! each with a correlated result.
//!
//! - [`registry`]: loaded function metadata
//! - [`binding`]: output binding and argument resolution
//! - [`executor`]: the script engine contract and the process engine
//! - [`session`]: per-stream state and message handling
//! - [`worker`]: the receive loop and reply writer

pub mod binding;
pub mod config;
pub mod error;
pub mod executor;
pub mod message;
pub mod registry;
pub mod session;
pub mod signals;
pub mod transport;
pub mod worker;

pub use config::{Args, Settings, WorkerConfig};
pub use error::{ConfigError, ExecutionError, InvocationError, WorkerError};
pub use executor::{EngineSession, ProcessEngine, ScriptEngine};
pub use message::{InboundMessage, InvocationRequest};
pub use registry::{Binding, FunctionMetadata, FunctionRegistry};
pub use session::{SessionState, WorkerIdentity, WorkerSession};
pub use worker::Worker;
