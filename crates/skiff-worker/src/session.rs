//! Worker session: the state owned by one protocol stream.
//!
//! A [`WorkerSession`] is built once at startup and owns the function
//! registry, the script engine and the identifiers stamped on outbound
//! messages. The receive loop hands it one inbound message at a time and
//! gets exactly one reply back.

use std::time::Duration;

use skiff_proto::{
    Content, ParameterBinding, RpcFunctionMetadata, RpcHttp, StatusResult, StreamingMessage,
    TypedData,
};
use tracing::{debug, info, warn};

use crate::binding::{self, HTTP_OK};
use crate::error::InvocationError;
use crate::executor::{EngineSession, ScriptEngine};
use crate::message::{InboundMessage, InvocationRequest};
use crate::registry::{FunctionMetadata, FunctionRegistry};

/// Worker version reported to the host.
pub const WORKER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Identifiers assigned by the host at launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerIdentity {
    /// Identifies this worker to the host.
    pub worker_id: String,

    /// Session request id carried on every outbound message.
    pub request_id: String,
}

impl WorkerIdentity {
    #[must_use]
    pub fn new(worker_id: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
            request_id: request_id.into(),
        }
    }
}

/// Handshake state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No init request handled yet.
    Uninitialized,
    /// Init request acknowledged.
    Ready,
}

/// State owned by a single protocol stream.
pub struct WorkerSession {
    identity: WorkerIdentity,
    state: SessionState,
    registry: FunctionRegistry,
    engine: Box<dyn ScriptEngine>,
    invocation_timeout: Option<Duration>,
}

impl WorkerSession {
    /// Creates a session around the given engine.
    #[must_use]
    pub fn new(identity: WorkerIdentity, engine: Box<dyn ScriptEngine>) -> Self {
        Self {
            identity,
            state: SessionState::Uninitialized,
            registry: FunctionRegistry::new(),
            engine,
            invocation_timeout: None,
        }
    }

    /// Bounds each engine call. `None` leaves invocations unbounded.
    #[must_use]
    pub fn with_invocation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.invocation_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn identity(&self) -> &WorkerIdentity {
        &self.identity
    }

    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub const fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    /// The announcement written before anything else on the stream.
    #[must_use]
    pub fn start_stream(&self) -> StreamingMessage {
        self.reply(Content::StartStream {
            worker_id: self.identity.worker_id.clone(),
        })
    }

    /// Handles one inbound message and returns its reply.
    pub async fn handle(&mut self, message: InboundMessage) -> StreamingMessage {
        if self.state == SessionState::Uninitialized && !matches!(message, InboundMessage::WorkerInit { .. }) {
            warn!(kind = message.kind(), "message received before worker init");
        }

        let content = match message {
            InboundMessage::WorkerInit { host_version } => self.worker_init(&host_version),
            InboundMessage::FunctionLoad {
                function_id,
                metadata,
            } => self.function_load(function_id, metadata),
            InboundMessage::Invocation(request) => self.invocation(request).await,
        };
        self.reply(content)
    }

    fn worker_init(&mut self, host_version: &str) -> Content {
        info!(
            worker_id = %self.identity.worker_id,
            host_version,
            "worker initialised"
        );
        self.state = SessionState::Ready;

        Content::WorkerInitResponse {
            worker_version: WORKER_VERSION.to_owned(),
            result: StatusResult::success(),
        }
    }

    fn function_load(&mut self, function_id: String, metadata: RpcFunctionMetadata) -> Content {
        let metadata = FunctionMetadata::from(metadata);
        let script = metadata.script_file.clone();

        if self.registry.register(&function_id, metadata) {
            info!(function_id = %function_id, script = %script.display(), "function loaded");
        } else {
            debug!(function_id = %function_id, "function already loaded, keeping first registration");
        }

        Content::FunctionLoadResponse {
            function_id,
            result: StatusResult::success(),
        }
    }

    async fn invocation(&mut self, request: InvocationRequest) -> Content {
        let InvocationRequest {
            invocation_id,
            function_id,
            input_data,
        } = request;

        match self.execute(&function_id, &input_data).await {
            Ok((output_name, body)) => {
                debug!(
                    invocation_id = %invocation_id,
                    function_id = %function_id,
                    "invocation completed"
                );
                Content::InvocationResponse {
                    invocation_id,
                    output_data: vec![ParameterBinding::new(
                        output_name,
                        TypedData::Http(RpcHttp::response(HTTP_OK, body.clone())),
                    )],
                    return_value: Some(TypedData::String(body)),
                    result: StatusResult::success(),
                }
            }
            Err(e) => {
                warn!(
                    invocation_id = %invocation_id,
                    function_id = %function_id,
                    code = %e.code(),
                    error = %e,
                    "invocation failed"
                );
                Content::InvocationResponse {
                    invocation_id,
                    output_data: Vec::new(),
                    return_value: None,
                    result: StatusResult::failure(e.code(), e.to_string()),
                }
            }
        }
    }

    /// Runs the function and returns the output binding name with the
    /// comma-joined output.
    async fn execute(
        &mut self,
        function_id: &str,
        input_data: &[ParameterBinding],
    ) -> Result<(String, String), InvocationError> {
        let metadata = self
            .registry
            .get(function_id)
            .ok_or_else(|| InvocationError::FunctionNotLoaded(function_id.to_owned()))?;
        let resolved = binding::resolve(metadata, input_data)?;

        let mut session = EngineSession::begin(self.engine.as_mut());
        let run = session.invoke(&metadata.script_file, resolved.argument);
        let lines = match self.invocation_timeout {
            Some(limit) => tokio::time::timeout(limit, run)
                .await
                .map_err(|_| InvocationError::Timeout(limit))??,
            None => run.await?,
        };

        Ok((resolved.output.name.clone(), lines.join(",")))
    }

    fn reply(&self, content: Content) -> StreamingMessage {
        StreamingMessage::new(self.identity.request_id.clone(), content)
    }
}
