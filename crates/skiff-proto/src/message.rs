//! Streaming message envelope and content variants.

use rkyv::{Archive, Deserialize, Serialize};

use crate::types::{ParameterBinding, RpcFunctionMetadata, StatusResult, TypedData};

/// A single message on the worker stream.
///
/// Every message the worker writes carries the session request identifier
/// assigned at process start. The identifier is opaque and never
/// interpreted.
#[derive(Archive, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StreamingMessage {
    /// Session correlation identifier.
    pub request_id: String,

    /// The message content.
    pub content: Content,
}

impl StreamingMessage {
    /// Creates a message with the given request identifier and content.
    #[must_use]
    pub fn new(request_id: impl Into<String>, content: Content) -> Self {
        Self {
            request_id: request_id.into(),
            content,
        }
    }
}

/// Message content, one variant per message kind.
#[derive(Archive, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Worker self-introduction, written once at the start of the stream.
    StartStream { worker_id: String },

    /// Host request to initialise the worker.
    WorkerInitRequest {
        host_version: String,
        capabilities: Vec<(String, String)>,
    },

    /// Worker reply to [`Content::WorkerInitRequest`].
    WorkerInitResponse {
        worker_version: String,
        result: StatusResult,
    },

    /// Host request to register function metadata.
    FunctionLoadRequest {
        function_id: String,
        metadata: RpcFunctionMetadata,
    },

    /// Worker reply to [`Content::FunctionLoadRequest`].
    FunctionLoadResponse {
        function_id: String,
        result: StatusResult,
    },

    /// Host request to run a loaded function.
    InvocationRequest {
        invocation_id: String,
        function_id: String,
        input_data: Vec<ParameterBinding>,
    },

    /// Worker reply to [`Content::InvocationRequest`].
    InvocationResponse {
        invocation_id: String,
        output_data: Vec<ParameterBinding>,
        return_value: Option<TypedData>,
        result: StatusResult,
    },

    /// Host request to cancel an in-flight invocation.
    InvocationCancel { invocation_id: String },

    /// Host request for the worker to shut down.
    WorkerTerminate { grace_period_secs: u64 },
}

impl Content {
    /// Returns the message kind name, for diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::StartStream { .. } => "start_stream",
            Self::WorkerInitRequest { .. } => "worker_init_request",
            Self::WorkerInitResponse { .. } => "worker_init_response",
            Self::FunctionLoadRequest { .. } => "function_load_request",
            Self::FunctionLoadResponse { .. } => "function_load_response",
            Self::InvocationRequest { .. } => "invocation_request",
            Self::InvocationResponse { .. } => "invocation_response",
            Self::InvocationCancel { .. } => "invocation_cancel",
            Self::WorkerTerminate { .. } => "worker_terminate",
        }
    }
}
