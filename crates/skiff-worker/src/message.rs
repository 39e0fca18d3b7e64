//! Inbound message classification.

use skiff_proto::{Content, ParameterBinding, RpcFunctionMetadata};

use crate::error::WorkerError;

/// A host message the worker knows how to handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    /// Host initialisation request.
    WorkerInit { host_version: String },

    /// Function metadata to register.
    FunctionLoad {
        function_id: String,
        metadata: RpcFunctionMetadata,
    },

    /// Request to run a loaded function.
    Invocation(InvocationRequest),
}

/// A request to run one function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    /// Correlates the reply; copied verbatim.
    pub invocation_id: String,

    /// Registered function to run.
    pub function_id: String,

    /// Input values, in declaration order.
    pub input_data: Vec<ParameterBinding>,
}

impl InboundMessage {
    /// Returns the message kind name, for diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::WorkerInit { .. } => "worker_init_request",
            Self::FunctionLoad { .. } => "function_load_request",
            Self::Invocation(_) => "invocation_request",
        }
    }
}

impl TryFrom<Content> for InboundMessage {
    type Error = WorkerError;

    fn try_from(content: Content) -> Result<Self, Self::Error> {
        match content {
            Content::WorkerInitRequest { host_version, .. } => Ok(Self::WorkerInit { host_version }),
            Content::FunctionLoadRequest {
                function_id,
                metadata,
            } => Ok(Self::FunctionLoad {
                function_id,
                metadata,
            }),
            Content::InvocationRequest {
                invocation_id,
                function_id,
                input_data,
            } => Ok(Self::Invocation(InvocationRequest {
                invocation_id,
                function_id,
                input_data,
            })),
            other @ (Content::StartStream { .. }
            | Content::WorkerInitResponse { .. }
            | Content::FunctionLoadResponse { .. }
            | Content::InvocationResponse { .. }
            | Content::InvocationCancel { .. }
            | Content::WorkerTerminate { .. }) => Err(WorkerError::UnexpectedMessage { kind: other.kind() }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use skiff_proto::StatusResult;

    #[test]
    fn classifies_host_requests() {
        let init = InboundMessage::try_from(Content::WorkerInitRequest {
            host_version: "4.0".into(),
            capabilities: vec![],
        })
        .unwrap();
        assert_eq!(
            init,
            InboundMessage::WorkerInit {
                host_version: "4.0".into()
            }
        );

        let invoke = InboundMessage::try_from(Content::InvocationRequest {
            invocation_id: "inv-1".into(),
            function_id: "fn-a".into(),
            input_data: vec![],
        })
        .unwrap();
        assert_eq!(invoke.kind(), "invocation_request");
    }

    #[test]
    fn rejects_unhandled_kinds() {
        let cancel = InboundMessage::try_from(Content::InvocationCancel {
            invocation_id: "inv-1".into(),
        });
        assert!(matches!(
            cancel,
            Err(WorkerError::UnexpectedMessage {
                kind: "invocation_cancel"
            })
        ));

        let echoed = InboundMessage::try_from(Content::FunctionLoadResponse {
            function_id: "fn-a".into(),
            result: StatusResult::success(),
        });
        assert!(matches!(
            echoed,
            Err(WorkerError::UnexpectedMessage {
                kind: "function_load_response"
            })
        ));
    }
}
