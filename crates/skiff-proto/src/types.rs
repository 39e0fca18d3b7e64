//! Payload types shared by the protocol messages.

use rkyv::{Archive, Deserialize, Serialize};

use crate::error::ErrorCode;

/// HTTP parameter set: ordered name/value pairs.
pub type HttpParams = Vec<(String, String)>;

/// Metadata describing one loadable function.
#[derive(Archive, Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct RpcFunctionMetadata {
    /// Function name as declared by the host.
    pub name: String,

    /// Directory the function was loaded from.
    pub directory: String,

    /// Path to the script the worker executes.
    pub script_file: String,

    /// Optional entry point inside the script.
    pub entry_point: String,

    /// Declared bindings, in declaration order.
    ///
    /// Binding names are unique within a function.
    pub bindings: Vec<(String, BindingInfo)>,
}

impl RpcFunctionMetadata {
    /// Creates metadata for a script with no bindings.
    #[must_use]
    pub fn new(name: impl Into<String>, script_file: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script_file: script_file.into(),
            ..Self::default()
        }
    }

    /// Appends a binding declaration.
    #[must_use]
    pub fn with_binding(
        mut self,
        name: impl Into<String>,
        direction: Direction,
        binding_type: impl Into<String>,
    ) -> Self {
        self.bindings.push((
            name.into(),
            BindingInfo {
                direction,
                binding_type: binding_type.into(),
            },
        ));
        self
    }
}

/// Direction of a declared binding.
#[derive(Archive, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    In = 0,
    Out = 1,
}

/// A declared binding of a function.
#[derive(Archive, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BindingInfo {
    /// Binding direction.
    pub direction: Direction,

    /// Free-form binding type tag, e.g. `"http"` or `"httpTrigger"`.
    pub binding_type: String,
}

/// A named value bound to a function parameter or output slot.
#[derive(Archive, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ParameterBinding {
    /// Binding name.
    pub name: String,

    /// Bound value, if any.
    pub data: Option<TypedData>,
}

impl ParameterBinding {
    /// Creates a binding carrying the given value.
    #[must_use]
    pub fn new(name: impl Into<String>, data: TypedData) -> Self {
        Self {
            name: name.into(),
            data: Some(data),
        }
    }
}

/// A typed value on the wire.
#[derive(Archive, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum TypedData {
    /// Plain text.
    String(String),

    /// JSON document as text.
    Json(String),

    /// Raw bytes.
    Bytes(Vec<u8>),

    /// HTTP request or response.
    Http(RpcHttp),
}

impl TypedData {
    /// Returns the HTTP payload if this value is HTTP-shaped.
    #[must_use]
    pub const fn as_http(&self) -> Option<&RpcHttp> {
        match self {
            Self::Http(http) => Some(http),
            Self::String(_) | Self::Json(_) | Self::Bytes(_) => None,
        }
    }
}

/// HTTP request or response payload.
#[derive(Archive, Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct RpcHttp {
    /// Request method. Empty on responses.
    pub method: String,

    /// Request URL. Empty on responses.
    pub url: String,

    /// Header name/value pairs.
    pub headers: Vec<(String, String)>,

    /// Route and query parameters.
    pub params: HttpParams,

    /// Response status code. Zero on requests.
    pub status_code: u16,

    /// Message body.
    pub body: String,
}

impl RpcHttp {
    /// Creates an HTTP request payload.
    #[must_use]
    pub fn request(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    /// Creates an HTTP response payload.
    #[must_use]
    pub fn response(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            body: body.into(),
            ..Self::default()
        }
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }
}

/// Outcome of a request.
#[derive(Archive, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Status {
    Failure = 0,
    Success = 1,
    Cancelled = 2,
}

/// Status carried by every reply.
#[derive(Archive, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StatusResult {
    /// Outcome.
    pub status: Status,

    /// Human-readable detail. Empty on success.
    pub result: String,

    /// Structured error code for failures.
    pub error: Option<ErrorCode>,
}

impl StatusResult {
    /// Creates a success status.
    #[must_use]
    pub const fn success() -> Self {
        Self {
            status: Status::Success,
            result: String::new(),
            error: None,
        }
    }

    /// Creates a failure status with a code and message.
    #[must_use]
    pub fn failure(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status: Status::Failure,
            result: message.into(),
            error: Some(code),
        }
    }

    /// Checks if this status reports success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

impl Default for StatusResult {
    fn default() -> Self {
        Self::success()
    }
}
