//! JSON-RPC 2.0 message types for LSP communication.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request identifiers for one connection, starting at 1.
#[derive(Debug, Default)]
pub struct RequestIds {
    last: i64,
}

impl RequestIds {
    /// Returns the next identifier.
    pub fn next_id(&mut self) -> i64 {
        self.last += 1;
        self.last
    }
}

/// A JSON-RPC 2.0 request message.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    /// Protocol version, always "2.0".
    pub jsonrpc: &'static str,
    /// Request identifier.
    pub id: i64,
    /// The method to invoke.
    pub method: String,
    /// Optional parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Creates a request with the supplied identifier.
    #[must_use]
    pub fn new(id: i64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method: method.into(),
            params,
        }
    }
}

/// A JSON-RPC 2.0 notification (no response expected).
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcNotification {
    /// Protocol version, always "2.0".
    pub jsonrpc: &'static str,
    /// The method to invoke.
    pub method: String,
    /// Optional parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    /// Creates a new notification.
    #[must_use]
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.into(),
            params,
        }
    }
}

/// A JSON-RPC 2.0 response message.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    /// Request identifier this response corresponds to.
    pub id: Option<i64>,
    /// The result on success.
    #[serde(default)]
    pub result: Option<Value>,
    /// The error on failure.
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    /// Error code.
    pub code: i64,
    /// Human-readable error message.
    pub message: String,
}

/// Message initiated by the server: a request when `id` is present.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcIncoming {
    /// Identifier of a server request.
    #[serde(default)]
    pub id: Option<Value>,
    /// Method invoked by the server.
    pub method: String,
}

/// Any message a backend may send.
#[derive(Debug, Clone)]
pub enum JsonRpcMessage {
    /// Response to one of our requests.
    Response(JsonRpcResponse),
    /// Request initiated by the server.
    ServerRequest(JsonRpcIncoming),
    /// Notification from the server.
    Notification(JsonRpcIncoming),
}

impl JsonRpcMessage {
    /// Classifies a decoded payload.
    ///
    /// # Errors
    ///
    /// Returns the JSON error when the payload is not a JSON-RPC object.
    pub fn parse(payload: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(payload)?;
        if value.get("method").is_none() {
            return serde_json::from_value(value).map(Self::Response);
        }
        let incoming: JsonRpcIncoming = serde_json::from_value(value)?;
        if incoming.id.is_some() {
            Ok(Self::ServerRequest(incoming))
        } else {
            Ok(Self::Notification(incoming))
        }
    }
}
