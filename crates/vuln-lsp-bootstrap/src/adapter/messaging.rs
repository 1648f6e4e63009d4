//! JSON-RPC messaging over a framed connection.

use std::io::{BufRead, Write};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::error::AdapterError;
use super::jsonrpc::{
    JsonRpcMessage, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, RequestIds,
};
use super::lifecycle::ADAPTER_TARGET;
use super::transport::FramedTransport;
use crate::launch::OutputEncoding;
use crate::session::SessionId;

/// Maximum number of messages inspected while waiting for a response.
pub(super) const MAX_RESPONSE_ITERATIONS: usize = 100;

/// One JSON-RPC conversation with a backend.
pub(super) struct Channel<R, W> {
    transport: FramedTransport<R, W>,
    ids: RequestIds,
    encoding: OutputEncoding,
    session: SessionId,
}

impl<R: BufRead, W: Write> Channel<R, W> {
    pub(super) fn new(
        transport: FramedTransport<R, W>,
        encoding: OutputEncoding,
        session: SessionId,
    ) -> Self {
        Self {
            transport,
            ids: RequestIds::default(),
            encoding,
            session,
        }
    }

    /// Sends a request and deserializes its non-null result.
    pub(super) fn request<P, T>(&mut self, method: &str, params: P) -> Result<T, AdapterError>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        let response = self.request_raw(method, params)?;
        match response.result {
            Some(Value::Null) | None => Err(AdapterError::InitializationFailed {
                message: format!("empty result in response to {method}"),
            }),
            Some(value) => serde_json::from_value(value).map_err(AdapterError::from),
        }
    }

    /// Sends a request and returns the raw response.
    pub(super) fn request_raw<P>(
        &mut self,
        method: &str,
        params: P,
    ) -> Result<JsonRpcResponse, AdapterError>
    where
        P: Serialize,
    {
        let request = JsonRpcRequest::new(self.ids.next_id(), method, encode_params(params)?);
        let payload = serde_json::to_vec(&request)?;

        debug!(
            target: ADAPTER_TARGET,
            session = %self.session,
            method,
            id = request.id,
            "sending request"
        );

        self.transport.send(&payload)?;
        let response = self.receive_response_for(request.id)?;
        if let Some(error) = response.error {
            return Err(AdapterError::from_jsonrpc(error));
        }
        Ok(response)
    }

    /// Sends a notification (no response expected).
    pub(super) fn notify<P>(&mut self, method: &str, params: P) -> Result<(), AdapterError>
    where
        P: Serialize,
    {
        let notification = JsonRpcNotification::new(method, encode_params(params)?);
        let payload = serde_json::to_vec(&notification)?;

        debug!(
            target: ADAPTER_TARGET,
            session = %self.session,
            method,
            "sending notification"
        );

        self.transport.send(&payload)?;
        Ok(())
    }

    /// Receives messages until the response to `request_id` arrives.
    ///
    /// Notifications, server requests and unrelated responses are skipped,
    /// up to [`MAX_RESPONSE_ITERATIONS`] messages.
    fn receive_response_for(&mut self, request_id: i64) -> Result<JsonRpcResponse, AdapterError> {
        for _ in 0..MAX_RESPONSE_ITERATIONS {
            let bytes = self.transport.receive()?;
            let payload = self
                .encoding
                .decode(&bytes)
                .map_err(|source| AdapterError::Encoding {
                    encoding: self.encoding.label(),
                    source,
                })?;

            match JsonRpcMessage::parse(payload)? {
                JsonRpcMessage::Response(response) if response.id == Some(request_id) => {
                    return Ok(response);
                }
                JsonRpcMessage::Response(response) => {
                    warn!(
                        target: ADAPTER_TARGET,
                        session = %self.session,
                        expected = request_id,
                        received = ?response.id,
                        "skipping response with non-matching ID"
                    );
                }
                JsonRpcMessage::ServerRequest(incoming) => {
                    debug!(
                        target: ADAPTER_TARGET,
                        session = %self.session,
                        method = %incoming.method,
                        "ignoring server-initiated request"
                    );
                }
                JsonRpcMessage::Notification(incoming) => {
                    debug!(
                        target: ADAPTER_TARGET,
                        session = %self.session,
                        method = %incoming.method,
                        "skipping server notification"
                    );
                }
            }
        }

        warn!(
            target: ADAPTER_TARGET,
            session = %self.session,
            request_id,
            max_iterations = MAX_RESPONSE_ITERATIONS,
            "giving up on response after reaching maximum iterations"
        );
        Err(AdapterError::MaxResponseIterations {
            request_id,
            max_iterations: MAX_RESPONSE_ITERATIONS,
        })
    }

    #[cfg(test)]
    pub(super) fn into_transport(self) -> FramedTransport<R, W> {
        self.transport
    }
}

/// Unit parameters are omitted rather than sent as `null`.
fn encode_params<P: Serialize>(params: P) -> Result<Option<Value>, AdapterError> {
    let value = serde_json::to_value(params)?;
    Ok((!value.is_null()).then_some(value))
}
