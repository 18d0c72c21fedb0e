//! API Gateway: the single seam between the workflows and the management backend.
//!
//! Every call returns a [`GatewayResult`]. Remote failures, transport failures and
//! undecodable bodies all arrive as an [`ErrorPayload`] value, never as a panic or
//! a propagated error, so callers decide locally how much of a failure to absorb.

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub use http::HttpGateway;

/// Failure value returned by the gateway in place of a domain payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{error}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
pub struct ErrorPayload {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorPayload {
    /// Remote side answered with a non-success status.
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self {
            error: format!("HTTP {status}"),
            message: Some(body.into()),
        }
    }

    /// Request never produced a response (connection refused, timeout, ...).
    pub fn transport(description: impl Into<String>) -> Self {
        Self {
            error: description.into(),
            message: None,
        }
    }

    /// Response decoded but did not have the expected shape.
    pub fn unexpected_shape(expected: &str) -> Self {
        Self {
            error: "unexpected response shape".to_string(),
            message: Some(format!("expected {expected}")),
        }
    }
}

/// Success payload or failure value from a single gateway call.
pub type GatewayResult = Result<Value, ErrorPayload>;

/// Returns the list inside a successful result, or `None` for errors and
/// non-list payloads alike.
pub fn as_sequence(result: &GatewayResult) -> Option<&[Value]> {
    result.as_ref().ok().and_then(Value::as_array).map(Vec::as_slice)
}

/// Flattens a result into plain JSON, embedding error payloads verbatim.
pub fn into_value(result: GatewayResult) -> Value {
    match result {
        Ok(value) => value,
        Err(payload) => serde_json::to_value(payload).unwrap_or(Value::Null),
    }
}

/// HTTP verbs used against the management API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        };
        f.write_str(verb)
    }
}

/// Access to the management backend.
///
/// Implementors supply [`ApiGateway::request`]; the resource methods are thin
/// path builders on top of it and should not normally be overridden.
/// Implementations must be stateless with respect to callers so one instance
/// can be shared by concurrent sessions.
#[async_trait]
pub trait ApiGateway: Send + Sync {
    /// Perform one logical query or mutation against `path` (relative to the API root).
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> GatewayResult;

    async fn organizations(&self) -> GatewayResult {
        self.request(Method::Get, "/organizations", None).await
    }

    async fn networks(&self, organization_id: &str) -> GatewayResult {
        let path = format!("/organizations/{organization_id}/networks");
        self.request(Method::Get, &path, None).await
    }

    async fn organization_uplink_statuses(&self, organization_id: &str) -> GatewayResult {
        let path = format!("/organizations/{organization_id}/uplinks/statuses");
        self.request(Method::Get, &path, None).await
    }

    async fn network_devices(&self, network_id: &str) -> GatewayResult {
        let path = format!("/networks/{network_id}/devices");
        self.request(Method::Get, &path, None).await
    }

    async fn network_health_alerts(&self, network_id: &str) -> GatewayResult {
        let path = format!("/networks/{network_id}/health/alerts");
        self.request(Method::Get, &path, None).await
    }

    async fn network_clients(&self, network_id: &str, timespan: u32) -> GatewayResult {
        let path = format!("/networks/{network_id}/clients?timespan={timespan}");
        self.request(Method::Get, &path, None).await
    }

    async fn client_details(&self, network_id: &str, client_id: &str) -> GatewayResult {
        let path = format!("/networks/{network_id}/clients/{client_id}");
        self.request(Method::Get, &path, None).await
    }

    async fn update_network(&self, network_id: &str, payload: Value) -> GatewayResult {
        let path = format!("/networks/{network_id}");
        self.request(Method::Put, &path, Some(payload)).await
    }

    async fn wireless_ssids(&self, network_id: &str) -> GatewayResult {
        let path = format!("/networks/{network_id}/wireless/ssids");
        self.request(Method::Get, &path, None).await
    }

    async fn update_wireless_ssid(
        &self,
        network_id: &str,
        number: u8,
        payload: Value,
    ) -> GatewayResult {
        let path = format!("/networks/{network_id}/wireless/ssids/{number}");
        self.request(Method::Put, &path, Some(payload)).await
    }

    async fn device_status(&self, serial: &str) -> GatewayResult {
        let path = format!("/devices/{serial}/statuses");
        self.request(Method::Get, &path, None).await
    }

    async fn device_uplink(&self, serial: &str) -> GatewayResult {
        let path = format!("/devices/{serial}/uplink");
        self.request(Method::Get, &path, None).await
    }

    async fn device_clients(&self, serial: &str, timespan: u32) -> GatewayResult {
        let path = format!("/devices/{serial}/clients?timespan={timespan}");
        self.request(Method::Get, &path, None).await
    }

    async fn update_device(&self, serial: &str, payload: Value) -> GatewayResult {
        let path = format!("/devices/{serial}");
        self.request(Method::Put, &path, Some(payload)).await
    }
}
