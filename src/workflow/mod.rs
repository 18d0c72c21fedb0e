//! Multi-step workflows layered on the API Gateway.
//!
//! Both engines run a bounded, ordered sequence of gateway calls and always
//! return a best-effort report: a failed or malformed sub-call degrades the
//! result but never aborts the run. Only a contract violation by the caller
//! (see [`EngineError`]) fails a workflow.

pub mod context;
pub mod diagnosis;
pub mod health;
pub mod recommendations;

use serde_json::Value;
use tracing::warn;

use crate::gateway::GatewayResult;

pub use context::WorkflowContext;
pub use diagnosis::{DiagnosisRequest, DiagnosticEngine};
pub use health::HealthCheckEngine;

/// Invalid invocation of a workflow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("missing required argument: {0}")]
    MissingArgument(&'static str),
}

pub(crate) fn require(value: &str, name: &'static str) -> Result<(), EngineError> {
    if value.trim().is_empty() {
        return Err(EngineError::MissingArgument(name));
    }
    Ok(())
}

/// Extract the list from a step's gateway result, logging why when there is none.
pub(crate) fn sequence_for<'a>(step: &str, result: &'a GatewayResult) -> Option<&'a [Value]> {
    match result {
        Ok(Value::Array(items)) => Some(items.as_slice()),
        Ok(_) => {
            warn!(step, "unexpected response shape, expected a list");
            None
        }
        Err(payload) => {
            warn!(step, error = %payload, "gateway call failed");
            None
        }
    }
}

/// Items whose `status` field is anything other than `expected`, missing included.
pub(crate) fn not_in_status<'a>(items: &'a [Value], expected: &str) -> Vec<&'a Value> {
    items
        .iter()
        .filter(|item| item.get("status").and_then(Value::as_str) != Some(expected))
        .collect()
}
