pub mod config;
pub mod gateway;
pub mod mcp;
pub mod models;
pub mod workflow;

// Re-export main types
pub use config::{ApiConfig, AssistantConfig, HealthCheckConfig};
pub use gateway::{ApiGateway, ErrorPayload, GatewayResult, HttpGateway, Method};
pub use models::{
    DiagnosisReport, Finding, FindingCategory, HealthReport, HealthSummary, NetworkHealth, Severity,
};
pub use workflow::{
    DiagnosisRequest, DiagnosticEngine, EngineError, HealthCheckEngine, WorkflowContext,
};

// Re-export MCP server
pub use mcp::MerakiServer;
