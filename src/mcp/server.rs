//! Meraki MCP Server implementation.
//!
//! Exposes the management API accessors and the diagnostic workflows to AI
//! assistants via MCP protocol.

use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult, Content, ErrorCode, ErrorData, Implementation, Role, ServerCapabilities,
        ServerInfo,
    },
    schemars::JsonSchema,
    tool, tool_handler, tool_router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::AssistantConfig;
use crate::gateway::{ApiGateway, ErrorPayload, GatewayResult, HttpGateway};
use crate::models::{DeviceUpdate, NetworkUpdate, SsidUpdate};
use crate::workflow::{
    DiagnosisRequest, DiagnosticEngine, EngineError, HealthCheckEngine, WorkflowContext,
};

/// Default client lookback window (one day)
pub const DEFAULT_TIMESPAN: u32 = 86_400;
/// Longest lookback the API accepts (30 days)
pub const MAX_TIMESPAN: u32 = 2_592_000;
/// Highest SSID slot number
pub const MAX_SSID_NUMBER: u8 = 14;

const MISSING_API_KEY: &str = "MERAKI_API_KEY environment variable not set";

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the get_organizations tool
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct GetOrganizationsParams {
    /// Ignore the session cache and fetch again (default: false)
    #[serde(default)]
    pub refresh: bool,
}

/// Parameters for the get_networks tool
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GetNetworksParams {
    /// Organization ID
    pub organization_id: String,
    /// Ignore the session cache and fetch again (default: false)
    #[serde(default)]
    pub refresh: bool,
}

/// Parameters for tools addressing one organization
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct OrganizationParams {
    /// Organization ID
    pub organization_id: String,
}

/// Parameters for tools addressing one network
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct NetworkParams {
    /// Network ID
    pub network_id: String,
}

/// Parameters for tools addressing one device
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DeviceParams {
    /// Device serial number
    pub serial: String,
}

/// Parameters for the get_device_clients tool
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DeviceClientsParams {
    /// Device serial number
    pub serial: String,
    /// Timespan in seconds (max 2592000 - 30 days, default 86400)
    pub timespan: Option<u32>,
}

/// Parameters for the get_network_clients tool
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct NetworkClientsParams {
    /// Network ID
    pub network_id: String,
    /// Timespan in seconds (max 2592000 - 30 days, default 86400)
    pub timespan: Option<u32>,
}

/// Parameters for the get_client_details tool
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ClientDetailsParams {
    /// Network ID
    pub network_id: String,
    /// Client ID or MAC address
    pub client_id: String,
}

/// Parameters for the update_device tool
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct UpdateDeviceParams {
    /// Device serial number
    pub serial: String,
    #[serde(flatten)]
    pub update: DeviceUpdate,
}

/// Parameters for the update_network tool
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct UpdateNetworkParams {
    /// Network ID
    pub network_id: String,
    #[serde(flatten)]
    pub update: NetworkUpdate,
}

/// Parameters for the update_wireless_ssid tool
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct UpdateSsidParams {
    /// Network ID
    pub network_id: String,
    /// SSID number (0-14)
    pub number: String,
    #[serde(flatten)]
    pub update: SsidUpdate,
}

/// Parameters for the diagnose_connectivity_issue tool
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DiagnoseParams {
    /// Organization ID
    pub organization_id: String,
    /// Description of the connectivity issue
    pub issue_description: String,
    /// Network ID (optional)
    pub network_id: Option<String>,
    /// Device serial (optional)
    pub device_serial: Option<String>,
}

/// Parameters for the automated_health_check tool
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct HealthCheckParams {
    /// Organization ID
    pub organization_id: String,
    /// Include configuration recommendations (default: true)
    pub include_recommendations: Option<bool>,
}

// ============================================================================
// Server Implementation
// ============================================================================

/// Meraki MCP Server
///
/// One instance serves one conversation: the workflow context it owns is
/// never shared with another session. The gateway is shared read-only.
#[derive(Clone)]
pub struct MerakiServer {
    tool_router: ToolRouter<Self>,
    /// Absent when no API key is configured
    gateway: Option<Arc<dyn ApiGateway>>,
    /// Discovery cache for this session
    context: Arc<Mutex<WorkflowContext>>,
    config: Arc<AssistantConfig>,
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for MerakiServer {
    fn get_info(&self) -> ServerInfo {
        let instructions = r#"Meraki Assistant: troubleshooting and configuration for Cisco Meraki networks.

Start with get_organizations, then get_networks for an organization, then drill
into devices, clients, alerts and uplinks.

Workflows:
- diagnose_connectivity_issue: multi-step diagnosis (org uplinks, optional network and device checks) with findings and recommendations
- automated_health_check: sweep of the first networks of an organization (alerts, offline devices, uplinks)

Configuration tools (update_device, update_network, update_wireless_ssid) change live settings.
"#;

        ServerInfo {
            server_info: Implementation {
                name: "meraki-assistant".to_string(),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                title: Some("Meraki Assistant".to_string()),
                icons: None,
                website_url: None,
            },
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(instructions.to_string()),
            ..Default::default()
        }
    }
}

#[tool_router(router = tool_router)]
impl MerakiServer {
    /// Create a new server with auto-detected config and env overrides.
    pub fn new() -> Self {
        let base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let config_path = AssistantConfig::auto_detect(&base_dir);
        let config = AssistantConfig::load_with_env(config_path.as_ref())
            .unwrap_or_else(|_| AssistantConfig::default().apply_env_overrides());

        Self::with_config(config)
    }

    /// Create with an already resolved configuration, talking HTTP to the API.
    pub fn with_config(config: AssistantConfig) -> Self {
        let gateway = HttpGateway::from_config(&config.api)
            .map(|gateway| Arc::new(gateway) as Arc<dyn ApiGateway>);
        if gateway.is_none() {
            warn!("{}; tool calls will fail until it is configured", MISSING_API_KEY);
        }

        Self::build(gateway, config)
    }

    /// Create with a caller-supplied gateway.
    pub fn with_gateway(gateway: Arc<dyn ApiGateway>, config: AssistantConfig) -> Self {
        Self::build(Some(gateway), config)
    }

    fn build(gateway: Option<Arc<dyn ApiGateway>>, config: AssistantConfig) -> Self {
        Self {
            tool_router: Self::tool_router(),
            gateway,
            context: Arc::new(Mutex::new(WorkflowContext::new())),
            config: Arc::new(config),
        }
    }

    fn gateway(&self) -> Result<&dyn ApiGateway, ErrorData> {
        self.gateway.as_deref().ok_or_else(|| {
            ErrorData::new(ErrorCode::INVALID_REQUEST, MISSING_API_KEY.to_string(), None)
        })
    }

    // ========================================================================
    // Discovery Tools
    // ========================================================================

    #[tool(
        name = "get_organizations",
        description = "Get all organizations accessible with the API key. First step in workflow."
    )]
    pub async fn get_organizations(
        &self,
        params: Parameters<GetOrganizationsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let gateway = self.gateway()?;
        let mut context = self.context.lock().await;

        match context.organizations(gateway, params.0.refresh).await {
            Ok(organizations) => json_result(&organizations),
            Err(payload) => Ok(error_payload_result(&payload)),
        }
    }

    #[tool(
        name = "get_networks",
        description = "Get all networks in an organization. Use after getting organization ID."
    )]
    pub async fn get_networks(
        &self,
        params: Parameters<GetNetworksParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let gateway = self.gateway()?;
        let mut context = self.context.lock().await;

        match context
            .networks(gateway, &params.0.organization_id, params.0.refresh)
            .await
        {
            Ok(networks) => json_result(&networks),
            Err(payload) => Ok(error_payload_result(&payload)),
        }
    }

    #[tool(
        name = "get_network_devices",
        description = "Get all devices in a network with status information"
    )]
    pub async fn get_network_devices(
        &self,
        params: Parameters<NetworkParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let result = self.gateway()?.network_devices(&params.0.network_id).await;
        gateway_result(result)
    }

    // ========================================================================
    // Device Troubleshooting Tools
    // ========================================================================

    #[tool(
        name = "get_device_status",
        description = "Get detailed status of a specific device including connectivity, performance"
    )]
    pub async fn get_device_status(
        &self,
        params: Parameters<DeviceParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let result = self.gateway()?.device_status(&params.0.serial).await;
        gateway_result(result)
    }

    #[tool(
        name = "get_device_uplink_status",
        description = "Troubleshoot device uplink connectivity issues"
    )]
    pub async fn get_device_uplink_status(
        &self,
        params: Parameters<DeviceParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let result = self.gateway()?.device_uplink(&params.0.serial).await;
        gateway_result(result)
    }

    #[tool(
        name = "get_device_clients",
        description = "Get clients connected to a device for troubleshooting client issues"
    )]
    pub async fn get_device_clients(
        &self,
        params: Parameters<DeviceClientsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let timespan = resolve_timespan(params.0.timespan)?;
        let result = self
            .gateway()?
            .device_clients(&params.0.serial, timespan)
            .await;
        gateway_result(result)
    }

    // ========================================================================
    // Monitoring Tools
    // ========================================================================

    #[tool(
        name = "get_network_health_alerts",
        description = "Get active alerts and health issues for a network"
    )]
    pub async fn get_network_health_alerts(
        &self,
        params: Parameters<NetworkParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let result = self
            .gateway()?
            .network_health_alerts(&params.0.network_id)
            .await;
        gateway_result(result)
    }

    #[tool(
        name = "get_organization_uplink_statuses",
        description = "Get uplink status for all devices across organization"
    )]
    pub async fn get_organization_uplink_statuses(
        &self,
        params: Parameters<OrganizationParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let result = self
            .gateway()?
            .organization_uplink_statuses(&params.0.organization_id)
            .await;
        gateway_result(result)
    }

    // ========================================================================
    // Client Troubleshooting Tools
    // ========================================================================

    #[tool(
        name = "get_network_clients",
        description = "Get all clients in a network for troubleshooting connectivity"
    )]
    pub async fn get_network_clients(
        &self,
        params: Parameters<NetworkClientsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let timespan = resolve_timespan(params.0.timespan)?;
        let result = self
            .gateway()?
            .network_clients(&params.0.network_id, timespan)
            .await;
        gateway_result(result)
    }

    #[tool(
        name = "get_client_details",
        description = "Get detailed information about a specific client"
    )]
    pub async fn get_client_details(
        &self,
        params: Parameters<ClientDetailsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let result = self
            .gateway()?
            .client_details(&params.0.network_id, &params.0.client_id)
            .await;
        gateway_result(result)
    }

    // ========================================================================
    // Configuration Tools
    // ========================================================================

    #[tool(
        name = "update_device",
        description = "Update device configuration (name, tags, address, notes)"
    )]
    pub async fn update_device(
        &self,
        params: Parameters<UpdateDeviceParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let UpdateDeviceParams { serial, update } = params.0;
        let payload = to_payload(&update)?;
        info!("Updating device {}", serial);

        let result = self.gateway()?.update_device(&serial, payload).await;
        gateway_result(result)
    }

    #[tool(
        name = "update_network",
        description = "Update network configuration (name, timezone, tags)"
    )]
    pub async fn update_network(
        &self,
        params: Parameters<UpdateNetworkParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let UpdateNetworkParams { network_id, update } = params.0;
        let payload = to_payload(&update)?;
        info!("Updating network {}", network_id);

        let result = self.gateway()?.update_network(&network_id, payload).await;
        gateway_result(result)
    }

    #[tool(
        name = "get_wireless_ssids",
        description = "Get wireless SSIDs configured in a network"
    )]
    pub async fn get_wireless_ssids(
        &self,
        params: Parameters<NetworkParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let result = self.gateway()?.wireless_ssids(&params.0.network_id).await;
        gateway_result(result)
    }

    #[tool(
        name = "update_wireless_ssid",
        description = "Update wireless SSID configuration. authMode is one of open, psk, 8021x-radius."
    )]
    pub async fn update_wireless_ssid(
        &self,
        params: Parameters<UpdateSsidParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let UpdateSsidParams {
            network_id,
            number,
            update,
        } = params.0;
        let number = parse_ssid_number(&number)?;
        let payload = to_payload(&update)?;
        info!("Updating SSID {} in network {}", number, network_id);

        let result = self
            .gateway()?
            .update_wireless_ssid(&network_id, number, payload)
            .await;
        gateway_result(result)
    }

    // ========================================================================
    // Workflow Tools
    // ========================================================================

    #[tool(
        name = "diagnose_connectivity_issue",
        description = "Intelligent diagnosis of connectivity issues using multi-step analysis"
    )]
    pub async fn diagnose_connectivity_issue(
        &self,
        params: Parameters<DiagnoseParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let params = params.0;
        let request = DiagnosisRequest {
            organization_id: params.organization_id,
            issue_description: params.issue_description,
            network_id: params.network_id,
            device_serial: params.device_serial,
        };

        let report = DiagnosticEngine::new(self.gateway()?)
            .diagnose(&request)
            .await
            .map_err(engine_error)?;

        json_result(&report)
    }

    #[tool(
        name = "automated_health_check",
        description = "Comprehensive automated health check across organization"
    )]
    pub async fn automated_health_check(
        &self,
        params: Parameters<HealthCheckParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let include_recommendations = params.0.include_recommendations.unwrap_or(true);

        let report = HealthCheckEngine::with_config(
            self.gateway()?,
            self.config.health_check.clone(),
        )
        .health_check(&params.0.organization_id, include_recommendations)
        .await
        .map_err(engine_error)?;

        json_result(&report)
    }
}

impl Default for MerakiServer {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn json_result<T: Serialize + ?Sized>(value: &T) -> Result<CallToolResult, ErrorData> {
    let text = serde_json::to_string_pretty(value).map_err(|e| {
        ErrorData::new(
            ErrorCode::INTERNAL_ERROR,
            format!("Failed to serialize response: {}", e),
            None,
        )
    })?;

    Ok(CallToolResult::success(vec![
        Content::text(text).with_audience(vec![Role::Assistant]),
    ]))
}

/// Gateway failures are reported to the assistant as tool errors carrying the payload.
fn error_payload_result(payload: &ErrorPayload) -> CallToolResult {
    let text = serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string());
    CallToolResult::error(vec![
        Content::text(text).with_audience(vec![Role::Assistant]),
    ])
}

fn gateway_result(result: GatewayResult) -> Result<CallToolResult, ErrorData> {
    match result {
        Ok(value) => json_result(&value),
        Err(payload) => Ok(error_payload_result(&payload)),
    }
}

fn engine_error(e: EngineError) -> ErrorData {
    ErrorData::new(ErrorCode::INVALID_PARAMS, e.to_string(), None)
}

fn to_payload<T: Serialize>(update: &T) -> Result<serde_json::Value, ErrorData> {
    serde_json::to_value(update).map_err(|e| {
        ErrorData::new(
            ErrorCode::INVALID_PARAMS,
            format!("Invalid update payload: {}", e),
            None,
        )
    })
}

fn resolve_timespan(timespan: Option<u32>) -> Result<u32, ErrorData> {
    match timespan {
        None => Ok(DEFAULT_TIMESPAN),
        Some(0) => Err(ErrorData::new(
            ErrorCode::INVALID_PARAMS,
            "timespan must be greater than 0".to_string(),
            None,
        )),
        Some(t) if t > MAX_TIMESPAN => Err(ErrorData::new(
            ErrorCode::INVALID_PARAMS,
            format!("timespan {} exceeds the maximum of {} seconds", t, MAX_TIMESPAN),
            None,
        )),
        Some(t) => Ok(t),
    }
}

fn parse_ssid_number(number: &str) -> Result<u8, ErrorData> {
    number
        .trim()
        .parse::<u8>()
        .ok()
        .filter(|n| *n <= MAX_SSID_NUMBER)
        .ok_or_else(|| {
            ErrorData::new(
                ErrorCode::INVALID_PARAMS,
                format!("Invalid SSID number '{}'. Use 0-{}.", number, MAX_SSID_NUMBER),
                None,
            )
        })
}
