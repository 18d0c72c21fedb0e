use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::finding::Finding;

/// Result of one connectivity diagnosis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisReport {
    pub issue_description: String,
    pub timestamp: DateTime<Utc>,
    /// Steps in execution order
    pub steps_performed: Vec<String>,
    /// Findings in the order their steps ran
    pub findings: Vec<Finding>,
    pub recommendations: Vec<String>,
}

impl DiagnosisReport {
    /// True when any finding is high severity.
    pub fn has_high_severity(&self) -> bool {
        self.findings.iter().any(Finding::is_high)
    }
}

/// Organization-level counters. Fields stay `None` when the backing query failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_networks: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_uplinks: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inactive_uplinks: Option<usize>,
}

/// Per-network counters collected by a health check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkHealth {
    pub network_id: String,
    pub network_name: String,
    pub alert_count: usize,
    pub device_count: usize,
    pub offline_devices: usize,
}

/// Result of an organization-wide health check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub organization_id: String,
    pub timestamp: DateTime<Utc>,
    pub summary: HealthSummary,
    /// One entry per scanned network, in the order the backend listed them
    pub network_health: Vec<NetworkHealth>,
    pub recommendations: Vec<String>,
}
