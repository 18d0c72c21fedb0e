use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Severity of a diagnostic finding.
///
/// Variants are declared lowest first so the derived ordering gives
/// `High > Medium > Info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Medium,
    High,
}

impl Severity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which diagnostic step produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingCategory {
    /// Organization-wide uplink check
    Uplink,
    /// Network health alerts
    Alerts,
    /// Offline devices in a network
    DeviceStatus,
    /// Raw status dump for a single device
    DeviceDetails,
}

impl FindingCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            FindingCategory::Uplink => "uplink",
            FindingCategory::Alerts => "alerts",
            FindingCategory::DeviceStatus => "device_status",
            FindingCategory::DeviceDetails => "device_details",
        }
    }
}

impl fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single observation made during a diagnosis run. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub category: FindingCategory,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl Finding {
    pub fn new(severity: Severity, category: FindingCategory, message: impl Into<String>) -> Self {
        Self {
            severity,
            category,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn is_high(&self) -> bool {
        self.severity == Severity::High
    }
}
