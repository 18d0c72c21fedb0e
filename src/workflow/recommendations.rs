//! Recommendation synthesis.
//!
//! Pure functions of already-computed findings and counters: identical input
//! always yields the identical, identically ordered list.

use crate::models::{Finding, HealthSummary, NetworkHealth};

pub const IMMEDIATE_ACTION: &str =
    "Immediate action required: Check devices with inactive uplinks or offline status";

/// Follow-ups appended to every diagnosis, in this order.
pub const GENERIC_FOLLOW_UPS: [&str; 4] = [
    "Review device logs for error patterns",
    "Verify physical connections and power",
    "Check for recent configuration changes",
    "Consider firmware updates if available",
];

pub const ADDRESS_INACTIVE_UPLINKS: &str = "Address inactive uplink connections immediately";

/// Recommendations for a diagnosis report.
///
/// The immediate-action line leads, exactly once, when any finding is high severity.
pub fn for_diagnosis(findings: &[Finding]) -> Vec<String> {
    let mut recommendations = Vec::with_capacity(GENERIC_FOLLOW_UPS.len() + 1);

    if findings.iter().any(Finding::is_high) {
        recommendations.push(IMMEDIATE_ACTION.to_string());
    }
    recommendations.extend(GENERIC_FOLLOW_UPS.iter().map(|r| r.to_string()));

    recommendations
}

/// Recommendations for a health report, one per network with offline devices
/// in `network_health` order.
pub fn for_health_check(summary: &HealthSummary, network_health: &[NetworkHealth]) -> Vec<String> {
    let mut recommendations = Vec::new();

    if summary.inactive_uplinks.unwrap_or(0) > 0 {
        recommendations.push(ADDRESS_INACTIVE_UPLINKS.to_string());
    }

    recommendations.extend(
        network_health
            .iter()
            .filter(|network| network.offline_devices > 0)
            .map(|network| {
                format!(
                    "Network '{}' has {} offline devices",
                    network.network_name, network.offline_devices
                )
            }),
    );

    recommendations
}
