//! Integration tests for the diagnosis and health check workflows.
//!
//! These tests drive the engines against a scripted gateway and verify:
//! - Findings, steps and recommendations for each diagnosis branch
//! - Tolerance of failed or malformed sub-calls
//! - Network scan ordering, cap and concurrency
//! - Contract violations failing fast

mod common;

use serde_json::{Value, json};

use common::ScriptedGateway;
use meraki_assistant::workflow::recommendations::{
    ADDRESS_INACTIVE_UPLINKS, GENERIC_FOLLOW_UPS, IMMEDIATE_ACTION,
};
use meraki_assistant::{
    DiagnosisReport, DiagnosisRequest, DiagnosticEngine, EngineError, ErrorPayload, FindingCategory,
    HealthCheckConfig, HealthCheckEngine, Severity,
};

const ORG: &str = "O_1";
const UPLINKS: &str = "/organizations/O_1/uplinks/statuses";
const NETWORKS: &str = "/organizations/O_1/networks";

fn generic() -> Vec<String> {
    GENERIC_FOLLOW_UPS.iter().map(|r| r.to_string()).collect()
}

fn categories(report: &DiagnosisReport) -> Vec<FindingCategory> {
    report.findings.iter().map(|f| f.category).collect()
}

fn networks(count: usize) -> Value {
    Value::Array(
        (1..=count)
            .map(|i| json!({"id": format!("N_{i}"), "name": format!("Network {i}")}))
            .collect(),
    )
}

// ============================================================================
// Diagnosis
// ============================================================================

#[tokio::test]
async fn test_diagnose_inactive_uplink_scenario() {
    let gateway = ScriptedGateway::new().respond(
        UPLINKS,
        json!([{"status": "active"}, {"status": "down"}]),
    );

    let report = DiagnosticEngine::new(&gateway)
        .diagnose(&DiagnosisRequest::new(ORG, "Branch office offline"))
        .await
        .unwrap();

    assert_eq!(report.issue_description, "Branch office offline");
    assert_eq!(report.steps_performed, vec!["Checking organization uplink status"]);
    assert_eq!(report.findings.len(), 1);

    let finding = &report.findings[0];
    assert_eq!(finding.severity, Severity::High);
    assert_eq!(finding.category, FindingCategory::Uplink);
    assert_eq!(finding.message, "Found 1 devices with inactive uplinks");
    assert_eq!(finding.details, Some(json!([{"status": "down"}])));

    let mut expected = vec![IMMEDIATE_ACTION.to_string()];
    expected.extend(generic());
    assert_eq!(report.recommendations, expected);
}

#[tokio::test]
async fn test_diagnose_uplink_failure_is_absorbed() {
    let gateway = ScriptedGateway::new().fail(UPLINKS, ErrorPayload::http(500, "Internal Server Error"));

    let report = DiagnosticEngine::new(&gateway)
        .diagnose(&DiagnosisRequest::new(ORG, "No internet"))
        .await
        .unwrap();

    assert_eq!(report.steps_performed, vec!["Checking organization uplink status"]);
    assert!(report.findings.is_empty());
    assert_eq!(report.recommendations, generic());
}

#[tokio::test]
async fn test_diagnose_uplink_object_response_is_not_iterated() {
    let gateway = ScriptedGateway::new().respond(UPLINKS, json!({"status": "down"}));

    let report = DiagnosticEngine::new(&gateway)
        .diagnose(&DiagnosisRequest::new(ORG, "No internet"))
        .await
        .unwrap();

    assert!(report.findings.is_empty());
}

#[tokio::test]
async fn test_diagnose_network_checks() {
    let gateway = ScriptedGateway::new()
        .respond(UPLINKS, json!([{"serial": "A", "status": "failed"}]))
        .respond(
            "/networks/N_1/health/alerts",
            json!([{"type": "packet loss"}, {"type": "dhcp"}]),
        )
        .respond(
            "/networks/N_1/devices",
            json!([
                {"serial": "B", "status": "online"},
                {"serial": "C", "status": "offline"},
                {"serial": "D", "status": "alerting"}
            ]),
        );

    let report = DiagnosticEngine::new(&gateway)
        .diagnose(&DiagnosisRequest::new(ORG, "Slow WiFi").with_network("N_1"))
        .await
        .unwrap();

    assert_eq!(
        report.steps_performed,
        vec![
            "Checking organization uplink status",
            "Checking network health: N_1"
        ]
    );
    assert_eq!(
        categories(&report),
        vec![
            FindingCategory::Uplink,
            FindingCategory::Alerts,
            FindingCategory::DeviceStatus
        ]
    );

    let alerts = &report.findings[1];
    assert_eq!(alerts.severity, Severity::Medium);
    assert_eq!(alerts.message, "Found 2 active alerts");

    let devices = &report.findings[2];
    assert_eq!(devices.severity, Severity::High);
    assert_eq!(devices.message, "Found 2 offline devices");
    assert_eq!(
        devices.details,
        Some(json!([
            {"serial": "C", "status": "offline"},
            {"serial": "D", "status": "alerting"}
        ]))
    );

    assert_eq!(
        gateway.calls(),
        vec![UPLINKS, "/networks/N_1/health/alerts", "/networks/N_1/devices"]
    );
}

#[tokio::test]
async fn test_diagnose_medium_only_has_no_immediate_action() {
    let gateway = ScriptedGateway::new()
        .respond(UPLINKS, json!([{"status": "active"}]))
        .respond("/networks/N_1/health/alerts", json!([{"type": "dhcp"}]))
        .respond("/networks/N_1/devices", json!([{"status": "online"}]));

    let report = DiagnosticEngine::new(&gateway)
        .diagnose(&DiagnosisRequest::new(ORG, "Intermittent drops").with_network("N_1"))
        .await
        .unwrap();

    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].severity, Severity::Medium);
    assert!(!report.has_high_severity());
    assert_eq!(report.recommendations, generic());
}

#[tokio::test]
async fn test_diagnose_device_details_embed_errors() {
    let gateway = ScriptedGateway::new()
        .respond(UPLINKS, json!([]))
        .respond("/devices/Q2XX/statuses", json!({"status": "online"}))
        .fail("/devices/Q2XX/uplink", ErrorPayload::transport("connection refused"));

    let report = DiagnosticEngine::new(&gateway)
        .diagnose(&DiagnosisRequest::new(ORG, "AP unreachable").with_device("Q2XX"))
        .await
        .unwrap();

    assert_eq!(
        report.steps_performed,
        vec!["Checking organization uplink status", "Checking device: Q2XX"]
    );
    assert_eq!(report.findings.len(), 1);

    let details = &report.findings[0];
    assert_eq!(details.severity, Severity::Info);
    assert_eq!(details.category, FindingCategory::DeviceDetails);
    assert_eq!(
        details.details,
        Some(json!({
            "device_status": {"status": "online"},
            "uplink_status": {"error": "connection refused"}
        }))
    );
    assert_eq!(report.recommendations, generic());
}

#[tokio::test]
async fn test_diagnose_all_calls_failing_still_reports() {
    let gateway = ScriptedGateway::new();

    let report = DiagnosticEngine::new(&gateway)
        .diagnose(
            &DiagnosisRequest::new(ORG, "Everything is down")
                .with_network("N_1")
                .with_device("Q2XX"),
        )
        .await
        .unwrap();

    assert_eq!(report.steps_performed.len(), 3);
    assert_eq!(categories(&report), vec![FindingCategory::DeviceDetails]);
    assert_eq!(report.recommendations, generic());
}

#[tokio::test]
async fn test_diagnose_empty_optional_ids_are_skipped() {
    let gateway = ScriptedGateway::new().respond(UPLINKS, json!([]));
    let request = DiagnosisRequest {
        network_id: Some(String::new()),
        device_serial: Some(String::new()),
        ..DiagnosisRequest::new(ORG, "Nothing specific")
    };

    let report = DiagnosticEngine::new(&gateway).diagnose(&request).await.unwrap();

    assert_eq!(report.steps_performed.len(), 1);
    assert_eq!(gateway.calls(), vec![UPLINKS]);
}

#[tokio::test]
async fn test_diagnose_blank_optional_ids_are_skipped() {
    let gateway = ScriptedGateway::new().respond(UPLINKS, json!([]));
    let request = DiagnosisRequest::new(ORG, "Nothing specific")
        .with_network(" ")
        .with_device("\t");

    let report = DiagnosticEngine::new(&gateway).diagnose(&request).await.unwrap();

    assert_eq!(report.steps_performed.len(), 1);
    assert_eq!(gateway.calls(), vec![UPLINKS]);
}

#[tokio::test]
async fn test_diagnose_is_idempotent_apart_from_timestamp() {
    let gateway = ScriptedGateway::new()
        .respond(UPLINKS, json!([{"status": "down"}]))
        .respond("/networks/N_1/health/alerts", json!([{"type": "dhcp"}]))
        .respond("/networks/N_1/devices", json!([{"status": "offline"}]));
    let engine = DiagnosticEngine::new(&gateway);
    let request = DiagnosisRequest::new(ORG, "Slow").with_network("N_1");

    let first = engine.diagnose(&request).await.unwrap();
    let mut second = engine.diagnose(&request).await.unwrap();
    second.timestamp = first.timestamp;

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_diagnose_findings_belong_to_performed_steps() {
    let gateway = ScriptedGateway::new()
        .respond(UPLINKS, json!([{"status": "down"}]))
        .respond("/networks/N_1/devices", json!([{"status": "offline"}]));

    let report = DiagnosticEngine::new(&gateway)
        .diagnose(&DiagnosisRequest::new(ORG, "Slow").with_network("N_1"))
        .await
        .unwrap();

    for finding in &report.findings {
        let step_prefix = match finding.category {
            FindingCategory::Uplink => "Checking organization uplink status",
            FindingCategory::Alerts | FindingCategory::DeviceStatus => "Checking network health",
            FindingCategory::DeviceDetails => "Checking device",
        };
        assert!(
            report
                .steps_performed
                .iter()
                .any(|step| step.starts_with(step_prefix)),
            "finding {:?} has no matching step",
            finding.category
        );
    }
}

#[tokio::test]
async fn test_diagnose_requires_arguments() {
    let gateway = ScriptedGateway::new();
    let engine = DiagnosticEngine::new(&gateway);

    let err = engine
        .diagnose(&DiagnosisRequest::new(ORG, ""))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::MissingArgument("issue_description"));

    let err = engine
        .diagnose(&DiagnosisRequest::new("", "Slow"))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::MissingArgument("organization_id"));

    assert!(gateway.calls().is_empty());
}

// ============================================================================
// Health Check
// ============================================================================

#[tokio::test]
async fn test_health_check_summary_and_ordering() {
    let mut gateway = ScriptedGateway::new()
        .respond(NETWORKS, networks(5))
        .respond(
            UPLINKS,
            json!([{"status": "active"}, {"status": "failed"}, {"status": "not connected"}]),
        );
    for i in 1..=5 {
        let devices = if i == 2 || i == 4 {
            json!([{"status": "online"}, {"status": "offline"}])
        } else {
            json!([{"status": "online"}])
        };
        gateway = gateway
            .respond(&format!("/networks/N_{i}/devices"), devices)
            .respond(&format!("/networks/N_{i}/health/alerts"), json!([]));
    }

    let report = HealthCheckEngine::new(&gateway)
        .health_check(ORG, true)
        .await
        .unwrap();

    assert_eq!(report.organization_id, ORG);
    assert_eq!(report.summary.total_networks, Some(5));
    assert_eq!(report.summary.total_uplinks, Some(3));
    assert_eq!(report.summary.inactive_uplinks, Some(2));

    let ids: Vec<&str> = report
        .network_health
        .iter()
        .map(|n| n.network_id.as_str())
        .collect();
    assert_eq!(ids, vec!["N_1", "N_2", "N_3", "N_4", "N_5"]);
    assert_eq!(report.network_health[1].device_count, 2);
    assert_eq!(report.network_health[1].offline_devices, 1);
    assert_eq!(report.network_health[0].offline_devices, 0);

    assert_eq!(
        report.recommendations,
        vec![
            ADDRESS_INACTIVE_UPLINKS.to_string(),
            "Network 'Network 2' has 1 offline devices".to_string(),
            "Network 'Network 4' has 1 offline devices".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_health_check_scans_first_ten_networks() {
    let gateway = ScriptedGateway::new()
        .respond(NETWORKS, networks(15))
        .respond(UPLINKS, json!([]));

    let report = HealthCheckEngine::new(&gateway)
        .health_check(ORG, true)
        .await
        .unwrap();

    assert_eq!(report.summary.total_networks, Some(15));
    assert_eq!(report.network_health.len(), 10);
    assert_eq!(report.network_health[9].network_id, "N_10");

    let calls = gateway.calls();
    assert!(calls.contains(&"/networks/N_10/devices".to_string()));
    assert!(
        !calls
            .iter()
            .any(|c| (11..=15).any(|i| c.starts_with(&format!("/networks/N_{i}/"))))
    );
}

#[tokio::test]
async fn test_health_check_call_order_is_sequential() {
    let gateway = ScriptedGateway::new()
        .respond(NETWORKS, networks(2))
        .respond(UPLINKS, json!([]));

    HealthCheckEngine::new(&gateway)
        .health_check(ORG, false)
        .await
        .unwrap();

    assert_eq!(
        gateway.calls(),
        vec![
            NETWORKS,
            "/networks/N_1/health/alerts",
            "/networks/N_1/devices",
            "/networks/N_2/health/alerts",
            "/networks/N_2/devices",
            UPLINKS,
        ]
    );
}

#[tokio::test]
async fn test_health_check_concurrent_scan_keeps_listing_order() {
    let mut gateway = ScriptedGateway::new()
        .respond(NETWORKS, networks(8))
        .respond(UPLINKS, json!([]));
    for i in 1..=8 {
        let devices: Vec<Value> = (0..i).map(|_| json!({"status": "offline"})).collect();
        gateway = gateway.respond(&format!("/networks/N_{i}/devices"), Value::Array(devices));
    }
    let config = HealthCheckConfig {
        scan_concurrency: 4,
        ..Default::default()
    };

    let concurrent = HealthCheckEngine::with_config(&gateway, config)
        .health_check(ORG, true)
        .await
        .unwrap();
    let sequential = HealthCheckEngine::new(&gateway)
        .health_check(ORG, true)
        .await
        .unwrap();

    assert_eq!(concurrent.network_health, sequential.network_health);
    assert_eq!(concurrent.recommendations, sequential.recommendations);
    let offline: Vec<usize> = concurrent
        .network_health
        .iter()
        .map(|n| n.offline_devices)
        .collect();
    assert_eq!(offline, (1..=8usize).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_health_check_failed_network_calls_count_as_zero() {
    let gateway = ScriptedGateway::new()
        .respond(NETWORKS, networks(2))
        .fail("/networks/N_1/health/alerts", ErrorPayload::http(429, "Too Many Requests"))
        .fail("/networks/N_1/devices", ErrorPayload::transport("timed out"))
        .respond("/networks/N_2/health/alerts", json!([{"type": "dhcp"}]))
        .respond("/networks/N_2/devices", json!({"unexpected": "object"}))
        .respond(UPLINKS, json!([]));

    let report = HealthCheckEngine::new(&gateway)
        .health_check(ORG, true)
        .await
        .unwrap();

    assert_eq!(report.network_health.len(), 2);
    let first = &report.network_health[0];
    assert_eq!((first.alert_count, first.device_count, first.offline_devices), (0, 0, 0));
    let second = &report.network_health[1];
    assert_eq!((second.alert_count, second.device_count, second.offline_devices), (1, 0, 0));
    assert!(report.recommendations.is_empty());
}

#[tokio::test]
async fn test_health_check_networks_failure_leaves_uplinks() {
    let gateway = ScriptedGateway::new()
        .fail(NETWORKS, ErrorPayload::http(403, "Forbidden"))
        .respond(UPLINKS, json!([{"status": "failed"}]));

    let report = HealthCheckEngine::new(&gateway)
        .health_check(ORG, true)
        .await
        .unwrap();

    assert!(report.network_health.is_empty());
    assert_eq!(report.summary.total_networks, None);
    assert_eq!(report.summary.inactive_uplinks, Some(1));
    assert_eq!(report.recommendations, vec![ADDRESS_INACTIVE_UPLINKS.to_string()]);
}

#[tokio::test]
async fn test_health_check_empty_organization() {
    let gateway = ScriptedGateway::new()
        .respond(NETWORKS, json!([]))
        .fail(UPLINKS, ErrorPayload::http(404, "Not Found"));

    let report = HealthCheckEngine::new(&gateway)
        .health_check(ORG, true)
        .await
        .unwrap();

    assert!(report.network_health.is_empty());
    assert_eq!(report.summary.total_networks, Some(0));
    assert_eq!(report.summary.total_uplinks, None);
    assert!(report.recommendations.is_empty());

    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["summary"], json!({"total_networks": 0}));
}

#[tokio::test]
async fn test_health_check_without_recommendations() {
    let gateway = ScriptedGateway::new()
        .respond(NETWORKS, networks(1))
        .respond("/networks/N_1/devices", json!([{"status": "offline"}]))
        .respond(UPLINKS, json!([{"status": "failed"}]));

    let report = HealthCheckEngine::new(&gateway)
        .health_check(ORG, false)
        .await
        .unwrap();

    assert_eq!(report.network_health[0].offline_devices, 1);
    assert!(report.recommendations.is_empty());
}

#[tokio::test]
async fn test_health_check_unnamed_and_malformed_networks() {
    let gateway = ScriptedGateway::new()
        .respond(NETWORKS, json!([{"name": "No id"}, {"id": "N_9"}]))
        .respond("/networks/N_9/devices", json!([{"status": "offline"}]))
        .respond(UPLINKS, json!([]));

    let report = HealthCheckEngine::new(&gateway)
        .health_check(ORG, true)
        .await
        .unwrap();

    assert_eq!(report.summary.total_networks, Some(2));
    assert_eq!(report.network_health.len(), 1);
    assert_eq!(report.network_health[0].network_name, "N_9");
    assert_eq!(
        report.recommendations,
        vec!["Network 'N_9' has 1 offline devices".to_string()]
    );
}

#[tokio::test]
async fn test_health_check_keeps_networks_with_null_fields() {
    let gateway = ScriptedGateway::new()
        .respond(
            NETWORKS,
            json!([
                {"id": "N_1", "name": "HQ", "tags": null},
                {"id": "N_2", "name": "Lab", "productTypes": null}
            ]),
        )
        .respond("/networks/N_1/devices", json!([{"status": "offline"}]))
        .respond(UPLINKS, json!([]));

    let report = HealthCheckEngine::new(&gateway)
        .health_check(ORG, true)
        .await
        .unwrap();

    let names: Vec<&str> = report
        .network_health
        .iter()
        .map(|n| n.network_name.as_str())
        .collect();
    assert_eq!(names, vec!["HQ", "Lab"]);
    assert_eq!(report.network_health[0].offline_devices, 1);
    assert_eq!(
        report.recommendations,
        vec!["Network 'HQ' has 1 offline devices".to_string()]
    );
}

#[tokio::test]
async fn test_health_check_requires_organization() {
    let gateway = ScriptedGateway::new();

    let err = HealthCheckEngine::new(&gateway)
        .health_check("  ", true)
        .await
        .unwrap_err();

    assert_eq!(err, EngineError::MissingArgument("organization_id"));
    assert!(gateway.calls().is_empty());
}
