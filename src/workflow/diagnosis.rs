//! Connectivity diagnosis.
//!
//! Runs a fixed sequence of checks:
//!
//! 1. Organization-wide uplink statuses (always)
//! 2. Network alerts and device status (when a network is given)
//! 3. Raw device and uplink status (when a device serial is given)
//!
//! then derives recommendations from whatever was found.

use chrono::Utc;
use serde_json::{Value, json};
use tracing::info;

use crate::gateway::{ApiGateway, into_value};
use crate::models::{DiagnosisReport, Finding, FindingCategory, Severity};

use super::{EngineError, not_in_status, recommendations, require, sequence_for};

/// Input for one diagnosis run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosisRequest {
    pub organization_id: String,
    pub issue_description: String,
    pub network_id: Option<String>,
    pub device_serial: Option<String>,
}

impl DiagnosisRequest {
    pub fn new(organization_id: impl Into<String>, issue_description: impl Into<String>) -> Self {
        Self {
            organization_id: organization_id.into(),
            issue_description: issue_description.into(),
            network_id: None,
            device_serial: None,
        }
    }

    pub fn with_network(mut self, network_id: impl Into<String>) -> Self {
        self.network_id = Some(network_id.into());
        self
    }

    pub fn with_device(mut self, serial: impl Into<String>) -> Self {
        self.device_serial = Some(serial.into());
        self
    }

    fn network(&self) -> Option<&str> {
        self.network_id.as_deref().filter(|id| !id.trim().is_empty())
    }

    fn device(&self) -> Option<&str> {
        self.device_serial.as_deref().filter(|serial| !serial.trim().is_empty())
    }
}

/// Accumulates steps and findings while a diagnosis runs.
struct Trace {
    steps: Vec<String>,
    findings: Vec<Finding>,
}

impl Trace {
    fn step(&mut self, description: String) {
        info!("{}", description);
        self.steps.push(description);
    }
}

pub struct DiagnosticEngine<'a, G: ApiGateway + ?Sized> {
    gateway: &'a G,
}

impl<'a, G: ApiGateway + ?Sized> DiagnosticEngine<'a, G> {
    pub fn new(gateway: &'a G) -> Self {
        Self { gateway }
    }

    /// Diagnose a described connectivity problem.
    ///
    /// Gateway failures never fail the run; they only reduce the findings.
    pub async fn diagnose(&self, request: &DiagnosisRequest) -> Result<DiagnosisReport, EngineError> {
        require(&request.organization_id, "organization_id")?;
        require(&request.issue_description, "issue_description")?;

        info!(
            "Diagnosing '{}' in organization {}",
            request.issue_description, request.organization_id
        );

        let mut trace = Trace {
            steps: Vec::new(),
            findings: Vec::new(),
        };

        self.check_organization_uplinks(&request.organization_id, &mut trace)
            .await;

        if let Some(network_id) = request.network() {
            self.check_network(network_id, &mut trace).await;
        }

        if let Some(serial) = request.device() {
            self.check_device(serial, &mut trace).await;
        }

        let recommendations = recommendations::for_diagnosis(&trace.findings);

        info!(
            "Diagnosis finished: {} step(s), {} finding(s)",
            trace.steps.len(),
            trace.findings.len()
        );

        Ok(DiagnosisReport {
            issue_description: request.issue_description.clone(),
            timestamp: Utc::now(),
            steps_performed: trace.steps,
            findings: trace.findings,
            recommendations,
        })
    }

    async fn check_organization_uplinks(&self, organization_id: &str, trace: &mut Trace) {
        trace.step("Checking organization uplink status".to_string());

        let uplinks = self
            .gateway
            .organization_uplink_statuses(organization_id)
            .await;
        let Some(uplinks) = sequence_for("organization uplinks", &uplinks) else {
            return;
        };

        let down = not_in_status(uplinks, "active");
        if !down.is_empty() {
            trace.findings.push(
                Finding::new(
                    Severity::High,
                    FindingCategory::Uplink,
                    format!("Found {} devices with inactive uplinks", down.len()),
                )
                .with_details(Value::Array(down.into_iter().cloned().collect())),
            );
        }
    }

    async fn check_network(&self, network_id: &str, trace: &mut Trace) {
        trace.step(format!("Checking network health: {network_id}"));

        let alerts = self.gateway.network_health_alerts(network_id).await;
        if let Some(alerts) = sequence_for("network alerts", &alerts)
            && !alerts.is_empty()
        {
            trace.findings.push(
                Finding::new(
                    Severity::Medium,
                    FindingCategory::Alerts,
                    format!("Found {} active alerts", alerts.len()),
                )
                .with_details(Value::Array(alerts.to_vec())),
            );
        }

        let devices = self.gateway.network_devices(network_id).await;
        if let Some(devices) = sequence_for("network devices", &devices) {
            let offline = not_in_status(devices, "online");
            if !offline.is_empty() {
                trace.findings.push(
                    Finding::new(
                        Severity::High,
                        FindingCategory::DeviceStatus,
                        format!("Found {} offline devices", offline.len()),
                    )
                    .with_details(Value::Array(offline.into_iter().cloned().collect())),
                );
            }
        }
    }

    /// Always records one info finding holding both raw results, errors included.
    async fn check_device(&self, serial: &str, trace: &mut Trace) {
        trace.step(format!("Checking device: {serial}"));

        let device_status = self.gateway.device_status(serial).await;
        let uplink_status = self.gateway.device_uplink(serial).await;

        trace.findings.push(
            Finding::new(
                Severity::Info,
                FindingCategory::DeviceDetails,
                format!("Collected raw status for device {serial}"),
            )
            .with_details(json!({
                "device_status": into_value(device_status),
                "uplink_status": into_value(uplink_status),
            })),
        );
    }
}
