//! Organization-wide health check.

use chrono::Utc;
use futures::StreamExt;
use futures::stream;
use tracing::{info, warn};

use crate::config::HealthCheckConfig;
use crate::gateway::ApiGateway;
use crate::models::{HealthReport, HealthSummary, Network, NetworkHealth};

use super::{EngineError, not_in_status, recommendations, require, sequence_for};

pub struct HealthCheckEngine<'a, G: ApiGateway + ?Sized> {
    gateway: &'a G,
    config: HealthCheckConfig,
}

impl<'a, G: ApiGateway + ?Sized> HealthCheckEngine<'a, G> {
    pub fn new(gateway: &'a G) -> Self {
        Self::with_config(gateway, HealthCheckConfig::default())
    }

    pub fn with_config(gateway: &'a G, config: HealthCheckConfig) -> Self {
        Self { gateway, config }
    }

    /// Sweep the first `network_scan_limit` networks of an organization, then
    /// its uplinks.
    ///
    /// Networks are scanned `scan_concurrency` at a time; results always come
    /// back in listing order and one failing network never cancels another.
    pub async fn health_check(
        &self,
        organization_id: &str,
        include_recommendations: bool,
    ) -> Result<HealthReport, EngineError> {
        require(organization_id, "organization_id")?;

        info!("Running health check for organization {}", organization_id);

        let mut summary = HealthSummary::default();
        let mut network_health: Vec<NetworkHealth> = Vec::new();

        let networks = self.gateway.networks(organization_id).await;
        if let Some(networks) = sequence_for("organization networks", &networks) {
            summary.total_networks = Some(networks.len());

            if networks.len() > self.config.network_scan_limit {
                info!(
                    "Scanning first {} of {} networks",
                    self.config.network_scan_limit,
                    networks.len()
                );
            }

            let to_scan: Vec<Network> = networks
                .iter()
                .take(self.config.network_scan_limit)
                .filter_map(|raw| match serde_json::from_value::<Network>(raw.clone()) {
                    Ok(network) => Some(network),
                    Err(e) => {
                        warn!("Skipping malformed network entry: {}", e);
                        None
                    }
                })
                .collect();

            network_health = stream::iter(to_scan)
                .map(|network| self.scan_network(network))
                .buffered(self.config.scan_concurrency.max(1))
                .collect()
                .await;
        }

        let uplinks = self
            .gateway
            .organization_uplink_statuses(organization_id)
            .await;
        if let Some(uplinks) = sequence_for("organization uplinks", &uplinks) {
            summary.total_uplinks = Some(uplinks.len());
            summary.inactive_uplinks = Some(not_in_status(uplinks, "active").len());
        }

        let recommendations = if include_recommendations {
            recommendations::for_health_check(&summary, &network_health)
        } else {
            Vec::new()
        };

        info!(
            "Health check finished: {} network(s) scanned",
            network_health.len()
        );

        Ok(HealthReport {
            organization_id: organization_id.to_string(),
            timestamp: Utc::now(),
            summary,
            network_health,
            recommendations,
        })
    }

    async fn scan_network(&self, network: Network) -> NetworkHealth {
        let alerts = self.gateway.network_health_alerts(&network.id).await;
        let devices = self.gateway.network_devices(&network.id).await;

        let alerts = sequence_for("network alerts", &alerts);
        let devices = sequence_for("network devices", &devices);

        NetworkHealth {
            network_name: network.display_name().to_string(),
            alert_count: alerts.map_or(0, <[_]>::len),
            device_count: devices.map_or(0, <[_]>::len),
            offline_devices: devices.map_or(0, |d| not_in_status(d, "online").len()),
            network_id: network.id,
        }
    }
}
