//! Per-session discovery cache.
//!
//! A `WorkflowContext` belongs to exactly one conversation. It remembers the
//! organizations and networks already listed so follow-up tool calls in the
//! same session skip redundant fetches. Only successful listings are cached.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::gateway::{ApiGateway, ErrorPayload, GatewayResult};
use crate::models::{Network, Organization};

#[derive(Debug, Clone, Default)]
pub struct WorkflowContext {
    organizations: Option<Vec<Organization>>,
    networks: Option<Vec<Network>>,
    /// Organization the cached `networks` belong to
    networks_organization: Option<String>,
}

impl WorkflowContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached_organizations(&self) -> Option<&[Organization]> {
        self.organizations.as_deref()
    }

    /// Cached networks, if they were listed for `organization_id`.
    pub fn cached_networks(&self, organization_id: &str) -> Option<&[Network]> {
        match self.networks_organization.as_deref() {
            Some(org) if org == organization_id => self.networks.as_deref(),
            _ => None,
        }
    }

    /// Organizations visible to the API key, fetched on first use.
    pub async fn organizations<G>(
        &mut self,
        gateway: &G,
        refresh: bool,
    ) -> Result<&[Organization], ErrorPayload>
    where
        G: ApiGateway + ?Sized,
    {
        if refresh || self.organizations.is_none() {
            let organizations: Vec<Organization> =
                decode_list(gateway.organizations().await, "a list of organizations")?;
            info!("Cached {} organization(s)", organizations.len());
            self.organizations = Some(organizations);
        } else {
            debug!("Using cached organizations");
        }

        Ok(self.organizations.as_deref().unwrap_or_default())
    }

    /// Networks of `organization_id`, fetched on first use or when the
    /// cached listing belongs to another organization.
    pub async fn networks<G>(
        &mut self,
        gateway: &G,
        organization_id: &str,
        refresh: bool,
    ) -> Result<&[Network], ErrorPayload>
    where
        G: ApiGateway + ?Sized,
    {
        if refresh || self.cached_networks(organization_id).is_none() {
            let networks: Vec<Network> = decode_list(
                gateway.networks(organization_id).await,
                "a list of networks",
            )?;
            info!(
                "Cached {} network(s) for organization {}",
                networks.len(),
                organization_id
            );
            self.networks = Some(networks);
            self.networks_organization = Some(organization_id.to_string());
        } else {
            debug!("Using cached networks for organization {}", organization_id);
        }

        Ok(self.networks.as_deref().unwrap_or_default())
    }

    /// Forget everything discovered so far.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

fn decode_list<T: DeserializeOwned>(
    result: GatewayResult,
    expected: &str,
) -> Result<Vec<T>, ErrorPayload> {
    let Value::Array(items) = result? else {
        return Err(ErrorPayload::unexpected_shape(expected));
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!("Skipping undecodable entry in {}: {}", expected, e);
                None
            }
        })
        .collect())
}
