//! Per-gateway proxy configuration overrides.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// ProxyConfig carries data-plane configuration overrides for the Gateways
/// that reference it.
#[derive(
    Clone,
    Debug,
    Default,
    kube::CustomResource,
    serde::Deserialize,
    serde::Serialize,
    schemars::JsonSchema,
)]
#[kube(
    group = "gateway.envoyproxy.io",
    version = "v1alpha1",
    kind = "ProxyConfig",
    root = "ProxyConfig",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfigSpec {
    /// RoutingType can be set to Service to use the Service cluster IP for
    /// routing into the cluster, or Endpoint to route directly to individual
    /// endpoints. When unset, the translator-wide default applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_type: Option<RoutingType>,
}

/// RoutingType defines the type of routing of this Envoy proxy.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum RoutingType {
    /// Route to the Service cluster IP.
    Service,

    /// Route to individual endpoints gathered from EndpointSlices.
    Endpoint,
}
