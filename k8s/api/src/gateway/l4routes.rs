use super::common::{BackendRef, CommonRouteSpec, RouteStatus};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The TLSRoute resource is similar to TCPRoute, but can be configured to
/// match against TLS-specific metadata (SNI).
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
    group = "gateway.networking.k8s.io",
    version = "v1alpha2",
    kind = "TLSRoute",
    root = "TlsRoute",
    status = "TlsRouteStatus",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct TlsRouteSpec {
    /// Common route information.
    #[serde(flatten)]
    pub inner: CommonRouteSpec,

    /// Hostnames defines a set of SNI names that should match against the SNI
    /// attribute of TLS ClientHello message in TLS handshake.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostnames: Option<Vec<String>>,

    /// Rules are a list of TLS matchers and actions.
    pub rules: Vec<TlsRouteRule>,
}

/// TLSRouteRule is the configuration for a given rule.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TlsRouteRule {
    /// BackendRefs defines the backend(s) where matching requests should be
    /// sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_refs: Option<Vec<BackendRef>>,
}

/// TLSRouteStatus defines the observed state of TLSRoute.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct TlsRouteStatus {
    #[serde(flatten)]
    pub inner: RouteStatus,
}

/// TCPRoute provides a way to route TCP requests.
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
    group = "gateway.networking.k8s.io",
    version = "v1alpha2",
    kind = "TCPRoute",
    root = "TcpRoute",
    status = "TcpRouteStatus",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct TcpRouteSpec {
    /// Common route information.
    #[serde(flatten)]
    pub inner: CommonRouteSpec,

    /// Rules are a list of TCP matchers and actions. One and only one rule is
    /// supported.
    pub rules: Vec<TcpRouteRule>,
}

/// TCPRouteRule is the configuration for a given rule.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TcpRouteRule {
    /// BackendRefs defines the backend(s) where matching requests should be
    /// sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_refs: Option<Vec<BackendRef>>,
}

/// TCPRouteStatus defines the observed state of TCPRoute.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct TcpRouteStatus {
    #[serde(flatten)]
    pub inner: RouteStatus,
}

/// UDPRoute provides a way to route UDP traffic.
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
    group = "gateway.networking.k8s.io",
    version = "v1alpha2",
    kind = "UDPRoute",
    root = "UdpRoute",
    status = "UdpRouteStatus",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct UdpRouteSpec {
    /// Common route information.
    #[serde(flatten)]
    pub inner: CommonRouteSpec,

    /// Rules are a list of UDP matchers and actions. One and only one rule is
    /// supported.
    pub rules: Vec<UdpRouteRule>,
}

/// UDPRouteRule is the configuration for a given rule.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UdpRouteRule {
    /// BackendRefs defines the backend(s) where matching requests should be
    /// sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_refs: Option<Vec<BackendRef>>,
}

/// UDPRouteStatus defines the observed state of UDPRoute.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct UdpRouteStatus {
    #[serde(flatten)]
    pub inner: RouteStatus,
}
