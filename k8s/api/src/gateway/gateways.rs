use super::common::RouteGroupKind;
use crate::labels::Selector;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Gateway represents an instance of a service-traffic handling
/// infrastructure by binding Listeners to a set of IP addresses.
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
    version = "v1",
    kind = "Gateway",
    root = "Gateway",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct GatewaySpec {
    /// GatewayClassName used for this Gateway.
    pub gateway_class_name: String,

    /// Listeners associated with this Gateway. Listeners define logical
    /// endpoints that are bound on this Gateway's addresses.
    pub listeners: Vec<Listener>,
}

/// Listener embodies the concept of a logical endpoint where a Gateway
/// accepts network connections.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Listener {
    /// Name is the name of the Listener. This name must be unique within the
    /// Gateway.
    pub name: String,

    /// Hostname specifies the virtual hostname to match for protocol types
    /// that define this concept.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    /// Port is the network port.
    pub port: u16,

    /// Protocol specifies the network protocol this listener expects to
    /// receive: HTTP, HTTPS, TLS, TCP or UDP.
    pub protocol: String,

    /// TLS is the TLS configuration for the Listener.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<GatewayTlsConfig>,

    /// AllowedRoutes defines the types of routes that MAY be attached to a
    /// Listener and the trusted namespaces where those Route resources MAY
    /// be present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_routes: Option<AllowedRoutes>,
}

/// GatewayTLSConfig describes a TLS configuration.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GatewayTlsConfig {
    /// Mode defines the TLS behavior for the TLS session initiated by the
    /// client: Terminate or Passthrough.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    /// CertificateRefs contains a series of references to Kubernetes objects
    /// that contain TLS certificates and private keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_refs: Option<Vec<SecretObjectReference>>,
}

/// SecretObjectReference identifies an API object including its namespace,
/// defaulting to Secret.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct SecretObjectReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// AllowedRoutes defines which Routes may be attached to this Listener.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct AllowedRoutes {
    /// Namespaces indicates namespaces from which Routes may be attached to
    /// this Listener.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespaces: Option<RouteNamespaces>,

    /// Kinds specifies the groups and kinds of Routes that are allowed to
    /// bind to this Gateway Listener. When unspecified, the kinds of Routes
    /// selected are determined using the Listener protocol.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kinds: Option<Vec<RouteGroupKind>>,
}

/// RouteNamespaces indicate which namespaces Routes should be selected from.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct RouteNamespaces {
    /// From indicates where Routes will be selected for this Gateway:
    /// All, Selector or Same.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<FromNamespaces>,

    /// Selector must be specified when From is set to Selector. In that case,
    /// only Routes in namespaces whose labels match this Selector will be
    /// selected by this Gateway.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<Selector>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum FromNamespaces {
    All,
    Selector,
    Same,
}
