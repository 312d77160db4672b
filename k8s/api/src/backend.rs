//! The controller-specific `Backend` resource: a backend whose endpoints are
//! declared directly on the object rather than discovered from a Service.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Backend allows the user to configure the endpoints of a backend and the
/// behavior of the connection to it.
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
    kind = "Backend",
    root = "Backend",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct BackendSpec {
    /// Endpoints defines the endpoints to be used when connecting to the
    /// backend.
    #[serde(default)]
    pub endpoints: Vec<BackendEndpoint>,

    /// AppProtocols defines the application protocols to be supported when
    /// connecting to the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_protocols: Option<Vec<AppProtocolType>>,

    /// Fallback indicates whether the backend is designated as a fallback.
    /// Traffic is sent to fallback backends only when all primary backends
    /// are unavailable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<bool>,
}

/// BackendEndpoint describes a backend endpoint, which can be either a
/// fully-qualified domain name, an IP address or a Unix domain socket
/// corresponding to the application. Exactly one of the members should be
/// set.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackendEndpoint {
    /// IP defines an IP endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<IpEndpoint>,

    /// FQDN defines a FQDN endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<FqdnEndpoint>,

    /// Unix defines the unix domain socket endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unix: Option<UnixSocket>,
}

/// IPEndpoint describes TCP/UDP socket address, corresponding to Envoy's
/// SocketAddress.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct IpEndpoint {
    /// Address defines the IP address of the backend endpoint.
    pub address: String,

    /// Port defines the port of the backend endpoint.
    pub port: u16,
}

/// FQDNEndpoint describes a FQDN endpoint.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct FqdnEndpoint {
    /// Hostname defines the FQDN hostname of the backend endpoint.
    pub hostname: String,

    /// Port defines the port of the backend endpoint.
    pub port: u16,
}

/// UnixSocket describes TCP/UDP unix domain socket address.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct UnixSocket {
    /// Path defines the unix domain socket path of the backend endpoint.
    pub path: String,
}

/// AppProtocolType defines the application protocols a backend may declare
/// support for.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum AppProtocolType {
    /// HTTP/2 over cleartext.
    #[serde(rename = "gateway.envoyproxy.io/h2c")]
    H2c,

    /// WebSocket over HTTP.
    #[serde(rename = "gateway.envoyproxy.io/ws")]
    Ws,

    /// WebSocket over HTTPS.
    #[serde(rename = "gateway.envoyproxy.io/wss")]
    Wss,
}
