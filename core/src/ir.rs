use ahash::AHashMap as HashMap;
use std::{collections::BTreeMap, time::Duration};

/// Per-gateway IR, keyed by the gateway's IR key (`<namespace>/<name>`).
pub type IrMap = HashMap<String, Ir>;

/// The routing configuration computed for a single gateway.
///
/// Listeners are created by listener translation before routes are attached;
/// route translation only appends to them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ir {
    pub http: Vec<HttpListener>,
    pub tcp: Vec<TcpListener>,
    pub udp: Vec<UdpListener>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HttpListener {
    /// Unique within the IR: `<gateway-ns>/<gateway-name>/<listener-name>`.
    pub name: String,

    /// Whether the listener speaks HTTP/2. Set when a gRPC route attaches.
    pub is_http2: bool,

    /// Routes in attachment order.
    pub routes: Vec<HttpRoute>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TcpListener {
    pub name: String,

    /// TLS termination material configured on the listener, if any.
    pub tls: Option<TlsTermination>,

    pub routes: Vec<TcpRoute>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UdpListener {
    pub name: String,

    /// A UDP listener carries at most one route.
    pub route: Option<UdpRoute>,
}

/// A match+action record attached to an HTTP listener.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HttpRoute {
    /// `<route-id>/<rule-idx>/<match-idx-or-empty>` plus, once expanded per
    /// host, `/<hostname with '.' replaced by '_'>`.
    pub name: String,

    /// The intersected hostname this clone serves. Empty until per-host
    /// expansion.
    pub hostname: Option<String>,

    pub path_match: Option<StringMatch>,
    pub header_matches: Vec<HeaderMatch>,
    pub query_param_matches: Vec<QueryParamMatch>,

    pub add_request_headers: Vec<AddHeader>,
    pub remove_request_headers: Vec<String>,
    pub add_response_headers: Vec<AddHeader>,
    pub remove_response_headers: Vec<String>,

    pub destination: Option<RouteDestination>,
    pub redirect: Option<Redirect>,
    pub direct_response: Option<CustomResponse>,
    pub url_rewrite: Option<UrlRewrite>,
    pub mirrors: Vec<MirrorPolicy>,
    pub extension_refs: Vec<UnstructuredRef>,

    pub is_http2: bool,
    pub traffic: Option<TrafficFeatures>,
    pub session_persistence: Option<SessionPersistence>,
    pub metadata: Option<ResourceMetadata>,
}

/// A TCP route, synthesized from a TCPRoute or a TLSRoute.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TcpRoute {
    pub name: String,
    pub tls: Option<RouteTls>,
    pub destination: RouteDestination,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UdpRoute {
    pub name: String,
    pub destination: RouteDestination,
}

/// How a string value (path, header, query param) is matched.
///
/// Regular expressions are validated during translation and carried as
/// strings so the IR stays comparable and serializable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StringMatch {
    Exact(String),
    Prefix(String),
    Suffix(String),
    Regex(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderMatch {
    pub name: String,
    pub value: StringMatch,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryParamMatch {
    pub name: String,
    pub value: StringMatch,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddHeader {
    pub name: String,
    pub value: String,

    /// Append to existing values rather than overwrite them.
    pub append: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Redirect {
    pub scheme: Option<String>,
    pub hostname: Option<String>,
    pub path: Option<PathModifier>,
    pub port: Option<u32>,
    pub status_code: Option<u16>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathModifier {
    /// Replace the full path.
    Full(String),

    /// Replace the matched prefix.
    Prefix(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UrlRewrite {
    pub hostname: Option<String>,
    pub path: Option<PathModifier>,
}

/// A response synthesized by the proxy instead of forwarding upstream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomResponse {
    pub status_code: u16,
    pub body: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MirrorPolicy {
    pub destination: RouteDestination,
}

/// An extension filter reference left for the extension layer to resolve.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnstructuredRef {
    pub group: String,
    pub kind: String,
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrafficFeatures {
    /// Upstream request timeout.
    pub timeout: Option<Duration>,

    /// Reserved; route translation does not populate retries yet.
    pub retry: Option<RouteRetry>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteRetry {
    pub num_retries: u32,
    pub per_try_timeout: Option<Duration>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionPersistence {
    Cookie { name: String, ttl: Option<Duration> },
    Header { name: String },
}

/// SNI-based route selection for TLS passthrough and terminated TCP.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TlsInspectorConfig {
    pub snis: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TlsTermination {
    pub certificates: Vec<TlsCertificate>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TlsCertificate {
    /// Name of the secret carrying the certificate and key.
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RouteTls {
    /// Terminate TLS with the listener's material.
    pub terminate: Option<TlsTermination>,

    /// Inspect the ClientHello and match the listed SNIs.
    pub inspector: Option<TlsInspectorConfig>,
}

/// Where matched traffic is sent: an ordered set of weighted settings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RouteDestination {
    pub name: String,
    pub settings: Vec<DestinationSetting>,
}

/// The weight partition of a destination: settings that resolved to
/// endpoints count as valid, the rest keep their weight so synthesized
/// failure responses stay proportional.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BackendWeights {
    pub valid: u32,
    pub invalid: u32,
}

/// The resolution of a single backend reference.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DestinationSetting {
    pub weight: u32,
    pub protocol: Option<AppProtocol>,
    pub endpoints: Vec<DestinationEndpoint>,
    pub address_type: Option<DestinationAddressType>,
    pub tls: Option<BackendTls>,
    pub filters: Option<DestinationFilters>,
    pub ip_family: Option<IpFamily>,

    /// Load-balancing priority; fallback backends are demoted to 1.
    pub priority: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DestinationEndpoint {
    pub host: String,
    pub port: u32,

    /// Set for Unix domain socket endpoints, in which case host and port are
    /// unused.
    pub path: Option<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AppProtocol {
    Http,
    Http2,
    Grpc,
    Tcp,
    Udp,
    Https,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DestinationAddressType {
    Ip,
    Fqdn,
    Mixed,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IpFamily {
    V4,
    V6,
    DualStack,
}

/// Upstream TLS, pre-resolved by the policy layer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BackendTls {
    pub sni: Option<String>,
    pub ca_certificate_name: Option<String>,
}

/// Header mutations scoped to a single destination.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DestinationFilters {
    pub add_request_headers: Vec<AddHeader>,
    pub remove_request_headers: Vec<String>,
    pub add_response_headers: Vec<AddHeader>,
    pub remove_response_headers: Vec<String>,
}

/// Provenance of an IR route: the source object and its annotations, with
/// only the controller's annotation domain retained.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceMetadata {
    pub kind: String,
    pub name: String,
    pub namespace: String,
    pub section_name: Option<String>,
    pub annotations: BTreeMap<String, String>,
}

// === impl Ir ===

impl Ir {
    pub fn http_listener_mut(&mut self, name: &str) -> Option<&mut HttpListener> {
        self.http.iter_mut().find(|l| l.name == name)
    }

    pub fn tcp_listener_mut(&mut self, name: &str) -> Option<&mut TcpListener> {
        self.tcp.iter_mut().find(|l| l.name == name)
    }

    pub fn udp_listener_mut(&mut self, name: &str) -> Option<&mut UdpListener> {
        self.udp.iter_mut().find(|l| l.name == name)
    }
}

// === impl RouteDestination ===

impl RouteDestination {
    pub fn new(name: String) -> Self {
        Self {
            name,
            settings: Vec::new(),
        }
    }

    pub fn to_backend_weights(&self) -> BackendWeights {
        let mut weights = BackendWeights::default();
        for setting in &self.settings {
            if setting.endpoints.is_empty() {
                weights.invalid += setting.weight;
            } else {
                weights.valid += setting.weight;
            }
        }
        weights
    }
}

// === impl DestinationEndpoint ===

impl DestinationEndpoint {
    pub fn new(host: impl Into<String>, port: u32) -> Self {
        Self {
            host: host.into(),
            port,
            path: None,
        }
    }

    pub fn unix(path: impl Into<String>) -> Self {
        Self {
            host: String::new(),
            port: 0,
            path: Some(path.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setting(weight: u32, endpoints: Vec<DestinationEndpoint>) -> DestinationSetting {
        DestinationSetting {
            weight,
            endpoints,
            ..Default::default()
        }
    }

    #[test]
    fn backend_weights_partition_valid_and_invalid() {
        let destination = RouteDestination {
            name: "httproute/default/route/rule/0".to_string(),
            settings: vec![
                setting(1, vec![DestinationEndpoint::new("10.0.0.1", 8080)]),
                setting(3, vec![]),
                setting(2, vec![DestinationEndpoint::new("10.0.0.2", 8080)]),
            ],
        };

        assert_eq!(
            destination.to_backend_weights(),
            BackendWeights {
                valid: 3,
                invalid: 3
            }
        );
    }

    #[test]
    fn empty_destination_has_no_valid_weight() {
        let destination = RouteDestination::new("tcproute/default/route".to_string());
        assert_eq!(destination.to_backend_weights(), BackendWeights::default());
    }

    #[test]
    fn listener_lookup_is_by_name() {
        let mut ir = Ir {
            http: vec![
                HttpListener {
                    name: "default/gateway/http".to_string(),
                    ..Default::default()
                },
                HttpListener {
                    name: "default/gateway/web".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        assert!(ir.http_listener_mut("default/gateway/web").is_some());
        assert!(ir.http_listener_mut("default/gateway/missing").is_none());
        assert!(ir.tcp_listener_mut("default/gateway/http").is_none());
    }
}
