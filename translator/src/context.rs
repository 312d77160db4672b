use anyhow::{bail, Result};
use gateway_translator_core::ir;
use gateway_translator_k8s_api::{gateway, labels, proxy::ProxyConfig, Labels, ObjectMeta};
use std::fmt;

/// Annotations carrying this prefix are copied into IR metadata with the
/// prefix stripped; all other annotations are dropped.
const ANNOTATION_PREFIX: &str = "gateway.envoyproxy.io/";

/// The route kinds this translator understands.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RouteKind {
    Http,
    Grpc,
    Tls,
    Tcp,
    Udp,
}

impl RouteKind {
    /// The Kubernetes kind string.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http => "HTTPRoute",
            Self::Grpc => "GRPCRoute",
            Self::Tls => "TLSRoute",
            Self::Tcp => "TCPRoute",
            Self::Udp => "UDPRoute",
        }
    }

    pub fn from_kind(kind: &str) -> Option<Self> {
        match kind {
            "HTTPRoute" => Some(Self::Http),
            "GRPCRoute" => Some(Self::Grpc),
            "TLSRoute" => Some(Self::Tls),
            "TCPRoute" => Some(Self::Tcp),
            "UDPRoute" => Some(Self::Udp),
            _ => None,
        }
    }
}

impl fmt::Display for RouteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

/// Listener protocols, as resolved by listener translation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProtocolType {
    Http,
    Https,
    Tls,
    Tcp,
    Udp,
}

impl ProtocolType {
    /// The route kinds a listener of this protocol admits when its
    /// `allowedRoutes` does not name kinds explicitly.
    fn default_route_kinds(&self) -> Vec<RouteKind> {
        match self {
            Self::Http | Self::Https => vec![RouteKind::Http, RouteKind::Grpc],
            Self::Tls => vec![RouteKind::Tls],
            Self::Tcp => vec![RouteKind::Tcp],
            Self::Udp => vec![RouteKind::Udp],
        }
    }
}

impl std::str::FromStr for ProtocolType {
    type Err = anyhow::Error;

    fn from_str(protocol: &str) -> Result<Self> {
        match protocol {
            "HTTP" => Ok(Self::Http),
            "HTTPS" => Ok(Self::Https),
            "TLS" => Ok(Self::Tls),
            "TCP" => Ok(Self::Tcp),
            "UDP" => Ok(Self::Udp),
            other => bail!("unsupported listener protocol {other:?}"),
        }
    }
}

/// Which namespaces a listener accepts routes from.
#[derive(Clone, Debug)]
pub enum AllowedNamespaces {
    All,
    Same,
    Selector(labels::Selector),
}

/// A gateway owned by this controller, with its listeners in definition
/// order.
#[derive(Clone, Debug)]
pub struct GatewayContext {
    pub namespace: String,
    pub name: String,

    /// Data-plane configuration override referenced by this gateway, if any.
    pub proxy_config: Option<ProxyConfig>,

    pub listeners: Vec<ListenerContext>,
}

impl GatewayContext {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            proxy_config: None,
            listeners: Vec::new(),
        }
    }

    /// Builds a context from a Gateway object. Listener readiness and TLS
    /// material are settled by listener translation afterwards.
    pub fn from_gateway(gateway: &gateway::Gateway) -> Result<Self> {
        let mut ctx = Self::new(
            gateway
                .metadata
                .namespace
                .as_deref()
                .expect("Gateway must have a namespace"),
            gateway
                .metadata
                .name
                .as_deref()
                .expect("Gateway must have a name"),
        );
        for listener in &gateway.spec.listeners {
            ctx.listeners.push(ListenerContext::from_listener(listener)?);
        }
        Ok(ctx)
    }

    /// The key of this gateway's slot in the IR map.
    pub fn ir_key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    /// The IR name of one of this gateway's listeners.
    pub fn ir_listener_name(&self, listener: &ListenerContext) -> String {
        format!("{}/{}/{}", self.namespace, self.name, listener.name)
    }
}

/// One gateway listener, with the admission data the resolver consults.
///
/// Listener-level translation happens before route translation; by the time
/// routes are processed the allowed kinds, namespaces and readiness are
/// settled facts.
#[derive(Clone, Debug)]
pub struct ListenerContext {
    pub name: String,
    pub port: u16,
    pub protocol: ProtocolType,
    pub hostname: Option<String>,
    pub allowed_kinds: Vec<RouteKind>,
    pub allowed_namespaces: AllowedNamespaces,
    pub ready: bool,
    attached_routes: u32,
}

impl ListenerContext {
    /// A ready listener admitting the protocol's default route kinds from
    /// its own namespace.
    pub fn new(name: impl Into<String>, port: u16, protocol: ProtocolType) -> Self {
        Self {
            name: name.into(),
            port,
            protocol,
            hostname: None,
            allowed_kinds: protocol.default_route_kinds(),
            allowed_namespaces: AllowedNamespaces::Same,
            ready: true,
            attached_routes: 0,
        }
    }

    /// Builds a context from a Gateway listener, resolving its admission
    /// policy. Unrecognized allowed-route kinds are dropped.
    pub fn from_listener(listener: &gateway::Listener) -> Result<Self> {
        let protocol = listener.protocol.parse::<ProtocolType>()?;
        let mut ctx = Self::new(&listener.name, listener.port, protocol);
        ctx.hostname = listener.hostname.clone().filter(|h| !h.is_empty());

        if let Some(allowed_routes) = &listener.allowed_routes {
            if let Some(kinds) = &allowed_routes.kinds {
                ctx.allowed_kinds = kinds
                    .iter()
                    .filter_map(|k| RouteKind::from_kind(&k.kind))
                    .collect();
            }
            if let Some(namespaces) = &allowed_routes.namespaces {
                ctx.allowed_namespaces = match namespaces.from {
                    Some(gateway::FromNamespaces::All) => AllowedNamespaces::All,
                    Some(gateway::FromNamespaces::Selector) => AllowedNamespaces::Selector(
                        namespaces.selector.clone().unwrap_or_default(),
                    ),
                    Some(gateway::FromNamespaces::Same) | None => AllowedNamespaces::Same,
                };
            }
        }

        Ok(ctx)
    }

    pub fn allows_kind(&self, kind: RouteKind) -> bool {
        self.allowed_kinds.contains(&kind)
    }

    /// Whether a route in `route_ns` may attach, given the labels of that
    /// namespace.
    pub fn allows_namespace(
        &self,
        gateway_ns: &str,
        route_ns: &str,
        route_ns_labels: Option<&Labels>,
    ) -> bool {
        match &self.allowed_namespaces {
            AllowedNamespaces::All => true,
            AllowedNamespaces::Same => gateway_ns == route_ns,
            AllowedNamespaces::Selector(selector) => match route_ns_labels {
                Some(labels) => selector.matches(labels),
                None => selector.selects_all(),
            },
        }
    }

    pub fn attached_routes(&self) -> u32 {
        self.attached_routes
    }

    pub fn increment_attached_routes(&mut self) {
        self.attached_routes += 1;
    }

    /// Must be called by the owner of the gateway contexts before each pass.
    pub fn reset_attached_routes(&mut self) {
        self.attached_routes = 0;
    }
}

/// Addresses a listener within a slice of gateway contexts without borrowing
/// it, so route-parent contexts can reference listeners while counters are
/// mutated.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ListenerKey {
    pub gateway: usize,
    pub listener: usize,
}

impl ListenerKey {
    pub fn get<'a>(&self, gateways: &'a [GatewayContext]) -> &'a ListenerContext {
        &gateways[self.gateway].listeners[self.listener]
    }

    pub fn get_mut<'a>(&self, gateways: &'a mut [GatewayContext]) -> &'a mut ListenerContext {
        &mut gateways[self.gateway].listeners[self.listener]
    }
}

/// The attachment state of one parent reference of a route.
#[derive(Clone, Debug)]
pub struct RouteParentContext {
    pub parent_ref: gateway::ParentReference,

    /// Index of this parent's slot in the route's parent-status array.
    /// Stable for the duration of a pass.
    pub status_idx: usize,

    /// Index of the referenced gateway.
    pub gateway: usize,

    /// The listeners that ultimately allow this route to attach.
    pub listeners: Vec<ListenerKey>,
}

/// A route under translation: the object itself, its relevant parent
/// references, and the parent-status array computed this pass.
#[derive(Clone, Debug)]
pub struct RouteContext<R> {
    pub route: R,
    pub parents: Vec<RouteParentContext>,
    pub status: Vec<gateway::RouteParentStatus>,
}

pub type HttpRouteContext = RouteContext<gateway::HttpRoute>;
pub type GrpcRouteContext = RouteContext<gateway::GrpcRoute>;
pub type TlsRouteContext = RouteContext<gateway::TlsRoute>;
pub type TcpRouteContext = RouteContext<gateway::TcpRoute>;
pub type UdpRouteContext = RouteContext<gateway::UdpRoute>;

impl<R: Route> RouteContext<R> {
    pub fn new(route: R) -> Self {
        Self {
            route,
            parents: Vec::new(),
            status: Vec::new(),
        }
    }
}

/// The capability set shared by all five route kinds.
pub trait Route {
    const KIND: RouteKind;

    fn metadata(&self) -> &ObjectMeta;

    fn parent_refs(&self) -> &[gateway::ParentReference];

    /// Declared hostnames; empty for kinds without a hostname concept.
    fn hostnames(&self) -> &[String];

    fn name(&self) -> &str {
        self.metadata()
            .name
            .as_deref()
            .expect("route must have a name")
    }

    fn namespace(&self) -> &str {
        self.metadata()
            .namespace
            .as_deref()
            .expect("route must have a namespace")
    }

    fn generation(&self) -> Option<i64> {
        self.metadata().generation
    }

    /// Deterministic route id: `<kind-lowercase>/<namespace>/<name>`.
    fn route_id(&self) -> String {
        format!(
            "{}/{}/{}",
            Self::KIND.kind().to_ascii_lowercase(),
            self.namespace(),
            self.name()
        )
    }
}

impl Route for gateway::HttpRoute {
    const KIND: RouteKind = RouteKind::Http;

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn parent_refs(&self) -> &[gateway::ParentReference] {
        self.spec.inner.parent_refs.as_deref().unwrap_or(&[])
    }

    fn hostnames(&self) -> &[String] {
        self.spec.hostnames.as_deref().unwrap_or(&[])
    }
}

impl Route for gateway::GrpcRoute {
    const KIND: RouteKind = RouteKind::Grpc;

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn parent_refs(&self) -> &[gateway::ParentReference] {
        self.spec.inner.parent_refs.as_deref().unwrap_or(&[])
    }

    fn hostnames(&self) -> &[String] {
        self.spec.hostnames.as_deref().unwrap_or(&[])
    }
}

impl Route for gateway::TlsRoute {
    const KIND: RouteKind = RouteKind::Tls;

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn parent_refs(&self) -> &[gateway::ParentReference] {
        self.spec.inner.parent_refs.as_deref().unwrap_or(&[])
    }

    fn hostnames(&self) -> &[String] {
        self.spec.hostnames.as_deref().unwrap_or(&[])
    }
}

impl Route for gateway::TcpRoute {
    const KIND: RouteKind = RouteKind::Tcp;

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn parent_refs(&self) -> &[gateway::ParentReference] {
        self.spec.inner.parent_refs.as_deref().unwrap_or(&[])
    }

    fn hostnames(&self) -> &[String] {
        &[]
    }
}

impl Route for gateway::UdpRoute {
    const KIND: RouteKind = RouteKind::Udp;

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn parent_refs(&self) -> &[gateway::ParentReference] {
        self.spec.inner.parent_refs.as_deref().unwrap_or(&[])
    }

    fn hostnames(&self) -> &[String] {
        &[]
    }
}

/// `<route-id>/<rule-idx>/<match-idx-or-empty>`. The match segment is empty
/// for the single match-everything route of a matchless rule.
pub(crate) fn ir_route_name(route_id: &str, rule_idx: usize, match_idx: Option<usize>) -> String {
    match match_idx {
        Some(match_idx) => format!("{route_id}/{rule_idx}/{match_idx}"),
        None => format!("{route_id}/{rule_idx}/"),
    }
}

/// `<route-id>/rule/<rule-idx>`; L4 routes have a single whole-route
/// destination named by the bare route id.
pub(crate) fn ir_destination_name(route_id: &str, rule_idx: Option<usize>) -> String {
    match rule_idx {
        Some(rule_idx) => format!("{route_id}/rule/{rule_idx}"),
        None => route_id.to_string(),
    }
}

/// Builds the IR metadata carried by every route synthesized from `route`.
pub(crate) fn build_route_metadata<R: Route>(
    route: &R,
    section_name: Option<&String>,
) -> ir::ResourceMetadata {
    let annotations = route
        .metadata()
        .annotations
        .iter()
        .flatten()
        .filter_map(|(k, v)| {
            k.strip_prefix(ANNOTATION_PREFIX)
                .map(|k| (k.to_string(), v.clone()))
        })
        .collect();

    ir::ResourceMetadata {
        kind: R::KIND.kind().to_string(),
        name: route.name().to_string(),
        namespace: route.namespace().to_string(),
        section_name: section_name.cloned(),
        annotations,
    }
}
