//! Hand-maintained Gateway API types.
//!
//! Only the fields the translator reads are modeled; unknown fields are
//! ignored at deserialization time, which keeps these types forward
//! compatible with newer API revisions.

mod common;
mod gateways;
mod grant;
mod grpcroute;
mod httproute;
mod l4routes;

pub use self::{
    common::{
        BackendObjectReference, BackendRef, CommonRouteSpec, LocalObjectReference,
        ParentReference, RouteGroupKind, RouteParentStatus, RouteStatus,
    },
    gateways::{
        AllowedRoutes, FromNamespaces, Gateway, GatewaySpec, GatewayTlsConfig, Listener,
        RouteNamespaces, SecretObjectReference,
    },
    grant::{ReferenceGrant, ReferenceGrantFrom, ReferenceGrantSpec, ReferenceGrantTo},
    grpcroute::{
        GrpcBackendRef, GrpcHeaderMatch, GrpcMethodMatch, GrpcRoute, GrpcRouteFilter,
        GrpcRouteMatch, GrpcRouteRule, GrpcRouteSpec, GrpcRouteStatus,
    },
    httproute::{
        CookieConfig, CookieLifetimeType, HttpBackendRef, HttpHeader, HttpHeaderMatch,
        HttpPathMatch, HttpPathModifier, HttpQueryParamMatch, HttpRequestHeaderFilter,
        HttpRequestMirrorFilter, HttpRequestRedirectFilter, HttpRoute, HttpRouteFilter,
        HttpRouteMatch, HttpRouteRule, HttpRouteSpec, HttpRouteStatus, HttpRouteTimeouts,
        HttpUrlRewriteFilter, SessionPersistence,
    },
    l4routes::{
        TcpRoute, TcpRouteRule, TcpRouteSpec, TcpRouteStatus, TlsRoute, TlsRouteRule,
        TlsRouteSpec, TlsRouteStatus, UdpRoute, UdpRouteRule, UdpRouteSpec, UdpRouteStatus,
    },
};

/// The API group shared by all Gateway API kinds.
pub const GROUP: &str = "gateway.networking.k8s.io";
