//! Gateway route translation.
//!
//! The translator lowers Gateway API routes into the controller's
//! intermediate representation. A translation pass is a pure function over
//! materialized inputs:
//!
//! - the routes of the five supported kinds (HTTPRoute, GRPCRoute, TLSRoute,
//!   TCPRoute, UDPRoute),
//! - the gateway contexts the controller owns, with their listeners'
//!   admission policies and readiness,
//! - a [`Resources`] view of everything else a route can reference.
//!
//! Each per-kind entry point decides which listeners may carry each route,
//! appends IR routes to the listeners' slots in the [`ir::IrMap`], and
//! records `Accepted` / `ResolvedRefs` conditions on every relevant parent
//! reference. Routes that do not reference an owned gateway are dropped
//! silently; everything else is returned so the caller can patch statuses.
//!
//! The pass never blocks and keeps no state of its own. The caller is
//! responsible for clearing the IR map and zeroing the listeners'
//! attached-route counters before invoking it.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod attach;
mod context;
mod destination;
mod filters;
mod grpc;
mod hostnames;
mod http;
mod resource_id;
mod resources;
mod status;
mod tcp;
mod tls;
mod udp;


pub use self::{
    context::{
        AllowedNamespaces, GatewayContext, GrpcRouteContext, HttpRouteContext, ListenerContext,
        ListenerKey, ProtocolType, Route, RouteContext, RouteKind, RouteParentContext,
        TcpRouteContext, TlsRouteContext, UdpRouteContext,
    },
    filters::FilterContext,
    resource_id::ResourceId,
    resources::Resources,
    status::{
        COND_ACCEPTED, COND_RESOLVED_REFS, REASON_ACCEPTED, REASON_BACKEND_NOT_FOUND,
        REASON_INVALID_KIND, REASON_INVALID_RULE, REASON_NO_MATCHING_LISTENER_HOSTNAME,
        REASON_NO_MATCHING_PARENT, REASON_NO_READY_LISTENERS, REASON_NOT_ALLOWED_BY_LISTENERS,
        REASON_REF_NOT_PERMITTED, REASON_RESOLVED_REFS, REASON_UNSUPPORTED_VALUE,
    },
};

use gateway_translator_k8s_api::proxy::{ProxyConfig, RoutingType};
use std::time::Duration;

/// The controller name written into every `RouteParentStatus`.
pub const CONTROLLER_NAME: &str = "gateway.envoyproxy.io/gatewayclass-controller";

/// Default upstream request timeout, applied when a route names a timeout
/// that fails to parse.
pub const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Translates routes into IR against a fixed set of gateway contexts.
#[derive(Clone, Debug)]
pub struct Translator {
    /// Written as `controllerName` into route parent statuses.
    pub controller_name: String,

    /// When set, backends resolve to per-endpoint addresses gathered from
    /// EndpointSlices; when unset, Service and ServiceImport backends route
    /// to their cluster IPs. A gateway's `ProxyConfig` may override this.
    pub endpoint_routing: bool,
}

impl Default for Translator {
    fn default() -> Self {
        Self::new(CONTROLLER_NAME)
    }
}

impl Translator {
    pub fn new(controller_name: impl Into<String>) -> Self {
        Self {
            controller_name: controller_name.into(),
            endpoint_routing: true,
        }
    }

    /// Whether backends under `proxy` route to service cluster IPs instead of
    /// endpoints.
    pub(crate) fn is_service_routing(&self, proxy: Option<&ProxyConfig>) -> bool {
        match proxy.and_then(|p| p.spec.routing_type) {
            Some(RoutingType::Service) => true,
            Some(RoutingType::Endpoint) => false,
            None => !self.endpoint_routing,
        }
    }
}
