//! Hostname intersection and per-host route expansion.

use crate::{
    context::{GatewayContext, Route, RouteKind, RouteParentContext},
    Translator,
};
use gateway_translator_core::ir;

/// Computes the hostnames satisfying both the route's declared hostnames and
/// the listener's hostname, with standard wildcard semantics.
///
/// A route with no hostnames matches whatever the listener matches; a
/// listener with no hostname constrains nothing.
pub(crate) fn compute_hosts(
    route_hostnames: &[String],
    listener_hostname: Option<&str>,
) -> Vec<String> {
    let listener_hostname = listener_hostname.filter(|h| !h.is_empty());

    if route_hostnames.is_empty() {
        return vec![listener_hostname.unwrap_or("*").to_string()];
    }

    let mut hostnames = Vec::new();
    for route_hostname in route_hostnames {
        match listener_hostname {
            None => hostnames.push(route_hostname.clone()),
            Some(listener_hostname) if route_hostname == listener_hostname => {
                hostnames.push(route_hostname.clone())
            }
            Some(listener_hostname) if route_hostname.starts_with('*') => {
                if hostname_matches_wildcard(listener_hostname, route_hostname) {
                    hostnames.push(listener_hostname.to_string());
                }
            }
            Some(listener_hostname) if listener_hostname.starts_with('*') => {
                if hostname_matches_wildcard(route_hostname, listener_hostname) {
                    hostnames.push(route_hostname.clone());
                }
            }
            Some(_) => {}
        }
    }
    hostnames
}

/// Whether `hostname` is covered by `wildcard` (`*.example.com`), requiring
/// at least one label in place of the wildcard.
fn hostname_matches_wildcard(hostname: &str, wildcard: &str) -> bool {
    let suffix = wildcard.trim_start_matches('*');
    match hostname.strip_suffix(suffix) {
        Some(rest) => !rest.is_empty(),
        None => false,
    }
}

impl Translator {
    /// Expands the rule-produced IR routes per intersected hostname onto each
    /// of the parent's listeners. Returns whether any listener had a hostname
    /// intersection at all.
    pub(crate) fn process_route_parent_listeners<R: Route>(
        &self,
        route: &R,
        route_routes: &[ir::HttpRoute],
        parent: &RouteParentContext,
        gateways: &[GatewayContext],
        ir_map: &mut ir::IrMap,
    ) -> bool {
        let mut has_hostname_intersection = false;

        for key in &parent.listeners {
            let gateway = &gateways[key.gateway];
            let listener = &gateway.listeners[key.listener];

            let hosts = compute_hosts(route.hostnames(), listener.hostname.as_deref());
            if hosts.is_empty() {
                continue;
            }
            has_hostname_intersection = true;

            let mut per_host_routes = Vec::new();
            for host in &hosts {
                for route_route in route_routes {
                    let mut host_route = route_route.clone();

                    // If the redirect has no explicit port, derive it: the
                    // scheme's well-known port when the scheme names one,
                    // otherwise the listener port.
                    if let Some(redirect) = &mut host_route.redirect {
                        if redirect.port.is_none() {
                            let port = match redirect
                                .scheme
                                .as_deref()
                                .map(str::to_ascii_lowercase)
                                .as_deref()
                            {
                                Some("http") => 80,
                                Some("https") => 443,
                                _ => u32::from(listener.port),
                            };
                            redirect.port = Some(port);
                        }
                    }

                    // Dots collide with the downstream stats-tag extraction,
                    // so the hostname is underscored in the route name.
                    host_route.name = format!("{}/{}", route_route.name, host.replace('.', "_"));
                    host_route.hostname = Some(host.clone());
                    per_host_routes.push(host_route);
                }
            }

            let Some(gateway_ir) = ir_map.get_mut(&gateway.ir_key()) else {
                continue;
            };
            if let Some(ir_listener) =
                gateway_ir.http_listener_mut(&gateway.ir_listener_name(listener))
            {
                if R::KIND == RouteKind::Grpc {
                    ir_listener.is_http2 = true;
                }
                ir_listener.routes.extend(per_host_routes);
            }
        }

        has_hostname_intersection
    }
}
