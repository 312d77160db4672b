//! The TLSRoute translation pipeline: SNI intersection over passthrough
//! listeners, one synthesized IR TCP route per listener.

use crate::{
    context::{ir_destination_name, GatewayContext, Route, RouteContext, TlsRouteContext},
    destination::RouteInfo,
    filters::BackendFilters,
    hostnames::compute_hosts,
    status::{
        has_condition, set_route_condition, COND_ACCEPTED,
        REASON_NO_MATCHING_LISTENER_HOSTNAME,
    },
    Resources, Translator,
};
use gateway_translator_core::ir;
use gateway_translator_k8s_api::gateway;

impl Translator {
    /// Translates TLSRoutes against the owned gateways. Returns the routes
    /// that reference an owned gateway.
    pub fn process_tls_routes(
        &self,
        routes: Vec<gateway::TlsRoute>,
        gateways: &mut [GatewayContext],
        resources: &Resources,
        ir_map: &mut ir::IrMap,
    ) -> Vec<TlsRouteContext> {
        let mut relevant_routes = Vec::new();

        for route in routes {
            tracing::debug!(
                name = %route.name(),
                namespace = %route.namespace(),
                "translating TLSRoute"
            );
            let mut ctx = RouteContext::new(route);
            if !self.process_allowed_listeners_for_parent_refs(&mut ctx, gateways, resources) {
                continue;
            }
            self.process_tls_route_parent_refs(&mut ctx, gateways, resources, ir_map);
            relevant_routes.push(ctx);
        }

        relevant_routes
    }

    fn process_tls_route_parent_refs(
        &self,
        ctx: &mut TlsRouteContext,
        gateways: &[GatewayContext],
        resources: &Resources,
        ir_map: &mut ir::IrMap,
    ) {
        let generation = ctx.route.generation();
        let route_id = ctx.route.route_id();

        for parent_idx in 0..ctx.parents.len() {
            let RouteContext {
                route,
                parents,
                status,
            } = &mut *ctx;
            let parent = &parents[parent_idx];
            let status_idx = parent.status_idx;
            let proxy = gateways[parent.gateway].proxy_config.as_ref();
            let info = RouteInfo::new(&*route, proxy);

            // All rule backends combine into a single destination.
            let mut dest_settings = Vec::new();
            for rule in &route.spec.rules {
                for backend_ref in rule.backend_refs.iter().flatten() {
                    if let Some(setting) = self.process_destination(
                        backend_ref,
                        BackendFilters::None,
                        &info,
                        status,
                        status_idx,
                        resources,
                    ) {
                        dest_settings.push(setting);
                    }
                }
            }

            self.ensure_resolved_refs(status, status_idx, generation);

            // Skip parent refs that did not accept the route.
            if has_condition(status, status_idx, COND_ACCEPTED, false) {
                continue;
            }

            let mut has_hostname_intersection = false;
            for key in &parent.listeners {
                let gateway = &gateways[key.gateway];
                let listener = &gateway.listeners[key.listener];
                if !listener.ready {
                    continue;
                }

                let hosts = compute_hosts(route.hostnames(), listener.hostname.as_deref());
                if hosts.is_empty() {
                    continue;
                }
                has_hostname_intersection = true;

                let Some(gateway_ir) = ir_map.get_mut(&gateway.ir_key()) else {
                    continue;
                };
                if let Some(ir_listener) =
                    gateway_ir.tcp_listener_mut(&gateway.ir_listener_name(listener))
                {
                    ir_listener.routes.push(ir::TcpRoute {
                        name: route_id.clone(),
                        tls: Some(ir::RouteTls {
                            terminate: None,
                            inspector: Some(ir::TlsInspectorConfig {
                                snis: hosts.clone(),
                            }),
                        }),
                        destination: ir::RouteDestination {
                            name: ir_destination_name(&route_id, None),
                            settings: dest_settings.clone(),
                        },
                    });
                }
            }

            if !has_hostname_intersection {
                set_route_condition(
                    status,
                    status_idx,
                    generation,
                    COND_ACCEPTED,
                    false,
                    REASON_NO_MATCHING_LISTENER_HOSTNAME,
                    "There were no hostname intersections between the TLSRoute and this parent ref's Listener(s)",
                );
            }

            self.ensure_accepted(status, status_idx, generation);
        }
    }
}
