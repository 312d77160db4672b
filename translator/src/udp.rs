//! The UDPRoute translation pipeline.

use crate::{
    context::{ir_destination_name, GatewayContext, Route, RouteContext, UdpRouteContext},
    destination::RouteInfo,
    filters::BackendFilters,
    status::{
        has_condition, set_route_condition, COND_ACCEPTED, COND_RESOLVED_REFS,
        REASON_INVALID_RULE, REASON_UNSUPPORTED_VALUE,
    },
    Resources, Translator,
};
use gateway_translator_core::ir;
use gateway_translator_k8s_api::gateway;

impl Translator {
    /// Translates UDPRoutes against the owned gateways. Returns the routes
    /// that reference an owned gateway.
    pub fn process_udp_routes(
        &self,
        routes: Vec<gateway::UdpRoute>,
        gateways: &mut [GatewayContext],
        resources: &Resources,
        ir_map: &mut ir::IrMap,
    ) -> Vec<UdpRouteContext> {
        let mut relevant_routes = Vec::new();

        for route in routes {
            tracing::debug!(
                name = %route.name(),
                namespace = %route.namespace(),
                "translating UDPRoute"
            );
            let mut ctx = RouteContext::new(route);
            if !self.process_allowed_listeners_for_parent_refs(&mut ctx, gateways, resources) {
                continue;
            }
            self.process_udp_route_parent_refs(&mut ctx, gateways, resources, ir_map);
            relevant_routes.push(ctx);
        }

        relevant_routes
    }

    fn process_udp_route_parent_refs(
        &self,
        ctx: &mut UdpRouteContext,
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

            if route.spec.rules.len() != 1 {
                set_route_condition(
                    status,
                    status_idx,
                    generation,
                    COND_RESOLVED_REFS,
                    false,
                    REASON_INVALID_RULE,
                    "One and only one rule is supported",
                );
                continue;
            }

            let info = RouteInfo::new(&*route, proxy);
            let mut dest_settings = Vec::new();
            for backend_ref in route.spec.rules[0].backend_refs.iter().flatten() {
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

            self.ensure_resolved_refs(status, status_idx, generation);

            // Skip parent refs that did not accept the route.
            if has_condition(status, status_idx, COND_ACCEPTED, false) {
                continue;
            }

            let mut accepted = false;
            for key in &parent.listeners {
                let gateway = &gateways[key.gateway];
                let listener = &gateway.listeners[key.listener];

                // Only one route is allowed on a UDP listener.
                if listener.attached_routes() > 1 {
                    continue;
                }
                if !listener.ready {
                    continue;
                }
                accepted = true;

                let Some(gateway_ir) = ir_map.get_mut(&gateway.ir_key()) else {
                    continue;
                };
                if let Some(ir_listener) =
                    gateway_ir.udp_listener_mut(&gateway.ir_listener_name(listener))
                {
                    ir_listener.route = Some(ir::UdpRoute {
                        name: route_id.clone(),
                        destination: ir::RouteDestination {
                            name: ir_destination_name(&route_id, None),
                            settings: dest_settings.clone(),
                        },
                    });
                }
            }

            if accepted {
                self.ensure_accepted(status, status_idx, generation);
            } else {
                set_route_condition(
                    status,
                    status_idx,
                    generation,
                    COND_ACCEPTED,
                    false,
                    REASON_UNSUPPORTED_VALUE,
                    "Multiple routes on the same UDP listener",
                );
            }
        }
    }
}
