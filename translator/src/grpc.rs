//! The GRPCRoute translation pipeline.
//!
//! Structurally the HTTP pipeline with gRPC method matching in place of path
//! matching; every produced route speaks HTTP/2.

use crate::{
    context::{
        build_route_metadata, ir_destination_name, ir_route_name, GatewayContext,
        GrpcRouteContext, Route, RouteContext,
    },
    destination::RouteInfo,
    filters::{BackendFilters, FilterContext},
    http::validate_regex,
    status::{
        has_condition, set_route_condition, COND_ACCEPTED,
        REASON_NO_MATCHING_LISTENER_HOSTNAME, REASON_UNSUPPORTED_VALUE,
    },
    Resources, Translator,
};
use anyhow::Result;
use gateway_translator_core::ir;
use gateway_translator_k8s_api::{gateway, proxy::ProxyConfig};

/// Matches a dotted protobuf service identifier.
pub(crate) const VALID_SERVICE_NAME: &str = r"(?i)\.?[a-z_][a-z_0-9]*(\.[a-z_][a-z_0-9]*)*";

/// Matches a protobuf method identifier.
pub(crate) const VALID_METHOD_NAME: &str = r"[A-Za-z_][A-Za-z_0-9]*";

impl Translator {
    /// Translates GRPCRoutes against the owned gateways. Returns the routes
    /// that reference an owned gateway.
    pub fn process_grpc_routes(
        &self,
        routes: Vec<gateway::GrpcRoute>,
        gateways: &mut [GatewayContext],
        resources: &Resources,
        ir_map: &mut ir::IrMap,
    ) -> Vec<GrpcRouteContext> {
        let mut relevant_routes = Vec::new();

        for route in routes {
            tracing::debug!(
                name = %route.name(),
                namespace = %route.namespace(),
                "translating GRPCRoute"
            );
            let mut ctx = RouteContext::new(route);
            if !self.process_allowed_listeners_for_parent_refs(&mut ctx, gateways, resources) {
                continue;
            }
            self.process_grpc_route_parent_refs(&mut ctx, gateways, resources, ir_map);
            relevant_routes.push(ctx);
        }

        relevant_routes
    }

    fn process_grpc_route_parent_refs(
        &self,
        ctx: &mut GrpcRouteContext,
        gateways: &[GatewayContext],
        resources: &Resources,
        ir_map: &mut ir::IrMap,
    ) {
        let generation = ctx.route.generation();

        for parent_idx in 0..ctx.parents.len() {
            let RouteContext {
                route,
                parents,
                status,
            } = &mut *ctx;
            let parent = &parents[parent_idx];
            let status_idx = parent.status_idx;
            let proxy = gateways[parent.gateway].proxy_config.as_ref();

            let route_routes =
                match self.process_grpc_route_rules(route, status, status_idx, proxy, resources) {
                    Ok(route_routes) => route_routes,
                    Err(error) => {
                        set_route_condition(
                            status,
                            status_idx,
                            generation,
                            COND_ACCEPTED,
                            false,
                            REASON_UNSUPPORTED_VALUE,
                            &error.to_string(),
                        );
                        self.ensure_resolved_refs(status, status_idx, generation);
                        continue;
                    }
                };

            self.ensure_resolved_refs(status, status_idx, generation);

            if has_condition(status, status_idx, COND_ACCEPTED, false) {
                continue;
            }

            let has_hostname_intersection = self.process_route_parent_listeners(
                &*route,
                &route_routes,
                parent,
                gateways,
                ir_map,
            );
            if !has_hostname_intersection {
                set_route_condition(
                    status,
                    status_idx,
                    generation,
                    COND_ACCEPTED,
                    false,
                    REASON_NO_MATCHING_LISTENER_HOSTNAME,
                    "There were no hostname intersections between the GRPCRoute and this parent ref's Listener(s)",
                );
            }

            self.ensure_accepted(status, status_idx, generation);
        }
    }

    fn process_grpc_route_rules(
        &self,
        route: &gateway::GrpcRoute,
        status: &mut [gateway::RouteParentStatus],
        status_idx: usize,
        proxy: Option<&ProxyConfig>,
        resources: &Resources,
    ) -> Result<Vec<ir::HttpRoute>> {
        let info = RouteInfo::new(route, proxy);
        let mut route_routes = Vec::new();

        for (rule_idx, rule) in route.spec.rules.iter().flatten().enumerate() {
            let dest_name = ir_destination_name(&info.id, Some(rule_idx));
            let filter_ctx = self.process_grpc_filters(
                rule.filters.as_deref().unwrap_or(&[]),
                &info,
                &dest_name,
                status,
                status_idx,
                resources,
            )?;

            let mut rule_routes = process_grpc_route_rule(route, rule_idx, &filter_ctx, rule)?;

            for backend_ref in rule.backend_refs.iter().flatten() {
                let Some(backend) = &backend_ref.backend_ref else {
                    continue;
                };
                let filters = BackendFilters::Grpc(backend_ref.filters.as_deref().unwrap_or(&[]));
                let Some(setting) =
                    self.process_destination(backend, filters, &info, status, status_idx, resources)
                else {
                    continue;
                };

                for route_route in &mut rule_routes {
                    if route_route.direct_response.is_some() || route_route.redirect.is_some() {
                        continue;
                    }
                    route_route
                        .destination
                        .get_or_insert_with(|| ir::RouteDestination::new(dest_name.clone()))
                        .settings
                        .push(setting.clone());
                }
            }

            for route_route in &mut rule_routes {
                let no_valid_backends = route_route
                    .destination
                    .as_ref()
                    .map_or(true, |d| d.to_backend_weights().valid == 0);
                if route_route.direct_response.is_none()
                    && no_valid_backends
                    && route_route.redirect.is_none()
                {
                    route_route.direct_response = Some(ir::CustomResponse {
                        status_code: 500,
                        body: None,
                    });
                }
                route_route.is_http2 = true;
            }

            route_routes.append(&mut rule_routes);
        }

        Ok(route_routes)
    }
}

fn process_grpc_route_rule(
    route: &gateway::GrpcRoute,
    rule_idx: usize,
    filter_ctx: &FilterContext,
    rule: &gateway::GrpcRouteRule,
) -> Result<Vec<ir::HttpRoute>> {
    let route_id = route.route_id();
    let mut rule_routes = Vec::new();

    // If no matches are specified, the rule matches every gRPC request.
    if rule.matches.as_deref().unwrap_or(&[]).is_empty() {
        let mut ir_route = ir::HttpRoute {
            name: ir_route_name(&route_id, rule_idx, None),
            metadata: Some(build_route_metadata(route, rule.name.as_ref())),
            ..Default::default()
        };
        filter_ctx.apply_to_route(&mut ir_route);
        rule_routes.push(ir_route);
    }

    for (match_idx, grpc_match) in rule.matches.iter().flatten().enumerate() {
        let mut ir_route = ir::HttpRoute {
            name: ir_route_name(&route_id, rule_idx, Some(match_idx)),
            metadata: Some(build_route_metadata(route, rule.name.as_ref())),
            ..Default::default()
        };

        for header_match in grpc_match.headers.iter().flatten() {
            ir_route.header_matches.push(match header_match {
                gateway::GrpcHeaderMatch::Exact { name, value } => ir::HeaderMatch {
                    name: name.clone(),
                    value: ir::StringMatch::Exact(value.clone()),
                },
                gateway::GrpcHeaderMatch::RegularExpression { name, value } => {
                    validate_regex(value)?;
                    ir::HeaderMatch {
                        name: name.clone(),
                        value: ir::StringMatch::Regex(value.clone()),
                    }
                }
            });
        }

        if let Some(method) = &grpc_match.method {
            // A gRPC request path has the form `/<service>/<method>`.
            match method {
                gateway::GrpcMethodMatch::Exact { method, service } => {
                    process_grpc_method_exact(method.as_deref(), service.as_deref(), &mut ir_route)
                }
                gateway::GrpcMethodMatch::RegularExpression { method, service } => {
                    if let Some(service) = service {
                        validate_regex(service)?;
                    }
                    if let Some(method) = method {
                        validate_regex(method)?;
                    }
                    process_grpc_method_regex(method.as_deref(), service.as_deref(), &mut ir_route)
                }
            }
        }

        filter_ctx.apply_to_route(&mut ir_route);
        rule_routes.push(ir_route);
    }

    Ok(rule_routes)
}

fn process_grpc_method_exact(
    method: Option<&str>,
    service: Option<&str>,
    ir_route: &mut ir::HttpRoute,
) {
    match (service, method) {
        (Some(service), Some(method)) => {
            ir_route.path_match = Some(ir::StringMatch::Exact(format!("/{service}/{method}")));
        }
        (None, Some(method)) => {
            // Path matching has no suffix form, so match the method through
            // the `:path` header instead.
            ir_route.header_matches.push(ir::HeaderMatch {
                name: ":path".to_string(),
                value: ir::StringMatch::Suffix(format!("/{method}")),
            });
        }
        (Some(service), None) => {
            ir_route.path_match = Some(ir::StringMatch::Prefix(format!("/{service}")));
        }
        (None, None) => {}
    }
}

fn process_grpc_method_regex(
    method: Option<&str>,
    service: Option<&str>,
    ir_route: &mut ir::HttpRoute,
) {
    match (service, method) {
        (Some(service), Some(method)) => {
            ir_route.path_match = Some(ir::StringMatch::Regex(format!("/{service}/{method}")));
        }
        (None, Some(method)) => {
            ir_route.path_match = Some(ir::StringMatch::Regex(format!(
                "/{VALID_SERVICE_NAME}/{method}"
            )));
        }
        (Some(service), None) => {
            ir_route.path_match = Some(ir::StringMatch::Regex(format!(
                "/{service}/{VALID_METHOD_NAME}"
            )));
        }
        (None, None) => {}
    }
}
