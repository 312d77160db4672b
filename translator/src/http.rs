//! The HTTPRoute translation pipeline.

use crate::{
    context::{
        build_route_metadata, ir_destination_name, ir_route_name, GatewayContext,
        HttpRouteContext, Route, RouteContext,
    },
    destination::RouteInfo,
    filters::{BackendFilters, FilterContext},
    status::{
        has_condition, set_route_condition, COND_ACCEPTED, COND_RESOLVED_REFS,
        REASON_NO_MATCHING_LISTENER_HOSTNAME, REASON_RESOLVED_REFS, REASON_UNSUPPORTED_VALUE,
    },
    Resources, Translator, HTTP_REQUEST_TIMEOUT,
};
use ahash::AHashMap as HashMap;
use anyhow::{anyhow, bail, Result};
use gateway_translator_core::ir;
use gateway_translator_k8s_api::{duration, gateway, proxy::ProxyConfig};

impl Translator {
    /// Translates HTTPRoutes against the owned gateways, appending IR routes
    /// to listener slots and recording conditions. Returns the routes that
    /// reference an owned gateway.
    pub fn process_http_routes(
        &self,
        routes: Vec<gateway::HttpRoute>,
        gateways: &mut [GatewayContext],
        resources: &Resources,
        ir_map: &mut ir::IrMap,
    ) -> Vec<HttpRouteContext> {
        let mut relevant_routes = Vec::new();

        for route in routes {
            tracing::debug!(
                name = %route.name(),
                namespace = %route.namespace(),
                "translating HTTPRoute"
            );
            let mut ctx = RouteContext::new(route);
            if !self.process_allowed_listeners_for_parent_refs(&mut ctx, gateways, resources) {
                continue;
            }
            self.process_http_route_parent_refs(&mut ctx, gateways, resources, ir_map);
            relevant_routes.push(ctx);
        }

        relevant_routes
    }

    fn process_http_route_parent_refs(
        &self,
        ctx: &mut HttpRouteContext,
        gateways: &[GatewayContext],
        resources: &Resources,
        ir_map: &mut ir::IrMap,
    ) {
        let generation = ctx.route.generation();

        // Rules are recomputed per parent ref because the conditions they
        // produce land on each RouteParentStatus, not on the route as a
        // whole.
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
                match self.process_http_route_rules(route, status, status_idx, proxy, resources) {
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

            // Skip parent refs that did not accept the route.
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
                    "There were no hostname intersections between the HTTPRoute and this parent ref's Listener(s)",
                );
            }

            self.ensure_accepted(status, status_idx, generation);
        }
    }

    fn process_http_route_rules(
        &self,
        route: &gateway::HttpRoute,
        status: &mut [gateway::RouteParentStatus],
        status_idx: usize,
        proxy: Option<&ProxyConfig>,
        resources: &Resources,
    ) -> Result<Vec<ir::HttpRoute>> {
        let info = RouteInfo::new(route, proxy);
        let mut route_routes = Vec::new();

        for (rule_idx, rule) in route.spec.rules.iter().flatten().enumerate() {
            let dest_name = ir_destination_name(&info.id, Some(rule_idx));
            let filter_ctx = self.process_http_filters(
                rule.filters.as_deref().unwrap_or(&[]),
                &info,
                &dest_name,
                status,
                status_idx,
                resources,
            )?;

            // A rule is matched if any one of its matches is satisfied (a
            // logical OR), so each match becomes its own IR route.
            let mut rule_routes = process_http_route_rule(route, rule_idx, &filter_ctx, rule)?;

            let mut dst_addr_types: HashMap<ir::DestinationAddressType, usize> = HashMap::new();
            for backend_ref in rule.backend_refs.iter().flatten() {
                let Some(backend) = &backend_ref.backend_ref else {
                    continue;
                };
                let filters = BackendFilters::Http(backend_ref.filters.as_deref().unwrap_or(&[]));
                let Some(setting) =
                    self.process_destination(backend, filters, &info, status, status_idx, resources)
                else {
                    continue;
                };

                if !self.is_service_routing(proxy) && !setting.endpoints.is_empty() {
                    if let Some(addr_type) = setting.address_type {
                        *dst_addr_types.entry(addr_type).or_default() += 1;
                    }
                }

                for route_route in &mut rule_routes {
                    // A route whose filters made it a redirect or direct
                    // response is terminal: no destinations.
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

            if !self.is_service_routing(proxy) && dst_addr_types.len() > 1 {
                set_route_condition(
                    status,
                    status_idx,
                    info.generation,
                    COND_RESOLVED_REFS,
                    false,
                    REASON_RESOLVED_REFS,
                    "Mixed endpointslice address type between backendRefs is not supported",
                );
            }

            // A rule with no valid backends answers with a plain 500 rather
            // than weighted responses.
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
                route_route.is_http2 = false;
            }

            route_routes.append(&mut rule_routes);
        }

        Ok(route_routes)
    }
}

fn process_http_route_rule(
    route: &gateway::HttpRoute,
    rule_idx: usize,
    filter_ctx: &FilterContext,
    rule: &gateway::HttpRouteRule,
) -> Result<Vec<ir::HttpRoute>> {
    let route_id = route.route_id();
    let mut rule_routes = Vec::new();

    // If no matches are specified, the rule matches every HTTP request.
    if rule.matches.as_deref().unwrap_or(&[]).is_empty() {
        let mut ir_route = ir::HttpRoute {
            name: ir_route_name(&route_id, rule_idx, None),
            metadata: Some(build_route_metadata(route, rule.name.as_ref())),
            ..Default::default()
        };
        process_route_timeout(&mut ir_route, rule);
        filter_ctx.apply_to_route(&mut ir_route);
        rule_routes.push(ir_route);
    }

    let session_persistence = session_persistence(&route_id, rule_idx, rule)?;

    for (match_idx, http_match) in rule.matches.iter().flatten().enumerate() {
        let mut ir_route = ir::HttpRoute {
            name: ir_route_name(&route_id, rule_idx, Some(match_idx)),
            metadata: Some(build_route_metadata(route, rule.name.as_ref())),
            session_persistence: session_persistence.clone(),
            ..Default::default()
        };
        process_route_timeout(&mut ir_route, rule);

        if let Some(path) = &http_match.path {
            ir_route.path_match = Some(match path {
                gateway::HttpPathMatch::Exact { value } => ir::StringMatch::Exact(value.clone()),
                gateway::HttpPathMatch::PathPrefix { value } => {
                    ir::StringMatch::Prefix(value.clone())
                }
                gateway::HttpPathMatch::RegularExpression { value } => {
                    validate_regex(value)?;
                    ir::StringMatch::Regex(value.clone())
                }
            });
        }

        for header_match in http_match.headers.iter().flatten() {
            ir_route.header_matches.push(match header_match {
                gateway::HttpHeaderMatch::Exact { name, value } => ir::HeaderMatch {
                    name: name.clone(),
                    value: ir::StringMatch::Exact(value.clone()),
                },
                gateway::HttpHeaderMatch::RegularExpression { name, value } => {
                    validate_regex(value)?;
                    ir::HeaderMatch {
                        name: name.clone(),
                        value: ir::StringMatch::Regex(value.clone()),
                    }
                }
            });
        }

        for query_match in http_match.query_params.iter().flatten() {
            ir_route.query_param_matches.push(match query_match {
                gateway::HttpQueryParamMatch::Exact { name, value } => ir::QueryParamMatch {
                    name: name.clone(),
                    value: ir::StringMatch::Exact(value.clone()),
                },
                gateway::HttpQueryParamMatch::RegularExpression { name, value } => {
                    validate_regex(value)?;
                    ir::QueryParamMatch {
                        name: name.clone(),
                        value: ir::StringMatch::Regex(value.clone()),
                    }
                }
            });
        }

        if let Some(method) = &http_match.method {
            ir_route.header_matches.push(ir::HeaderMatch {
                name: ":method".to_string(),
                value: ir::StringMatch::Exact(method.clone()),
            });
        }

        filter_ctx.apply_to_route(&mut ir_route);
        rule_routes.push(ir_route);
    }

    Ok(rule_routes)
}

fn process_route_timeout(ir_route: &mut ir::HttpRoute, rule: &gateway::HttpRouteRule) {
    if let Some(timeouts) = &rule.timeouts {
        let mut timeout = None;

        if let Some(request) = &timeouts.request {
            timeout = Some(duration::parse(request).unwrap_or(HTTP_REQUEST_TIMEOUT));
        }

        // The backend request timeout stands in for the route timeout until
        // retries are introduced, at which point it becomes the per-try
        // timeout.
        if let Some(backend_request) = &timeouts.backend_request {
            timeout = Some(duration::parse(backend_request).unwrap_or(HTTP_REQUEST_TIMEOUT));
        }

        ir_route.traffic = Some(ir::TrafficFeatures {
            timeout,
            retry: None,
        });
    }
}

fn session_persistence(
    route_id: &str,
    rule_idx: usize,
    rule: &gateway::HttpRouteRule,
) -> Result<Option<ir::SessionPersistence>> {
    let Some(session) = &rule.session_persistence else {
        return Ok(None);
    };

    if session.idle_timeout.is_some() {
        bail!("idle timeout is not supported for session persistence");
    }

    let session_name = match &session.session_name {
        Some(name) => name.clone(),
        // The session name is optional on the API but required by the data
        // plane; synthesize a unique one per route rule. `/` is not a valid
        // header-key character, so it becomes `-`.
        None => ir_destination_name(route_id, Some(rule_idx)).replace('/', "-"),
    };

    match session.type_.as_deref() {
        // Cookie-based session persistence is the default.
        None | Some("Cookie") => {
            let mut ttl = None;
            if let (Some(absolute_timeout), Some(cookie_config)) =
                (&session.absolute_timeout, &session.cookie_config)
            {
                if cookie_config.lifetime_type == Some(gateway::CookieLifetimeType::Permanent) {
                    ttl = Some(duration::parse(absolute_timeout)?);
                }
            }
            Ok(Some(ir::SessionPersistence::Cookie {
                name: session_name,
                ttl,
            }))
        }
        Some("Header") => Ok(Some(ir::SessionPersistence::Header { name: session_name })),
        Some(other) => bail!("unknown session persistence type {other}"),
    }
}

/// Validates a regular-expression match value; the IR carries it verbatim.
pub(crate) fn validate_regex(value: &str) -> Result<()> {
    regex::Regex::new(value)
        .map(|_| ())
        .map_err(|error| anyhow!("regex {value:?} is invalid: {error}"))
}
