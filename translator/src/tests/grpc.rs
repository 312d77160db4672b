use super::*;
use crate::{COND_ACCEPTED, REASON_UNSUPPORTED_VALUE};
use gateway_translator_core::ir;
use gateway_translator_k8s_api::gateway;

fn grpc_gateways() -> Vec<GatewayContext> {
    vec![make_gateway(vec![listener(
        "http",
        80,
        ProtocolType::Http,
        None,
    )])]
}

fn grpc_resources() -> crate::Resources {
    let mut resources = crate::Resources::default();
    resources.add_service(make_service("default", "echo", 9000, "grpc"));
    resources.add_endpoint_slice(make_endpoint_slice(
        "default",
        "echo",
        "echo-1",
        &["10.0.0.9"],
        9000,
        "grpc",
        Some(true),
    ));
    resources
}

fn make_grpc_route(matches: Vec<gateway::GrpcRouteMatch>) -> gateway::GrpcRoute {
    gateway::GrpcRoute {
        metadata: meta("default", "grpc-route"),
        spec: gateway::GrpcRouteSpec {
            inner: gateway::CommonRouteSpec {
                parent_refs: Some(vec![parent_ref()]),
            },
            hostnames: None,
            rules: Some(vec![gateway::GrpcRouteRule {
                matches: Some(matches),
                backend_refs: Some(vec![gateway::GrpcBackendRef {
                    backend_ref: Some(service_backend("echo", 9000, None)),
                    filters: None,
                }]),
                ..Default::default()
            }]),
        },
        status: None,
    }
}

fn method_match(
    service: Option<&str>,
    method: Option<&str>,
    regex: bool,
) -> gateway::GrpcRouteMatch {
    let method = method.map(str::to_string);
    let service = service.map(str::to_string);
    gateway::GrpcRouteMatch {
        method: Some(if regex {
            gateway::GrpcMethodMatch::RegularExpression { method, service }
        } else {
            gateway::GrpcMethodMatch::Exact { method, service }
        }),
        headers: None,
    }
}

fn listener_ir<'a>(ir_map: &'a ir::IrMap, gateways: &[GatewayContext]) -> &'a ir::HttpListener {
    let gateway = &gateways[0];
    let listener_name = gateway.ir_listener_name(&gateway.listeners[0]);
    ir_map[&gateway.ir_key()]
        .http
        .iter()
        .find(|l| l.name == listener_name)
        .expect("listener IR")
}

#[test]
fn exact_service_and_method_match_the_full_path() {
    let mut gateways = grpc_gateways();
    let resources = grpc_resources();
    let mut ir_map = seed_ir(&gateways);

    let route = make_grpc_route(vec![method_match(Some("echo"), Some("Say"), false)]);
    let relevant = translator().process_grpc_routes(vec![route], &mut gateways, &resources, &mut ir_map);
    assert_condition(&relevant[0].status[0], COND_ACCEPTED, "True", "Accepted");

    let listener_ir = listener_ir(&ir_map, &gateways);
    assert!(listener_ir.is_http2, "gRPC attachment flips the listener to HTTP/2");

    let ir_route = &listener_ir.routes[0];
    assert_eq!(ir_route.name, "grpcroute/default/grpc-route/0/0/*");
    assert_eq!(
        ir_route.path_match,
        Some(ir::StringMatch::Exact("/echo/Say".to_string()))
    );
    assert!(ir_route.is_http2);
}

#[test]
fn exact_method_without_service_matches_a_path_suffix() {
    let mut gateways = grpc_gateways();
    let resources = grpc_resources();
    let mut ir_map = seed_ir(&gateways);

    let route = make_grpc_route(vec![method_match(None, Some("Say"), false)]);
    translator().process_grpc_routes(vec![route], &mut gateways, &resources, &mut ir_map);

    let ir_route = &listener_ir(&ir_map, &gateways).routes[0];
    assert!(ir_route.path_match.is_none());
    assert_eq!(
        ir_route.header_matches,
        vec![ir::HeaderMatch {
            name: ":path".to_string(),
            value: ir::StringMatch::Suffix("/Say".to_string()),
        }]
    );
}

#[test]
fn exact_service_without_method_matches_a_path_prefix() {
    let mut gateways = grpc_gateways();
    let resources = grpc_resources();
    let mut ir_map = seed_ir(&gateways);

    let route = make_grpc_route(vec![method_match(Some("echo"), None, false)]);
    translator().process_grpc_routes(vec![route], &mut gateways, &resources, &mut ir_map);

    let ir_route = &listener_ir(&ir_map, &gateways).routes[0];
    assert_eq!(
        ir_route.path_match,
        Some(ir::StringMatch::Prefix("/echo".to_string()))
    );
}

#[test]
fn regex_method_matches_substitute_identifier_patterns() {
    let mut gateways = grpc_gateways();
    let resources = grpc_resources();
    let mut ir_map = seed_ir(&gateways);

    let route = make_grpc_route(vec![
        method_match(Some("echo.v1"), Some("Say.*"), true),
        method_match(None, Some("Say"), true),
        method_match(Some("echo"), None, true),
    ]);
    translator().process_grpc_routes(vec![route], &mut gateways, &resources, &mut ir_map);

    let routes = &listener_ir(&ir_map, &gateways).routes;
    assert_eq!(
        routes[0].path_match,
        Some(ir::StringMatch::Regex("/echo.v1/Say.*".to_string()))
    );
    assert_eq!(
        routes[1].path_match,
        Some(ir::StringMatch::Regex(format!(
            "/{}/Say",
            crate::grpc::VALID_SERVICE_NAME
        )))
    );
    assert_eq!(
        routes[2].path_match,
        Some(ir::StringMatch::Regex(format!(
            "/echo/{}",
            crate::grpc::VALID_METHOD_NAME
        )))
    );
}

#[test]
fn invalid_method_regex_fails_the_parent() {
    let mut gateways = grpc_gateways();
    let resources = grpc_resources();
    let mut ir_map = seed_ir(&gateways);

    let route = make_grpc_route(vec![method_match(Some("(unclosed"), None, true)]);
    let relevant = translator().process_grpc_routes(vec![route], &mut gateways, &resources, &mut ir_map);
    assert_condition(
        &relevant[0].status[0],
        COND_ACCEPTED,
        "False",
        REASON_UNSUPPORTED_VALUE,
    );
    assert!(listener_ir(&ir_map, &gateways).routes.is_empty());
}

#[test]
fn grpc_header_matches_translate_like_http_headers() {
    let mut gateways = grpc_gateways();
    let resources = grpc_resources();
    let mut ir_map = seed_ir(&gateways);

    let route = make_grpc_route(vec![gateway::GrpcRouteMatch {
        method: None,
        headers: Some(vec![gateway::GrpcHeaderMatch::Exact {
            name: "x-tenant".to_string(),
            value: "acme".to_string(),
        }]),
    }]);
    translator().process_grpc_routes(vec![route], &mut gateways, &resources, &mut ir_map);

    let ir_route = &listener_ir(&ir_map, &gateways).routes[0];
    assert_eq!(
        ir_route.header_matches,
        vec![ir::HeaderMatch {
            name: "x-tenant".to_string(),
            value: ir::StringMatch::Exact("acme".to_string()),
        }]
    );
}

#[test]
fn grpc_service_app_protocol_upgrades_the_destination() {
    let mut gateways = grpc_gateways();
    let mut resources = crate::Resources::default();
    let mut service = make_service("default", "echo", 9000, "grpc");
    if let Some(spec) = service.spec.as_mut() {
        if let Some(ports) = spec.ports.as_mut() {
            ports[0].app_protocol = Some("grpc".to_string());
        }
    }
    resources.add_service(service);
    resources.add_endpoint_slice(make_endpoint_slice(
        "default",
        "echo",
        "echo-1",
        &["10.0.0.9"],
        9000,
        "grpc",
        Some(true),
    ));
    let mut ir_map = seed_ir(&gateways);

    let route = make_grpc_route(vec![method_match(Some("echo"), Some("Say"), false)]);
    translator().process_grpc_routes(vec![route], &mut gateways, &resources, &mut ir_map);

    let ir_route = &listener_ir(&ir_map, &gateways).routes[0];
    let destination = ir_route.destination.as_ref().expect("destination");
    assert_eq!(
        destination.settings[0].protocol,
        Some(ir::AppProtocol::Grpc)
    );
}
