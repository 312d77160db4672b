use super::*;
use crate::{
    AllowedNamespaces, RouteContext, COND_ACCEPTED, REASON_NOT_ALLOWED_BY_LISTENERS,
    REASON_NO_MATCHING_PARENT, REASON_NO_READY_LISTENERS,
};
use gateway_translator_k8s_api::{gateway, labels, Namespace};

fn run_attach(
    route: gateway::HttpRoute,
    gateways: &mut [GatewayContext],
    resources: &crate::Resources,
) -> (bool, crate::HttpRouteContext) {
    let mut ctx = RouteContext::new(route);
    let relevant = translator().process_allowed_listeners_for_parent_refs(
        &mut ctx,
        gateways,
        resources,
    );
    (relevant, ctx)
}

fn plain_route() -> gateway::HttpRoute {
    make_http_route(vec![gateway::HttpRouteRule {
        matches: Some(vec![exact_path_match("/")]),
        ..Default::default()
    }])
}

#[test]
fn unknown_gateway_is_skipped_silently() {
    let mut gateways = vec![make_gateway(vec![listener(
        "http",
        80,
        ProtocolType::Http,
        None,
    )])];
    let resources = crate::Resources::default();

    let mut route = plain_route();
    route.spec.inner.parent_refs = Some(vec![gateway::ParentReference {
        name: "someone-elses-gateway".to_string(),
        ..Default::default()
    }]);

    let (relevant, ctx) = run_attach(route, &mut gateways, &resources);
    assert!(!relevant);
    assert!(ctx.status.is_empty());
    assert_eq!(gateways[0].listeners[0].attached_routes(), 0);
}

#[test]
fn section_name_mismatch_selects_no_listeners() {
    let mut gateways = vec![make_gateway(vec![listener(
        "http",
        80,
        ProtocolType::Http,
        None,
    )])];
    let resources = crate::Resources::default();

    let mut route = plain_route();
    route.spec.inner.parent_refs = Some(vec![gateway::ParentReference {
        name: GATEWAY_NAME.to_string(),
        section_name: Some("does-not-exist".to_string()),
        ..Default::default()
    }]);

    let (relevant, ctx) = run_attach(route, &mut gateways, &resources);
    assert!(relevant);
    assert_condition(
        &ctx.status[0],
        COND_ACCEPTED,
        "False",
        REASON_NO_MATCHING_PARENT,
    );
}

#[test]
fn port_mismatch_selects_no_listeners() {
    let mut gateways = vec![make_gateway(vec![listener(
        "http",
        80,
        ProtocolType::Http,
        None,
    )])];
    let resources = crate::Resources::default();

    let mut route = plain_route();
    route.spec.inner.parent_refs = Some(vec![gateway::ParentReference {
        name: GATEWAY_NAME.to_string(),
        port: Some(8080),
        ..Default::default()
    }]);

    let (_, ctx) = run_attach(route, &mut gateways, &resources);
    assert_condition(
        &ctx.status[0],
        COND_ACCEPTED,
        "False",
        REASON_NO_MATCHING_PARENT,
    );
}

#[test]
fn listener_kind_filter_rejects_the_route() {
    // A UDP-only gateway cannot carry an HTTPRoute.
    let mut gateways = vec![make_gateway(vec![listener(
        "udp",
        5353,
        ProtocolType::Udp,
        None,
    )])];
    let resources = crate::Resources::default();

    let (_, ctx) = run_attach(plain_route(), &mut gateways, &resources);
    assert_condition(
        &ctx.status[0],
        COND_ACCEPTED,
        "False",
        REASON_NOT_ALLOWED_BY_LISTENERS,
    );
    assert_eq!(gateways[0].listeners[0].attached_routes(), 0);
}

#[test]
fn same_namespace_policy_rejects_foreign_routes() {
    let mut gateways = vec![make_gateway(vec![listener(
        "http",
        80,
        ProtocolType::Http,
        None,
    )])];
    let resources = crate::Resources::default();

    let mut route = plain_route();
    route.metadata.namespace = Some("apps".to_string());
    route.spec.inner.parent_refs = Some(vec![gateway::ParentReference {
        name: GATEWAY_NAME.to_string(),
        namespace: Some(GATEWAY_NS.to_string()),
        ..Default::default()
    }]);

    let (_, ctx) = run_attach(route, &mut gateways, &resources);
    assert_condition(
        &ctx.status[0],
        COND_ACCEPTED,
        "False",
        REASON_NOT_ALLOWED_BY_LISTENERS,
    );
}

#[test]
fn namespace_selector_admits_matching_namespaces() {
    let mut gateways = vec![make_gateway(vec![listener(
        "http",
        80,
        ProtocolType::Http,
        None,
    )])];
    gateways[0].listeners[0].allowed_namespaces = AllowedNamespaces::Selector(
        [("team", "edge")].into_iter().collect::<labels::Selector>(),
    );

    let mut resources = crate::Resources::default();
    let mut namespace = Namespace::default();
    namespace.metadata = meta("", "apps");
    namespace.metadata.namespace = None;
    namespace.metadata.labels = Some(
        [("team".to_string(), "edge".to_string())]
            .into_iter()
            .collect(),
    );
    resources.add_namespace(namespace);

    let mut route = plain_route();
    route.metadata.namespace = Some("apps".to_string());
    route.spec.inner.parent_refs = Some(vec![gateway::ParentReference {
        name: GATEWAY_NAME.to_string(),
        namespace: Some(GATEWAY_NS.to_string()),
        ..Default::default()
    }]);

    let (_, ctx) = run_attach(route, &mut gateways, &resources);
    assert_condition(&ctx.status[0], COND_ACCEPTED, "True", "Accepted");
    assert_eq!(ctx.parents[0].listeners.len(), 1);
    assert_eq!(gateways[0].listeners[0].attached_routes(), 1);
}

#[test]
fn no_ready_listener_among_the_selected_set() {
    let mut ready_listener = listener("http", 80, ProtocolType::Http, None);
    ready_listener.ready = false;
    let mut gateways = vec![make_gateway(vec![ready_listener])];
    let resources = crate::Resources::default();

    let (_, ctx) = run_attach(plain_route(), &mut gateways, &resources);
    assert_condition(
        &ctx.status[0],
        COND_ACCEPTED,
        "False",
        REASON_NO_READY_LISTENERS,
    );
    // Counters are incremented before the readiness verdict.
    assert_eq!(gateways[0].listeners[0].attached_routes(), 1);
}

#[test]
fn readiness_is_judged_before_the_kind_filter() {
    // The ready listener does not admit HTTPRoutes; the admitting listener
    // is not ready. Readiness is checked against the selected (pre-filter)
    // set, so the route is accepted onto the not-ready listener.
    let ready_udp = listener("udp", 5353, ProtocolType::Udp, None);
    let mut http = listener("http", 80, ProtocolType::Http, None);
    http.ready = false;
    let mut gateways = vec![make_gateway(vec![ready_udp, http])];
    let resources = crate::Resources::default();

    let (_, ctx) = run_attach(plain_route(), &mut gateways, &resources);
    assert_condition(&ctx.status[0], COND_ACCEPTED, "True", "Accepted");
    assert_eq!(ctx.parents[0].listeners.len(), 1);
    assert_eq!(ctx.parents[0].listeners[0].listener, 1);
}

#[test]
fn each_parent_ref_gets_its_own_status_slot() {
    let mut gateways = vec![make_gateway(vec![
        listener("web", 80, ProtocolType::Http, None),
        listener("alt", 8080, ProtocolType::Http, None),
    ])];
    let resources = crate::Resources::default();

    let mut route = plain_route();
    route.spec.inner.parent_refs = Some(vec![
        gateway::ParentReference {
            name: GATEWAY_NAME.to_string(),
            section_name: Some("web".to_string()),
            ..Default::default()
        },
        gateway::ParentReference {
            name: GATEWAY_NAME.to_string(),
            section_name: Some("missing".to_string()),
            ..Default::default()
        },
    ]);

    let (_, ctx) = run_attach(route, &mut gateways, &resources);
    assert_eq!(ctx.status.len(), 2);
    assert_eq!(ctx.parents[0].status_idx, 0);
    assert_eq!(ctx.parents[1].status_idx, 1);
    assert_condition(&ctx.status[0], COND_ACCEPTED, "True", "Accepted");
    assert_condition(
        &ctx.status[1],
        COND_ACCEPTED,
        "False",
        REASON_NO_MATCHING_PARENT,
    );
}

#[test]
fn a_slot_with_only_resolved_refs_defaults_to_accepted() {
    // A parent-status slot filled without the attachment resolver carries no
    // Accepted verdict; the final defaulting rule supplies one.
    let translator = translator();
    let mut status = vec![gateway::RouteParentStatus::default()];

    translator.ensure_resolved_refs(&mut status, 0, Some(1));
    translator.ensure_accepted(&mut status, 0, Some(1));

    assert_condition(&status[0], "ResolvedRefs", "True", "ResolvedRefs");
    assert_condition(&status[0], COND_ACCEPTED, "True", "Accepted");
}

#[test]
fn the_accepted_default_never_displaces_a_verdict() {
    let translator = translator();

    // A negative ResolvedRefs blocks the default entirely.
    let mut status = vec![gateway::RouteParentStatus::default()];
    crate::status::set_route_condition(
        &mut status,
        0,
        Some(1),
        "ResolvedRefs",
        false,
        "BackendNotFound",
        "Service default/missing not found",
    );
    translator.ensure_accepted(&mut status, 0, Some(1));
    assert!(status[0].conditions.iter().all(|c| c.type_ != COND_ACCEPTED));

    // An existing Accepted condition is left untouched.
    let mut status = vec![gateway::RouteParentStatus::default()];
    crate::status::set_route_condition(
        &mut status,
        0,
        Some(1),
        COND_ACCEPTED,
        false,
        REASON_NO_MATCHING_PARENT,
        "No listeners match this parent ref",
    );
    translator.ensure_resolved_refs(&mut status, 0, Some(1));
    translator.ensure_accepted(&mut status, 0, Some(1));
    assert_condition(
        &status[0],
        COND_ACCEPTED,
        "False",
        REASON_NO_MATCHING_PARENT,
    );
}
