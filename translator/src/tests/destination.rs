use super::*;
use crate::{
    destination::RouteInfo,
    filters::BackendFilters,
    RouteKind, COND_RESOLVED_REFS, REASON_BACKEND_NOT_FOUND, REASON_INVALID_KIND,
    REASON_REF_NOT_PERMITTED, REASON_RESOLVED_REFS, REASON_UNSUPPORTED_VALUE,
};
use gateway_translator_core::ir;
use gateway_translator_k8s_api::{
    backend, gateway, multicluster, proxy, SERVICE_IMPORT_NAME_LABEL,
};

fn info() -> RouteInfo<'static> {
    RouteInfo {
        id: "httproute/default/route".to_string(),
        namespace: "default".to_string(),
        kind: RouteKind::Http,
        generation: Some(1),
        proxy: None,
    }
}

fn resolve(
    backend_ref: &gateway::BackendRef,
    resources: &crate::Resources,
) -> (
    Option<ir::DestinationSetting>,
    gateway::RouteParentStatus,
) {
    resolve_with(&translator(), &info(), backend_ref, resources)
}

fn resolve_with(
    translator: &crate::Translator,
    info: &RouteInfo<'_>,
    backend_ref: &gateway::BackendRef,
    resources: &crate::Resources,
) -> (
    Option<ir::DestinationSetting>,
    gateway::RouteParentStatus,
) {
    let mut status = vec![gateway::RouteParentStatus::default()];
    let setting = translator.process_destination(
        backend_ref,
        BackendFilters::None,
        info,
        &mut status,
        0,
        resources,
    );
    (setting, status.remove(0))
}

fn service_resources() -> crate::Resources {
    let mut resources = crate::Resources::default();
    resources.add_service(make_service("default", "svc", 8080, "http"));
    resources.add_endpoint_slice(make_endpoint_slice(
        "default",
        "svc",
        "svc-1",
        &["10.0.0.1", "10.0.0.2"],
        8080,
        "http",
        Some(true),
    ));
    resources
}

#[test]
fn weight_defaults_to_one() {
    let (setting, status) = resolve(&service_backend("svc", 8080, None), &service_resources());
    let setting = setting.expect("destination");
    assert_eq!(setting.weight, 1);
    assert!(status.conditions.is_empty());
}

#[test]
fn weight_zero_produces_no_destination() {
    let (setting, status) = resolve(&service_backend("svc", 8080, Some(0)), &service_resources());
    assert!(setting.is_none());
    assert!(status.conditions.is_empty());
}

#[test]
fn missing_service_yields_weight_only_destination() {
    let (setting, status) = resolve(
        &service_backend("missing", 8080, Some(3)),
        &service_resources(),
    );
    let setting = setting.expect("weight-only destination");
    assert_eq!(setting.weight, 3);
    assert!(setting.endpoints.is_empty());
    assert!(setting.protocol.is_none());

    let cond = condition(&status, COND_RESOLVED_REFS);
    assert_eq!(cond.status, "False");
    assert_eq!(cond.reason, REASON_BACKEND_NOT_FOUND);
}

#[test]
fn unsupported_kind_is_rejected() {
    let backend_ref = gateway::BackendRef {
        inner: gateway::BackendObjectReference {
            kind: Some("ConfigMap".to_string()),
            name: "cm".to_string(),
            port: Some(8080),
            ..Default::default()
        },
        weight: None,
    };
    let (setting, status) = resolve(&backend_ref, &service_resources());
    assert!(setting.expect("weight-only destination").endpoints.is_empty());
    assert_eq!(
        condition(&status, COND_RESOLVED_REFS).reason,
        REASON_INVALID_KIND
    );
}

#[test]
fn missing_port_is_rejected() {
    let backend_ref = gateway::BackendRef {
        inner: gateway::BackendObjectReference {
            name: "svc".to_string(),
            port: None,
            ..Default::default()
        },
        weight: None,
    };
    let (_, status) = resolve(&backend_ref, &service_resources());
    assert_eq!(
        condition(&status, COND_RESOLVED_REFS).reason,
        REASON_UNSUPPORTED_VALUE
    );
}

#[test]
fn cross_namespace_reference_requires_a_grant() {
    let mut resources = crate::Resources::default();
    resources.add_service(make_service("backends", "svc", 8080, "http"));
    resources.add_endpoint_slice(make_endpoint_slice(
        "backends",
        "svc",
        "svc-1",
        &["10.0.1.1"],
        8080,
        "http",
        Some(true),
    ));

    let backend_ref = gateway::BackendRef {
        inner: gateway::BackendObjectReference {
            name: "svc".to_string(),
            namespace: Some("backends".to_string()),
            port: Some(8080),
            ..Default::default()
        },
        weight: None,
    };

    let (setting, status) = resolve(&backend_ref, &resources);
    assert!(setting.expect("weight-only destination").endpoints.is_empty());
    assert_eq!(
        condition(&status, COND_RESOLVED_REFS).reason,
        REASON_REF_NOT_PERMITTED
    );

    // With a grant in the backend namespace the reference resolves.
    resources.add_reference_grant(gateway::ReferenceGrant {
        metadata: meta("backends", "allow-routes"),
        spec: gateway::ReferenceGrantSpec {
            from: vec![gateway::ReferenceGrantFrom {
                group: gateway::GROUP.to_string(),
                kind: "HTTPRoute".to_string(),
                namespace: "default".to_string(),
            }],
            to: vec![gateway::ReferenceGrantTo {
                group: String::new(),
                kind: "Service".to_string(),
                name: None,
            }],
        },
    });

    let (setting, status) = resolve(&backend_ref, &resources);
    assert_eq!(setting.expect("destination").endpoints.len(), 1);
    assert!(status.conditions.is_empty());
}

#[test]
fn app_protocol_upgrades_the_destination_protocol() {
    for (app_protocol, expected) in [
        ("kubernetes.io/h2c", ir::AppProtocol::Http2),
        ("grpc", ir::AppProtocol::Grpc),
    ] {
        let mut resources = crate::Resources::default();
        let mut service = make_service("default", "svc", 8080, "http");
        if let Some(ports) = service.spec.as_mut().and_then(|s| s.ports.as_mut()) {
            ports[0].app_protocol = Some(app_protocol.to_string());
        }
        resources.add_service(service);
        resources.add_endpoint_slice(make_endpoint_slice(
            "default",
            "svc",
            "svc-1",
            &["10.0.0.1"],
            8080,
            "http",
            Some(true),
        ));

        let (setting, _) = resolve(&service_backend("svc", 8080, None), &resources);
        assert_eq!(setting.expect("destination").protocol, Some(expected));
    }
}

#[test]
fn endpoints_filter_by_port_name_protocol_and_readiness() {
    let mut resources = crate::Resources::default();
    resources.add_service(make_service("default", "svc", 8080, "http"));
    // Matching, ready.
    resources.add_endpoint_slice(make_endpoint_slice(
        "default",
        "svc",
        "svc-ready",
        &["10.0.0.1"],
        8080,
        "http",
        Some(true),
    ));
    // Matching port number but wrong port name.
    resources.add_endpoint_slice(make_endpoint_slice(
        "default",
        "svc",
        "svc-admin",
        &["10.0.0.2"],
        8080,
        "admin",
        Some(true),
    ));
    // Not ready.
    resources.add_endpoint_slice(make_endpoint_slice(
        "default",
        "svc",
        "svc-unready",
        &["10.0.0.3"],
        8080,
        "http",
        Some(false),
    ));
    // Absent ready condition counts as ready.
    resources.add_endpoint_slice(make_endpoint_slice(
        "default",
        "svc",
        "svc-unknown",
        &["10.0.0.4"],
        8080,
        "http",
        None,
    ));

    let (setting, _) = resolve(&service_backend("svc", 8080, None), &resources);
    let endpoints = setting.expect("destination").endpoints;
    assert_eq!(
        endpoints,
        vec![
            ir::DestinationEndpoint::new("10.0.0.1", 8080),
            ir::DestinationEndpoint::new("10.0.0.4", 8080),
        ]
    );
}

#[test]
fn service_routing_uses_the_cluster_ip() {
    let mut translator = translator();
    translator.endpoint_routing = false;

    let (setting, _) = resolve_with(
        &translator,
        &info(),
        &service_backend("svc", 8080, None),
        &service_resources(),
    );
    let setting = setting.expect("destination");
    assert_eq!(
        setting.endpoints,
        vec![ir::DestinationEndpoint::new("10.96.0.10", 8080)]
    );
    assert!(setting.address_type.is_none());
}

#[test]
fn proxy_config_overrides_the_routing_mode() {
    let proxy = proxy::ProxyConfig {
        metadata: meta("default", "proxy"),
        spec: proxy::ProxyConfigSpec {
            routing_type: Some(proxy::RoutingType::Service),
        },
    };
    let info = RouteInfo {
        id: "httproute/default/route".to_string(),
        namespace: "default".to_string(),
        kind: RouteKind::Http,
        generation: Some(1),
        proxy: Some(&proxy),
    };

    let (setting, _) = resolve_with(
        &translator(),
        &info,
        &service_backend("svc", 8080, None),
        &service_resources(),
    );
    assert_eq!(
        setting.expect("destination").endpoints,
        vec![ir::DestinationEndpoint::new("10.96.0.10", 8080)]
    );
}

#[test]
fn service_import_routes_to_exported_ips_without_endpoint_routing() {
    let mut translator = translator();
    translator.endpoint_routing = false;

    let mut resources = crate::Resources::default();
    resources.add_service_import(multicluster::ServiceImport {
        metadata: meta("default", "imported"),
        spec: multicluster::ServiceImportSpec {
            ports: vec![multicluster::ServiceImportPort {
                name: Some("http".to_string()),
                port: 8080,
                protocol: Some("TCP".to_string()),
                ..Default::default()
            }],
            ips: Some(vec!["10.127.0.5".to_string()]),
            type_: None,
        },
    });

    let backend_ref = gateway::BackendRef {
        inner: gateway::BackendObjectReference {
            kind: Some("ServiceImport".to_string()),
            name: "imported".to_string(),
            port: Some(8080),
            ..Default::default()
        },
        weight: None,
    };
    let (setting, _) = resolve_with(&translator, &info(), &backend_ref, &resources);
    assert_eq!(
        setting.expect("destination").endpoints,
        vec![ir::DestinationEndpoint::new("10.127.0.5", 8080)]
    );
}

#[test]
fn service_import_gathers_endpoint_slices_by_label() {
    let mut resources = crate::Resources::default();
    resources.add_service_import(multicluster::ServiceImport {
        metadata: meta("default", "imported"),
        spec: multicluster::ServiceImportSpec {
            ports: vec![multicluster::ServiceImportPort {
                name: Some("http".to_string()),
                port: 8080,
                protocol: Some("TCP".to_string()),
                ..Default::default()
            }],
            ips: None,
            type_: None,
        },
    });
    let mut slice = make_endpoint_slice(
        "default",
        "imported",
        "imported-1",
        &["10.0.0.7"],
        8080,
        "http",
        Some(true),
    );
    slice.metadata.labels = Some(
        [(SERVICE_IMPORT_NAME_LABEL.to_string(), "imported".to_string())]
            .into_iter()
            .collect(),
    );
    resources.add_endpoint_slice(slice);

    let backend_ref = gateway::BackendRef {
        inner: gateway::BackendObjectReference {
            kind: Some("ServiceImport".to_string()),
            name: "imported".to_string(),
            port: Some(8080),
            ..Default::default()
        },
        weight: None,
    };
    let (setting, _) = resolve(&backend_ref, &resources);
    assert_eq!(
        setting.expect("destination").endpoints,
        vec![ir::DestinationEndpoint::new("10.0.0.7", 8080)]
    );
}

fn make_backend(endpoints: Vec<backend::BackendEndpoint>) -> backend::Backend {
    backend::Backend {
        metadata: meta("default", "be"),
        spec: backend::BackendSpec {
            endpoints,
            app_protocols: None,
            fallback: None,
        },
    }
}

fn backend_ref() -> gateway::BackendRef {
    gateway::BackendRef {
        inner: gateway::BackendObjectReference {
            kind: Some("Backend".to_string()),
            name: "be".to_string(),
            ..Default::default()
        },
        weight: None,
    }
}

fn ip_endpoint(address: &str, port: u16) -> backend::BackendEndpoint {
    backend::BackendEndpoint {
        ip: Some(backend::IpEndpoint {
            address: address.to_string(),
            port,
        }),
        ..Default::default()
    }
}

fn fqdn_endpoint(hostname: &str, port: u16) -> backend::BackendEndpoint {
    backend::BackendEndpoint {
        fqdn: Some(backend::FqdnEndpoint {
            hostname: hostname.to_string(),
            port,
        }),
        ..Default::default()
    }
}

#[test]
fn backend_with_uniform_endpoints_keeps_the_address_type() {
    let mut resources = crate::Resources::default();
    resources.add_backend(make_backend(vec![
        fqdn_endpoint("a.example.com", 443),
        fqdn_endpoint("b.example.com", 443),
    ]));

    let (setting, status) = resolve(&backend_ref(), &resources);
    let setting = setting.expect("destination");
    assert_eq!(setting.address_type, Some(ir::DestinationAddressType::Fqdn));
    assert!(status.conditions.is_empty());
}

#[test]
fn backend_with_mixed_endpoints_is_rejected_but_emitted() {
    let mut resources = crate::Resources::default();
    resources.add_backend(make_backend(vec![
        ip_endpoint("10.1.0.1", 443),
        fqdn_endpoint("a.example.com", 443),
    ]));

    let (setting, status) = resolve(&backend_ref(), &resources);
    let setting = setting.expect("destination");
    assert_eq!(setting.address_type, Some(ir::DestinationAddressType::Mixed));
    assert_eq!(setting.endpoints.len(), 2);
    assert_eq!(
        condition(&status, COND_RESOLVED_REFS).reason,
        REASON_RESOLVED_REFS
    );
}

#[test]
fn backend_unix_socket_endpoints_carry_a_path() {
    let mut resources = crate::Resources::default();
    resources.add_backend(make_backend(vec![backend::BackendEndpoint {
        unix: Some(backend::UnixSocket {
            path: "/run/app.sock".to_string(),
        }),
        ..Default::default()
    }]));

    let (setting, _) = resolve(&backend_ref(), &resources);
    let setting = setting.expect("destination");
    assert_eq!(
        setting.endpoints,
        vec![ir::DestinationEndpoint::unix("/run/app.sock")]
    );
    assert_eq!(setting.address_type, Some(ir::DestinationAddressType::Ip));
}

#[test]
fn backend_h2c_app_protocol_and_fallback_priority() {
    let mut resources = crate::Resources::default();
    let mut be = make_backend(vec![ip_endpoint("10.1.0.1", 443)]);
    be.spec.app_protocols = Some(vec![backend::AppProtocolType::H2c]);
    be.spec.fallback = Some(true);
    resources.add_backend(be);

    let (setting, _) = resolve(&backend_ref(), &resources);
    let setting = setting.expect("destination");
    assert_eq!(setting.protocol, Some(ir::AppProtocol::Http2));
    assert_eq!(setting.priority, Some(1));
}

#[test]
fn backend_tls_records_are_attached_from_the_view() {
    let mut resources = service_resources();
    resources.add_backend_tls(
        "default".to_string(),
        "svc".to_string(),
        ir::BackendTls {
            sni: Some("svc.internal".to_string()),
            ca_certificate_name: Some("internal-ca".to_string()),
        },
    );

    let (setting, _) = resolve(&service_backend("svc", 8080, None), &resources);
    let tls = setting.expect("destination").tls.expect("backend TLS");
    assert_eq!(tls.sni.as_deref(), Some("svc.internal"));
}

#[test]
fn service_ip_family_is_recorded_on_the_destination() {
    let cases: &[(Option<&[&str]>, Option<&str>, Option<ir::IpFamily>)] = &[
        (Some(&["IPv4"]), None, Some(ir::IpFamily::V4)),
        (Some(&["IPv6"]), None, Some(ir::IpFamily::V6)),
        (
            Some(&["IPv4", "IPv6"]),
            None,
            Some(ir::IpFamily::DualStack),
        ),
        // The policy wins even when only one family is listed yet.
        (
            Some(&["IPv4"]),
            Some("RequireDualStack"),
            Some(ir::IpFamily::DualStack),
        ),
        (None, None, None),
    ];

    for (families, policy, expected) in cases {
        let mut resources = crate::Resources::default();
        let mut service = make_service("default", "svc", 8080, "http");
        if let Some(spec) = service.spec.as_mut() {
            spec.ip_families =
                families.map(|families| families.iter().map(|f| f.to_string()).collect());
            spec.ip_family_policy = policy.map(str::to_string);
        }
        resources.add_service(service);
        resources.add_endpoint_slice(make_endpoint_slice(
            "default",
            "svc",
            "svc-1",
            &["10.0.0.1"],
            8080,
            "http",
            Some(true),
        ));

        let (setting, _) = resolve(&service_backend("svc", 8080, None), &resources);
        assert_eq!(
            setting.expect("destination").ip_family,
            *expected,
            "families={families:?} policy={policy:?}"
        );
    }
}
