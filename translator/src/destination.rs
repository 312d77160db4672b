//! Backend resolution: translating a backend reference into a destination
//! setting, or into a weight-only placeholder when the reference is invalid
//! so synthesized failure responses stay proportional to peers.

use crate::{
    context::{Route, RouteKind},
    filters::{destination_filters, BackendFilters},
    status::{
        set_route_condition, COND_RESOLVED_REFS, REASON_BACKEND_NOT_FOUND, REASON_INVALID_KIND,
        REASON_REF_NOT_PERMITTED, REASON_RESOLVED_REFS, REASON_UNSUPPORTED_VALUE,
    },
    Resources, Translator,
};
use ahash::AHashMap as HashMap;
use gateway_translator_core::ir;
use gateway_translator_k8s_api::{
    gateway, proxy::ProxyConfig, EndpointSlice, Service, ServicePort,
};

pub(crate) const KIND_SERVICE: &str = "Service";
pub(crate) const KIND_SERVICE_IMPORT: &str = "ServiceImport";
pub(crate) const KIND_BACKEND: &str = "Backend";

const GROUP_CORE: &str = "";
const GROUP_MULTICLUSTER: &str = "multicluster.x-k8s.io";
const GROUP_BACKEND: &str = "gateway.envoyproxy.io";

/// Route-scoped facts threaded through backend resolution.
pub(crate) struct RouteInfo<'a> {
    pub id: String,
    pub namespace: String,
    pub kind: RouteKind,
    pub generation: Option<i64>,
    pub proxy: Option<&'a ProxyConfig>,
}

impl<'a> RouteInfo<'a> {
    pub(crate) fn new<R: Route>(route: &R, proxy: Option<&'a ProxyConfig>) -> Self {
        Self {
            id: route.route_id(),
            namespace: route.namespace().to_string(),
            kind: R::KIND,
            generation: route.generation(),
            proxy,
        }
    }
}

struct RefError {
    reason: &'static str,
    message: String,
}

impl Translator {
    /// Translates a backend reference into a destination setting.
    ///
    /// An invalid reference yields a destination carrying only its weight and
    /// records a negative `ResolvedRefs` condition; a reference with weight 0
    /// yields nothing at all.
    pub(crate) fn process_destination(
        &self,
        backend_ref: &gateway::BackendRef,
        backend_filters: BackendFilters<'_>,
        info: &RouteInfo<'_>,
        status: &mut [gateway::RouteParentStatus],
        status_idx: usize,
        resources: &Resources,
    ) -> Option<ir::DestinationSetting> {
        let weight = backend_ref.weight.unwrap_or(1);
        let backend_ns = backend_ref
            .inner
            .namespace
            .clone()
            .unwrap_or_else(|| info.namespace.clone());

        if let Err(err) = validate_backend_ref(&backend_ref.inner, info, &backend_ns, resources) {
            set_route_condition(
                status,
                status_idx,
                info.generation,
                COND_RESOLVED_REFS,
                false,
                err.reason,
                &err.message,
            );
            // A destination with no endpoints still counts its weight toward
            // synthesized failure responses.
            return Some(ir::DestinationSetting {
                weight,
                ..Default::default()
            });
        }

        if weight == 0 {
            return None;
        }

        let protocol = protocol_for_route_kind(info.kind);
        let kind = backend_ref.inner.kind.as_deref().unwrap_or(KIND_SERVICE);
        let name = backend_ref.inner.name.as_str();

        let mut ds = match kind {
            KIND_SERVICE_IMPORT => self.process_service_import_destination(
                &backend_ref.inner,
                &backend_ns,
                protocol,
                info,
                resources,
            ),
            KIND_BACKEND => {
                let mut ds = process_backend_destination(name, &backend_ns, resources);
                ds.tls = resources.backend_tls(&backend_ns, name);
                ds.filters = destination_filters(&backend_filters);
                ds
            }
            _ => {
                let mut ds = self.process_service_destination(
                    &backend_ref.inner,
                    &backend_ns,
                    protocol,
                    info,
                    resources,
                );
                ds.tls = resources.backend_tls(&backend_ns, name);
                ds.filters = destination_filters(&backend_filters);
                ds.ip_family = resources
                    .get_service(&backend_ns, name)
                    .and_then(service_ip_family);
                ds
            }
        };

        if let Err(message) =
            validate_destination_setting(&ds, self.is_service_routing(info.proxy), kind)
        {
            set_route_condition(
                status,
                status_idx,
                info.generation,
                COND_RESOLVED_REFS,
                false,
                REASON_RESOLVED_REFS,
                &message,
            );
        }

        ds.weight = weight;
        Some(ds)
    }

    fn process_service_destination(
        &self,
        backend: &gateway::BackendObjectReference,
        backend_ns: &str,
        mut protocol: ir::AppProtocol,
        info: &RouteInfo<'_>,
        resources: &Resources,
    ) -> ir::DestinationSetting {
        let Some(service) = resources.get_service(backend_ns, &backend.name) else {
            return ir::DestinationSetting::default();
        };
        let port = backend.port.unwrap_or_default();

        let service_port = service
            .spec
            .as_ref()
            .and_then(|spec| spec.ports.as_ref())
            .into_iter()
            .flatten()
            .find(|p| p.port == i32::from(port));

        if let Some(app_protocol) = service_port.and_then(|p| p.app_protocol.as_deref()) {
            match app_protocol {
                "kubernetes.io/h2c" => protocol = ir::AppProtocol::Http2,
                "grpc" => protocol = ir::AppProtocol::Grpc,
                _ => {}
            }
        }

        let (endpoints, address_type) = if !self.is_service_routing(info.proxy) {
            let slices =
                resources.get_endpoint_slices_for_backend(backend_ns, &backend.name, KIND_SERVICE);
            endpoints_from_endpoint_slices(&slices, service_port)
        } else {
            // Fall back to Service ClusterIP routing.
            let cluster_ip = service
                .spec
                .as_ref()
                .and_then(|spec| spec.cluster_ip.clone())
                .unwrap_or_default();
            (
                vec![ir::DestinationEndpoint::new(cluster_ip, u32::from(port))],
                None,
            )
        };

        ir::DestinationSetting {
            protocol: Some(protocol),
            endpoints,
            address_type,
            ..Default::default()
        }
    }

    fn process_service_import_destination(
        &self,
        backend: &gateway::BackendObjectReference,
        backend_ns: &str,
        protocol: ir::AppProtocol,
        info: &RouteInfo<'_>,
        resources: &Resources,
    ) -> ir::DestinationSetting {
        let Some(service_import) = resources.get_service_import(backend_ns, &backend.name) else {
            return ir::DestinationSetting::default();
        };
        let port = backend.port.unwrap_or_default();

        let import_port = service_import
            .spec
            .ports
            .iter()
            .find(|p| p.port == i32::from(port));

        let (endpoints, address_type) = if !self.is_service_routing(info.proxy) {
            let slices = resources.get_endpoint_slices_for_backend(
                backend_ns,
                &backend.name,
                KIND_SERVICE_IMPORT,
            );
            endpoint_slice_endpoints(
                &slices,
                import_port.and_then(|p| p.name.as_deref()).unwrap_or(""),
                import_port.and_then(|p| p.protocol.as_deref()).unwrap_or("TCP"),
            )
        } else {
            let endpoints = service_import
                .spec
                .ips
                .iter()
                .flatten()
                .map(|ip| ir::DestinationEndpoint::new(ip.clone(), u32::from(port)))
                .collect();
            (endpoints, None)
        };

        ir::DestinationSetting {
            protocol: Some(protocol),
            endpoints,
            address_type,
            ..Default::default()
        }
    }
}

fn validate_backend_ref(
    backend: &gateway::BackendObjectReference,
    info: &RouteInfo<'_>,
    backend_ns: &str,
    resources: &Resources,
) -> Result<(), RefError> {
    let kind = backend.kind.as_deref().unwrap_or(KIND_SERVICE);
    let group = match kind {
        KIND_SERVICE => GROUP_CORE,
        KIND_SERVICE_IMPORT => GROUP_MULTICLUSTER,
        KIND_BACKEND => GROUP_BACKEND,
        _ => {
            return Err(RefError {
                reason: REASON_INVALID_KIND,
                message: format!("Kind {kind} is not a supported backend kind"),
            })
        }
    };

    if backend_ns != info.namespace
        && !resources.reference_grant_permits(
            gateway::GROUP,
            info.kind.kind(),
            &info.namespace,
            group,
            kind,
            backend_ns,
            &backend.name,
        )
    {
        return Err(RefError {
            reason: REASON_REF_NOT_PERMITTED,
            message: format!(
                "Backend ref to {kind} {backend_ns}/{} not permitted by any ReferenceGrant",
                backend.name
            ),
        });
    }

    let exists = match kind {
        KIND_SERVICE_IMPORT => resources
            .get_service_import(backend_ns, &backend.name)
            .is_some(),
        KIND_BACKEND => resources.get_backend(backend_ns, &backend.name).is_some(),
        _ => resources.get_service(backend_ns, &backend.name).is_some(),
    };
    if !exists {
        return Err(RefError {
            reason: REASON_BACKEND_NOT_FOUND,
            message: format!("{kind} {backend_ns}/{} not found", backend.name),
        });
    }

    if kind != KIND_BACKEND && backend.port.is_none() {
        return Err(RefError {
            reason: REASON_UNSUPPORTED_VALUE,
            message: format!(
                "A valid port number corresponding to a port on the {kind} must be specified"
            ),
        });
    }

    Ok(())
}

/// MIXED address types are rejected for Backend always, and for Service /
/// ServiceImport whenever endpoints (rather than cluster IPs) are routed to.
fn validate_destination_setting(
    ds: &ir::DestinationSetting,
    service_routing: bool,
    kind: &str,
) -> Result<(), String> {
    let mixed = ds.address_type == Some(ir::DestinationAddressType::Mixed);
    match kind {
        KIND_BACKEND if mixed => Err(
            "Mixed FQDN and IP or Unix address type for the same backendRef is not supported"
                .to_string(),
        ),
        KIND_SERVICE | KIND_SERVICE_IMPORT if !service_routing && mixed => Err(
            "Mixed endpointslice address type for the same backendRef is not supported".to_string(),
        ),
        _ => Ok(()),
    }
}

fn process_backend_destination(
    name: &str,
    backend_ns: &str,
    resources: &Resources,
) -> ir::DestinationSetting {
    let Some(backend) = resources.get_backend(backend_ns, name) else {
        return ir::DestinationSetting::default();
    };

    let mut endpoints = Vec::new();
    let mut addr_type_counts: HashMap<ir::DestinationAddressType, usize> = HashMap::new();
    for endpoint in &backend.spec.endpoints {
        if let Some(ip) = &endpoint.ip {
            if ip.address.parse::<std::net::IpAddr>().is_ok() {
                *addr_type_counts
                    .entry(ir::DestinationAddressType::Ip)
                    .or_default() += 1;
                endpoints.push(ir::DestinationEndpoint::new(
                    ip.address.clone(),
                    u32::from(ip.port),
                ));
            } else {
                tracing::warn!(
                    backend = %crate::ResourceId::new(backend_ns.to_string(), name.to_string()),
                    address = %ip.address,
                    "skipping endpoint with unparseable IP address"
                );
            }
        } else if let Some(fqdn) = &endpoint.fqdn {
            *addr_type_counts
                .entry(ir::DestinationAddressType::Fqdn)
                .or_default() += 1;
            endpoints.push(ir::DestinationEndpoint::new(
                fqdn.hostname.clone(),
                u32::from(fqdn.port),
            ));
        } else if let Some(unix) = &endpoint.unix {
            *addr_type_counts
                .entry(ir::DestinationAddressType::Ip)
                .or_default() += 1;
            endpoints.push(ir::DestinationEndpoint::unix(unix.path.clone()));
        }
    }

    let address_type = aggregate_address_type(&addr_type_counts, backend.spec.endpoints.len());

    let protocol = backend
        .spec
        .app_protocols
        .iter()
        .flatten()
        .any(|p| *p == gateway_translator_k8s_api::backend::AppProtocolType::H2c)
        .then_some(ir::AppProtocol::Http2);

    // Fallback backends are demoted to the secondary priority; primaries keep
    // the default.
    let priority = (backend.spec.fallback == Some(true)).then_some(1);

    ir::DestinationSetting {
        protocol,
        endpoints,
        address_type,
        priority,
        ..Default::default()
    }
}

/// Gathers endpoints from a set of EndpointSlices, tracking per-slice address
/// types to aggregate the destination's address type.
fn endpoints_from_endpoint_slices(
    slices: &[&EndpointSlice],
    service_port: Option<&ServicePort>,
) -> (Vec<ir::DestinationEndpoint>, Option<ir::DestinationAddressType>) {
    endpoint_slice_endpoints(
        slices,
        service_port.and_then(|p| p.name.as_deref()).unwrap_or(""),
        service_port
            .and_then(|p| p.protocol.as_deref())
            .unwrap_or("TCP"),
    )
}

fn endpoint_slice_endpoints(
    slices: &[&EndpointSlice],
    port_name: &str,
    port_protocol: &str,
) -> (Vec<ir::DestinationEndpoint>, Option<ir::DestinationAddressType>) {
    let mut endpoints = Vec::new();
    let mut addr_type_counts: HashMap<ir::DestinationAddressType, usize> = HashMap::new();

    for slice in slices {
        let addr_type = if slice.address_type == "FQDN" {
            ir::DestinationAddressType::Fqdn
        } else {
            ir::DestinationAddressType::Ip
        };
        *addr_type_counts.entry(addr_type).or_default() += 1;

        for endpoint in &slice.endpoints {
            for port in slice.ports.iter().flatten() {
                let Some(port_number) = port.port else {
                    continue;
                };
                if port.name.as_deref().unwrap_or("") != port_name {
                    continue;
                }
                if port.protocol.as_deref().unwrap_or("TCP") != port_protocol {
                    continue;
                }
                // An absent ready condition counts as ready.
                let ready = endpoint
                    .conditions
                    .as_ref()
                    .and_then(|c| c.ready)
                    .unwrap_or(true);
                if !ready {
                    continue;
                }
                for address in &endpoint.addresses {
                    endpoints.push(ir::DestinationEndpoint::new(
                        address.clone(),
                        port_number as u32,
                    ));
                }
            }
        }
    }

    let address_type = aggregate_address_type(&addr_type_counts, slices.len());
    (endpoints, address_type)
}

/// The aggregated type is the unique type covering every element; any split
/// aggregates to MIXED, and an empty map stays unset.
fn aggregate_address_type(
    counts: &HashMap<ir::DestinationAddressType, usize>,
    total: usize,
) -> Option<ir::DestinationAddressType> {
    if counts.is_empty() {
        return None;
    }
    counts
        .iter()
        .find(|(_, count)| **count == total)
        .map(|(addr_type, _)| *addr_type)
        .or(Some(ir::DestinationAddressType::Mixed))
}

fn service_ip_family(service: &Service) -> Option<ir::IpFamily> {
    let spec = service.spec.as_ref()?;
    if spec.ip_family_policy.as_deref() == Some("RequireDualStack") {
        return Some(ir::IpFamily::DualStack);
    }
    match spec.ip_families.as_deref() {
        Some([family]) => match family.as_str() {
            "IPv4" => Some(ir::IpFamily::V4),
            "IPv6" => Some(ir::IpFamily::V6),
            _ => None,
        },
        Some(families) if families.len() == 2 => Some(ir::IpFamily::DualStack),
        _ => None,
    }
}

pub(crate) fn protocol_for_route_kind(kind: RouteKind) -> ir::AppProtocol {
    match kind {
        RouteKind::Http => ir::AppProtocol::Http,
        RouteKind::Grpc => ir::AppProtocol::Grpc,
        RouteKind::Tls => ir::AppProtocol::Https,
        RouteKind::Tcp => ir::AppProtocol::Tcp,
        RouteKind::Udp => ir::AppProtocol::Udp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregation_picks_the_unique_covering_type() {
        let mut counts: HashMap<ir::DestinationAddressType, usize> = HashMap::new();
        counts.insert(ir::DestinationAddressType::Ip, 3);
        assert_eq!(
            aggregate_address_type(&counts, 3),
            Some(ir::DestinationAddressType::Ip)
        );
    }

    #[test]
    fn aggregation_of_a_split_is_mixed() {
        let mut counts: HashMap<ir::DestinationAddressType, usize> = HashMap::new();
        counts.insert(ir::DestinationAddressType::Ip, 2);
        counts.insert(ir::DestinationAddressType::Fqdn, 1);
        assert_eq!(
            aggregate_address_type(&counts, 3),
            Some(ir::DestinationAddressType::Mixed)
        );
    }

    #[test]
    fn aggregation_of_nothing_is_unset() {
        let counts: HashMap<ir::DestinationAddressType, usize> = HashMap::new();
        assert_eq!(aggregate_address_type(&counts, 0), None);
    }

    #[test]
    fn partial_counts_do_not_cover_the_total() {
        // One endpoint failed to parse: its type was never counted, so no
        // type covers the declared total and the aggregate is mixed.
        let mut counts: HashMap<ir::DestinationAddressType, usize> = HashMap::new();
        counts.insert(ir::DestinationAddressType::Ip, 1);
        assert_eq!(
            aggregate_address_type(&counts, 2),
            Some(ir::DestinationAddressType::Mixed)
        );
    }
}
