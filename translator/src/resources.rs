//! The materialized view of referenceable cluster state.
//!
//! Everything a route can point at is loaded here before a pass begins; the
//! translator never fetches anything itself.

use crate::ResourceId;
use ahash::AHashMap as HashMap;
use gateway_translator_core::ir;
use gateway_translator_k8s_api::{
    backend::Backend, gateway::ReferenceGrant, multicluster::ServiceImport, EndpointSlice,
    Namespace, ResourceExt, Service, SERVICE_IMPORT_NAME_LABEL, SERVICE_NAME_LABEL,
};

#[derive(Debug, Default)]
pub struct Resources {
    services: HashMap<ResourceId, Service>,
    service_imports: HashMap<ResourceId, ServiceImport>,
    backends: HashMap<ResourceId, Backend>,
    endpoint_slices: Vec<EndpointSlice>,
    namespaces: HashMap<String, Namespace>,
    reference_grants: Vec<ReferenceGrant>,
    backend_tls: HashMap<ResourceId, ir::BackendTls>,
}

impl Resources {
    pub fn add_service(&mut self, service: Service) {
        let id = ResourceId::new(
            service.namespace().expect("Service must have a namespace"),
            service.name_unchecked(),
        );
        self.services.insert(id, service);
    }

    pub fn add_service_import(&mut self, service_import: ServiceImport) {
        let id = ResourceId::new(
            service_import
                .namespace()
                .expect("ServiceImport must have a namespace"),
            service_import.name_unchecked(),
        );
        self.service_imports.insert(id, service_import);
    }

    pub fn add_backend(&mut self, backend: Backend) {
        let id = ResourceId::new(
            backend.namespace().expect("Backend must have a namespace"),
            backend.name_unchecked(),
        );
        self.backends.insert(id, backend);
    }

    pub fn add_endpoint_slice(&mut self, slice: EndpointSlice) {
        self.endpoint_slices.push(slice);
    }

    pub fn add_namespace(&mut self, namespace: Namespace) {
        self.namespaces
            .insert(namespace.name_unchecked(), namespace);
    }

    pub fn add_reference_grant(&mut self, grant: ReferenceGrant) {
        self.reference_grants.push(grant);
    }

    /// Registers pre-resolved upstream TLS for a backend.
    pub fn add_backend_tls(&mut self, namespace: String, name: String, tls: ir::BackendTls) {
        self.backend_tls.insert(ResourceId::new(namespace, name), tls);
    }

    pub fn get_service(&self, namespace: &str, name: &str) -> Option<&Service> {
        self.services
            .get(&ResourceId::new(namespace.to_string(), name.to_string()))
    }

    pub fn get_service_import(&self, namespace: &str, name: &str) -> Option<&ServiceImport> {
        self.service_imports
            .get(&ResourceId::new(namespace.to_string(), name.to_string()))
    }

    pub fn get_backend(&self, namespace: &str, name: &str) -> Option<&Backend> {
        self.backends
            .get(&ResourceId::new(namespace.to_string(), name.to_string()))
    }

    pub fn get_namespace(&self, name: &str) -> Option<&Namespace> {
        self.namespaces.get(name)
    }

    /// The EndpointSlices backing a Service or ServiceImport, matched by the
    /// well-known ownership label.
    pub fn get_endpoint_slices_for_backend(
        &self,
        namespace: &str,
        name: &str,
        kind: &str,
    ) -> Vec<&EndpointSlice> {
        let label = match kind {
            "ServiceImport" => SERVICE_IMPORT_NAME_LABEL,
            _ => SERVICE_NAME_LABEL,
        };
        self.endpoint_slices
            .iter()
            .filter(|slice| {
                slice.metadata.namespace.as_deref() == Some(namespace)
                    && slice
                        .metadata
                        .labels
                        .as_ref()
                        .and_then(|labels| labels.get(label))
                        .map(String::as_str)
                        == Some(name)
            })
            .collect()
    }

    pub fn backend_tls(&self, namespace: &str, name: &str) -> Option<ir::BackendTls> {
        self.backend_tls
            .get(&ResourceId::new(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Whether a ReferenceGrant in `to_ns` permits routes of `from_kind` in
    /// `from_ns` to reference the named object.
    pub fn reference_grant_permits(
        &self,
        from_group: &str,
        from_kind: &str,
        from_ns: &str,
        to_group: &str,
        to_kind: &str,
        to_ns: &str,
        to_name: &str,
    ) -> bool {
        self.reference_grants.iter().any(|grant| {
            grant.metadata.namespace.as_deref() == Some(to_ns)
                && grant.spec.from.iter().any(|from| {
                    from.group == from_group && from.kind == from_kind && from.namespace == from_ns
                })
                && grant.spec.to.iter().any(|to| {
                    to.group == to_group
                        && to.kind == to_kind
                        && to.name.as_deref().map_or(true, |n| n == to_name)
                })
        })
    }
}
