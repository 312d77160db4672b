#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod backend;
pub mod duration;
pub mod gateway;
pub mod labels;
pub mod multicluster;
pub mod proxy;

pub use self::labels::Labels;
pub use k8s_openapi::{
    api::{
        core::v1::{Namespace, Service, ServicePort, ServiceSpec},
        discovery::v1::{Endpoint, EndpointConditions, EndpointPort, EndpointSlice},
    },
    apimachinery::pkg::apis::meta::v1::{Condition, Time},
};
pub use kube::core::{ObjectMeta, Resource, ResourceExt};

/// Label placed on `EndpointSlice`s by the endpoint-slice controller to tie a
/// slice back to its `Service`.
pub const SERVICE_NAME_LABEL: &str = "kubernetes.io/service-name";

/// Label placed on `EndpointSlice`s derived from a multi-cluster
/// `ServiceImport`.
pub const SERVICE_IMPORT_NAME_LABEL: &str = "multicluster.kubernetes.io/service-name";
