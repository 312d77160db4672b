//! Multi-cluster services API (`ServiceImport`).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// ServiceImport describes a service imported from clusters in a ClusterSet.
#[derive(
    Clone,
    Debug,
    Default,
    kube::CustomResource,
    serde::Deserialize,
    serde::Serialize,
    schemars::JsonSchema,
)]
#[kube(
    group = "multicluster.x-k8s.io",
    version = "v1alpha1",
    kind = "ServiceImport",
    root = "ServiceImport",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ServiceImportSpec {
    /// Ports is the list of ports exposed by the imported service.
    #[serde(default)]
    pub ports: Vec<ServiceImportPort>,

    /// IPs is the list of VIPs the imported service is reachable at, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ips: Option<Vec<String>>,

    /// Type defines the type of this service: ClusterSetIP or Headless.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
}

/// ServicePort represents the port on which the imported service is exposed.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceImportPort {
    /// The name of this port within the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// The port that will be exposed by this service.
    pub port: i32,

    /// The IP protocol for this port: TCP, UDP or SCTP. Defaults to TCP.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,

    /// The application protocol for this port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_protocol: Option<String>,
}
