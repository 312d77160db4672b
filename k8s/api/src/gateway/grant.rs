use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// ReferenceGrant identifies kinds of resources in other namespaces that are
/// trusted to reference the specified kinds of resources in the same
/// namespace as the policy.
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
    group = "gateway.networking.k8s.io",
    version = "v1beta1",
    kind = "ReferenceGrant",
    root = "ReferenceGrant",
    namespaced
)]
pub struct ReferenceGrantSpec {
    /// From describes the trusted namespaces and kinds that can reference the
    /// resources described in "To".
    pub from: Vec<ReferenceGrantFrom>,

    /// To describes the resources that may be referenced by the resources
    /// described in "From".
    pub to: Vec<ReferenceGrantTo>,
}

/// ReferenceGrantFrom describes trusted namespaces and kinds.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct ReferenceGrantFrom {
    /// Group is the group of the referent. The empty string represents the
    /// core API group.
    pub group: String,

    /// Kind is the kind of the referent.
    pub kind: String,

    /// Namespace is the namespace of the referent.
    pub namespace: String,
}

/// ReferenceGrantTo describes what kinds are allowed as targets of the
/// references.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct ReferenceGrantTo {
    /// Group is the group of the referent. The empty string represents the
    /// core API group.
    pub group: String,

    /// Kind is the kind of the referent.
    pub kind: String,

    /// Name is the name of the referent. When unspecified, this policy
    /// refers to all resources of the specified Group and Kind in the local
    /// namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}
