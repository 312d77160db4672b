use super::common::{BackendRef, CommonRouteSpec, LocalObjectReference, RouteStatus};
use super::httproute::{HttpRequestHeaderFilter, HttpRequestMirrorFilter};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// GRPCRoute provides a way to route gRPC requests. This includes the
/// capability to match requests by hostname, gRPC service, or gRPC method.
/// Filters can be used to specify additional processing steps.
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
    version = "v1",
    kind = "GRPCRoute",
    root = "GrpcRoute",
    status = "GrpcRouteStatus",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct GrpcRouteSpec {
    /// Common route information.
    #[serde(flatten)]
    pub inner: CommonRouteSpec,

    /// Hostnames defines a set of hostnames to match against the gRPC Host
    /// header to select a GRPCRoute to process the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostnames: Option<Vec<String>>,

    /// Rules are a list of gRPC matchers, filters and actions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<GrpcRouteRule>>,
}

/// GRPCRouteRule defines the semantics for matching a gRPC request based on
/// conditions (matches), processing it (filters), and forwarding the request
/// to an API object (backendRefs).
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrpcRouteRule {
    /// Name is the name of the route rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Matches define conditions used for matching the rule against incoming
    /// gRPC requests. Each match is independent: the rule is matched if any
    /// one of the matches is satisfied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matches: Option<Vec<GrpcRouteMatch>>,

    /// Filters define the filters that are applied to requests that match
    /// this rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<GrpcRouteFilter>>,

    /// BackendRefs defines the backend(s) where matching requests should be
    /// sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_refs: Option<Vec<GrpcBackendRef>>,
}

/// GRPCRouteMatch defines the predicate used to match requests to a given
/// action. Multiple match types are ANDed together.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrpcRouteMatch {
    /// Method specifies a gRPC request service/method matcher.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<GrpcMethodMatch>,

    /// Headers specifies gRPC request header matchers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<GrpcHeaderMatch>>,
}

/// GRPCMethodMatch describes how to select a gRPC route by matching the gRPC
/// request service and/or method. At least one of Service or Method must be
/// a non-empty string.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(tag = "type", rename_all = "PascalCase")]
pub enum GrpcMethodMatch {
    Exact {
        method: Option<String>,
        service: Option<String>,
    },
    RegularExpression {
        method: Option<String>,
        service: Option<String>,
    },
}

/// GRPCHeaderMatch describes how to select a gRPC route by matching gRPC
/// request headers.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(tag = "type", rename_all = "PascalCase")]
pub enum GrpcHeaderMatch {
    Exact { name: String, value: String },
    RegularExpression { name: String, value: String },
}

/// GRPCRouteFilter defines processing steps that must be completed during
/// the request or response lifecycle.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(tag = "type", rename_all = "PascalCase")]
pub enum GrpcRouteFilter {
    #[serde(rename_all = "camelCase")]
    RequestHeaderModifier {
        request_header_modifier: HttpRequestHeaderFilter,
    },

    #[serde(rename_all = "camelCase")]
    ResponseHeaderModifier {
        response_header_modifier: HttpRequestHeaderFilter,
    },

    #[serde(rename_all = "camelCase")]
    RequestMirror {
        request_mirror: HttpRequestMirrorFilter,
    },

    #[serde(rename_all = "camelCase")]
    ExtensionRef { extension_ref: LocalObjectReference },
}

/// GRPCBackendRef defines how a GRPCRoute forwards a gRPC request.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrpcBackendRef {
    /// BackendRef is a reference to a backend to forward matched requests to.
    #[serde(flatten)]
    pub backend_ref: Option<BackendRef>,

    /// Filters defined at this level should be executed if and only if the
    /// request is being forwarded to the backend defined here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<GrpcRouteFilter>>,
}

/// GRPCRouteStatus defines the observed state of GRPCRoute.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct GrpcRouteStatus {
    /// Common route status information.
    #[serde(flatten)]
    pub inner: RouteStatus,
}
