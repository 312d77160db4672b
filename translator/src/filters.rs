//! Rule-level filter evaluation.
//!
//! A rule's filters are evaluated once into a [`FilterContext`] and then
//! applied to every IR route the rule produces. A redirect or direct
//! response in the context marks those routes terminal: backend destinations
//! are not attached to them.

use crate::{destination::RouteInfo, Resources, Translator};
use anyhow::{bail, Result};
use gateway_translator_core::ir;
use gateway_translator_k8s_api::gateway;

/// The route-level effects of one rule's filters.
#[derive(Clone, Debug, Default)]
pub struct FilterContext {
    pub redirect: Option<ir::Redirect>,
    pub direct_response: Option<ir::CustomResponse>,
    pub url_rewrite: Option<ir::UrlRewrite>,
    pub add_request_headers: Vec<ir::AddHeader>,
    pub remove_request_headers: Vec<String>,
    pub add_response_headers: Vec<ir::AddHeader>,
    pub remove_response_headers: Vec<String>,
    pub mirrors: Vec<ir::MirrorPolicy>,
    pub extension_refs: Vec<ir::UnstructuredRef>,
}

/// Backend-level filters, by owning route kind.
pub(crate) enum BackendFilters<'a> {
    Http(&'a [gateway::HttpRouteFilter]),
    Grpc(&'a [gateway::GrpcRouteFilter]),
    None,
}

impl FilterContext {
    /// Copies the context's effects onto an IR route.
    pub(crate) fn apply_to_route(&self, route: &mut ir::HttpRoute) {
        if let Some(redirect) = &self.redirect {
            route.redirect = Some(redirect.clone());
        }
        if let Some(direct_response) = &self.direct_response {
            route.direct_response = Some(direct_response.clone());
        }
        if let Some(url_rewrite) = &self.url_rewrite {
            route.url_rewrite = Some(url_rewrite.clone());
        }
        if !self.add_request_headers.is_empty() {
            route.add_request_headers = self.add_request_headers.clone();
        }
        if !self.remove_request_headers.is_empty() {
            route.remove_request_headers = self.remove_request_headers.clone();
        }
        if !self.add_response_headers.is_empty() {
            route.add_response_headers = self.add_response_headers.clone();
        }
        if !self.remove_response_headers.is_empty() {
            route.remove_response_headers = self.remove_response_headers.clone();
        }
        if !self.mirrors.is_empty() {
            route.mirrors = self.mirrors.clone();
        }
        if !self.extension_refs.is_empty() {
            route.extension_refs = self.extension_refs.clone();
        }
    }
}

impl Translator {
    pub(crate) fn process_http_filters(
        &self,
        filters: &[gateway::HttpRouteFilter],
        info: &RouteInfo<'_>,
        dest_name: &str,
        route_status: &mut [gateway::RouteParentStatus],
        status_idx: usize,
        resources: &Resources,
    ) -> Result<FilterContext> {
        let mut ctx = FilterContext::default();
        for (filter_idx, filter) in filters.iter().enumerate() {
            match filter {
                gateway::HttpRouteFilter::RequestHeaderModifier {
                    request_header_modifier,
                } => apply_header_modifier(
                    request_header_modifier,
                    &mut ctx.add_request_headers,
                    &mut ctx.remove_request_headers,
                ),

                gateway::HttpRouteFilter::ResponseHeaderModifier {
                    response_header_modifier,
                } => apply_header_modifier(
                    response_header_modifier,
                    &mut ctx.add_response_headers,
                    &mut ctx.remove_response_headers,
                ),

                gateway::HttpRouteFilter::RequestRedirect { request_redirect } => {
                    ctx.redirect = Some(redirect_filter(request_redirect)?);
                }

                gateway::HttpRouteFilter::UrlRewrite { url_rewrite } => {
                    ctx.url_rewrite = Some(url_rewrite_filter(url_rewrite)?);
                }

                gateway::HttpRouteFilter::RequestMirror { request_mirror } => {
                    self.process_mirror_filter(
                        request_mirror,
                        filter_idx,
                        info,
                        dest_name,
                        route_status,
                        status_idx,
                        resources,
                        &mut ctx.mirrors,
                    );
                }

                gateway::HttpRouteFilter::ExtensionRef { extension_ref } => {
                    ctx.extension_refs.push(unstructured_ref(extension_ref));
                }
            }
        }
        Ok(ctx)
    }

    pub(crate) fn process_grpc_filters(
        &self,
        filters: &[gateway::GrpcRouteFilter],
        info: &RouteInfo<'_>,
        dest_name: &str,
        route_status: &mut [gateway::RouteParentStatus],
        status_idx: usize,
        resources: &Resources,
    ) -> Result<FilterContext> {
        let mut ctx = FilterContext::default();
        for (filter_idx, filter) in filters.iter().enumerate() {
            match filter {
                gateway::GrpcRouteFilter::RequestHeaderModifier {
                    request_header_modifier,
                } => apply_header_modifier(
                    request_header_modifier,
                    &mut ctx.add_request_headers,
                    &mut ctx.remove_request_headers,
                ),

                gateway::GrpcRouteFilter::ResponseHeaderModifier {
                    response_header_modifier,
                } => apply_header_modifier(
                    response_header_modifier,
                    &mut ctx.add_response_headers,
                    &mut ctx.remove_response_headers,
                ),

                gateway::GrpcRouteFilter::RequestMirror { request_mirror } => {
                    self.process_mirror_filter(
                        request_mirror,
                        filter_idx,
                        info,
                        dest_name,
                        route_status,
                        status_idx,
                        resources,
                        &mut ctx.mirrors,
                    );
                }

                gateway::GrpcRouteFilter::ExtensionRef { extension_ref } => {
                    ctx.extension_refs.push(unstructured_ref(extension_ref));
                }
            }
        }
        Ok(ctx)
    }

    #[allow(clippy::too_many_arguments)]
    fn process_mirror_filter(
        &self,
        mirror: &gateway::HttpRequestMirrorFilter,
        filter_idx: usize,
        info: &RouteInfo<'_>,
        dest_name: &str,
        route_status: &mut [gateway::RouteParentStatus],
        status_idx: usize,
        resources: &Resources,
        mirrors: &mut Vec<ir::MirrorPolicy>,
    ) {
        let Some(backend) = &mirror.backend_ref else {
            return;
        };
        let mirror_ref = gateway::BackendRef {
            inner: backend.clone(),
            weight: None,
        };
        if let Some(setting) = self.process_destination(
            &mirror_ref,
            BackendFilters::None,
            info,
            route_status,
            status_idx,
            resources,
        ) {
            mirrors.push(ir::MirrorPolicy {
                destination: ir::RouteDestination {
                    name: format!("{dest_name}/mirror/{filter_idx}"),
                    settings: vec![setting],
                },
            });
        }
    }
}

fn apply_header_modifier(
    filter: &gateway::HttpRequestHeaderFilter,
    add: &mut Vec<ir::AddHeader>,
    remove: &mut Vec<String>,
) {
    for header in filter.set.iter().flatten() {
        add.push(ir::AddHeader {
            name: header.name.clone(),
            value: header.value.clone(),
            append: false,
        });
    }
    for header in filter.add.iter().flatten() {
        add.push(ir::AddHeader {
            name: header.name.clone(),
            value: header.value.clone(),
            append: true,
        });
    }
    remove.extend(filter.remove.iter().flatten().cloned());
}

fn redirect_filter(filter: &gateway::HttpRequestRedirectFilter) -> Result<ir::Redirect> {
    if let Some(scheme) = &filter.scheme {
        if !matches!(scheme.to_ascii_lowercase().as_str(), "http" | "https") {
            bail!("scheme {scheme:?} is unsupported for redirect filters");
        }
    }
    if let Some(status_code) = filter.status_code {
        if !matches!(status_code, 301 | 302) {
            bail!("status code {status_code} is unsupported for redirect filters");
        }
    }
    Ok(ir::Redirect {
        scheme: filter.scheme.clone(),
        hostname: filter.hostname.clone(),
        path: filter.path.as_ref().map(path_modifier).transpose()?,
        port: filter.port.map(u32::from),
        status_code: filter.status_code,
    })
}

fn url_rewrite_filter(filter: &gateway::HttpUrlRewriteFilter) -> Result<ir::UrlRewrite> {
    Ok(ir::UrlRewrite {
        hostname: filter.hostname.clone(),
        path: filter.path.as_ref().map(path_modifier).transpose()?,
    })
}

fn path_modifier(modifier: &gateway::HttpPathModifier) -> Result<ir::PathModifier> {
    use gateway::HttpPathModifier::*;
    match modifier {
        ReplaceFullPath {
            replace_full_path: path,
        }
        | ReplacePrefixMatch {
            replace_prefix_match: path,
        } if !path.starts_with('/') => {
            bail!(
                "path modifiers may only contain absolute paths \
                 (starting with '/'); {path:?} is not an absolute path"
            )
        }
        ReplaceFullPath { replace_full_path } => {
            Ok(ir::PathModifier::Full(replace_full_path.clone()))
        }
        ReplacePrefixMatch {
            replace_prefix_match,
        } => Ok(ir::PathModifier::Prefix(replace_prefix_match.clone())),
    }
}

fn unstructured_ref(reference: &gateway::LocalObjectReference) -> ir::UnstructuredRef {
    ir::UnstructuredRef {
        group: reference.group.clone(),
        kind: reference.kind.clone(),
        name: reference.name.clone(),
    }
}

/// Destination-level filters keep only the header mutations; terminal
/// effects make no sense per backend.
pub(crate) fn destination_filters(filters: &BackendFilters<'_>) -> Option<ir::DestinationFilters> {
    let mut dest = ir::DestinationFilters::default();
    match filters {
        BackendFilters::Http(filters) => {
            if filters.is_empty() {
                return None;
            }
            for filter in *filters {
                match filter {
                    gateway::HttpRouteFilter::RequestHeaderModifier {
                        request_header_modifier,
                    } => apply_header_modifier(
                        request_header_modifier,
                        &mut dest.add_request_headers,
                        &mut dest.remove_request_headers,
                    ),
                    gateway::HttpRouteFilter::ResponseHeaderModifier {
                        response_header_modifier,
                    } => apply_header_modifier(
                        response_header_modifier,
                        &mut dest.add_response_headers,
                        &mut dest.remove_response_headers,
                    ),
                    _ => {}
                }
            }
        }
        BackendFilters::Grpc(filters) => {
            if filters.is_empty() {
                return None;
            }
            for filter in *filters {
                match filter {
                    gateway::GrpcRouteFilter::RequestHeaderModifier {
                        request_header_modifier,
                    } => apply_header_modifier(
                        request_header_modifier,
                        &mut dest.add_request_headers,
                        &mut dest.remove_request_headers,
                    ),
                    gateway::GrpcRouteFilter::ResponseHeaderModifier {
                        response_header_modifier,
                    } => apply_header_modifier(
                        response_header_modifier,
                        &mut dest.add_response_headers,
                        &mut dest.remove_response_headers,
                    ),
                    _ => {}
                }
            }
        }
        BackendFilters::None => return None,
    }
    Some(dest)
}
