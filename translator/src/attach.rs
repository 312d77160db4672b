//! Parent-attachment resolution: deciding, per parent reference, which
//! listeners may carry a route.

use crate::{
    context::{GatewayContext, ListenerKey, Route, RouteContext, RouteParentContext},
    status::{
        has_condition, set_route_condition, COND_ACCEPTED, COND_RESOLVED_REFS, REASON_ACCEPTED,
        REASON_NOT_ALLOWED_BY_LISTENERS, REASON_NO_MATCHING_PARENT, REASON_NO_READY_LISTENERS,
        REASON_RESOLVED_REFS,
    },
    Resources, Translator,
};
use gateway_translator_k8s_api::gateway;

impl Translator {
    /// Finds out if the route attaches to one of our gateways' listeners and,
    /// if so, records the listeners that allow it to attach for each parent
    /// ref. Returns whether any parent ref pointed at an owned gateway.
    pub(crate) fn process_allowed_listeners_for_parent_refs<R: Route>(
        &self,
        ctx: &mut RouteContext<R>,
        gateways: &mut [GatewayContext],
        resources: &Resources,
    ) -> bool {
        let mut relevant_route = false;
        let route_ns = ctx.route.namespace().to_string();
        let generation = ctx.route.generation();
        let parent_refs = ctx.route.parent_refs().to_vec();

        for parent_ref in parent_refs {
            // Parent ref is not to a gateway that we control: skip it.
            let Some((gateway_idx, selected)) =
                referenced_listeners(&parent_ref, &route_ns, gateways)
            else {
                continue;
            };
            relevant_route = true;

            // A fresh slot per pass; starting empty resets any prior
            // conditions.
            let status_idx = ctx.status.len();
            ctx.status.push(gateway::RouteParentStatus {
                parent_ref: parent_ref.clone(),
                controller_name: self.controller_name.clone(),
                conditions: Vec::new(),
            });
            ctx.parents.push(RouteParentContext {
                parent_ref,
                status_idx,
                gateway: gateway_idx,
                listeners: Vec::new(),
            });

            if selected.is_empty() {
                set_route_condition(
                    &mut ctx.status,
                    status_idx,
                    generation,
                    COND_ACCEPTED,
                    false,
                    REASON_NO_MATCHING_PARENT,
                    "No listeners match this parent ref",
                );
                continue;
            }

            let route_ns_labels = resources
                .get_namespace(&route_ns)
                .and_then(|ns| ns.metadata.labels.as_ref());
            let allowed: Vec<ListenerKey> = selected
                .iter()
                .copied()
                .filter(|key| {
                    let gateway = &gateways[key.gateway];
                    let listener = &gateway.listeners[key.listener];
                    listener.allows_kind(R::KIND)
                        && listener.allows_namespace(&gateway.namespace, &route_ns, route_ns_labels)
                })
                .collect();

            if allowed.is_empty() {
                set_route_condition(
                    &mut ctx.status,
                    status_idx,
                    generation,
                    COND_ACCEPTED,
                    false,
                    REASON_NOT_ALLOWED_BY_LISTENERS,
                    "No listeners included by this parent ref allowed this attachment",
                );
                continue;
            }

            for key in &allowed {
                key.get_mut(gateways).increment_attached_routes();
            }

            // Readiness is judged against the selected listeners, before the
            // kind/namespace filter.
            if !selected.iter().any(|key| key.get(gateways).ready) {
                set_route_condition(
                    &mut ctx.status,
                    status_idx,
                    generation,
                    COND_ACCEPTED,
                    false,
                    REASON_NO_READY_LISTENERS,
                    "There are no ready listeners for this parent ref",
                );
                continue;
            }

            if let Some(parent) = ctx.parents.last_mut() {
                parent.listeners = allowed;
            }

            set_route_condition(
                &mut ctx.status,
                status_idx,
                generation,
                COND_ACCEPTED,
                true,
                REASON_ACCEPTED,
                "Route is accepted",
            );
        }

        relevant_route
    }

    /// If no negative condition has been set for `ResolvedRefs`, sets
    /// `ResolvedRefs=True`. Every parent-status slot ends a pass with a
    /// `ResolvedRefs` condition one way or the other.
    pub(crate) fn ensure_resolved_refs(
        &self,
        status: &mut [gateway::RouteParentStatus],
        status_idx: usize,
        generation: Option<i64>,
    ) {
        if !has_condition(status, status_idx, COND_RESOLVED_REFS, false) {
            set_route_condition(
                status,
                status_idx,
                generation,
                COND_RESOLVED_REFS,
                true,
                REASON_RESOLVED_REFS,
                "Resolved all the Object references for the Route",
            );
        }
    }

    /// Final defaulting rule: a slot holding nothing but a positive
    /// `ResolvedRefs` after translation is marked accepted. The attachment
    /// resolver writes an `Accepted` verdict on every slot it creates, so
    /// this only takes effect for slots populated without it.
    pub(crate) fn ensure_accepted(
        &self,
        status: &mut [gateway::RouteParentStatus],
        status_idx: usize,
        generation: Option<i64>,
    ) {
        let only_positive_resolved_refs = status[status_idx]
            .conditions
            .iter()
            .all(|c| c.type_ == COND_RESOLVED_REFS && c.status == "True");
        if only_positive_resolved_refs {
            set_route_condition(
                status,
                status_idx,
                generation,
                COND_ACCEPTED,
                true,
                REASON_ACCEPTED,
                "Route is accepted",
            );
        }
    }
}

/// Resolves a parent reference against the owned gateways. Returns the
/// gateway's index and the listeners selected by the optional section name
/// and port, or `None` when the reference points elsewhere.
fn referenced_listeners(
    parent_ref: &gateway::ParentReference,
    route_ns: &str,
    gateways: &[GatewayContext],
) -> Option<(usize, Vec<ListenerKey>)> {
    if !matches!(parent_ref.kind.as_deref(), None | Some("Gateway")) {
        return None;
    }
    if !matches!(parent_ref.group.as_deref(), None | Some(gateway::GROUP)) {
        return None;
    }

    let parent_ns = parent_ref.namespace.as_deref().unwrap_or(route_ns);
    let gateway_idx = gateways
        .iter()
        .position(|g| g.namespace == parent_ns && g.name == parent_ref.name)?;

    let selected = gateways[gateway_idx]
        .listeners
        .iter()
        .enumerate()
        .filter(|(_, listener)| {
            parent_ref
                .section_name
                .as_deref()
                .map_or(true, |section| section == listener.name)
                && parent_ref.port.map_or(true, |port| port == listener.port)
        })
        .map(|(listener, _)| ListenerKey {
            gateway: gateway_idx,
            listener,
        })
        .collect();

    Some((gateway_idx, selected))
}
