//! Deterministic condition writing for route parent statuses.
//!
//! Conditions are keyed by parent-status index and upserted by type, so a
//! slot never holds two conditions of the same type. The attachment resolver
//! creates every slot with an empty condition list, which doubles as the
//! per-pass reset.

use chrono::offset::Utc;
use gateway_translator_k8s_api::{gateway, Condition, Time};

pub const COND_ACCEPTED: &str = "Accepted";
pub const COND_RESOLVED_REFS: &str = "ResolvedRefs";

pub const REASON_ACCEPTED: &str = "Accepted";
pub const REASON_NO_MATCHING_PARENT: &str = "NoMatchingParent";
pub const REASON_NOT_ALLOWED_BY_LISTENERS: &str = "NotAllowedByListeners";
pub const REASON_NO_READY_LISTENERS: &str = "NoReadyListeners";
pub const REASON_NO_MATCHING_LISTENER_HOSTNAME: &str = "NoMatchingListenerHostname";
pub const REASON_UNSUPPORTED_VALUE: &str = "UnsupportedValue";
pub const REASON_RESOLVED_REFS: &str = "ResolvedRefs";
pub const REASON_INVALID_KIND: &str = "InvalidKind";
pub const REASON_REF_NOT_PERMITTED: &str = "RefNotPermitted";
pub const REASON_BACKEND_NOT_FOUND: &str = "BackendNotFound";
pub const REASON_INVALID_RULE: &str = "InvalidRule";

/// Writes a condition into the parent-status slot at `idx`, replacing any
/// existing condition of the same type.
pub(crate) fn set_route_condition(
    status: &mut [gateway::RouteParentStatus],
    idx: usize,
    observed_generation: Option<i64>,
    type_: &str,
    value: bool,
    reason: &str,
    message: &str,
) {
    let condition = Condition {
        last_transition_time: Time(Utc::now()),
        message: message.to_string(),
        observed_generation,
        reason: reason.to_string(),
        status: if value { "True" } else { "False" }.to_string(),
        type_: type_.to_string(),
    };

    let conditions = &mut status[idx].conditions;
    match conditions.iter_mut().find(|c| c.type_ == type_) {
        Some(existing) => *existing = condition,
        None => conditions.push(condition),
    }
}

/// Whether the slot at `idx` holds a condition of the given type and status.
pub(crate) fn has_condition(
    status: &[gateway::RouteParentStatus],
    idx: usize,
    type_: &str,
    value: bool,
) -> bool {
    let want = if value { "True" } else { "False" };
    status[idx]
        .conditions
        .iter()
        .any(|c| c.type_ == type_ && c.status == want)
}
