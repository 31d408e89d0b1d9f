use tracing::debug;

use crate::domain::conflict::{ConflictReport, GroupMember, ProtocolConflictGroup};
use crate::domain::identity::{identifier, normalized_protocol};
use crate::domain::plan::{
    PlanAction, PlanClient, PlanError, PlanOutcome, PlanTarget, ReconciliationPlan, SourceChoice,
};
use crate::domain::value_objects::{CredentialFamily, FieldValue, Fingerprint, Locator};

// ─────────────────────────────────────────────────────────────────────────────
// Reconciliation Plan Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Plan a sub-group with an explicitly chosen source copy.
///
/// An unknown `source` is rejected; it never falls back to another copy.
pub fn build_plan(
    group: &ProtocolConflictGroup,
    source: &Locator,
    based_on: &Fingerprint,
) -> Result<PlanOutcome, PlanError> {
    let member = group
        .member(source)
        .ok_or_else(|| PlanError::UnknownSource(source.clone(), group.protocol.clone()))?;
    Ok(plan_from(group, member, SourceChoice::Explicit, based_on))
}

/// Plan a sub-group using its recommended (top-ranked) source.
pub fn build_recommended_plan(
    group: &ProtocolConflictGroup,
    based_on: &Fingerprint,
) -> Result<PlanOutcome, PlanError> {
    let member = group.member(&group.recommended_source).ok_or_else(|| {
        PlanError::UnknownSource(group.recommended_source.clone(), group.protocol.clone())
    })?;
    Ok(plan_from(group, member, SourceChoice::Recommended, based_on))
}

/// Look up `identity`/`protocol` in `report` and plan it, with an explicit
/// source when given, otherwise the recommended one.
pub fn plan_for(
    report: &ConflictReport,
    identity: &str,
    protocol: &str,
    source: Option<&Locator>,
) -> Result<PlanOutcome, PlanError> {
    let group = report
        .find_group(identity)
        .ok_or_else(|| PlanError::UnknownIdentity(identity.to_string()))?;
    let sub = group
        .protocol_group(protocol)
        .ok_or_else(|| PlanError::UnknownProtocol {
            identity: identity.to_string(),
            protocol: protocol.to_string(),
        })?;

    match source {
        Some(locator) => build_plan(sub, locator, &report.snapshot_fingerprint),
        None => build_recommended_plan(sub, &report.snapshot_fingerprint),
    }
}

fn plan_from(
    group: &ProtocolConflictGroup,
    source: &GroupMember,
    choice: SourceChoice,
    based_on: &Fingerprint,
) -> PlanOutcome {
    let entry = &source.entry;
    let family = CredentialFamily::of(&group.protocol);

    // Email is never a credential here, even where `identifier` falls back to it.
    let has_credential = family
        .credential_fields()
        .iter()
        .any(|field| field.value(entry) != FieldValue::text(""));
    if !has_credential {
        debug!(source = %source.locator, "source has no credential, nothing to plan");
        return PlanOutcome::MissingCredential {
            source: source.locator.clone(),
        };
    }

    let targets: Vec<PlanTarget> = group
        .members
        .iter()
        .filter(|m| m.locator != source.locator)
        .map(|m| PlanTarget {
            locator: m.locator.clone(),
            server_id: m.entry.server_id.clone(),
            server_name: m.entry.server_name.clone(),
            inbound_id: m.entry.inbound_id,
            protocol: normalized_protocol(&m.entry),
            email: m.entry.email.as_deref().unwrap_or_default().trim().to_string(),
            client_identifier: identifier(&m.entry),
        })
        .collect();

    if targets.is_empty() {
        return PlanOutcome::AlreadyConverged;
    }

    let (id, password) = match family {
        CredentialFamily::Uuid => (entry.id.trim().to_string(), String::new()),
        CredentialFamily::Password => (String::new(), entry.password.trim().to_string()),
        CredentialFamily::Unknown => (
            entry.id.trim().to_string(),
            entry.password.trim().to_string(),
        ),
    };

    PlanOutcome::Ready(ReconciliationPlan {
        action: PlanAction::Update,
        based_on: based_on.clone(),
        source_locator: source.locator.clone(),
        source_choice: choice,
        targets,
        client: PlanClient {
            id,
            password,
            email: entry.email.as_deref().unwrap_or_default().trim().to_string(),
            total_gb: entry.total_gb,
            expiry_time: entry.expiry_time,
            enable: entry.is_enabled(),
            tg_id: entry.tg_id.clone(),
            sub_id: entry.sub_id.trim().to_string(),
            limit_ip: entry.limit_ip,
            flow: entry.flow.trim().to_string(),
        },
        source_entry: entry.clone(),
    })
}
