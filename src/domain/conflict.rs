use serde::Serialize;

use crate::domain::client_entry::{serialize_number, ClientEntry};
use crate::domain::value_objects::{
    CredentialFamily, Field, FieldValue, Fingerprint, IdentityType, Locator,
};

/// Kind of disagreement between copies of one client.
///
/// Declaration order is display priority: credential first, email last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    CredentialMismatch,
    ExpiryMismatch,
    QuotaMismatch,
    EnableMismatch,
    LimitIpMismatch,
    FlowMismatch,
    SubidMismatch,
    EmailMismatch,
}

impl ConflictType {
    pub fn for_field(field: Field) -> Self {
        match field {
            Field::Id | Field::Password => ConflictType::CredentialMismatch,
            Field::ExpiryTime => ConflictType::ExpiryMismatch,
            Field::TotalGb => ConflictType::QuotaMismatch,
            Field::Enable => ConflictType::EnableMismatch,
            Field::LimitIp => ConflictType::LimitIpMismatch,
            Field::Flow => ConflictType::FlowMismatch,
            Field::SubId => ConflictType::SubidMismatch,
            Field::Email => ConflictType::EmailMismatch,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictType::CredentialMismatch => "credential_mismatch",
            ConflictType::ExpiryMismatch => "expiry_mismatch",
            ConflictType::QuotaMismatch => "quota_mismatch",
            ConflictType::EnableMismatch => "enable_mismatch",
            ConflictType::LimitIpMismatch => "limit_ip_mismatch",
            ConflictType::FlowMismatch => "flow_mismatch",
            ConflictType::SubidMismatch => "subid_mismatch",
            ConflictType::EmailMismatch => "email_mismatch",
        }
    }
}

impl std::fmt::Display for ConflictType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Group-level severity. `High` sorts before `Medium`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One copy inside a protocol sub-group, addressed by its locator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    pub locator: Locator,
    pub entry: ClientEntry,
}

/// The distinct normalized values observed for one diverging field,
/// in first-seen member order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDiff {
    pub field: Field,
    pub values: Vec<FieldValue>,
}

/// A ranked candidate for canonical source. Rank `0` is the recommendation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceCandidate {
    pub rank: usize,
    pub locator: Locator,
    pub server_id: String,
    pub server_name: String,
    pub inbound_remark: String,
    pub enable: bool,
    #[serde(serialize_with = "serialize_number")]
    pub expiry_time: f64,
    #[serde(rename = "totalGB", serialize_with = "serialize_number")]
    pub total_gb: f64,
    #[serde(serialize_with = "serialize_number")]
    pub limit_ip: f64,
}

/// Copies of one identity that share a protocol and disagree on at least one
/// comparable field.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolConflictGroup {
    pub protocol: String,
    pub credential_family: CredentialFamily,
    pub entry_count: usize,
    pub members: Vec<GroupMember>,
    /// Diverging fields, in comparison order.
    pub diff_fields: Vec<Field>,
    pub field_diffs: Vec<FieldDiff>,
    /// Sorted by [`ConflictType`] priority, no duplicates.
    pub conflict_types: Vec<ConflictType>,
    pub has_credential_conflict: bool,
    pub ranked_sources: Vec<SourceCandidate>,
    pub recommended_source: Locator,
}

impl ProtocolConflictGroup {
    pub fn has_conflict(&self) -> bool {
        !self.diff_fields.is_empty()
    }

    pub fn member(&self, locator: &Locator) -> Option<&GroupMember> {
        self.members.iter().find(|m| &m.locator == locator)
    }
}

/// One logical subscriber with at least one diverging protocol sub-group.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictGroup {
    pub identity_type: IdentityType,
    pub identity_value: String,
    pub severity: Severity,
    /// Copies across every protocol of this identity, conflicting or not.
    pub entry_count: usize,
    pub protocols: Vec<ProtocolConflictGroup>,
}

impl ConflictGroup {
    /// Look up the sub-group for `protocol` (case-insensitive).
    pub fn protocol_group(&self, protocol: &str) -> Option<&ProtocolConflictGroup> {
        let wanted = protocol.trim().to_lowercase();
        self.protocols.iter().find(|p| p.protocol == wanted)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_entries: usize,
    /// Entries with neither email nor identifier; excluded from grouping.
    pub unidentifiable_entries: usize,
    /// Identity groups scanned, conflicting or not.
    pub total_groups: usize,
    pub conflict_groups: usize,
    pub high: usize,
    pub medium: usize,
}

/// Output of a scan: every conflicting identity, high severity first, then
/// by descending copy count.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictReport {
    pub snapshot_fingerprint: Fingerprint,
    pub summary: ReportSummary,
    pub groups: Vec<ConflictGroup>,
}

impl ConflictReport {
    pub fn is_clean(&self) -> bool {
        self.groups.is_empty()
    }

    /// Look up a conflicting identity by its `identity_value`.
    /// Emails are matched case-insensitively.
    pub fn find_group(&self, identity_value: &str) -> Option<&ConflictGroup> {
        let wanted = identity_value.trim();
        self.groups.iter().find(|g| match g.identity_type {
            IdentityType::Email => g.identity_value == wanted.to_lowercase(),
            IdentityType::Identifier => g.identity_value == wanted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_types_sort_by_priority() {
        let mut types = vec![
            ConflictType::EmailMismatch,
            ConflictType::QuotaMismatch,
            ConflictType::CredentialMismatch,
            ConflictType::SubidMismatch,
            ConflictType::ExpiryMismatch,
        ];
        types.sort();
        assert_eq!(
            types,
            vec![
                ConflictType::CredentialMismatch,
                ConflictType::ExpiryMismatch,
                ConflictType::QuotaMismatch,
                ConflictType::SubidMismatch,
                ConflictType::EmailMismatch,
            ]
        );
    }

    #[test]
    fn both_credential_fields_map_to_credential_mismatch() {
        assert_eq!(
            ConflictType::for_field(Field::Id),
            ConflictType::CredentialMismatch
        );
        assert_eq!(
            ConflictType::for_field(Field::Password),
            ConflictType::CredentialMismatch
        );
    }

    #[test]
    fn high_severity_sorts_first() {
        assert!(Severity::High < Severity::Medium);
        assert_eq!(serde_json::to_string(&Severity::High).unwrap(), "\"high\"");
    }
}
