use indexmap::IndexMap;
use tracing::debug;

use crate::domain::client_entry::ClientEntry;
use crate::domain::identity::{identifier, locate, normalized_email, normalized_protocol};
use crate::domain::value_objects::IdentityType;

/// Copies believed to be the same logical subscriber.
///
/// Members either share one normalized email, or (when they have no email)
/// one `(protocol, identifier)` pair.
#[derive(Debug, Clone)]
pub struct IdentityGroup<'a> {
    pub identity_type: IdentityType,
    /// Normalized email, or `protocol:identifier`.
    pub identity_value: String,
    pub entries: Vec<&'a ClientEntry>,
}

/// Output of [`group_by_identity`].
#[derive(Debug, Default)]
pub struct Grouping<'a> {
    /// In first-seen order.
    pub groups: Vec<IdentityGroup<'a>>,
    /// Entries with neither email nor identifier.
    pub unidentifiable: usize,
}

/// Cluster entries by identity.
///
/// Email wins when present (`email:<email>`); otherwise the entry is keyed by
/// `identifier:<protocol>:<identifier>`. Entries with neither cannot be
/// correlated with any other copy and are dropped (counted, not grouped).
pub fn group_by_identity(entries: &[ClientEntry]) -> Grouping<'_> {
    let mut by_key: IndexMap<String, IdentityGroup<'_>> = IndexMap::new();
    let mut unidentifiable = 0;

    for entry in entries {
        let email = normalized_email(entry);
        let (key, identity_type, identity_value) = if !email.is_empty() {
            (format!("email:{email}"), IdentityType::Email, email)
        } else {
            let ident = identifier(entry);
            if ident.is_empty() {
                debug!(locator = %locate(entry), "entry has no email or identifier, skipped");
                unidentifiable += 1;
                continue;
            }
            let value = format!("{}:{}", normalized_protocol(entry), ident);
            (format!("identifier:{value}"), IdentityType::Identifier, value)
        };

        by_key
            .entry(key)
            .or_insert_with(|| IdentityGroup {
                identity_type,
                identity_value,
                entries: Vec::new(),
            })
            .entries
            .push(entry);
    }

    Grouping {
        groups: by_key.into_values().collect(),
        unidentifiable,
    }
}

/// Partition a group's members by normalized protocol, keeping only
/// sub-groups with at least two copies. Order is first-seen.
pub fn protocol_subgroups<'a>(group: &IdentityGroup<'a>) -> Vec<(String, Vec<&'a ClientEntry>)> {
    let mut by_protocol: IndexMap<String, Vec<&'a ClientEntry>> = IndexMap::new();
    for entry in &group.entries {
        by_protocol
            .entry(normalized_protocol(entry))
            .or_default()
            .push(*entry);
    }
    by_protocol
        .into_iter()
        .filter(|(_, members)| members.len() >= 2)
        .collect()
}
