use std::collections::BTreeSet;

use indexmap::IndexSet;

use crate::domain::client_entry::ClientEntry;
use crate::domain::conflict::{ConflictType, FieldDiff};
use crate::domain::value_objects::{CredentialFamily, Field, FieldValue, IdentityType};

// ─── Field Diff Analyzer ───

/// Per-field comparison of one protocol sub-group.
#[derive(Debug, Clone, Default)]
pub struct FieldAnalysis {
    /// Diverging fields, in comparison order.
    pub diff_fields: Vec<Field>,
    pub field_diffs: Vec<FieldDiff>,
    /// Sorted by priority, deduplicated.
    pub conflict_types: Vec<ConflictType>,
}

impl FieldAnalysis {
    pub fn has_conflict(&self) -> bool {
        !self.diff_fields.is_empty()
    }

    pub fn has_credential_conflict(&self) -> bool {
        self.conflict_types.contains(&ConflictType::CredentialMismatch)
    }
}

/// Fields compared for a sub-group: the family's credential field(s), the
/// common fields, and `email` unless email is what correlated the group
/// (then it is equal by construction).
pub fn comparable_fields(family: CredentialFamily, identity_type: IdentityType) -> Vec<Field> {
    let mut fields: Vec<Field> = family.credential_fields().to_vec();
    fields.extend(Field::COMMON);
    if identity_type != IdentityType::Email {
        fields.push(Field::Email);
    }
    fields
}

/// Compare `members` field by field.
///
/// A field diverges iff its normalized values form more than one distinct
/// value across the members. Absent values normalize to the same default, so
/// two absent values never diverge.
pub fn analyze_fields(
    protocol: &str,
    identity_type: IdentityType,
    members: &[&ClientEntry],
) -> FieldAnalysis {
    let family = CredentialFamily::of(protocol);
    let mut analysis = FieldAnalysis::default();
    let mut types = BTreeSet::new();

    for field in comparable_fields(family, identity_type) {
        let distinct: IndexSet<FieldValue> = members.iter().map(|e| field.value(e)).collect();
        if distinct.len() > 1 {
            analysis.diff_fields.push(field);
            analysis.field_diffs.push(FieldDiff {
                field,
                values: distinct.into_iter().collect(),
            });
            types.insert(ConflictType::for_field(field));
        }
    }

    analysis.conflict_types = types.into_iter().collect();
    analysis
}
