use crate::application::analyzer::analyze_fields;
use crate::application::grouping::{group_by_identity, protocol_subgroups};
use crate::application::scoring::rank;
use crate::domain::client_entry::ClientEntry;
use crate::domain::conflict::{
    ConflictGroup, ConflictReport, GroupMember, ProtocolConflictGroup, ReportSummary, Severity,
    SourceCandidate,
};
use crate::domain::fingerprint::snapshot_fingerprint;
use crate::domain::identity::locate;
use crate::domain::value_objects::{CredentialFamily, IdentityType};

// ─────────────────────────────────────────────────────────────────────────────
// Report Aggregator
// ─────────────────────────────────────────────────────────────────────────────

/// Build the conflict report for one inventory snapshot.
///
/// # Algorithm
/// 1. Group entries by identity (email, else `protocol:identifier`).
/// 2. Split each identity group by protocol; keep sub-groups of 2+ copies.
/// 3. Diff every sub-group field by field; keep those with a diff.
/// 4. Rank each diverging sub-group's copies to recommend a source.
/// 5. Keep identities with at least one diverging sub-group. Severity is
///    `high` iff a sub-group has a credential mismatch.
/// 6. Sort `high` before `medium`, then by descending copy count. The sort is
///    stable, so equal groups keep first-seen order.
///
/// Pure: the same input always yields the same report, order included.
pub fn build_report(entries: &[ClientEntry]) -> ConflictReport {
    let grouping = group_by_identity(entries);

    let mut groups: Vec<ConflictGroup> = Vec::new();
    for group in &grouping.groups {
        let protocols: Vec<ProtocolConflictGroup> = protocol_subgroups(group)
            .into_iter()
            .filter_map(|(protocol, members)| {
                protocol_conflict(protocol, group.identity_type, &members)
            })
            .collect();

        if protocols.is_empty() {
            continue;
        }

        let severity = if protocols.iter().any(|p| p.has_credential_conflict) {
            Severity::High
        } else {
            Severity::Medium
        };

        groups.push(ConflictGroup {
            identity_type: group.identity_type,
            identity_value: group.identity_value.clone(),
            severity,
            entry_count: group.entries.len(),
            protocols,
        });
    }

    groups.sort_by(|a, b| {
        a.severity
            .cmp(&b.severity)
            .then_with(|| b.entry_count.cmp(&a.entry_count))
    });

    let high = groups.iter().filter(|g| g.severity == Severity::High).count();
    let summary = ReportSummary {
        total_entries: entries.len(),
        unidentifiable_entries: grouping.unidentifiable,
        total_groups: grouping.groups.len(),
        conflict_groups: groups.len(),
        high,
        medium: groups.len() - high,
    };

    ConflictReport {
        snapshot_fingerprint: snapshot_fingerprint(entries),
        summary,
        groups,
    }
}

/// Diff one protocol sub-group. `None` when its copies agree.
fn protocol_conflict(
    protocol: String,
    identity_type: IdentityType,
    members: &[&ClientEntry],
) -> Option<ProtocolConflictGroup> {
    let analysis = analyze_fields(&protocol, identity_type, members);
    if !analysis.has_conflict() {
        return None;
    }

    let ranked_sources: Vec<SourceCandidate> = rank(members)
        .into_iter()
        .enumerate()
        .map(|(rank, e)| SourceCandidate {
            rank,
            locator: locate(e),
            server_id: e.server_id.clone(),
            server_name: e.server_name.clone(),
            inbound_remark: e.inbound_remark.clone(),
            enable: e.is_enabled(),
            expiry_time: e.expiry_time,
            total_gb: e.total_gb,
            limit_ip: e.limit_ip,
        })
        .collect();
    let recommended_source = ranked_sources[0].locator.clone();

    Some(ProtocolConflictGroup {
        credential_family: CredentialFamily::of(&protocol),
        has_credential_conflict: analysis.has_credential_conflict(),
        protocol,
        entry_count: members.len(),
        members: members
            .iter()
            .map(|e| GroupMember {
                locator: locate(e),
                entry: (*e).clone(),
            })
            .collect(),
        diff_fields: analysis.diff_fields,
        field_diffs: analysis.field_diffs,
        conflict_types: analysis.conflict_types,
        ranked_sources,
        recommended_source,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conflict::ConflictType;
    use crate::domain::value_objects::Field;

    fn entry(server: &str, protocol: &str, email: Option<&str>) -> ClientEntry {
        ClientEntry {
            server_id: server.into(),
            server_name: server.to_uppercase(),
            inbound_id: 1,
            inbound_remark: format!("{server}-in"),
            protocol: protocol.into(),
            email: email.map(str::to_string),
            id: "uuid-1".into(),
            password: "pw-1".into(),
            ..Default::default()
        }
    }

    /// Three vless copies of one email: A enabled/1000, B enabled/2000,
    /// C disabled/3000.
    fn scenario() -> Vec<ClientEntry> {
        let email = Some("u@example.com");
        vec![
            ClientEntry {
                enable: Some(true),
                expiry_time: 1000.0,
                ..entry("serverA", "vless", email)
            },
            ClientEntry {
                enable: Some(true),
                expiry_time: 2000.0,
                ..entry("serverB", "vless", email)
            },
            ClientEntry {
                enable: Some(false),
                expiry_time: 3000.0,
                ..entry("serverC", "vless", email)
            },
        ]
    }

    #[test]
    fn scenario_expiry_drift_recommends_enabled_latest() {
        let entries = scenario();
        let report = build_report(&entries);

        assert_eq!(report.summary.total_groups, 1);
        assert_eq!(report.summary.conflict_groups, 1);
        assert_eq!(report.summary.medium, 1);
        assert_eq!(report.summary.high, 0);

        let group = &report.groups[0];
        assert_eq!(group.identity_type, IdentityType::Email);
        assert_eq!(group.identity_value, "u@example.com");
        assert_eq!(group.severity, Severity::Medium);
        assert_eq!(group.protocols.len(), 1);

        let vless = &group.protocols[0];
        assert_eq!(vless.protocol, "vless");
        // enable also differs between A/B and C
        assert_eq!(vless.diff_fields, vec![Field::ExpiryTime, Field::Enable]);
        assert_eq!(
            vless.conflict_types,
            vec![ConflictType::ExpiryMismatch, ConflictType::EnableMismatch]
        );
        assert_eq!(vless.recommended_source, locate(&entries[1]));
        let order: Vec<&str> = vless
            .ranked_sources
            .iter()
            .map(|c| c.server_id.as_str())
            .collect();
        assert_eq!(order, vec!["serverB", "serverA", "serverC"]);
    }

    #[test]
    fn expiry_only_drift_yields_single_conflict_type() {
        let mut entries = scenario();
        entries[2].enable = Some(true);
        let report = build_report(&entries);
        let vless = &report.groups[0].protocols[0];
        assert_eq!(vless.diff_fields, vec![Field::ExpiryTime]);
        assert_eq!(vless.conflict_types, vec![ConflictType::ExpiryMismatch]);
    }

    #[test]
    fn fractional_limit_drift_is_reported() {
        let entries = vec![
            ClientEntry {
                limit_ip: 1.2,
                ..entry("a", "vless", Some("u@x.io"))
            },
            ClientEntry {
                limit_ip: 1.7,
                ..entry("b", "vless", Some("u@x.io"))
            },
        ];
        let report = build_report(&entries);
        assert_eq!(report.summary.conflict_groups, 1);
        let vless = &report.groups[0].protocols[0];
        assert_eq!(vless.conflict_types, vec![ConflictType::LimitIpMismatch]);
        assert_eq!(vless.ranked_sources[0].server_id, "b");
        assert_eq!(vless.ranked_sources[0].limit_ip, 1.7);
    }

    #[test]
    fn agreeing_copies_are_not_reported() {
        let entries = vec![
            entry("a", "vless", Some("u@x.io")),
            entry("b", "vless", Some("U@X.IO")),
            entry("c", "trojan", Some("u@x.io")),
        ];
        let report = build_report(&entries);
        assert!(report.is_clean());
        assert_eq!(report.summary.total_groups, 1);
        assert_eq!(report.summary.conflict_groups, 0);
    }

    #[test]
    fn credential_diff_forces_high_severity() {
        let mut b = entry("b", "vless", Some("u@x.io"));
        b.id = "uuid-2".into();
        let entries = vec![entry("a", "vless", Some("u@x.io")), b];
        let report = build_report(&entries);
        assert_eq!(report.groups[0].severity, Severity::High);
        assert!(report.groups[0].protocols[0].has_credential_conflict);
        assert_eq!(report.summary.high, 1);
    }

    #[test]
    fn high_first_then_larger_groups() {
        let mut entries = Vec::new();
        // medium, 3 copies
        for (s, gb) in [("a", 1.0), ("b", 2.0), ("c", 3.0)] {
            entries.push(ClientEntry {
                total_gb: gb,
                ..entry(s, "vless", Some("big@x.io"))
            });
        }
        // medium, 2 copies
        entries.push(ClientEntry {
            flow: "xtls-rprx-vision".into(),
            ..entry("a", "vless", Some("small@x.io"))
        });
        entries.push(entry("b", "vless", Some("small@x.io")));
        // high, 2 copies
        entries.push(entry("a", "trojan", Some("cred@x.io")));
        entries.push(ClientEntry {
            password: "pw-2".into(),
            ..entry("b", "trojan", Some("cred@x.io"))
        });

        let report = build_report(&entries);
        let order: Vec<&str> = report
            .groups
            .iter()
            .map(|g| g.identity_value.as_str())
            .collect();
        assert_eq!(order, vec!["cred@x.io", "big@x.io", "small@x.io"]);
        assert_eq!(report.summary.high, 1);
        assert_eq!(report.summary.medium, 2);
    }

    #[test]
    fn identifier_groups_compare_email() {
        let a = entry("a", "vless", None);
        let mut b = entry("b", "vless", Some(""));
        b.sub_id = "s".into();
        let report = build_report(&[a, b]);
        let group = &report.groups[0];
        assert_eq!(group.identity_type, IdentityType::Identifier);
        assert_eq!(group.identity_value, "vless:uuid-1");
        assert_eq!(group.protocols[0].diff_fields, vec![Field::SubId]);
    }

    #[test]
    fn unidentifiable_entries_counted_in_summary() {
        let blank = ClientEntry {
            protocol: "vless".into(),
            ..Default::default()
        };
        let report = build_report(&[blank]);
        assert_eq!(report.summary.total_entries, 1);
        assert_eq!(report.summary.unidentifiable_entries, 1);
        assert_eq!(report.summary.total_groups, 0);
    }

    #[test]
    fn report_is_idempotent() {
        let entries = scenario();
        let first = serde_json::to_string(&build_report(&entries)).unwrap();
        let second = serde_json::to_string(&build_report(&entries)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn report_serialises_with_camel_case_keys() {
        let report = build_report(&scenario());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["summary"]["conflictGroups"], 1);
        assert_eq!(json["groups"][0]["severity"], "medium");
        assert_eq!(
            json["groups"][0]["protocols"][0]["conflictTypes"][0],
            "expiry_mismatch"
        );
        assert_eq!(
            json["groups"][0]["protocols"][0]["members"][0]["entry"]["totalGB"],
            0
        );
    }
}
