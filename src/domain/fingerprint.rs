use sha2::{Digest, Sha256};

use crate::domain::client_entry::ClientEntry;
use crate::domain::value_objects::Fingerprint;

/// Compute a SHA-256 fingerprint of an inventory snapshot.
///
/// Algorithm:
/// 1. Each entry is serialised to JSON (fields in declaration order).
/// 2. The strings are joined with `\n` in input order and hashed with SHA-256.
///
/// Entry order is part of the fingerprint: ranking breaks score ties by input
/// order, so the same entries in another order can recommend another source.
/// An empty snapshot produces a well-defined fingerprint (hash of empty string).
pub fn snapshot_fingerprint(entries: &[ClientEntry]) -> Fingerprint {
    let entry_strings: Vec<String> = entries
        .iter()
        .map(|e| serde_json::to_string(e).unwrap_or_default())
        .collect();

    let content = entry_strings.join("\n");
    let hash = Sha256::digest(content.as_bytes());
    Fingerprint(format!("{:x}", hash))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(server: &str, expiry: f64) -> ClientEntry {
        ClientEntry {
            server_id: server.into(),
            protocol: "vless".into(),
            id: "u1".into(),
            expiry_time: expiry,
            ..Default::default()
        }
    }

    #[test]
    fn same_entries_same_fingerprint() {
        let entries = vec![entry("a", 1.0), entry("b", 2.0)];
        assert_eq!(snapshot_fingerprint(&entries), snapshot_fingerprint(&entries));
    }

    #[test]
    fn changed_field_changes_fingerprint() {
        assert_ne!(
            snapshot_fingerprint(&[entry("a", 1.0)]),
            snapshot_fingerprint(&[entry("a", 2.0)])
        );
    }

    #[test]
    fn entry_order_changes_fingerprint() {
        // equal scores: the first copy is recommended, so order matters
        let a = entry("a", 1.0);
        let b = entry("b", 1.0);
        assert_ne!(
            snapshot_fingerprint(&[a.clone(), b.clone()]),
            snapshot_fingerprint(&[b, a]),
        );
    }

    #[test]
    fn fractional_change_changes_fingerprint() {
        assert_ne!(
            snapshot_fingerprint(&[entry("a", 1.2)]),
            snapshot_fingerprint(&[entry("a", 1.7)])
        );
    }

    #[test]
    fn empty_snapshot_is_deterministic() {
        assert_eq!(snapshot_fingerprint(&[]), snapshot_fingerprint(&[]));
        assert_eq!(snapshot_fingerprint(&[]).as_str().len(), 64);
    }
}
