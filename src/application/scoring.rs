use std::cmp::Ordering;

use crate::domain::client_entry::ClientEntry;

// ─── Source Scorer ───

/// Ranking key for canonical-source selection.
///
/// Compared lexicographically: an enabled copy outranks a disabled one no
/// matter its numbers, then the larger `expiryTime + totalGB + limitIp` sum
/// wins. The sum mixes units (ms, bytes, IP count) into one magnitude; it is
/// not a per-field cascade. Fractions count; magnitudes are ordered with
/// `f64::total_cmp`.
#[derive(Debug, Clone, Copy)]
pub struct SourceScore {
    pub enabled: bool,
    pub magnitude: f64,
}

impl Ord for SourceScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.enabled
            .cmp(&other.enabled)
            .then_with(|| self.magnitude.total_cmp(&other.magnitude))
    }
}

impl PartialOrd for SourceScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SourceScore {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SourceScore {}

pub fn score(entry: &ClientEntry) -> SourceScore {
    SourceScore {
        enabled: entry.is_enabled(),
        magnitude: entry.expiry_time + entry.total_gb + entry.limit_ip,
    }
}

/// Sort copies by descending score. The sort is stable: among equal scores
/// the earlier input wins.
pub fn rank<'a>(entries: &[&'a ClientEntry]) -> Vec<&'a ClientEntry> {
    let mut ranked = entries.to_vec();
    ranked.sort_by(|a, b| score(b).cmp(&score(a)));
    ranked
}
