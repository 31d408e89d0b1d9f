use serde::{Deserialize, Serialize, Serializer};
use std::hash::{Hash, Hasher};

use crate::domain::client_entry::{serialize_number, ClientEntry};

/// Deterministic key addressing one physical copy of a client.
///
/// Built by `identity::locate`. Two entries with the same locator are the
/// same copy on the same server and inbound.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator(pub String);

impl Locator {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for Locator {
    fn from(s: &str) -> Self {
        Locator(s.to_string())
    }
}

/// SHA-256 hex fingerprint of an inventory snapshot.
///
/// Carried by a report and by every plan built from it, so an executor can
/// refuse to apply a plan against data that has changed since the scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(pub String);

impl Fingerprint {
    /// Returns the raw hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// How the members of an identity group were correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityType {
    Email,
    Identifier,
}

impl IdentityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityType::Email => "email",
            IdentityType::Identifier => "identifier",
        }
    }
}

/// Where a protocol keeps its client credential.
///
/// | Family     | Protocols              | Credential field(s) |
/// |------------|------------------------|---------------------|
/// | `Uuid`     | vmess, vless           | `id`                |
/// | `Password` | trojan, shadowsocks    | `password`          |
/// | `Unknown`  | anything else          | `id` and `password` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialFamily {
    Uuid,
    Password,
    Unknown,
}

const UUID_PROTOCOLS: &[&str] = &["vmess", "vless"];
const PASSWORD_PROTOCOLS: &[&str] = &["trojan", "shadowsocks"];

impl CredentialFamily {
    /// Classify a protocol tag. Matching is case-insensitive and ignores
    /// surrounding whitespace.
    pub fn of(protocol: &str) -> Self {
        let p = protocol.trim().to_ascii_lowercase();
        if UUID_PROTOCOLS.contains(&p.as_str()) {
            CredentialFamily::Uuid
        } else if PASSWORD_PROTOCOLS.contains(&p.as_str()) {
            CredentialFamily::Password
        } else {
            CredentialFamily::Unknown
        }
    }

    /// Fields compared as credentials for this family.
    pub fn credential_fields(&self) -> &'static [Field] {
        match self {
            CredentialFamily::Uuid => &[Field::Id],
            CredentialFamily::Password => &[Field::Password],
            CredentialFamily::Unknown => &[Field::Id, Field::Password],
        }
    }

    /// Preference order for identifier extraction. Unknown protocols use the
    /// uuid order.
    pub fn identifier_order(&self) -> [Field; 3] {
        match self {
            CredentialFamily::Password => [Field::Password, Field::Id, Field::Email],
            CredentialFamily::Uuid | CredentialFamily::Unknown => {
                [Field::Id, Field::Password, Field::Email]
            }
        }
    }
}

/// A comparable client field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Field {
    #[serde(rename = "id")]
    Id,
    #[serde(rename = "password")]
    Password,
    #[serde(rename = "expiryTime")]
    ExpiryTime,
    #[serde(rename = "totalGB")]
    TotalGb,
    #[serde(rename = "enable")]
    Enable,
    #[serde(rename = "limitIp")]
    LimitIp,
    #[serde(rename = "flow")]
    Flow,
    #[serde(rename = "subId")]
    SubId,
    #[serde(rename = "email")]
    Email,
}

impl Field {
    /// Fields compared for every protocol, after the credential field(s).
    pub const COMMON: [Field; 6] = [
        Field::ExpiryTime,
        Field::TotalGb,
        Field::Enable,
        Field::LimitIp,
        Field::Flow,
        Field::SubId,
    ];

    /// Wire name, as used by the panel API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Password => "password",
            Field::ExpiryTime => "expiryTime",
            Field::TotalGb => "totalGB",
            Field::Enable => "enable",
            Field::LimitIp => "limitIp",
            Field::Flow => "flow",
            Field::SubId => "subId",
            Field::Email => "email",
        }
    }

    /// Human-readable label for reports.
    pub fn label(&self) -> &'static str {
        match self {
            Field::Id => "UUID",
            Field::Password => "Password",
            Field::ExpiryTime => "Expiry",
            Field::TotalGb => "Quota",
            Field::Enable => "Enabled",
            Field::LimitIp => "IP limit",
            Field::Flow => "Flow",
            Field::SubId => "Subscription ID",
            Field::Email => "Email",
        }
    }

    pub fn is_credential(&self) -> bool {
        matches!(self, Field::Id | Field::Password)
    }

    /// Normalized value of this field on `entry`.
    ///
    /// Numbers were already coerced at decode time (non-finite → 0, fractions
    /// kept), `enable`
    /// absent means enabled, everything else compares as a trimmed string.
    pub fn value(&self, entry: &ClientEntry) -> FieldValue {
        match self {
            Field::Id => FieldValue::text(&entry.id),
            Field::Password => FieldValue::text(&entry.password),
            Field::ExpiryTime => FieldValue::Number(entry.expiry_time),
            Field::TotalGb => FieldValue::Number(entry.total_gb),
            Field::Enable => FieldValue::Bool(entry.is_enabled()),
            Field::LimitIp => FieldValue::Number(entry.limit_ip),
            Field::Flow => FieldValue::text(&entry.flow),
            Field::SubId => FieldValue::text(&entry.sub_id),
            Field::Email => FieldValue::text(entry.email.as_deref().unwrap_or_default()),
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized field value. Two values are equal iff they are the same variant
/// holding the same payload, so `0`, `false` and `""` never collide.
///
/// Numbers compare by bit pattern after folding `-0.0` into `0.0`; decoding
/// never yields NaN.
#[derive(Debug, Clone)]
pub enum FieldValue {
    Number(f64),
    Bool(bool),
    Text(String),
}

impl FieldValue {
    pub fn text(s: &str) -> Self {
        FieldValue::Text(s.trim().to_string())
    }
}

fn number_bits(n: f64) -> u64 {
    if n == 0.0 {
        0
    } else {
        n.to_bits()
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldValue::Number(a), FieldValue::Number(b)) => number_bits(*a) == number_bits(*b),
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a == b,
            (FieldValue::Text(a), FieldValue::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for FieldValue {}

impl Hash for FieldValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            FieldValue::Number(n) => number_bits(*n).hash(state),
            FieldValue::Bool(b) => b.hash(state),
            FieldValue::Text(s) => s.hash(state),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Number(n) => serialize_number(n, s),
            FieldValue::Bool(b) => s.serialize_bool(*b),
            FieldValue::Text(t) => s.serialize_str(t),
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Number(n) => n.fmt(f),
            FieldValue::Bool(b) => b.fmt(f),
            FieldValue::Text(s) if s.is_empty() => f.write_str("∅"),
            FieldValue::Text(s) => s.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_protocols() {
        assert_eq!(CredentialFamily::of("vless"), CredentialFamily::Uuid);
        assert_eq!(CredentialFamily::of(" VMess "), CredentialFamily::Uuid);
        assert_eq!(CredentialFamily::of("trojan"), CredentialFamily::Password);
        assert_eq!(CredentialFamily::of("shadowsocks"), CredentialFamily::Password);
        assert_eq!(CredentialFamily::of("wireguard"), CredentialFamily::Unknown);
    }

    #[test]
    fn unknown_family_compares_both_credentials() {
        assert_eq!(
            CredentialFamily::Unknown.credential_fields(),
            &[Field::Id, Field::Password]
        );
        assert_eq!(
            CredentialFamily::Unknown.identifier_order(),
            CredentialFamily::Uuid.identifier_order()
        );
    }

    #[test]
    fn field_value_equality_is_structural() {
        assert_eq!(FieldValue::text("  abc "), FieldValue::text("abc"));
        assert_ne!(FieldValue::Number(0.0), FieldValue::Bool(false));
        assert_ne!(FieldValue::Number(0.0), FieldValue::text("0"));
        assert_eq!(FieldValue::Number(-0.0), FieldValue::Number(0.0));
    }

    #[test]
    fn fractional_numbers_stay_distinct() {
        use std::collections::HashSet;

        assert_ne!(FieldValue::Number(1.2), FieldValue::Number(1.7));
        let distinct: HashSet<FieldValue> = [1.2, 1.7, 1.2]
            .into_iter()
            .map(FieldValue::Number)
            .collect();
        assert_eq!(distinct.len(), 2);

        assert_eq!(serde_json::to_value(FieldValue::Number(1.2)).unwrap(), serde_json::json!(1.2));
        assert_eq!(serde_json::to_value(FieldValue::Number(2000.0)).unwrap(), serde_json::json!(2000));
        assert_eq!(FieldValue::Number(2000.0).to_string(), "2000");
    }

    #[test]
    fn field_serialises_with_wire_name() {
        assert_eq!(serde_json::to_string(&Field::TotalGb).unwrap(), "\"totalGB\"");
        assert_eq!(Field::TotalGb.to_string(), "totalGB");
    }
}
