use crate::domain::client_entry::ClientEntry;
use crate::domain::value_objects::{CredentialFamily, Field, Locator};

/// Separator between locator components. Never appears unescaped inside one.
const LOCATOR_DELIMITER: char = '|';

/// Trimmed, lower-cased email, or an empty string when absent.
pub fn normalized_email(entry: &ClientEntry) -> String {
    entry
        .email
        .as_deref()
        .map(|e| e.trim().to_lowercase())
        .unwrap_or_default()
}

/// Trimmed, lower-cased protocol tag.
pub fn normalized_protocol(entry: &ClientEntry) -> String {
    entry.protocol.trim().to_lowercase()
}

/// Protocol-aware credential identifier.
///
/// Uuid-style protocols prefer `id`, then `password`, then `email`;
/// password-style protocols prefer `password`, then `id`, then `email`.
/// Unknown protocols use the uuid order. The result is trimmed; an empty
/// string means the entry has no usable identifier.
pub fn identifier(entry: &ClientEntry) -> String {
    CredentialFamily::of(&entry.protocol)
        .identifier_order()
        .iter()
        .map(|field| raw_text(entry, *field))
        .find(|v| !v.is_empty())
        .unwrap_or_default()
        .to_string()
}

fn raw_text(entry: &ClientEntry, field: Field) -> &str {
    match field {
        Field::Id => entry.id.trim(),
        Field::Password => entry.password.trim(),
        Field::Email => entry.email.as_deref().unwrap_or_default().trim(),
        _ => "",
    }
}

/// Globally unique locator for one copy:
/// `serverId|inboundId|protocol|identifier|email`.
///
/// Every component is percent-escaped (`%` → `%25`, `|` → `%7C`) so the
/// delimiter can never be forged by field content.
pub fn locate(entry: &ClientEntry) -> Locator {
    let parts = [
        escape(&entry.server_id),
        escape(&entry.inbound_id.to_string()),
        escape(&normalized_protocol(entry)),
        escape(&identifier(entry)),
        escape(&normalized_email(entry)),
    ];
    Locator(parts.join(LOCATOR_DELIMITER.to_string().as_str()))
}

fn escape(component: &str) -> String {
    let mut out = String::with_capacity(component.len());
    for c in component.chars() {
        match c {
            '%' => out.push_str("%25"),
            LOCATOR_DELIMITER => out.push_str("%7C"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(protocol: &str, id: &str, password: &str, email: Option<&str>) -> ClientEntry {
        ClientEntry {
            server_id: "srv".into(),
            inbound_id: 1,
            protocol: protocol.into(),
            id: id.into(),
            password: password.into(),
            email: email.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn uuid_protocols_prefer_id() {
        assert_eq!(identifier(&entry("vless", "uuid-1", "pw", None)), "uuid-1");
        assert_eq!(identifier(&entry("vmess", "", "pw", None)), "pw");
    }

    #[test]
    fn password_protocols_prefer_password() {
        assert_eq!(identifier(&entry("trojan", "uuid-1", "pw", None)), "pw");
        assert_eq!(identifier(&entry("shadowsocks", "uuid-1", " ", None)), "uuid-1");
    }

    #[test]
    fn falls_back_to_email_then_empty() {
        assert_eq!(
            identifier(&entry("trojan", "", "", Some(" u@x.io "))),
            "u@x.io"
        );
        assert_eq!(identifier(&entry("trojan", "", "", None)), "");
    }

    #[test]
    fn unknown_protocol_uses_uuid_order() {
        assert_eq!(identifier(&entry("socks", "id-a", "pw-b", None)), "id-a");
    }

    #[test]
    fn locator_normalizes_protocol_and_email() {
        let a = entry("VLESS", "u1", "", Some("User@Example.com "));
        let b = entry("vless", "u1", "", Some("user@example.com"));
        assert_eq!(locate(&a), locate(&b));
        assert_eq!(locate(&a).as_str(), "srv|1|vless|u1|user@example.com");
    }

    #[test]
    fn locator_escapes_delimiter() {
        let tricky = entry("vless", "a|b", "", Some("c"));
        let split = entry("vless", "a", "", Some("b|c"));
        assert_ne!(locate(&tricky), locate(&split));
        assert_eq!(locate(&tricky).as_str(), "srv|1|vless|a%7Cb|c");
        assert_eq!(locate(&tricky).as_str().matches('|').count(), 4);
    }

    #[test]
    fn locator_distinguishes_servers() {
        let a = entry("vless", "u1", "", None);
        let mut b = a.clone();
        b.server_id = "other".into();
        assert_ne!(locate(&a), locate(&b));
    }
}
