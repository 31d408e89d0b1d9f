use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::domain::client_entry::ClientEntry;
use crate::domain::snapshot::BackendRef;

/// One inbound as stored by a panel: its clients live in the `settings`
/// JSON, which is either an embedded string (database column, API export) or
/// an already-decoded object.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundRecord {
    pub id: i64,
    #[serde(default)]
    pub remark: String,
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub settings: Value,
}

#[derive(Debug, Deserialize)]
struct InboundSettings {
    #[serde(default)]
    clients: Vec<Value>,
}

/// Decode the clients of one inbound and stamp each with its origin.
pub fn clients_from_inbound(backend: &BackendRef, inbound: &InboundRecord) -> Result<Vec<ClientEntry>> {
    let settings: InboundSettings = match &inbound.settings {
        Value::Null => return Ok(Vec::new()),
        Value::String(s) if s.trim().is_empty() => return Ok(Vec::new()),
        Value::String(s) => serde_json::from_str(s)
            .with_context(|| format!("inbound {} has malformed settings", inbound.id))?,
        other => serde_json::from_value(other.clone())
            .with_context(|| format!("inbound {} has malformed settings", inbound.id))?,
    };

    settings
        .clients
        .into_iter()
        .enumerate()
        .map(|(idx, raw)| {
            let mut entry: ClientEntry = serde_json::from_value(raw)
                .with_context(|| format!("inbound {} client #{idx} is not an object", inbound.id))?;
            entry.server_id = backend.id.clone();
            entry.server_name = backend.name.clone();
            entry.inbound_id = inbound.id;
            entry.inbound_remark = inbound.remark.clone();
            entry.protocol = inbound.protocol.clone();
            Ok(entry)
        })
        .collect()
}

/// Decode every inbound. A malformed inbound is logged and contributes no
/// entries; the rest of the backend is still used.
pub fn clients_from_inbounds(backend: &BackendRef, inbounds: &[InboundRecord]) -> Vec<ClientEntry> {
    let mut entries = Vec::new();
    for inbound in inbounds {
        match clients_from_inbound(backend, inbound) {
            Ok(clients) => entries.extend(clients),
            Err(err) => warn!(
                backend.id = %backend.id,
                inbound = inbound.id,
                error = %format!("{err:#}"),
                "inbound skipped"
            ),
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn backend() -> BackendRef {
        BackendRef {
            id: "fra-1".into(),
            name: "Frankfurt".into(),
            kind: "json".into(),
        }
    }

    fn inbound(id: i64, protocol: &str, settings: Value) -> InboundRecord {
        InboundRecord {
            id,
            remark: format!("in-{id}"),
            protocol: protocol.into(),
            settings,
        }
    }

    #[test]
    fn decodes_string_settings_and_stamps_origin() {
        let settings = json!({
            "clients": [
                { "id": "u1", "email": "a@x.io", "totalGB": 0, "expiryTime": 0, "enable": true, "flow": "" },
                { "id": "u2", "email": "b@x.io", "limitIp": 2 }
            ],
            "decryption": "none"
        })
        .to_string();
        let entries =
            clients_from_inbound(&backend(), &inbound(3, "vless", Value::String(settings))).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].server_id, "fra-1");
        assert_eq!(entries[0].server_name, "Frankfurt");
        assert_eq!(entries[0].inbound_id, 3);
        assert_eq!(entries[0].inbound_remark, "in-3");
        assert_eq!(entries[0].protocol, "vless");
        assert_eq!(entries[1].limit_ip, 2.0);
    }

    #[test]
    fn decodes_object_settings() {
        let settings = json!({ "clients": [{ "password": "pw", "email": "t@x.io" }] });
        let entries = clients_from_inbound(&backend(), &inbound(1, "trojan", settings)).unwrap();
        assert_eq!(entries[0].password, "pw");
    }

    #[test]
    fn inbound_without_clients_is_empty() {
        assert!(clients_from_inbound(&backend(), &inbound(1, "socks", Value::Null))
            .unwrap()
            .is_empty());
        assert!(clients_from_inbound(&backend(), &inbound(1, "socks", json!({ "auth": "noauth" })))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn malformed_inbound_is_skipped_not_fatal() {
        let inbounds = vec![
            inbound(1, "vless", Value::String("{not json".into())),
            inbound(2, "vless", json!({ "clients": [{ "id": "u1", "email": "a@x.io" }] })),
        ];
        let entries = clients_from_inbounds(&backend(), &inbounds);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].inbound_id, 2);
    }
}
