use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use tracing::debug;

use crate::domain::client_entry::ClientEntry;
use crate::domain::ports::InventorySource;
use crate::domain::snapshot::BackendRef;
use crate::infrastructure::inventory::inbound_mapper::{clients_from_inbounds, InboundRecord};

/// Reads an inbound-list export saved from a panel.
///
/// Accepts the API envelope `{ "success": true, "obj": [...] }` or a bare
/// array of inbounds. An envelope with `"success": false` is an error.
pub struct JsonFileInventorySource {
    backend: BackendRef,
    path: PathBuf,
}

impl JsonFileInventorySource {
    pub fn new(backend: BackendRef, path: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            path: path.into(),
        }
    }
}

fn inbound_list(doc: Value) -> Result<Vec<InboundRecord>> {
    let list = match doc {
        Value::Array(_) => doc,
        Value::Object(mut map) => {
            if map.get("success") == Some(&Value::Bool(false)) {
                let msg = map.get("msg").and_then(Value::as_str).unwrap_or("no message");
                bail!("export reports failure: {msg}");
            }
            match map.remove("obj") {
                Some(Value::Null) | None => Value::Array(Vec::new()),
                Some(obj) => obj,
            }
        }
        _ => bail!("expected an inbound array or an {{\"obj\": [...]}} envelope"),
    };
    Ok(serde_json::from_value(list)?)
}

#[async_trait]
impl InventorySource for JsonFileInventorySource {
    fn backend(&self) -> &BackendRef {
        &self.backend
    }

    async fn fetch_clients(&self) -> Result<Vec<ClientEntry>> {
        debug!("Reading {}", self.path.display());
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read inbound export {}", self.path.display()))?;
        let doc: Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse inbound export {}", self.path.display()))?;
        let inbounds = inbound_list(doc)
            .with_context(|| format!("Unexpected inbound export {}", self.path.display()))?;
        Ok(clients_from_inbounds(&self.backend, &inbounds))
    }
}
