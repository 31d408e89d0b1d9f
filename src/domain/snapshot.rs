use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::domain::client_entry::ClientEntry;
use crate::domain::ports::InventorySource;

/// Identity of one backend as configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendRef {
    pub id: String,
    pub name: String,
    /// Source kind, e.g. "sqlite" or "json". Informational only.
    pub kind: String,
}

/// A backend that contributed nothing to the snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchFailure {
    pub server_id: String,
    pub server_name: String,
    pub message: String,
}

/// Point-in-time view of every reachable backend's clients.
///
/// `entries` are in backend configuration order, then in the order each
/// backend returned them.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySnapshot {
    pub entries: Vec<ClientEntry>,
    pub failures: Vec<FetchFailure>,
}

impl InventorySnapshot {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// In-memory implementation of [`InventorySource`].
///
/// Returns a fixed list of entries. For library callers that already hold
/// the records, and for tests.
pub struct StaticInventorySource {
    backend: BackendRef,
    entries: Vec<ClientEntry>,
}

impl StaticInventorySource {
    pub fn new(backend: BackendRef, entries: Vec<ClientEntry>) -> Self {
        Self { backend, entries }
    }
}

#[async_trait]
impl InventorySource for StaticInventorySource {
    fn backend(&self) -> &BackendRef {
        &self.backend
    }

    async fn fetch_clients(&self) -> Result<Vec<ClientEntry>> {
        Ok(self.entries.clone())
    }
}
