use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::domain::client_entry::ClientEntry;
use crate::domain::ports::InventorySource;
use crate::domain::snapshot::BackendRef;
use crate::infrastructure::inventory::inbound_mapper::{clients_from_inbounds, InboundRecord};

const INBOUNDS_QUERY: &str = "SELECT id, remark, protocol, settings FROM inbounds ORDER BY id";

/// Reads the `inbounds` table of a panel database file.
///
/// The file is opened read-only and the pool is closed after each fetch, so
/// a scan never holds a lock on a live panel database.
pub struct SqliteInventorySource {
    backend: BackendRef,
    path: PathBuf,
}

impl SqliteInventorySource {
    pub fn new(backend: BackendRef, path: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            path: path.into(),
        }
    }
}

/// Open the database at `path` read-only.
async fn connect(path: &Path) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new().filename(path).read_only(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open panel database {}", path.display()))?;

    debug!("Opened {} read-only", path.display());
    Ok(pool)
}

fn row_to_inbound(row: &SqliteRow) -> Result<InboundRecord> {
    let settings: Option<String> = row.try_get("settings")?;
    Ok(InboundRecord {
        id: row.try_get("id")?,
        remark: row.try_get::<Option<String>, _>("remark")?.unwrap_or_default(),
        protocol: row.try_get::<Option<String>, _>("protocol")?.unwrap_or_default(),
        settings: settings.map(Value::String).unwrap_or(Value::Null),
    })
}

#[async_trait]
impl InventorySource for SqliteInventorySource {
    fn backend(&self) -> &BackendRef {
        &self.backend
    }

    async fn fetch_clients(&self) -> Result<Vec<ClientEntry>> {
        let pool = connect(&self.path).await?;

        debug!("Executing: {}", INBOUNDS_QUERY);
        let rows = sqlx::query(INBOUNDS_QUERY)
            .fetch_all(&pool)
            .await
            .with_context(|| format!("Failed to read inbounds from {}", self.path.display()));
        pool.close().await;

        let inbounds = rows?
            .iter()
            .map(row_to_inbound)
            .collect::<Result<Vec<_>>>()?;
        Ok(clients_from_inbounds(&self.backend, &inbounds))
    }
}
