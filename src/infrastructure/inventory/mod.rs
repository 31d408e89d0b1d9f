use std::sync::Arc;

use crate::domain::ports::InventorySource;
use crate::infrastructure::config::{BackendConfig, BackendKind};

pub mod inbound_mapper;
pub mod json_file;
pub mod sqlite;

use self::{json_file::JsonFileInventorySource, sqlite::SqliteInventorySource};

/// Build the inventory source for one configured backend.
pub fn source_for(cfg: &BackendConfig) -> Arc<dyn InventorySource> {
    match cfg.kind {
        BackendKind::Sqlite => Arc::new(SqliteInventorySource::new(cfg.backend_ref(), &cfg.path)),
        BackendKind::Json => Arc::new(JsonFileInventorySource::new(cfg.backend_ref(), &cfg.path)),
    }
}
