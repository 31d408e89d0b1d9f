use crate::domain::{
    client_entry::ClientEntry, conflict::ConflictReport, snapshot::BackendRef,
};
use anyhow::Result;
use async_trait::async_trait;

/// Port: client inventory of one backend (implemented by SqliteInventorySource,
/// JsonFileInventorySource, StaticInventorySource)
#[async_trait]
pub trait InventorySource: Send + Sync {
    /// Identity of the backend, stamped on every entry it returns.
    fn backend(&self) -> &BackendRef;

    async fn fetch_clients(&self) -> Result<Vec<ClientEntry>>;
}

/// Port: report formatting (implemented by JsonWriter, HtmlWriter)
pub trait ReportWriter: Send + Sync {
    /// Serializes the report to a string (JSON, HTML, etc.)
    fn format(&self, report: &ConflictReport) -> Result<String>;
    /// Extension of the produced file (e.g. "json", "html")
    fn extension(&self) -> &'static str;
}
