use anyhow::Result;
use sailfish::TemplateOnce;

use crate::domain::{conflict::ConflictReport, ports::ReportWriter};

#[derive(TemplateOnce)]
#[template(path = "html/report.stpl")] // base dir declared inside sailfish.toml
struct ReportTemplate<'a> {
    report: &'a ConflictReport,
}

pub struct HtmlWriter;

impl ReportWriter for HtmlWriter {
    fn format(&self, report: &ConflictReport) -> Result<String> {
        Ok(ReportTemplate { report }.render_once()?)
    }

    fn extension(&self) -> &'static str {
        "html"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::report::build_report;
    use crate::domain::client_entry::ClientEntry;

    #[test]
    fn html_lists_conflicting_identities_escaped() {
        let entries: Vec<ClientEntry> = [("a", 1.0), ("b", 2.0)]
            .iter()
            .map(|(s, gb)| ClientEntry {
                server_id: s.to_string(),
                protocol: "vless".into(),
                id: "u1".into(),
                email: Some("<b>@x.io".into()),
                total_gb: *gb,
                ..Default::default()
            })
            .collect();
        let html = HtmlWriter.format(&build_report(&entries)).unwrap();
        assert!(html.contains("&lt;b&gt;@x.io"));
        assert!(!html.contains("<b>@x.io"));
        assert!(html.contains("quota_mismatch"));
    }

    #[test]
    fn html_for_clean_report() {
        let html = HtmlWriter.format(&build_report(&[])).unwrap();
        assert!(html.contains("No conflicts"));
    }
}
