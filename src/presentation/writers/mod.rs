use crate::domain::{conflict::ConflictReport, plan::ReconciliationPlan, ports::ReportWriter};
use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

use self::{html::HtmlWriter, json::JsonWriter};

pub mod html;
pub mod json;

/// Every report format, in the order `-f all` writes them.
pub fn all_writers() -> Vec<Box<dyn ReportWriter>> {
    vec![Box::new(JsonWriter), Box::new(HtmlWriter)]
}

pub fn writer_for(format: &str) -> Option<Box<dyn ReportWriter>> {
    match format {
        "json" => Some(Box::new(JsonWriter)),
        "html" => Some(Box::new(HtmlWriter)),
        _ => None,
    }
}

/// Writes the report to `<dir>/<run_id>.<ext>` via the chosen writer.
pub fn write_to_file(
    writer: &dyn ReportWriter,
    report: &ConflictReport,
    dir: &Path,
    run_id: &str,
) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let content = writer.format(report)?;
    let path = dir.join(format!("{}.{}", run_id, writer.extension()));
    fs::write(&path, &content)?;
    Ok(path)
}

/// Writes a plan as pretty JSON to `<dir>/<run_id>.plan.json`.
pub fn write_plan(plan: &ReconciliationPlan, dir: &Path, run_id: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let path = dir.join(format!("{}.plan.json", run_id));
    fs::write(&path, serde_json::to_string_pretty(plan)?)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::plan::plan_for;
    use crate::application::report::build_report;
    use crate::domain::client_entry::ClientEntry;

    fn entries() -> Vec<ClientEntry> {
        ["a", "b"]
            .iter()
            .enumerate()
            .map(|(i, s)| ClientEntry {
                server_id: s.to_string(),
                protocol: "vless".into(),
                id: "u1".into(),
                email: Some("u@x.io".into()),
                expiry_time: i as f64,
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn writer_lookup_by_format() {
        assert_eq!(writer_for("json").unwrap().extension(), "json");
        assert_eq!(writer_for("html").unwrap().extension(), "html");
        assert!(writer_for("sql").is_none());
        assert_eq!(all_writers().len(), 2);
    }

    #[test]
    fn writes_report_and_plan_files() {
        let dir = tempfile::tempdir().unwrap();
        let report = build_report(&entries());

        let path = write_to_file(&JsonWriter, &report, dir.path(), "run_1").unwrap();
        assert!(path.ends_with("run_1.json"));
        assert!(fs::read_to_string(&path).unwrap().contains("u@x.io"));

        let outcome = plan_for(&report, "u@x.io", "vless", None).unwrap();
        let plan_path = write_plan(outcome.plan().unwrap(), dir.path(), "run_1").unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(plan_path).unwrap()).unwrap();
        assert_eq!(written["action"], "update");
        assert_eq!(written["targets"].as_array().unwrap().len(), 1);
    }
}
