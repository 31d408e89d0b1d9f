use anyhow::Result;

use crate::domain::{conflict::ConflictReport, ports::ReportWriter};

pub struct JsonWriter;

impl ReportWriter for JsonWriter {
    fn format(&self, report: &ConflictReport) -> Result<String> {
        Ok(serde_json::to_string_pretty(report)?)
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::report::build_report;
    use crate::domain::client_entry::ClientEntry;
    use serde_json::Value;

    fn entry(server: &str, password: &str) -> ClientEntry {
        ClientEntry {
            server_id: server.into(),
            inbound_id: 2,
            protocol: "trojan".into(),
            password: password.into(),
            email: Some("t@x.io".into()),
            ..Default::default()
        }
    }

    #[test]
    fn json_output_carries_summary_and_groups() {
        let report = build_report(&[entry("a", "pw-1"), entry("b", "pw-2")]);
        let output = JsonWriter.format(&report).unwrap();
        let parsed: Value = serde_json::from_str(&output).unwrap();

        assert_eq!(parsed["summary"]["high"], 1);
        assert_eq!(parsed["snapshotFingerprint"].as_str().unwrap().len(), 64);
        let sub = &parsed["groups"][0]["protocols"][0];
        assert_eq!(sub["protocol"], "trojan");
        assert_eq!(sub["credentialFamily"], "password");
        assert_eq!(sub["diffFields"][0], "password");
        assert_eq!(sub["fieldDiffs"][0]["values"][1], "pw-2");
        assert_eq!(sub["recommendedSource"], "a|2|trojan|pw-1|t@x.io");
    }

    #[test]
    fn json_output_is_stable() {
        let entries = [entry("a", "pw-1"), entry("b", "pw-2")];
        assert_eq!(
            JsonWriter.format(&build_report(&entries)).unwrap(),
            JsonWriter.format(&build_report(&entries)).unwrap()
        );
    }
}
