use crate::application::monitoring::PerfReport;
use crate::domain::conflict::{ConflictReport, Severity};
use crate::domain::plan::{PlanOutcome, SourceChoice};
use crate::domain::snapshot::FetchFailure;
use colored::*;
use tabled::settings::{object::Columns, Alignment, Modify, Style};
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct GroupRow {
    severity: String,
    identity: String,
    protocol: String,
    copies: String,
    conflicts: String,
    #[tabled(rename = "recommended source")]
    recommended: String,
}

#[derive(Tabled)]
struct SummaryRow {
    metric: String,
    value: String,
}

fn severity_label(severity: Severity) -> String {
    match severity {
        Severity::High => severity.as_str().bold().red().to_string(),
        Severity::Medium => severity.as_str().yellow().to_string(),
    }
}

pub fn print_report_summary(report: &ConflictReport) {
    println!();

    println!("{}", "CLIENTDIFF CONFLICT REPORT".bold().cyan());
    println!(
        "Snapshot: {}",
        report.snapshot_fingerprint.as_str().bright_yellow()
    );
    println!();

    if report.is_clean() {
        println!("{}", "✓ No conflicts — every copy agrees.".bold().green());
    } else {
        let rows: Vec<GroupRow> = report
            .groups
            .iter()
            .flat_map(|g| {
                g.protocols.iter().map(move |p| {
                    let recommended = p
                        .ranked_sources
                        .first()
                        .map(|c| format!("{} / {}", c.server_name, c.inbound_remark))
                        .unwrap_or_default();
                    GroupRow {
                        severity: severity_label(g.severity),
                        identity: g.identity_value.bold().to_string(),
                        protocol: p.protocol.clone(),
                        copies: p.entry_count.to_string(),
                        conflicts: p
                            .conflict_types
                            .iter()
                            .map(|t| t.as_str())
                            .collect::<Vec<_>>()
                            .join(", "),
                        recommended: recommended.green().to_string(),
                    }
                })
            })
            .collect();

        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(3..=3)).with(Alignment::right()))
            .to_string();
        println!("{table}");
    }

    let s = &report.summary;
    let summary_rows = vec![
        SummaryRow {
            metric: "Entries scanned".into(),
            value: s.total_entries.to_string(),
        },
        SummaryRow {
            metric: "Unidentifiable entries".into(),
            value: s.unidentifiable_entries.to_string().dimmed().to_string(),
        },
        SummaryRow {
            metric: "Identity groups".into(),
            value: s.total_groups.to_string(),
        },
        SummaryRow {
            metric: "High severity".into(),
            value: s.high.to_string().red().to_string(),
        },
        SummaryRow {
            metric: "Medium severity".into(),
            value: s.medium.to_string().yellow().to_string(),
        },
        SummaryRow {
            metric: "Conflicting groups".into(),
            value: s.conflict_groups.to_string().bold().to_string(),
        },
    ];

    let summary_table = Table::new(summary_rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..=1)).with(Alignment::right()))
        .to_string();

    println!();
    println!("{summary_table}");
    println!();
}

// ─── Fetch failures ───────────────────────────────────────────────────────────

#[derive(Tabled)]
struct FailureRow {
    backend: String,
    error: String,
}

/// Print the backends that contributed nothing to this run.
///
/// Returns `true` if there were failures (the report is partial).
pub fn print_fetch_failures(failures: &[FetchFailure]) -> bool {
    if failures.is_empty() {
        return false;
    }

    println!();
    println!("{}", "UNREACHABLE BACKENDS".bold().red());
    println!(
        "{} backend(s) were skipped; their copies are missing from this report.",
        failures.len().to_string().bold()
    );

    let rows: Vec<FailureRow> = failures
        .iter()
        .map(|f| FailureRow {
            backend: format!("{} ({})", f.server_name.bold(), f.server_id),
            error: f.message.red().to_string(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");
    println!();

    true
}

// ─── Plan ─────────────────────────────────────────────────────────────────────

#[derive(Tabled)]
struct TargetRow {
    server: String,
    inbound: String,
    identifier: String,
    locator: String,
}

/// Print a human-readable rendering of a plan outcome.
pub fn print_plan(outcome: &PlanOutcome) {
    println!();
    match outcome {
        PlanOutcome::AlreadyConverged => {
            println!("{}", "✓ Nothing to reconcile — already converged.".bold().green());
        }
        PlanOutcome::MissingCredential { source } => {
            println!(
                "{} source {} has no credential; refusing to plan.",
                "✗ Cannot reconcile:".bold().red(),
                source.as_str().yellow()
            );
        }
        PlanOutcome::Ready(plan) => {
            let choice = match plan.source_choice {
                SourceChoice::Explicit => "explicit".cyan(),
                SourceChoice::Recommended => "recommended".green(),
            };
            println!("{}", "RECONCILIATION PLAN".bold().cyan());
            println!("Source ({}): {}", choice, plan.source_locator.as_str().bold());
            println!("Based on snapshot: {}", plan.based_on.as_str().dimmed());

            let rows: Vec<TargetRow> = plan
                .targets
                .iter()
                .map(|t| TargetRow {
                    server: format!("{} ({})", t.server_name, t.server_id),
                    inbound: t.inbound_id.to_string(),
                    identifier: t.client_identifier.clone(),
                    locator: t.locator.as_str().dimmed().to_string(),
                })
                .collect();
            let table = Table::new(rows)
                .with(Style::rounded())
                .with(Modify::new(Columns::new(1..=1)).with(Alignment::right()))
                .to_string();
            println!("{table}");
            println!(
                "  {} target(s) will be overwritten with the source's values.",
                plan.targets.len().to_string().bold()
            );
        }
    }
    println!();
}

// ─── Performance summary ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct PerfRow {
    operation: String,
    backend: String,
    #[tabled(rename = "entries")]
    entries: String,
    #[tabled(rename = "time (ms)")]
    duration_ms: String,
}

/// Print a performance timing table to stdout.
pub fn print_perf_summary(report: &PerfReport) {
    if report.timings.is_empty() {
        return;
    }

    println!("{}", "PERFORMANCE".bold().cyan());

    let rows: Vec<PerfRow> = report
        .timings
        .iter()
        .map(|t| PerfRow {
            operation: t.operation.dimmed().to_string(),
            backend: if t.ok {
                t.target.bold().to_string()
            } else {
                t.target.red().to_string()
            },
            entries: t.entries.to_string(),
            duration_ms: format_duration(t.duration_ms),
        })
        .collect();

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..=3)).with(Alignment::right()))
        .to_string();

    println!("{table}");

    println!(
        "  Total: {} entr(ies) fetched  ·  {} ms elapsed",
        report.total_entries_fetched.to_string().bold(),
        format_duration(report.total_ms),
    );
    println!();
}

fn format_duration(ms: u128) -> String {
    if ms >= 1_000 {
        format!("{:.1}s", ms as f64 / 1_000.0).yellow().to_string()
    } else if ms >= 100 {
        ms.to_string().yellow().to_string()
    } else {
        ms.to_string().green().to_string()
    }
}
