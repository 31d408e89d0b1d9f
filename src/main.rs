use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::Parser;
use clientdiff::presentation::cli_summary::{
    print_fetch_failures, print_perf_summary, print_plan, print_report_summary,
};
use clientdiff::presentation::writers::{all_writers, write_plan, write_to_file, writer_for};
use clientdiff::{
    analyze, init_tracing, plan_for, AppConfig, ClientEntry, ConflictReport, InventorySnapshot,
    Locator, LogLevel, Scan,
};
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(
    name = "clientdiff",
    about = "clientdiff — find client drift across a proxy fleet and plan the fix."
)]
struct Cli {
    /// Config file (default: ./clientdiff.toml, then the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Analyse a JSON array of client entries instead of fetching backends
    #[arg(long, value_name = "SNAPSHOT.json")]
    input: Option<PathBuf>,

    #[arg(short, long, default_value = "all")]
    format: String,

    /// Print the summary only; write nothing
    #[arg(long)]
    dry_run: bool,

    /// Print per-backend fetch timings
    #[arg(long)]
    perf: bool,

    /// Build a reconciliation plan for this identity (email or identifier)
    #[arg(long, value_name = "IDENTITY", requires = "protocol")]
    plan: Option<String>,

    #[arg(long, value_name = "PROTO", requires = "plan")]
    protocol: Option<String>,

    /// Locator of the copy to use as source (default: the recommended one)
    #[arg(long, value_name = "LOCATOR", requires = "plan")]
    source: Option<String>,

    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(match (cli.quiet, cli.verbose) {
        (true, _) => LogLevel::Error,
        (_, true) => LogLevel::Debug,
        _ => LogLevel::Info,
    });

    let cfg = load_config(&cli)?;

    let (scan, perf) = match &cli.input {
        Some(path) => (scan_from_file(path)?, None),
        None => {
            let (scan, perf) = clientdiff::run_with_timing(&cfg).await?;
            (scan, Some(perf))
        }
    };

    print_fetch_failures(&scan.snapshot.failures);
    print_report_summary(&scan.report);
    if cli.perf {
        print_perf_summary(&perf.unwrap_or_default());
    }

    // --- one subdirectory per run ---
    let run_id = Uuid::new_v4();
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let output_subdir = Path::new(&cfg.output.dir).join(format!("{timestamp}_{run_id}"));
    let run_name = run_id.to_string();

    if let Some(identity) = &cli.plan {
        let protocol = cli.protocol.as_deref().unwrap_or_default();
        let source = cli.source.as_deref().map(Locator::from);
        return emit_plan(
            &scan.report,
            identity,
            protocol,
            source.as_ref(),
            (!cli.dry_run).then_some((output_subdir.as_path(), run_name.as_str())),
        );
    }

    if cli.dry_run {
        return Ok(());
    }

    match cli.format.as_str() {
        "all" => {
            for writer in all_writers() {
                write_to_file(&*writer, &scan.report, &output_subdir, &run_name)?;
            }
        }
        fmt => {
            let writer =
                writer_for(fmt).ok_or_else(|| anyhow::anyhow!("Unknown format: {}", fmt))?;
            write_to_file(&*writer, &scan.report, &output_subdir, &run_name)?;
        }
    }

    println!("Report written to {}", output_subdir.display());

    Ok(())
}

/// Resolve the config. With `--input` and no explicit `--config`, a missing
/// default file is fine: only `[output]` matters then.
fn load_config(cli: &Cli) -> Result<AppConfig> {
    let path = match &cli.config {
        Some(p) => p.clone(),
        None => AppConfig::default_path(),
    };

    if cli.input.is_some() && cli.config.is_none() && !path.exists() {
        return Ok(AppConfig::default());
    }

    let cfg = AppConfig::load(&path)?;
    if cli.input.is_none() && cfg.backends.is_empty() {
        bail!(
            "no backends configured in {} (add [[backends]] or use --input)",
            path.display()
        );
    }
    Ok(cfg)
}

fn scan_from_file(path: &Path) -> Result<Scan> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    let entries: Vec<ClientEntry> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse snapshot {}", path.display()))?;

    let report = analyze(&entries);
    Ok(Scan {
        snapshot: InventorySnapshot {
            entries,
            failures: Vec::new(),
        },
        report,
    })
}

fn emit_plan(
    report: &ConflictReport,
    identity: &str,
    protocol: &str,
    source: Option<&Locator>,
    output: Option<(&Path, &str)>,
) -> Result<()> {
    let outcome = plan_for(report, identity, protocol, source)?;
    print_plan(&outcome);

    if let Some(plan) = outcome.plan() {
        println!("{}", serde_json::to_string_pretty(plan)?);
        if let Some((dir, run_name)) = output {
            let path = write_plan(plan, dir, run_name)?;
            println!("Plan written to {}", path.display());
        }
    }

    Ok(())
}
