//! CLI entrypoint for the charpin characterization harness.

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use charpin_core::PluginRegistry;
use charpin_harness::loader::{ReferenceLoader, SourceLoader};
use charpin_harness::report::ReplayReport;
use charpin_harness::service::{GenerateRequest, generate, generate_logged};
use charpin_harness::structured_log::LogEmitter;
use charpin_harness::{SnapshotSet, capture, replay};

/// Behavioral-snapshot characterization tooling.
#[derive(Debug, Parser)]
#[command(name = "charpin")]
#[command(about = "Turn data-structure code into characterization tests")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Supported CLI subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a self-contained characterization test file.
    Generate {
        /// Path to the source text under test.
        #[arg(long)]
        source: PathBuf,
        /// Target identifier (bare function or `Owner.method`).
        #[arg(long)]
        target: String,
        /// Output path for the test file (stdout when omitted).
        #[arg(long)]
        output: Option<PathBuf>,
        /// Append JSONL log records to this file.
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Capture snapshots and write them as a fixture JSON file.
    Capture {
        /// Path to the source text under test.
        #[arg(long)]
        source: PathBuf,
        /// Target identifier (bare function or `Owner.method`).
        #[arg(long)]
        target: String,
        /// Output fixture path.
        #[arg(long)]
        output: PathBuf,
    },
    /// Re-capture a target and compare against a stored snapshot set.
    Replay {
        /// Path to the source text under test.
        #[arg(long)]
        source: PathBuf,
        /// Baseline fixture path (carries the target identifier).
        #[arg(long)]
        fixture: PathBuf,
        /// Output report path (markdown; a .json sibling is written too).
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let registry = PluginRegistry::standard();
    let loader = ReferenceLoader;

    match cli.command {
        Command::Generate {
            source,
            target,
            output,
            log,
        } => {
            let request = GenerateRequest {
                source_text: fs::read_to_string(&source)?,
                target_identifier: target,
            };
            let script = match log {
                Some(log_path) => {
                    let emitter = LogEmitter::file(&log_path)?;
                    generate_logged(&loader, &registry, &request, &emitter)?
                }
                None => generate(&loader, &registry, &request)?,
            };
            match output {
                Some(path) => {
                    fs::write(&path, &script)?;
                    eprintln!("Wrote test file to {}", path.display());
                }
                None => print!("{script}"),
            }
        }
        Command::Capture {
            source,
            target,
            output,
        } => {
            let module = loader.load(&fs::read_to_string(&source)?)?;
            let context = module.context();
            let resolved = module.resolve_target(&target)?;
            let snapshots = capture(&resolved, &registry, &context)?;
            eprintln!("Captured {} snapshots for {target}", snapshots.len());

            let set = SnapshotSet::new(target, snapshots);
            fs::write(&output, set.to_json()?)?;
            eprintln!("Wrote fixture to {}", output.display());
        }
        Command::Replay {
            source,
            fixture,
            report,
        } => {
            let baseline = SnapshotSet::from_file(&fixture)?;
            let module = loader.load(&fs::read_to_string(&source)?)?;
            let context = module.context();
            let resolved = module.resolve_target(&baseline.target)?;

            let summary = replay(&resolved, &registry, &context, &baseline)?;
            eprintln!(
                "Replay complete: baseline={}, matched={}, diverged={}",
                summary.baseline_total,
                summary.matched,
                summary.divergences.len()
            );

            let diverged = !summary.all_matched();
            if let Some(report_path) = report {
                let doc = ReplayReport::new("charpin replay report", summary);
                fs::write(&report_path, doc.to_markdown())?;
                let json_path = report_path.with_extension("json");
                fs::write(&json_path, doc.to_json())?;
                eprintln!(
                    "Wrote report to {} and {}",
                    report_path.display(),
                    json_path.display()
                );
            }
            if diverged {
                return Err("replay diverged from baseline".into());
            }
        }
    }

    Ok(())
}
