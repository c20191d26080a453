//! The request layer.
//!
//! One generation request carries exactly the source text and a target
//! identifier; the response is the rendered test-file text. Every core
//! failure surfaces as a structured error with enough identity (type
//! name, parameter position, identifier) to diagnose without re-running.
//! Nothing persists beyond the request.

use thiserror::Error;

use charpin_core::PluginRegistry;

use crate::capture::{CaptureError, capture};
use crate::loader::{LoadFault, SourceLoader, next_unit_id};
use crate::module::TargetResolutionFault;
use crate::render::{RenderError, render};
use crate::structured_log::{LogEmitter, LogEntry, LogLevel, Outcome, sha256_hex};

/// A generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub source_text: String,
    /// Bare callable name or `Owner.method`.
    pub target_identifier: String,
}

/// Request-level failure: every fatal core error, chained with context.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("loading source: {0}")]
    Load(#[from] LoadFault),
    #[error("resolving target: {0}")]
    Target(#[from] TargetResolutionFault),
    #[error("capturing snapshots: {0}")]
    Capture(#[from] CaptureError),
    #[error("rendering test script: {0}")]
    Render(#[from] RenderError),
}

/// Run one generation request: load, build context, resolve, capture,
/// render. Returns the test-file text.
pub fn generate(
    loader: &dyn SourceLoader,
    registry: &PluginRegistry,
    request: &GenerateRequest,
) -> Result<String, GenerateError> {
    run(loader, registry, request).map(|(script, _)| script)
}

/// As [`generate`], with JSONL log records for the request lifecycle and
/// an artifact digest on success.
pub fn generate_logged(
    loader: &dyn SourceLoader,
    registry: &PluginRegistry,
    request: &GenerateRequest,
    emitter: &LogEmitter,
) -> Result<String, GenerateError> {
    let trace_id = format!("gen-{}", next_unit_id());

    let mut start = LogEntry::new(&trace_id, LogLevel::Info, "generate_start");
    start.target = Some(request.target_identifier.clone());
    let _ = emitter.emit(&start);

    match run(loader, registry, request) {
        Ok((script, snapshot_count)) => {
            let mut done = LogEntry::new(&trace_id, LogLevel::Info, "generate_complete");
            done.target = Some(request.target_identifier.clone());
            done.outcome = Some(Outcome::Pass);
            done.snapshot_count = Some(snapshot_count);
            done.artifact_sha256 = Some(sha256_hex(script.as_bytes()));
            let _ = emitter.emit(&done);
            Ok(script)
        }
        Err(err) => {
            let mut failed = LogEntry::new(&trace_id, LogLevel::Error, "generate_failed");
            failed.target = Some(request.target_identifier.clone());
            failed.outcome = Some(Outcome::Error);
            failed.detail = Some(err.to_string());
            let _ = emitter.emit(&failed);
            Err(err)
        }
    }
}

fn run(
    loader: &dyn SourceLoader,
    registry: &PluginRegistry,
    request: &GenerateRequest,
) -> Result<(String, usize), GenerateError> {
    let module = loader.load(&request.source_text)?;
    let context = module.context();
    let target = module.resolve_target(&request.target_identifier)?;
    let snapshots = capture(&target, registry, &context)?;
    let script = render(&request.target_identifier, &module.source, &snapshots)?;
    Ok((script, snapshots.len()))
}
