use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;

use rotunfold::Polyhedron;

/// Everything the enumeration run records about itself.
pub struct RunReport<'a> {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub exit_status: i32,
    pub polyhedron_path: &'a Path,
    pub poly: &'a Polyhedron,
    pub root_pairs_path: &'a Path,
    pub num_root_pairs: usize,
    /// The symmetry mode as requested on the command line.
    pub mode_requested: &'a str,
    /// The flag actually used for the run.
    pub symmetric_used: bool,
    /// For `auto`, the polyhedron name the resolution was derived from.
    pub auto_basis: Option<String>,
    pub raw_path: &'a Path,
    pub records_written: u64,
}

/// Run identifier derived from the start timestamp.
pub fn run_id(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H%M%SZ").to_string()
}

fn absolute(path: &Path) -> String {
    fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .into_owned()
}

/// Write `run.json` next to the raw stream. Consumed by downstream tooling
/// as provenance only; not required for pipeline correctness.
pub fn write_run_metadata(path: &Path, report: &RunReport) -> Result<PathBuf> {
    let argv: Vec<String> = std::env::args().collect();
    let executable = std::env::current_exe()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "unknown".to_string());
    let cwd = std::env::current_dir()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "unknown".to_string());

    let mut symmetric = json!({
        "mode_requested": report.mode_requested,
        "symmetric_used": report.symmetric_used,
    });
    if let Some(basis) = &report.auto_basis {
        symmetric["auto_basis"] = json!({ "poly_name": basis });
    }

    let doc = json!({
        "schema_version": rotunfold::SCHEMA_VERSION,
        "record_type": "run_metadata",
        "run": {
            "run_id": run_id(report.started_at),
            "started_at_utc": report.started_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            "finished_at_utc": report.finished_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            "exit_code": report.exit_status,
        },
        "command": {
            "executable_path": executable,
            "argv": argv,
            "cwd": cwd,
        },
        "inputs": {
            "polyhedron": {
                "path": absolute(report.polyhedron_path),
                "schema_version": rotunfold::SCHEMA_VERSION,
                "poly_class": report.poly.class(),
                "poly_name": report.poly.name(),
                "num_faces": report.poly.num_faces(),
            },
            "root_pairs": {
                "path": absolute(report.root_pairs_path),
                "schema_version": rotunfold::SCHEMA_VERSION,
                "num_root_pairs": report.num_root_pairs,
            },
        },
        "options": { "symmetric": symmetric },
        "outputs": {
            "raw_jsonl": {
                "path": absolute(report.raw_path),
                "schema_version": rotunfold::SCHEMA_VERSION,
                "record_type": "partial_unfolding",
                "num_records_written": report.records_written,
            },
        },
    });
    fs::write(path, serde_json::to_vec_pretty(&doc)?)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path.to_path_buf())
}
