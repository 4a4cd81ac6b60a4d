use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::fmt::SubscriberBuilder;

use rotunfold::exact::verify_stream;
use rotunfold::noniso::dedup_stream;
use rotunfold::poly::root_pairs_from_reader;
use rotunfold::unfold::{enumerate_stream, SymmetricMode};
use rotunfold::Polyhedron;

mod provenance;

#[derive(Parser)]
#[command(name = "rotunfold")]
#[command(about = "Search pipeline for overlapping partial edge unfoldings")]
struct Cmd {
    /// Root of the output tree; each stage writes under <out-root>/<class>/<name>/
    #[arg(long, default_value = "output")]
    out_root: PathBuf,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Enumerate candidate partial unfoldings (raw.jsonl + run.json)
    Enumerate {
        /// Path to polyhedron.json
        #[arg(long)]
        polyhedron: PathBuf,
        /// Path to root_pairs.json
        #[arg(long)]
        roots: PathBuf,
        /// Symmetry pruning: on, off, or auto (derived from the polyhedron name)
        #[arg(long, value_enum, default_value = "auto")]
        symmetric: SymmetricArg,
    },
    /// Remove isomorphic duplicates (raw.jsonl -> noniso.jsonl)
    Noniso {
        #[arg(long)]
        polyhedron: PathBuf,
    },
    /// Exact overlap verification (noniso.jsonl -> exact.jsonl)
    Exact {
        #[arg(long)]
        polyhedron: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SymmetricArg {
    Auto,
    On,
    Off,
}

impl From<SymmetricArg> for SymmetricMode {
    fn from(arg: SymmetricArg) -> Self {
        match arg {
            SymmetricArg::Auto => SymmetricMode::Auto,
            SymmetricArg::On => SymmetricMode::On,
            SymmetricArg::Off => SymmetricMode::Off,
        }
    }
}

fn main() -> Result<()> {
    SubscriberBuilder::default().with_target(false).init();
    let cmd = Cmd::parse();
    match cmd.action {
        Action::Enumerate {
            polyhedron,
            roots,
            symmetric,
        } => enumerate(&cmd.out_root, &polyhedron, &roots, symmetric),
        Action::Noniso { polyhedron } => noniso(&cmd.out_root, &polyhedron),
        Action::Exact { polyhedron } => exact(&cmd.out_root, &polyhedron),
    }
}

fn load_polyhedron(path: &Path) -> Result<Polyhedron> {
    let file =
        File::open(path).with_context(|| format!("opening polyhedron file {}", path.display()))?;
    Polyhedron::from_reader(BufReader::new(file))
        .with_context(|| format!("loading polyhedron from {}", path.display()))
}

/// Deterministic per-polyhedron output directory; re-runs overwrite.
fn stage_dir(out_root: &Path, poly: &Polyhedron) -> PathBuf {
    out_root.join(poly.class()).join(poly.name())
}

fn open_input(path: &Path) -> Result<BufReader<File>> {
    Ok(BufReader::new(File::open(path).with_context(|| {
        format!("opening input stream {}", path.display())
    })?))
}

fn create_output(path: &Path) -> Result<BufWriter<File>> {
    Ok(BufWriter::new(File::create(path).with_context(|| {
        format!("creating output stream {}", path.display())
    })?))
}

fn enumerate(
    out_root: &Path,
    polyhedron_path: &Path,
    roots_path: &Path,
    symmetric: SymmetricArg,
) -> Result<()> {
    let started_at = chrono::Utc::now();
    let poly = load_polyhedron(polyhedron_path)?;
    let roots_file =
        File::open(roots_path).with_context(|| format!("opening {}", roots_path.display()))?;
    let roots = root_pairs_from_reader(BufReader::new(roots_file), &poly)
        .with_context(|| format!("loading root pairs from {}", roots_path.display()))?;

    let mode = SymmetricMode::from(symmetric);
    let symmetric_used = mode.resolve(&poly);
    tracing::info!(
        polyhedron = poly.name(),
        mode = ?symmetric,
        symmetric_used,
        "resolved symmetry mode"
    );

    let dir = stage_dir(out_root, &poly);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("creating output directory {}", dir.display()))?;
    let raw_path = dir.join("raw.jsonl");
    let mut out = create_output(&raw_path)?;
    let result = enumerate_stream(&poly, &roots, symmetric_used, &mut out);
    out.flush().context("flushing raw.jsonl")?;

    let report = provenance::RunReport {
        started_at,
        finished_at: chrono::Utc::now(),
        exit_status: if result.is_ok() { 0 } else { 1 },
        polyhedron_path,
        poly: &poly,
        root_pairs_path: roots_path,
        num_root_pairs: roots.len(),
        mode_requested: match symmetric {
            SymmetricArg::Auto => "auto",
            SymmetricArg::On => "on",
            SymmetricArg::Off => "off",
        },
        symmetric_used,
        auto_basis: (symmetric == SymmetricArg::Auto).then(|| poly.name().to_string()),
        raw_path: &raw_path,
        records_written: result.as_ref().map(|s| s.records_written).unwrap_or(0),
    };
    provenance::write_run_metadata(&dir.join("run.json"), &report)?;

    let summary = result.context("enumeration failed")?;
    tracing::info!(
        records = summary.records_written,
        out = %raw_path.display(),
        "raw stream written"
    );
    Ok(())
}

fn noniso(out_root: &Path, polyhedron_path: &Path) -> Result<()> {
    let poly = load_polyhedron(polyhedron_path)?;
    let dir = stage_dir(out_root, &poly);
    let input = open_input(&dir.join("raw.jsonl"))?;
    let out_path = dir.join("noniso.jsonl");
    let mut out = create_output(&out_path)?;
    let summary = dedup_stream(&poly, input, &mut out).context("noniso filter failed")?;
    out.flush().context("flushing noniso.jsonl")?;
    tracing::info!(
        records_in = summary.records_in,
        records_out = summary.records_out,
        out = %out_path.display(),
        "noniso stream written"
    );
    Ok(())
}

fn exact(out_root: &Path, polyhedron_path: &Path) -> Result<()> {
    let poly = load_polyhedron(polyhedron_path)?;
    let dir = stage_dir(out_root, &poly);
    let input = open_input(&dir.join("noniso.jsonl"))?;
    let out_path = dir.join("exact.jsonl");
    let mut out = create_output(&out_path)?;
    let summary = verify_stream(&poly, input, &mut out).context("exact verification failed")?;
    out.flush().context("flushing exact.jsonl")?;
    tracing::info!(
        records_in = summary.records_in,
        records_out = summary.records_out,
        out = %out_path.display(),
        "exact stream written"
    );
    Ok(())
}
