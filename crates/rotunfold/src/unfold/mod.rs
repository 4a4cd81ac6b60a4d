//! Rotational-unfolding enumeration (first stage).
//!
//! For each `(base_face, base_edge)` seed the search lays the base face at
//! the origin and explores every path on the face-adjacency graph, keeping
//! planar coordinates of each laid-out face. A record is emitted whenever
//! the circumcircles of the base face and the current face come close enough
//! to overlap; distance and symmetry pruning keep the tree small.

mod search;

use std::io::Write;

use crate::error::Result;
use crate::poly::{EdgeId, FaceId, Polyhedron, RootPair};
use crate::record::RecordWriter;

pub use search::UnfoldRunner;

/// How the symmetry pruning flag is chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymmetricMode {
    On,
    Off,
    /// Derive from the polyhedron name (see [`symmetric_by_name`]).
    Auto,
}

/// Naming convention for `auto`: prefixes `a`, `p`, `r` are the antiprism,
/// prism and platonic-family series, all mirror-symmetric; `sNN` is
/// symmetric for NN in 01..=11.
pub fn symmetric_by_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some('a') | Some('p') | Some('r') => true,
        Some('s') => name
            .get(1..3)
            .and_then(|digits| digits.parse::<u32>().ok())
            .is_some_and(|n| (1..=11).contains(&n)),
        _ => false,
    }
}

impl SymmetricMode {
    /// Resolve to the flag actually used for a given polyhedron.
    pub fn resolve(self, poly: &Polyhedron) -> bool {
        match self {
            SymmetricMode::On => true,
            SymmetricMode::Off => false,
            SymmetricMode::Auto => symmetric_by_name(poly.name()),
        }
    }
}

/// Result of one enumeration run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnumerateSummary {
    pub roots_processed: usize,
    pub records_written: u64,
}

/// Run the search for every root pair, in input order, writing the raw
/// record stream. Roots are validated by the loader before this is called;
/// structural problems discovered mid-search are fatal.
pub fn enumerate_stream<W: Write>(
    poly: &Polyhedron,
    roots: &[RootPair],
    symmetric: bool,
    output: W,
) -> Result<EnumerateSummary> {
    let mut writer = RecordWriter::new(output);
    let total = roots.len();
    for (i, root) in roots.iter().enumerate() {
        if i == 0 || i + 1 == total || (i + 1) % 10 == 0 {
            tracing::info!(root = i + 1, total, "processing root pairs");
        }
        let mut runner = UnfoldRunner::new(
            poly,
            FaceId(root.base_face as usize),
            EdgeId(root.base_edge),
            symmetric,
        );
        runner.run(&mut writer)?;
    }
    let summary = EnumerateSummary {
        roots_processed: total,
        records_written: writer.written(),
    };
    tracing::info!(
        roots = summary.roots_processed,
        records = summary.records_written,
        "enumeration done"
    );
    Ok(summary)
}
