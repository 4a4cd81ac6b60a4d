//! Isomorphic-path removal (second stage).
//!
//! Two partial unfoldings are isomorphic when one maps onto the other by
//! reversing the path and/or applying a combinatorial symmetry of the
//! polyhedron. Each record is reduced to the lexicographically smallest of
//! four tagged sequences (forward/mirrored × as-is/reversed); that signature
//! is the equality witness, and the filter keeps only first occurrences.
//!
//! The filter never touches record contents: kept input lines are written
//! byte-for-byte, in input order.


use std::collections::HashSet;
use std::io::{BufRead, Write};

use crate::error::{Result, UnfoldError};
use crate::poly::{EdgeId, FaceId, Polyhedron};
use crate::record::{RecordReader, RecordWriter, UnfoldedFace};

/// Input/output record counts of one filter pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageSummary {
    pub records_in: u64,
    pub records_out: u64,
}

/// Tagged path sequence: one `(gon, step)` pair per face.
///
/// `step` is how far the exit edge sits from the entry edge, counted against
/// the edge-cycle orientation; the first face is tagged 0 and the last -1,
/// since they have no entry (resp. exit) crossing.
type StepSeq = Vec<(i64, i64)>;

fn step_sequence(poly: &Polyhedron, faces: &[UnfoldedFace]) -> Result<StepSeq> {
    let k = faces.len();
    let mut seq = Vec::with_capacity(k);
    for (j, uf) in faces.iter().enumerate() {
        let gon = uf.gon as i64;
        if j == 0 {
            seq.push((gon, 0));
            continue;
        }
        if j == k - 1 {
            seq.push((gon, -1));
            continue;
        }
        let face = FaceId(uf.face_id as usize);
        let entry = EdgeId(uf.edge_id);
        let exit = EdgeId(faces[j + 1].edge_id);
        let edges = poly.edges_of(face);
        let pos = poly.edge_index(face, entry).ok_or_else(|| {
            UnfoldError::Reference(format!(
                "edge {} is not an edge of face {}",
                uf.edge_id, uf.face_id
            ))
        })? as i64;
        let mut cnt = 1;
        for step in 1..=gon {
            if edges[(pos - step).rem_euclid(gon) as usize] == exit {
                break;
            }
            cnt += 1;
        }
        if cnt > gon {
            return Err(UnfoldError::Reference(format!(
                "edge {} is not an edge of face {}",
                faces[j + 1].edge_id, uf.face_id
            )));
        }
        seq.push((gon, cnt));
    }
    Ok(seq)
}

/// Mirror image: a reflection symmetry reverses every edge cycle, so an
/// interior step `c` becomes `gon - c`.
fn mirrored(seq: &StepSeq) -> StepSeq {
    let last = seq.len() - 1;
    seq.iter()
        .enumerate()
        .map(|(i, &(gon, step))| match i {
            0 => (gon, 0),
            i if i == last => (gon, -1),
            _ => (gon, gon - step),
        })
        .collect()
}

/// Path reversal: walk the faces last-to-first; interior crossings flip
/// orientation, so steps complement as in `mirrored`.
fn reversed(seq: &StepSeq) -> StepSeq {
    let last = seq.len() - 1;
    (0..=last)
        .rev()
        .map(|i| {
            let (gon, step) = seq[i];
            match i {
                i if i == last => (gon, 0),
                0 => (gon, -1),
                _ => (gon, gon - step),
            }
        })
        .collect()
}

fn flatten(seq: StepSeq) -> Vec<i64> {
    seq.into_iter().flat_map(|(g, s)| [g, s]).collect()
}

/// Canonical signature: lexicographic minimum over the four variants.
pub fn canonical_signature(poly: &Polyhedron, faces: &[UnfoldedFace]) -> Result<Vec<i64>> {
    let fwd = step_sequence(poly, faces)?;
    let mir = mirrored(&fwd);
    let rev = reversed(&fwd);
    let rev_mir = reversed(&mir);
    Ok([fwd, mir, rev, rev_mir]
        .into_iter()
        .map(flatten)
        .min()
        .expect("four variants"))
}

/// First-occurrence filter over canonical signatures.
pub struct IsoFilter<'a> {
    poly: &'a Polyhedron,
    seen: HashSet<Vec<i64>>,
}

impl<'a> IsoFilter<'a> {
    pub fn new(poly: &'a Polyhedron) -> Self {
        IsoFilter {
            poly,
            seen: HashSet::new(),
        }
    }

    /// True when the record's signature has not been seen before.
    pub fn admit(&mut self, faces: &[UnfoldedFace]) -> Result<bool> {
        let key = canonical_signature(self.poly, faces)?;
        Ok(self.seen.insert(key))
    }
}

/// Filter a raw stream into a noniso stream. Order-preserving; kept lines
/// are copied verbatim.
pub fn dedup_stream<R: BufRead, W: Write>(
    poly: &Polyhedron,
    input: R,
    output: W,
) -> Result<StageSummary> {
    let mut reader = RecordReader::new(input);
    let mut writer = RecordWriter::new(output);
    let mut filter = IsoFilter::new(poly);
    let mut records_in = 0;
    while let Some(raw) = reader.next_record()? {
        raw.record.validate(poly, raw.line)?;
        records_in += 1;
        if filter.admit(&raw.record.faces)? {
            writer.write_line(&raw.text)?;
        }
    }
    let summary = StageSummary {
        records_in,
        records_out: writer.written(),
    };
    tracing::info!(
        records_in = summary.records_in,
        records_out = summary.records_out,
        "noniso filter done"
    );
    Ok(summary)
}
