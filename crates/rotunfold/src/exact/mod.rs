//! Exact overlap verification (third stage).
//!
//! For each record the endpoint faces are rebuilt in exact arithmetic and
//! every edge pair between them is tested; the record survives iff some
//! non-skipped pair truly intersects, and is then tagged with the strongest
//! contact kind found. Two structural skips reject legitimate contacts up
//! front: endpoint faces that are polyhedron neighbours (the trivial
//! two-face unfolding) and endpoint faces sharing a polyhedron vertex,
//! which by the convex angle-defect theorem can only touch at that vertex.
//! Interior faces are never cross-tested: a path cannot enclose its last
//! face without an edge crossing that the endpoint scan already detects.

mod cyclotomic;
mod intersect;
mod layout;
mod numeric;
#[cfg(test)]
mod tests;

use std::io::{BufRead, Write};

use crate::error::{Result, UnfoldError};
use crate::noniso::StageSummary;
use crate::poly::{Polyhedron, VertexIncidence};
use crate::record::{OverlapKind, RecordReader, RecordWriter, UnfoldedFace};

use intersect::classify_pair;
use layout::{exact_poses, face_segments, ExactCtx, ExactSegment};

/// Per-process cache of exact contexts, keyed by field order.
///
/// All records of one polyhedron use a handful of orders, so simplified
/// constants (inradius, circumradius, unit vectors, trig tables) are built
/// once and reused across the stream.
pub struct ExactEngine {
    ctxs: std::collections::HashMap<usize, ExactCtx>,
}

impl ExactEngine {
    pub fn new() -> Self {
        ExactEngine {
            ctxs: std::collections::HashMap::new(),
        }
    }

    fn ctx_for(&mut self, faces: &[UnfoldedFace]) -> &mut ExactCtx {
        let order = ExactCtx::order_for(faces.iter().map(|f| f.gon as usize));
        self.ctxs
            .entry(order)
            .or_insert_with(|| ExactCtx::new(order))
    }
}

impl Default for ExactEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Strongest contact kind between two laid-out faces, or `None` if no edge
/// pair intersects. Only face-face short-circuits the scan, so the result
/// does not depend on edge enumeration order.
fn strongest_overlap(
    ctx: &mut ExactCtx,
    base: &[ExactSegment],
    last: &[ExactSegment],
) -> Result<Option<OverlapKind>> {
    let mut best: Option<OverlapKind> = None;
    for ea in base {
        for eb in last {
            if let Some(kind) = classify_pair(ctx, ea, eb)? {
                if kind == OverlapKind::FaceFace {
                    return Ok(Some(kind));
                }
                if best.map_or(true, |b| kind.strength() > b.strength()) {
                    best = Some(kind);
                }
            }
        }
    }
    Ok(best)
}

/// Decide whether a record's endpoint faces genuinely overlap.
///
/// Returns the overlap kind to record, or `None` when the record must be
/// rejected (no overlap, or a skip rule applies).
pub fn verify_record(
    poly: &Polyhedron,
    incidence: &VertexIncidence,
    engine: &mut ExactEngine,
    faces: &[UnfoldedFace],
) -> Result<Option<OverlapKind>> {
    if faces.len() < 2 {
        return Ok(None);
    }
    let first = crate::poly::FaceId(faces[0].face_id as usize);
    let last = crate::poly::FaceId(faces[faces.len() - 1].face_id as usize);
    // Polyhedron neighbours never overlap in an unfolding.
    if poly.are_neighbors(first, last) {
        return Ok(None);
    }
    // Faces around a common vertex can only meet at that vertex.
    if incidence.shares_vertex(first, last) {
        return Ok(None);
    }
    let ctx = engine.ctx_for(faces);
    let poses = exact_poses(ctx, poly, faces)?;
    let base_segments = face_segments(ctx, &poses[0])?;
    let last_segments = face_segments(ctx, poses.last().expect("nonempty"))?;
    strongest_overlap(ctx, &base_segments, &last_segments)
}

/// Filter a noniso stream into the exact stream, augmenting kept records
/// with `exact_overlap.kind`. Order-preserving; every other field is copied
/// verbatim.
pub fn verify_stream<R: BufRead, W: Write>(
    poly: &Polyhedron,
    input: R,
    output: W,
) -> Result<StageSummary> {
    let incidence = poly.vertex_incidence();
    let mut engine = ExactEngine::new();
    let mut reader = RecordReader::new(input);
    let mut writer = RecordWriter::new(output);
    let mut records_in = 0;
    while let Some(raw) = reader.next_record()? {
        raw.record.validate(poly, raw.line)?;
        records_in += 1;
        match verify_record(poly, &incidence, &mut engine, &raw.record.faces)? {
            Some(kind) => {
                tracing::debug!(line = raw.line, ?kind, "record kept");
                let mut value: serde_json::Value = serde_json::from_str(&raw.text)
                    .map_err(|e| UnfoldError::record_at(raw.line, e))?;
                let map = value.as_object_mut().ok_or_else(|| UnfoldError::Record {
                    line: raw.line,
                    message: "record is not a JSON object".into(),
                })?;
                map.insert(
                    "exact_overlap".to_string(),
                    serde_json::json!({ "kind": kind }),
                );
                writer.write_line(&serde_json::to_string(&value)?)?;
            }
            None => tracing::debug!(line = raw.line, "record rejected"),
        }
    }
    let summary = StageSummary {
        records_in,
        records_out: writer.written(),
    };
    tracing::info!(
        records_in = summary.records_in,
        records_out = summary.records_out,
        "exact verification done"
    );
    Ok(summary)
}
