//! JSON-line record stream: types, fixed-point codec, reader/writer.
//!
//! One record per `\n`-terminated line. The numeric fields `x`, `y`,
//! `angle_deg` are written with exactly six fractional digits (half away
//! from zero); `serde_json`'s `arbitrary_precision` feature keeps those
//! literals intact on re-parse so downstream stages can pass lines through
//! byte-for-byte.


use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};

use crate::error::{Result, UnfoldError};
use crate::poly::{EdgeId, FaceId, Polyhedron};
use crate::SCHEMA_VERSION;

/// Fixed tag carried by every stream record.
pub const RECORD_TYPE: &str = "partial_unfolding";

/// The `(base_face, base_edge)` seed a record originated from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasePair {
    pub base_face: u32,
    pub base_edge: u32,
}

/// One face laid out on the plane.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnfoldedFace {
    pub face_id: u32,
    pub gon: u32,
    /// Edge crossed to unfold this face from its predecessor; for the first
    /// face this echoes the base edge.
    pub edge_id: u32,
    #[serde(with = "fixed6")]
    pub x: f64,
    #[serde(with = "fixed6")]
    pub y: f64,
    /// Normalised to [-180, 180].
    #[serde(with = "fixed6")]
    pub angle_deg: f64,
}

/// Overlap classification attached by the exact verifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExactOverlap {
    pub kind: OverlapKind,
}

/// Kinds of planar contact between the two endpoint faces, weakest last.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlapKind {
    FaceFace,
    EdgeEdge,
    EdgeVertex,
    VertexVertex,
}

impl OverlapKind {
    /// Classification strength: face-face > edge-edge > point contact.
    #[inline]
    pub fn strength(self) -> u8 {
        match self {
            OverlapKind::FaceFace => 3,
            OverlapKind::EdgeEdge => 2,
            OverlapKind::EdgeVertex | OverlapKind::VertexVertex => 1,
        }
    }
}

/// One path-shaped partial unfolding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnfoldingRecord {
    pub schema_version: u32,
    pub record_type: String,
    pub base_pair: BasePair,
    pub symmetric_used: bool,
    pub faces: Vec<UnfoldedFace>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub exact_overlap: Option<ExactOverlap>,
}

impl UnfoldingRecord {
    /// First face of the path (the base face).
    pub fn first_face(&self) -> FaceId {
        FaceId(self.faces[0].face_id as usize)
    }

    /// Last face of the path.
    pub fn last_face(&self) -> FaceId {
        FaceId(self.faces[self.faces.len() - 1].face_id as usize)
    }

    /// Schema and reference checks against the polyhedron the record claims
    /// to describe. `line` is used for diagnostics only.
    pub fn validate(&self, poly: &Polyhedron, line: u64) -> Result<()> {
        let fail = |message: String| Err(UnfoldError::Record { line, message });
        if self.schema_version != SCHEMA_VERSION {
            return Err(UnfoldError::Schema {
                expected: SCHEMA_VERSION,
                found: self.schema_version,
            });
        }
        if self.record_type != RECORD_TYPE {
            return fail(format!("unexpected record_type {:?}", self.record_type));
        }
        if self.faces.is_empty() {
            return fail("record has no faces".into());
        }
        let mut seen = std::collections::HashSet::new();
        for (i, uf) in self.faces.iter().enumerate() {
            let face = FaceId(uf.face_id as usize);
            if face.0 >= poly.num_faces() {
                return fail(format!("face_id {} is not on the polyhedron", uf.face_id));
            }
            if !seen.insert(uf.face_id) {
                return fail(format!("face_id {} appears twice in the path", uf.face_id));
            }
            if poly.gon(face) != uf.gon as usize {
                return fail(format!(
                    "face {} has gon {} on the polyhedron, record says {}",
                    uf.face_id,
                    poly.gon(face),
                    uf.gon
                ));
            }
            let Some(k) = poly.edge_index(face, EdgeId(uf.edge_id)) else {
                return fail(format!(
                    "edge {} is not an edge of face {}",
                    uf.edge_id, uf.face_id
                ));
            };
            if i > 0 {
                // Consecutive faces must share the crossing edge.
                let prev = FaceId(self.faces[i - 1].face_id as usize);
                if poly.neighbor(face, k) != prev {
                    return fail(format!(
                        "edge {} does not join faces {} and {}",
                        uf.edge_id,
                        self.faces[i - 1].face_id,
                        uf.face_id
                    ));
                }
            }
        }
        if self.base_pair.base_face != self.faces[0].face_id
            || self.base_pair.base_edge != self.faces[0].edge_id
        {
            return fail("base_pair does not match the first face".into());
        }
        Ok(())
    }
}

/// Six-fractional-digit fixed-point codec for `x`/`y`/`angle_deg`.
mod fixed6 {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::geometry::round6;

    pub fn serialize<S: Serializer>(v: &f64, s: S) -> std::result::Result<S::Ok, S::Error> {
        let literal = format!("{:.6}", round6(*v));
        serde_json::Number::from_string_unchecked(literal).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<f64, D::Error> {
        f64::deserialize(d)
    }
}

/// A parsed stream line together with its verbatim text.
#[derive(Clone, Debug)]
pub struct RawRecord {
    /// 1-based line number in the input stream.
    pub line: u64,
    /// The line exactly as read, without the trailing newline.
    pub text: String,
    pub record: UnfoldingRecord,
}

/// Line-oriented record reader. Blank lines are skipped; parse failures are
/// fatal with the offending line number.
pub struct RecordReader<R> {
    input: R,
    line: u64,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(input: R) -> Self {
        RecordReader { input, line: 0 }
    }

    /// Next record, or `None` at end of stream.
    pub fn next_record(&mut self) -> Result<Option<RawRecord>> {
        loop {
            let mut buf = String::new();
            let n = self.input.read_line(&mut buf)?;
            if n == 0 {
                return Ok(None);
            }
            self.line += 1;
            let text = buf.trim_end_matches(['\n', '\r']).to_string();
            if text.trim().is_empty() {
                continue;
            }
            let record: UnfoldingRecord = serde_json::from_str(&text)
                .map_err(|e| UnfoldError::record_at(self.line, e))?;
            return Ok(Some(RawRecord {
                line: self.line,
                text,
                record,
            }));
        }
    }
}

/// Record writer counting emitted lines.
pub struct RecordWriter<W> {
    out: W,
    written: u64,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(out: W) -> Self {
        RecordWriter { out, written: 0 }
    }

    pub fn write_record(&mut self, record: &UnfoldingRecord) -> Result<()> {
        serde_json::to_writer(&mut self.out, record)?;
        self.out.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    /// Pass a line through verbatim (the deduplicator never re-encodes).
    pub fn write_line(&mut self, text: &str) -> Result<()> {
        self.out.write_all(text.as_bytes())?;
        self.out.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
