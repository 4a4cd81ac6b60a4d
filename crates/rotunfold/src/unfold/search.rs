//! Depth-first search with distance and symmetry pruning.

use std::io::Write;

use nalgebra::Vector2;

use crate::error::{Result, UnfoldError};
use crate::geometry::{circumradius, inradius, normalize_angle, snap, BUFFER};
use crate::poly::{EdgeId, FaceId, Polyhedron};
use crate::record::{BasePair, RecordWriter, UnfoldedFace, UnfoldingRecord};
use crate::{record, SCHEMA_VERSION};

/// State of the face about to be placed.
#[derive(Clone, Debug)]
struct FaceState {
    face: FaceId,
    /// Edge crossed to reach this face from its predecessor.
    edge: EdgeId,
    center: Vector2<f64>,
    /// Direction from this face's centre back toward its predecessor,
    /// degrees from the +x axis.
    angle_deg: f64,
    /// Sum of circumcircle diameters over faces not yet on the path.
    remaining: f64,
    /// Symmetry pruning: true while no face centre has left the x-axis
    /// upward; entering y < 0 first means the mirror image will be found on
    /// a positive-y branch instead.
    y_clean: bool,
}

/// Search runner for one root pair, carrying the shared scratch.
///
/// `face_usage` and the current path are restored on every backtrack, so a
/// runner can be dropped and a fresh one built for the next root.
pub struct UnfoldRunner<'a> {
    poly: &'a Polyhedron,
    base_face: FaceId,
    base_edge: EdgeId,
    symmetric: bool,
    /// true = face still free for the current path.
    face_usage: Vec<bool>,
    path: Vec<UnfoldedFace>,
    base_circumradius: f64,
}

impl<'a> UnfoldRunner<'a> {
    pub fn new(poly: &'a Polyhedron, base_face: FaceId, base_edge: EdgeId, symmetric: bool) -> Self {
        UnfoldRunner {
            poly,
            base_face,
            base_edge,
            symmetric,
            face_usage: vec![true; poly.num_faces()],
            path: Vec::with_capacity(poly.num_faces()),
            base_circumradius: circumradius(poly.gon(base_face)),
        }
    }

    /// Explore every path rooted at the base pair, emitting a record for
    /// each prefix whose last face may overlap the base face.
    pub fn run<W: Write>(&mut self, writer: &mut RecordWriter<W>) -> Result<u64> {
        let before = writer.written();
        self.face_usage.fill(true);
        self.face_usage[self.base_face.0] = false;
        self.path.clear();
        self.path.push(UnfoldedFace {
            face_id: self.base_face.0 as u32,
            gon: self.poly.gon(self.base_face) as u32,
            edge_id: self.base_edge.0,
            x: 0.0,
            y: 0.0,
            angle_deg: 0.0,
        });
        let second = self.second_face_state()?;
        self.recur(second, writer)?;
        Ok(writer.written() - before)
    }

    /// The second face is derived directly from the initial placement: base
    /// edge perpendicular to +x, so its centre sits on the x-axis at the sum
    /// of the two inradii, facing back along -x.
    fn second_face_state(&self) -> Result<FaceState> {
        let pos = self
            .poly
            .edge_index(self.base_face, self.base_edge)
            .ok_or_else(|| {
                UnfoldError::Reference(format!(
                    "base_edge {} is not an edge of face {}",
                    self.base_edge.0, self.base_face.0
                ))
            })?;
        let mut remaining = 0.0;
        for f in 0..self.poly.num_faces() {
            if f != self.base_face.0 {
                remaining += 2.0 * circumradius(self.poly.gon(FaceId(f)));
            }
        }
        let second = self.poly.neighbor(self.base_face, pos);
        let x = inradius(self.poly.gon(self.base_face)) + inradius(self.poly.gon(second));
        Ok(FaceState {
            face: second,
            edge: self.base_edge,
            center: Vector2::new(x, 0.0),
            angle_deg: -180.0,
            remaining,
            y_clean: true,
        })
    }

    fn backtrack(&mut self, face: FaceId) {
        self.path.pop();
        self.face_usage[face.0] = true;
    }

    fn emit<W: Write>(&self, writer: &mut RecordWriter<W>) -> Result<()> {
        writer.write_record(&UnfoldingRecord {
            schema_version: SCHEMA_VERSION,
            record_type: record::RECORD_TYPE.to_string(),
            base_pair: BasePair {
                base_face: self.base_face.0 as u32,
                base_edge: self.base_edge.0,
            },
            symmetric_used: self.symmetric,
            faces: self.path.clone(),
            exact_overlap: None,
        })
    }

    fn recur<W: Write>(&mut self, mut state: FaceState, writer: &mut RecordWriter<W>) -> Result<()> {
        let face = state.face;
        let gon = self.poly.gon(face);
        self.face_usage[face.0] = false;
        state.remaining -= 2.0 * circumradius(gon);
        state.angle_deg = normalize_angle(state.angle_deg);
        state.center.x = snap(state.center.x);
        state.center.y = snap(state.center.y);
        self.path.push(UnfoldedFace {
            face_id: face.0 as u32,
            gon: gon as u32,
            edge_id: state.edge.0,
            x: state.center.x,
            y: state.center.y,
            angle_deg: state.angle_deg,
        });

        let rho = state.center.norm();
        let r_c = circumradius(gon);

        // Even using every remaining face, the path cannot re-approach the
        // base face: abandon the subtree.
        if rho > state.remaining + self.base_circumradius + r_c + BUFFER {
            self.backtrack(face);
            return Ok(());
        }

        if self.symmetric {
            if state.center.y > 0.0 {
                state.y_clean = false;
            }
            if state.y_clean && state.center.y < 0.0 {
                self.backtrack(face);
                return Ok(());
            }
        }

        // Circumcircle gate: the last face may overlap the base face.
        if rho < self.base_circumradius + r_c + BUFFER {
            self.emit(writer)?;
        }

        let pos = self.poly.edge_index(face, state.edge).ok_or_else(|| {
            UnfoldError::Reference(format!(
                "edge {} is not an edge of face {}",
                state.edge.0, face.0
            ))
        })?;

        // Outgoing edges counter-clockwise from the entry edge; each step
        // turns by the face's central angle.
        let mut out_angle = state.angle_deg;
        for i in pos + 1..pos + gon {
            out_angle = normalize_angle(out_angle - 360.0 / gon as f64);
            let k = i % gon;
            let next = self.poly.neighbor(face, k);
            if !self.face_usage[next.0] {
                continue;
            }
            let dist = inradius(gon) + inradius(self.poly.gon(next));
            let rad = out_angle.to_radians();
            self.recur(
                FaceState {
                    face: next,
                    edge: self.poly.edges_of(face)[k],
                    center: state.center + Vector2::new(dist * rad.cos(), dist * rad.sin()),
                    angle_deg: out_angle - 180.0,
                    remaining: state.remaining,
                    y_clean: state.y_clean,
                },
                writer,
            )?;
        }

        self.backtrack(face);
        Ok(())
    }
}
