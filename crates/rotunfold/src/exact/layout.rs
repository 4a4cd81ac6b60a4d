//! Exact reconstruction of face positions from a record.
//!
//! The float coordinates in the record are ignored; positions are replayed
//! from the combinatorial path. All orientation angles are integer
//! multiples of π/M where M = lcm(2, gons), so every coordinate is a field
//! element of ℚ(ζ_{2M}). Per-gon constants and per-angle unit vectors are
//! cached for the lifetime of the context.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::{Result, UnfoldError};
use crate::poly::{EdgeId, FaceId, Polyhedron};
use crate::record::UnfoldedFace;

use super::cyclotomic::{rat, CycField, CycNum};
use super::numeric::SignCtx;

/// Shared exact-arithmetic context for one field order.
pub(crate) struct ExactCtx {
    pub(crate) field: CycField,
    /// Angle unit: π/m radians; the field order is 2m.
    m: i64,
    signs: SignCtx,
    /// (cos, sin) of u·π/m keyed by u mod 2m.
    units: HashMap<i64, (CycNum, CycNum)>,
    inradius: HashMap<usize, CycNum>,
    circumradius: HashMap<usize, CycNum>,
}

fn lcm(a: i64, b: i64) -> i64 {
    a / gcd(a, b) * b
}

fn gcd(a: i64, b: i64) -> i64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

impl ExactCtx {
    /// Field order for a set of gons: N = 2·lcm(2, gons), a multiple of 4.
    pub(crate) fn order_for(gons: impl Iterator<Item = usize>) -> usize {
        let m = gons.fold(2i64, |acc, g| lcm(acc, g as i64));
        (2 * m) as usize
    }

    pub(crate) fn new(order: usize) -> Self {
        ExactCtx {
            field: CycField::new(order),
            m: (order / 2) as i64,
            signs: SignCtx::new(order),
            units: HashMap::new(),
            inradius: HashMap::new(),
            circumradius: HashMap::new(),
        }
    }

    /// (cos, sin) of the angle `u`·π/m.
    pub(crate) fn unit(&mut self, u: i64) -> (CycNum, CycNum) {
        let key = u.rem_euclid(2 * self.m);
        if let Some(pair) = self.units.get(&key) {
            return pair.clone();
        }
        let z = self.field.zeta_pow(key);
        let pair = (self.field.re(z), self.field.im(z));
        self.units.insert(key, pair.clone());
        pair
    }

    /// Inradius of the unit-edge regular n-gon: cos(π/n) / (2·sin(π/n)).
    pub(crate) fn inradius(&mut self, gon: usize) -> Result<CycNum> {
        if let Some(v) = self.inradius.get(&gon) {
            return Ok(v.clone());
        }
        let (cos, sin) = self.unit(self.m / gon as i64);
        let v = self
            .field
            .div(&cos, &sin.scale(&rat(2, 1)))
            .ok_or_else(|| UnfoldError::Undecidable(format!("sin(pi/{gon}) inverted to zero")))?;
        self.inradius.insert(gon, v.clone());
        Ok(v)
    }

    /// Circumradius of the unit-edge regular n-gon: 1 / (2·sin(π/n)).
    pub(crate) fn circumradius(&mut self, gon: usize) -> Result<CycNum> {
        if let Some(v) = self.circumradius.get(&gon) {
            return Ok(v.clone());
        }
        let (_, sin) = self.unit(self.m / gon as i64);
        let v = self
            .field
            .div(&CycNum::from_int(1), &sin.scale(&rat(2, 1)))
            .ok_or_else(|| UnfoldError::Undecidable(format!("sin(pi/{gon}) inverted to zero")))?;
        self.circumradius.insert(gon, v.clone());
        Ok(v)
    }

    /// Exact sign of a real field element.
    pub(crate) fn sign(&mut self, z: &CycNum) -> Result<Ordering> {
        self.signs.sign(&self.field, z)
    }

    /// Rational evaluation at a fixed precision level (level 0 = 80 digits).
    pub(crate) fn eval80(&mut self, z: &CycNum) -> super::cyclotomic::Rat {
        self.signs.level(0).eval_rat(&self.field, z)
    }
}

/// Exact pose of one laid-out face.
pub(crate) struct Pose {
    pub(crate) face: FaceId,
    pub(crate) gon: usize,
    pub(crate) x: CycNum,
    pub(crate) y: CycNum,
    /// Orientation in units of π/m.
    pub(crate) angle_units: i64,
}

/// Replay the path placement in exact arithmetic.
///
/// Mirrors the enumerator: base face at the origin, second face along +x at
/// the sum of the inradii facing back (-π), each further face displaced
/// along `θ_prev − cnt·(2π/gon_prev)` where `cnt` counts edge positions
/// from the entry edge to the exit edge.
pub(crate) fn exact_poses(
    ctx: &mut ExactCtx,
    poly: &Polyhedron,
    faces: &[UnfoldedFace],
) -> Result<Vec<Pose>> {
    let m = ctx.m;
    let mut poses = Vec::with_capacity(faces.len());
    let f0 = &faces[0];
    poses.push(Pose {
        face: FaceId(f0.face_id as usize),
        gon: f0.gon as usize,
        x: CycNum::zero(),
        y: CycNum::zero(),
        angle_units: 0,
    });
    if faces.len() < 2 {
        return Ok(poses);
    }

    let f1 = &faces[1];
    let x1 = ctx.inradius(f0.gon as usize)?.add(&ctx.inradius(f1.gon as usize)?);
    poses.push(Pose {
        face: FaceId(f1.face_id as usize),
        gon: f1.gon as usize,
        x: x1,
        y: CycNum::zero(),
        angle_units: -m,
    });

    for idx in 2..faces.len() {
        let cur = &faces[idx];
        let prev_rec = &faces[idx - 1];
        let prev = poses.last().expect("nonempty");
        let prev_gon = prev.gon as i64;
        let cnt = exit_steps(
            poly,
            FaceId(prev_rec.face_id as usize),
            EdgeId(prev_rec.edge_id),
            EdgeId(cur.edge_id),
        )?;
        let theta = prev.angle_units - cnt * (2 * m / prev_gon);
        let dist = ctx
            .inradius(prev.gon)?
            .add(&ctx.inradius(cur.gon as usize)?);
        let (cos, sin) = ctx.unit(theta);
        let x = prev.x.add(&ctx.field.mul(&dist, &cos));
        let y = prev.y.add(&ctx.field.mul(&dist, &sin));
        poses.push(Pose {
            face: FaceId(cur.face_id as usize),
            gon: cur.gon as usize,
            x,
            y,
            angle_units: theta - m,
        });
    }
    Ok(poses)
}

/// Edge positions walked from the entry edge to the exit edge, in the
/// direction the enumerator visits children.
fn exit_steps(poly: &Polyhedron, face: FaceId, entry: EdgeId, exit: EdgeId) -> Result<i64> {
    let edges = poly.edges_of(face);
    let gon = edges.len() as i64;
    let pos = poly.edge_index(face, entry).ok_or_else(|| {
        UnfoldError::Reference(format!(
            "edge {} is not an edge of face {}",
            entry.0, face.0
        ))
    })? as i64;
    for step in 1..gon {
        if edges[((pos + step) % gon) as usize] == exit {
            return Ok(step);
        }
    }
    Err(UnfoldError::Reference(format!(
        "edges {} and {} do not both bound face {}",
        entry.0, exit.0, face.0
    )))
}

/// Exact point in the plane.
#[derive(Clone, Debug)]
pub(crate) struct ExactPoint {
    pub(crate) x: CycNum,
    pub(crate) y: CycNum,
}

/// Closed edge of a laid-out face, as a segment between two vertices.
#[derive(Clone, Debug)]
pub(crate) struct ExactSegment {
    pub(crate) a: ExactPoint,
    pub(crate) b: ExactPoint,
}

/// Vertices of the pose: vertex k sits at angle α + π/n + 2πk/n from the
/// centre at circumradius distance; edge k joins vertices k and k+1.
pub(crate) fn face_segments(ctx: &mut ExactCtx, pose: &Pose) -> Result<Vec<ExactSegment>> {
    let m = ctx.m;
    let gon = pose.gon as i64;
    let r = ctx.circumradius(pose.gon)?;
    let mut vertices = Vec::with_capacity(pose.gon);
    for k in 0..gon {
        let u = pose.angle_units + m / gon + 2 * k * m / gon;
        let (cos, sin) = ctx.unit(u);
        vertices.push(ExactPoint {
            x: pose.x.add(&ctx.field.mul(&r, &cos)),
            y: pose.y.add(&ctx.field.mul(&r, &sin)),
        });
    }
    Ok((0..pose.gon)
        .map(|k| ExactSegment {
            a: vertices[k].clone(),
            b: vertices[(k + 1) % pose.gon].clone(),
        })
        .collect())
}
