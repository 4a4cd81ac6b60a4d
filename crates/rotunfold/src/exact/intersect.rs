//! Two-stage edge-pair intersection test.
//!
//! Stage 1 evaluates the four endpoints to 80 decimal digits and settles
//! the clear cases: disjoint bounding boxes, a proper crossing with every
//! orientation and parameter at least ε = 10⁻³⁰ away from zero, or a clear
//! miss with the same margin. Anything closer to a boundary escalates to
//! stage 2, which solves the 2×2 system in the field and classifies the
//! contact exactly. The float coordinates of the record never enter here.

use std::cmp::Ordering;

use num_bigint::BigInt;
use num_traits::{One, Signed};

use crate::error::Result;
use crate::record::OverlapKind;

use super::cyclotomic::{CycNum, Rat};
use super::layout::{ExactCtx, ExactPoint, ExactSegment};

/// Stage-1 margin: orientations or parameters closer than this to zero are
/// handed to the exact stage.
fn epsilon() -> Rat {
    let mut d = BigInt::one();
    for _ in 0..30 {
        d *= 10;
    }
    Rat::new(BigInt::one(), d)
}

#[derive(Debug, PartialEq, Eq)]
pub(super) enum Stage1 {
    /// Proper crossing with margin: face-face, no exact work needed.
    Crossing,
    /// Clearly disjoint.
    Miss,
    /// Within ε of a boundary case; decide exactly.
    Escalate,
}

/// Classify the contact between two closed segments, if any.
pub(crate) fn classify_pair(
    ctx: &mut ExactCtx,
    a: &ExactSegment,
    b: &ExactSegment,
) -> Result<Option<OverlapKind>> {
    match stage1(ctx, a, b) {
        Stage1::Crossing => Ok(Some(OverlapKind::FaceFace)),
        Stage1::Miss => Ok(None),
        Stage1::Escalate => stage2(ctx, a, b),
    }
}

pub(super) fn stage1(ctx: &mut ExactCtx, a: &ExactSegment, b: &ExactSegment) -> Stage1 {
    let eps = epsilon();
    let p1 = (ctx.eval80(&a.a.x), ctx.eval80(&a.a.y));
    let p2 = (ctx.eval80(&a.b.x), ctx.eval80(&a.b.y));
    let q1 = (ctx.eval80(&b.a.x), ctx.eval80(&b.a.y));
    let q2 = (ctx.eval80(&b.b.x), ctx.eval80(&b.b.y));

    // Axis-aligned bounding boxes with ε slack.
    let lo = |u: &Rat, v: &Rat| if u < v { u.clone() } else { v.clone() };
    let hi = |u: &Rat, v: &Rat| if u > v { u.clone() } else { v.clone() };
    if hi(&p1.0, &p2.0) < lo(&q1.0, &q2.0) - &eps
        || hi(&q1.0, &q2.0) < lo(&p1.0, &p2.0) - &eps
        || hi(&p1.1, &p2.1) < lo(&q1.1, &q2.1) - &eps
        || hi(&q1.1, &q2.1) < lo(&p1.1, &p2.1) - &eps
    {
        return Stage1::Miss;
    }

    let orient = |o: &(Rat, Rat), p: &(Rat, Rat), q: &(Rat, Rat)| -> Rat {
        (&p.0 - &o.0) * (&q.1 - &o.1) - (&p.1 - &o.1) * (&q.0 - &o.0)
    };
    let d1 = orient(&p1, &p2, &q1);
    let d2 = orient(&p1, &p2, &q2);
    let d3 = orient(&q1, &q2, &p1);
    let d4 = orient(&q1, &q2, &p2);
    if [&d1, &d2, &d3, &d4].iter().any(|d| d.abs() < eps) {
        return Stage1::Escalate;
    }
    let crossing = (&d1 * &d2).is_negative() && (&d3 * &d4).is_negative();
    if !crossing {
        // Some endpoint pair lies strictly on one side, with margin.
        return Stage1::Miss;
    }
    // Parametric intersection; require both parameters ε-inside (0, 1).
    let dx1 = &p2.0 - &p1.0;
    let dy1 = &p2.1 - &p1.1;
    let dx2 = &q2.0 - &q1.0;
    let dy2 = &q2.1 - &q1.1;
    let det = &dx1 * &dy2 - &dy1 * &dx2;
    let t = (&(&q1.0 - &p1.0) * &dy2 - &(&q1.1 - &p1.1) * &dx2) / &det;
    let s = (&(&q1.0 - &p1.0) * &dy1 - &(&q1.1 - &p1.1) * &dx1) / &det;
    let one = Rat::one();
    if t > eps && t < &one - &eps && s > eps && s < &one - &eps {
        Stage1::Crossing
    } else {
        Stage1::Escalate
    }
}

fn stage2(ctx: &mut ExactCtx, a: &ExactSegment, b: &ExactSegment) -> Result<Option<OverlapKind>> {
    let d1 = direction(a);
    let d2 = direction(b);
    let a_degenerate = d1.x.is_zero() && d1.y.is_zero();
    let b_degenerate = d2.x.is_zero() && d2.y.is_zero();
    if a_degenerate || b_degenerate {
        return degenerate(ctx, a, b, a_degenerate, b_degenerate);
    }

    let det = cross(&ctx.field, &d1, &d2);
    if det.is_zero() {
        return collinear(ctx, a, b, &d1);
    }

    // Solve P₁ + t·d₁ = Q₁ + s·d₂.
    let w = diff(&b.a, &a.a);
    let t = ctx
        .field
        .div(&cross(&ctx.field, &w, &d2), &det)
        .expect("nonzero determinant");
    let s = ctx
        .field
        .div(&cross(&ctx.field, &w, &d1), &det)
        .expect("nonzero determinant");
    let one = CycNum::from_int(1);
    let t0 = ctx.sign(&t)?;
    let t1 = ctx.sign(&one.sub(&t))?;
    let s0 = ctx.sign(&s)?;
    let s1 = ctx.sign(&one.sub(&s))?;
    if t0 == Ordering::Less || t1 == Ordering::Less || s0 == Ordering::Less || s1 == Ordering::Less
    {
        return Ok(None);
    }
    let t_at_end = t0 == Ordering::Equal || t1 == Ordering::Equal;
    let s_at_end = s0 == Ordering::Equal || s1 == Ordering::Equal;
    Ok(Some(match (t_at_end, s_at_end) {
        (false, false) => OverlapKind::FaceFace,
        (true, true) => OverlapKind::VertexVertex,
        _ => OverlapKind::EdgeVertex,
    }))
}

/// Parallel segments: overlap exists only on a shared carrier line, where
/// it is measured by projection onto the direction.
fn collinear(
    ctx: &mut ExactCtx,
    a: &ExactSegment,
    b: &ExactSegment,
    d1: &ExactPoint,
) -> Result<Option<OverlapKind>> {
    let w = diff(&b.a, &a.a);
    if !cross(&ctx.field, d1, &w).is_zero() {
        return Ok(None);
    }
    // Projections: A covers [0, |d₁|²]; order B's endpoints by sign.
    let len2 = dot(&ctx.field, d1, d1);
    let v1 = dot(&ctx.field, &w, d1);
    let v2 = dot(&ctx.field, &diff(&b.b, &a.a), d1);
    let (blo, bhi) = if ctx.sign(&v2.sub(&v1))? == Ordering::Less {
        (v2, v1)
    } else {
        (v1, v2)
    };
    let lo = if ctx.sign(&blo)? == Ordering::Less {
        CycNum::zero()
    } else {
        blo
    };
    let hi = if ctx.sign(&bhi.sub(&len2))? == Ordering::Greater {
        len2
    } else {
        bhi
    };
    Ok(match ctx.sign(&hi.sub(&lo))? {
        Ordering::Greater => Some(OverlapKind::EdgeEdge),
        Ordering::Equal => Some(OverlapKind::VertexVertex),
        Ordering::Less => None,
    })
}

/// A segment with coincident endpoints acts as a point.
fn degenerate(
    ctx: &mut ExactCtx,
    a: &ExactSegment,
    b: &ExactSegment,
    a_degenerate: bool,
    b_degenerate: bool,
) -> Result<Option<OverlapKind>> {
    if a_degenerate && b_degenerate {
        let same = a.a.x == b.a.x && a.a.y == b.a.y;
        return Ok(same.then_some(OverlapKind::VertexVertex));
    }
    let (point, seg) = if a_degenerate { (&a.a, b) } else { (&b.a, a) };
    let d = direction(seg);
    let w = diff(point, &seg.a);
    if !cross(&ctx.field, &d, &w).is_zero() {
        return Ok(None);
    }
    let u = dot(&ctx.field, &w, &d);
    let len2 = dot(&ctx.field, &d, &d);
    let at_start = ctx.sign(&u)?;
    let at_end = ctx.sign(&u.sub(&len2))?;
    if at_start == Ordering::Less || at_end == Ordering::Greater {
        return Ok(None);
    }
    if at_start == Ordering::Equal || at_end == Ordering::Equal {
        Ok(Some(OverlapKind::VertexVertex))
    } else {
        Ok(Some(OverlapKind::EdgeVertex))
    }
}

fn direction(s: &ExactSegment) -> ExactPoint {
    ExactPoint {
        x: s.b.x.sub(&s.a.x),
        y: s.b.y.sub(&s.a.y),
    }
}

fn diff(p: &ExactPoint, q: &ExactPoint) -> ExactPoint {
    ExactPoint {
        x: p.x.sub(&q.x),
        y: p.y.sub(&q.y),
    }
}

fn cross(field: &super::cyclotomic::CycField, u: &ExactPoint, v: &ExactPoint) -> CycNum {
    field.mul(&u.x, &v.y).sub(&field.mul(&u.y, &v.x))
}

fn dot(field: &super::cyclotomic::CycField, u: &ExactPoint, v: &ExactPoint) -> CycNum {
    field.mul(&u.x, &v.x).add(&field.mul(&u.y, &v.y))
}
