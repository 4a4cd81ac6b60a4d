use std::cmp::Ordering;

use num_bigint::BigInt;
use num_traits::Signed;

use super::cyclotomic::{cyclotomic_int, rat, CycField, CycNum, Rat};
use super::intersect::{classify_pair, stage1, Stage1};
use super::layout::{exact_poses, face_segments, ExactCtx, ExactPoint, ExactSegment};
use super::*;
use crate::poly::generate::{antiprism, cube};
use crate::record::{BasePair, UnfoldingRecord, RECORD_TYPE};
use crate::Polyhedron;

fn pow10_inv(p: u32) -> Rat {
    let mut d = BigInt::from(1);
    for _ in 0..p {
        d *= 10;
    }
    Rat::new(BigInt::from(1), d)
}

fn pt(x: Rat, y: Rat) -> ExactPoint {
    ExactPoint {
        x: CycNum::from_rat(x),
        y: CycNum::from_rat(y),
    }
}

fn seg(ax: Rat, ay: Rat, bx: Rat, by: Rat) -> ExactSegment {
    ExactSegment {
        a: pt(ax, ay),
        b: pt(bx, by),
    }
}

/// Axis-aligned unit square centred at a rational point, as four edges.
fn square(cx: Rat, cy: Rat) -> Vec<ExactSegment> {
    let h = rat(1, 2);
    let corners = [
        (&cx + &h, &cy + &h),
        (&cx - &h, &cy + &h),
        (&cx - &h, &cy - &h),
        (&cx + &h, &cy - &h),
    ];
    (0..4)
        .map(|k| {
            let (ax, ay) = corners[k].clone();
            let (bx, by) = corners[(k + 1) % 4].clone();
            seg(ax, ay, bx, by)
        })
        .collect()
}

fn square_ctx() -> ExactCtx {
    ExactCtx::new(ExactCtx::order_for([4usize].into_iter()))
}

// --- field arithmetic ---

#[test]
fn cyclotomic_polynomials() {
    // Φ_1 = x - 1, Φ_4 = x² + 1, Φ_12 = x⁴ - x² + 1.
    let as_i64 = |v: Vec<BigInt>| -> Vec<i64> {
        v.into_iter().map(|c| i64::try_from(c).unwrap()).collect()
    };
    assert_eq!(as_i64(cyclotomic_int(1)), vec![-1, 1]);
    assert_eq!(as_i64(cyclotomic_int(4)), vec![1, 0, 1]);
    assert_eq!(as_i64(cyclotomic_int(12)), vec![1, 0, -1, 0, 1]);
}

#[test]
fn field_basics() {
    let f = CycField::new(12);
    assert_eq!(f.degree(), 4);
    assert_eq!(*f.zeta_pow(12), CycNum::from_int(1));
    assert_eq!(*f.zeta_pow(6), CycNum::from_int(-1));
    assert_eq!(f.mul(f.zeta_pow(5), f.zeta_pow(7)), CycNum::from_int(1));
    // i² = -1.
    assert_eq!(f.mul(f.i(), f.i()), CycNum::from_int(-1));
    // Inversion: (1 + ζ)·(1 + ζ)⁻¹ = 1.
    let a = CycNum::from_int(1).add(f.zeta_pow(1));
    let inv = f.inv(&a).unwrap();
    assert_eq!(f.mul(&a, &inv), CycNum::from_int(1));
    assert!(f.inv(&CycNum::zero()).is_none());
}

#[test]
fn ngon_constants_have_their_closed_forms() {
    let mut ctx = ExactCtx::new(ExactCtx::order_for([3usize, 4, 6].into_iter()));
    // Square: r = 1/2 exactly, R² = 1/2.
    assert_eq!(ctx.inradius(4).unwrap(), CycNum::from_rat(rat(1, 2)));
    let r4 = ctx.circumradius(4).unwrap();
    let f = &ctx.field;
    assert_eq!(f.mul(&r4, &r4), CycNum::from_rat(rat(1, 2)));
    // Hexagon: R = 1 exactly, r² = 3/4.
    assert_eq!(ctx.circumradius(6).unwrap(), CycNum::from_int(1));
    let r6 = ctx.inradius(6).unwrap();
    assert_eq!(
        ctx.field.mul(&r6, &r6),
        CycNum::from_rat(rat(3, 4))
    );
    // Triangle: r² = 1/12, R² = 1/3.
    let r3 = ctx.inradius(3).unwrap();
    assert_eq!(ctx.field.mul(&r3, &r3), CycNum::from_rat(rat(1, 12)));
    let c3 = ctx.circumradius(3).unwrap();
    assert_eq!(ctx.field.mul(&c3, &c3), CycNum::from_rat(rat(1, 3)));
}

#[test]
fn unit_vectors_lie_on_the_circle() {
    let mut ctx = ExactCtx::new(ExactCtx::order_for([3usize, 4].into_iter()));
    for u in [0i64, 1, 5, 7, 12, 23, -3] {
        let (cos, sin) = ctx.unit(u);
        let sum = ctx
            .field
            .mul(&cos, &cos)
            .add(&ctx.field.mul(&sin, &sin));
        assert_eq!(sum, CycNum::from_int(1), "u = {u}");
        assert!(ctx.field.is_real(&cos) && ctx.field.is_real(&sin));
    }
}

#[test]
fn sign_decisions() {
    let mut ctx = ExactCtx::new(ExactCtx::order_for([4usize, 6].into_iter()));
    let r6 = ctx.inradius(6).unwrap();
    let r4 = ctx.inradius(4).unwrap();
    // √3/2 > 1/2.
    assert_eq!(ctx.sign(&r6.sub(&r4)).unwrap(), Ordering::Greater);
    assert_eq!(ctx.sign(&r4.sub(&r6)).unwrap(), Ordering::Less);
    // Exact zero is decided symbolically, not numerically.
    let r4c = ctx.circumradius(4).unwrap();
    let square = ctx.field.mul(&r4c, &r4c);
    assert_eq!(
        ctx.sign(&square.sub(&CycNum::from_rat(rat(1, 2)))).unwrap(),
        Ordering::Equal
    );
    // √3/2 − 0.866 is tiny but nonzero; the numeric ladder settles it.
    assert_eq!(
        ctx.sign(&r6.sub(&CycNum::from_rat(rat(866, 1000)))).unwrap(),
        Ordering::Greater
    );
    assert_eq!(
        ctx.sign(&r6.sub(&CycNum::from_rat(rat(8661, 10000)))).unwrap(),
        Ordering::Less
    );
}

#[test]
fn large_gons_resolve_at_base_precision() {
    // 18- and 20-gons are the practical upper end; their constants are
    // clearly separated rationals away, so the first ladder level decides.
    for (gon, below, above) in [(18usize, (283, 100), (284, 100)), (20, (315, 100), (316, 100))] {
        let mut ctx = ExactCtx::new(ExactCtx::order_for([gon].into_iter()));
        let r = ctx.inradius(gon).unwrap();
        assert_eq!(
            ctx.sign(&r.sub(&CycNum::from_rat(rat(below.0, below.1)))).unwrap(),
            Ordering::Greater
        );
        assert_eq!(
            ctx.sign(&r.sub(&CycNum::from_rat(rat(above.0, above.1)))).unwrap(),
            Ordering::Less
        );
        let (cos, sin) = ctx.unit(1);
        let sum = ctx.field.mul(&cos, &cos).add(&ctx.field.mul(&sin, &sin));
        assert_eq!(sum, CycNum::from_int(1));
    }
}

#[test]
fn eval80_is_precise() {
    let mut ctx = square_ctx();
    let third = CycNum::from_rat(rat(1, 3));
    let approx = ctx.eval80(&third);
    let err = (approx - rat(1, 3)).abs();
    assert!(err < pow10_inv(75));
}

// --- segment classification ---

#[test]
fn clear_crossing_is_face_face() {
    let mut ctx = square_ctx();
    let a = seg(rat(0, 1), rat(0, 1), rat(1, 1), rat(1, 1));
    let b = seg(rat(0, 1), rat(1, 1), rat(1, 1), rat(0, 1));
    assert_eq!(stage1(&mut ctx, &a, &b), Stage1::Crossing);
    assert_eq!(
        classify_pair(&mut ctx, &a, &b).unwrap(),
        Some(OverlapKind::FaceFace)
    );
}

#[test]
fn clear_miss_is_rejected_numerically() {
    let mut ctx = square_ctx();
    let a = seg(rat(0, 1), rat(0, 1), rat(1, 1), rat(0, 1));
    let b = seg(rat(3, 1), rat(1, 1), rat(4, 1), rat(1, 1));
    assert_eq!(stage1(&mut ctx, &a, &b), Stage1::Miss);
    assert_eq!(classify_pair(&mut ctx, &a, &b).unwrap(), None);
}

#[test]
fn endpoint_on_interior_is_edge_vertex() {
    let mut ctx = square_ctx();
    let a = seg(rat(0, 1), rat(0, 1), rat(1, 1), rat(0, 1));
    let b = seg(rat(1, 2), rat(0, 1), rat(1, 2), rat(1, 1));
    assert_eq!(stage1(&mut ctx, &a, &b), Stage1::Escalate);
    assert_eq!(
        classify_pair(&mut ctx, &a, &b).unwrap(),
        Some(OverlapKind::EdgeVertex)
    );
}

#[test]
fn shared_endpoint_is_vertex_vertex() {
    let mut ctx = square_ctx();
    let a = seg(rat(0, 1), rat(0, 1), rat(1, 1), rat(0, 1));
    let b = seg(rat(1, 1), rat(0, 1), rat(2, 1), rat(1, 1));
    assert_eq!(
        classify_pair(&mut ctx, &a, &b).unwrap(),
        Some(OverlapKind::VertexVertex)
    );
}

#[test]
fn collinear_overlap_is_edge_edge() {
    let mut ctx = square_ctx();
    let a = seg(rat(0, 1), rat(0, 1), rat(1, 1), rat(0, 1));
    // Positive-length overlap [1/2, 1].
    let b = seg(rat(1, 2), rat(0, 1), rat(2, 1), rat(0, 1));
    assert_eq!(
        classify_pair(&mut ctx, &a, &b).unwrap(),
        Some(OverlapKind::EdgeEdge)
    );
    // Touching end-to-end: a single shared point.
    let c = seg(rat(1, 1), rat(0, 1), rat(2, 1), rat(0, 1));
    assert_eq!(
        classify_pair(&mut ctx, &a, &c).unwrap(),
        Some(OverlapKind::VertexVertex)
    );
    // Same carrier line, disjoint ranges.
    let d = seg(rat(3, 1), rat(0, 1), rat(4, 1), rat(0, 1));
    assert_eq!(classify_pair(&mut ctx, &a, &d).unwrap(), None);
    // Parallel but off the line.
    let e = seg(rat(0, 1), rat(1, 1), rat(1, 1), rat(1, 1));
    assert_eq!(classify_pair(&mut ctx, &a, &e).unwrap(), None);
}

#[test]
fn epsilon_boundary_always_escalates() {
    let mut ctx = square_ctx();
    let a = seg(rat(0, 1), rat(0, 1), rat(1, 1), rat(0, 1));
    // Vertical segment 10⁻⁴⁰ right of a's start: inside stage 1's ε.
    let delta = pow10_inv(40);
    let b = seg(
        delta.clone(),
        rat(-1, 1),
        delta,
        rat(1, 1),
    );
    assert_eq!(stage1(&mut ctx, &a, &b), Stage1::Escalate);
    // Stage 2 decides exactly: t = 10⁻⁴⁰ is strictly inside (0, 1).
    assert_eq!(
        classify_pair(&mut ctx, &a, &b).unwrap(),
        Some(OverlapKind::FaceFace)
    );
    // Exactly on the endpoint it is a point contact instead.
    let c = seg(rat(0, 1), rat(-1, 1), rat(0, 1), rat(1, 1));
    assert_eq!(
        classify_pair(&mut ctx, &a, &c).unwrap(),
        Some(OverlapKind::EdgeVertex)
    );
    // And 10⁻⁴⁰ before the endpoint it is a miss.
    let d = seg(
        -pow10_inv(40),
        rat(-1, 1),
        -pow10_inv(40),
        rat(1, 1),
    );
    assert_eq!(stage1(&mut ctx, &a, &d), Stage1::Escalate);
    assert_eq!(classify_pair(&mut ctx, &a, &d).unwrap(), None);
}

#[test]
fn degenerate_segments_are_reclassified() {
    let mut ctx = square_ctx();
    let a = seg(rat(0, 1), rat(0, 1), rat(1, 1), rat(0, 1));
    let interior = seg(rat(1, 4), rat(0, 1), rat(1, 4), rat(0, 1));
    assert_eq!(
        classify_pair(&mut ctx, &a, &interior).unwrap(),
        Some(OverlapKind::EdgeVertex)
    );
    let endpoint = seg(rat(0, 1), rat(0, 1), rat(0, 1), rat(0, 1));
    assert_eq!(
        classify_pair(&mut ctx, &a, &endpoint).unwrap(),
        Some(OverlapKind::VertexVertex)
    );
    let off = seg(rat(1, 4), rat(1, 1), rat(1, 4), rat(1, 1));
    assert_eq!(classify_pair(&mut ctx, &a, &off).unwrap(), None);
    // Two coincident points.
    assert_eq!(
        classify_pair(&mut ctx, &endpoint, &endpoint).unwrap(),
        Some(OverlapKind::VertexVertex)
    );
}

// --- polygon-pair scan ---

#[test]
fn polygon_scan_priorities() {
    let mut ctx = square_ctx();
    let base = square(rat(0, 1), rat(0, 1));
    // Overlapping interiors: a diagonal offset makes the boundaries cross
    // properly (a purely horizontal offset would only slide edges along
    // each other).
    assert_eq!(
        strongest_overlap(&mut ctx, &base, &square(rat(1, 2), rat(1, 4))).unwrap(),
        Some(OverlapKind::FaceFace)
    );
    // Sharing a full edge.
    assert_eq!(
        strongest_overlap(&mut ctx, &base, &square(rat(1, 1), rat(0, 1))).unwrap(),
        Some(OverlapKind::EdgeEdge)
    );
    // Touching at one corner.
    assert_eq!(
        strongest_overlap(&mut ctx, &base, &square(rat(1, 1), rat(1, 1))).unwrap(),
        Some(OverlapKind::VertexVertex)
    );
    // Far away.
    assert_eq!(
        strongest_overlap(&mut ctx, &base, &square(rat(3, 1), rat(0, 1))).unwrap(),
        None
    );
}

#[test]
fn diamond_tip_on_edge_interior_is_edge_vertex() {
    let mut ctx = square_ctx();
    let base = square(rat(0, 1), rat(0, 1));
    // Unit square rotated 45°, circumradius √2/2, shifted so its left tip
    // lands on the interior of the base square's right edge.
    let r = ctx.circumradius(4).unwrap();
    let half = CycNum::from_rat(rat(1, 2));
    let cx = half.add(&r);
    let zero = CycNum::zero();
    let tips = [
        (cx.add(&r), zero.clone()),
        (cx.clone(), r.clone()),
        (cx.sub(&r), zero.clone()),
        (cx.clone(), r.neg()),
    ];
    let diamond: Vec<ExactSegment> = (0..4)
        .map(|k| {
            let (ax, ay) = tips[k].clone();
            let (bx, by) = tips[(k + 1) % 4].clone();
            ExactSegment {
                a: ExactPoint { x: ax, y: ay },
                b: ExactPoint { x: bx, y: by },
            }
        })
        .collect();
    assert_eq!(
        strongest_overlap(&mut ctx, &base, &diamond).unwrap(),
        Some(OverlapKind::EdgeVertex)
    );
}

// --- record-level verification ---

fn record_on(poly: &Polyhedron, path: &[(u32, u32)]) -> UnfoldingRecord {
    UnfoldingRecord {
        schema_version: 1,
        record_type: RECORD_TYPE.to_string(),
        base_pair: BasePair {
            base_face: path[0].0,
            base_edge: path[0].1,
        },
        symmetric_used: false,
        faces: path
            .iter()
            .map(|&(face_id, edge_id)| UnfoldedFace {
                face_id,
                gon: poly.gon(crate::poly::FaceId(face_id as usize)) as u32,
                edge_id,
                x: 0.0,
                y: 0.0,
                angle_deg: 0.0,
            })
            .collect(),
        exact_overlap: None,
    }
}

/// Five regular hexagons closed up by a 22-gon: the hexagon path
/// 0-1-2-3-4 curls through 120° turns and face 4 lands exactly on face 0,
/// while the two end faces share no polyhedron edge or vertex. This is not
/// realisable as a convex solid (the incidence warns), which is precisely
/// why it exhibits a guaranteed overlap.
fn hex_ring() -> Polyhedron {
    let faces: [(Vec<u32>, Vec<u32>); 6] = [
        (vec![0, 10, 11, 12, 13, 14], vec![1, 5, 5, 5, 5, 5]),
        (vec![15, 1, 0, 16, 17, 18], vec![5, 2, 0, 5, 5, 5]),
        (vec![19, 20, 2, 21, 1, 22], vec![5, 5, 3, 5, 1, 5]),
        (vec![23, 24, 25, 26, 3, 2], vec![5, 5, 5, 5, 4, 2]),
        (vec![3, 27, 28, 29, 30, 31], vec![3, 5, 5, 5, 5, 5]),
        (
            vec![
                14, 13, 12, 11, 10, 21, 31, 30, 29, 28, 27, 26, 25, 24, 23, 20, 19, 22, 15, 18,
                17, 16,
            ],
            vec![0, 0, 0, 0, 0, 2, 4, 4, 4, 4, 4, 3, 3, 3, 3, 2, 2, 2, 1, 1, 1, 1],
        ),
    ];
    let mut doc = String::from(
        "{\"schema_version\":1,\"polyhedron\":{\"class\":\"synthetic\",\"name\":\"hexring\"},\"faces\":[",
    );
    for (fid, (edges, neighbors)) in faces.iter().enumerate() {
        if fid > 0 {
            doc.push(',');
        }
        doc.push_str(&format!(
            "{{\"face_id\":{fid},\"gon\":{},\"neighbors\":[",
            edges.len()
        ));
        for (k, (e, n)) in edges.iter().zip(neighbors).enumerate() {
            if k > 0 {
                doc.push(',');
            }
            doc.push_str(&format!("{{\"edge_id\":{e},\"face_id\":{n}}}"));
        }
        doc.push_str("]}");
    }
    doc.push_str("]}");
    Polyhedron::from_reader(doc.as_bytes()).unwrap()
}

#[test]
fn trivial_two_face_record_is_rejected_by_the_shared_edge_skip() {
    let poly = cube();
    let incidence = poly.vertex_incidence();
    let mut engine = ExactEngine::new();
    let rec = record_on(&poly, &[(0, 0), (2, 0)]);
    assert_eq!(
        verify_record(&poly, &incidence, &mut engine, &rec.faces).unwrap(),
        None
    );
}

#[test]
fn shared_vertex_endpoints_are_skipped() {
    let poly = antiprism(4);
    let incidence = poly.vertex_incidence();
    // Side triangles 2 and 4 share one apex vertex but no edge.
    assert!(!poly.are_neighbors(crate::poly::FaceId(2), crate::poly::FaceId(4)));
    assert!(incidence.shares_vertex(crate::poly::FaceId(2), crate::poly::FaceId(4)));
    let mut engine = ExactEngine::new();
    let rec = record_on(&poly, &[(2, 8), (3, 12), (4, 9)]);
    assert_eq!(
        verify_record(&poly, &incidence, &mut engine, &rec.faces).unwrap(),
        None
    );
}

#[test]
fn distant_endpoints_simply_do_not_overlap() {
    let poly = cube();
    let incidence = poly.vertex_incidence();
    assert!(!incidence.shares_vertex(crate::poly::FaceId(0), crate::poly::FaceId(1)));
    let mut engine = ExactEngine::new();
    // Opposite cube faces unfold to a straight strip two units apart.
    let rec = record_on(&poly, &[(0, 0), (2, 0), (1, 4)]);
    assert_eq!(
        verify_record(&poly, &incidence, &mut engine, &rec.faces).unwrap(),
        None
    );
}

#[test]
fn exact_layout_replays_the_placement() {
    let poly = cube();
    let rec = record_on(&poly, &[(0, 0), (2, 0)]);
    let mut ctx = ExactCtx::new(ExactCtx::order_for([4usize].into_iter()));
    let poses = exact_poses(&mut ctx, &poly, &rec.faces).unwrap();
    assert_eq!(poses[1].x, CycNum::from_int(1));
    assert!(poses[1].y.is_zero());
    let segments = face_segments(&mut ctx, &poses[1]).unwrap();
    // Vertices are (1 ± 1/2, ±1/2).
    for s in &segments {
        for p in [&s.a, &s.b] {
            let x_ok = p.x == CycNum::from_rat(rat(1, 2)) || p.x == CycNum::from_rat(rat(3, 2));
            let y_ok =
                p.y == CycNum::from_rat(rat(1, 2)) || p.y == CycNum::from_rat(rat(-1, 2));
            assert!(x_ok && y_ok);
        }
    }
}

#[test]
fn hex_ring_path_overlaps_edge_to_edge() {
    let poly = hex_ring();
    let incidence = poly.vertex_incidence();
    let h0 = crate::poly::FaceId(0);
    let h4 = crate::poly::FaceId(4);
    assert!(!poly.are_neighbors(h0, h4));
    assert!(!incidence.shares_vertex(h0, h4));
    let mut engine = ExactEngine::new();
    let rec = record_on(&poly, &[(0, 0), (1, 0), (2, 1), (3, 2), (4, 3)]);
    rec.validate(&poly, 1).unwrap();
    assert_eq!(
        verify_record(&poly, &incidence, &mut engine, &rec.faces).unwrap(),
        Some(OverlapKind::EdgeEdge)
    );
}

#[test]
fn verify_stream_augments_and_is_idempotent() {
    let poly = hex_ring();
    let mut w = RecordWriter::new(Vec::new());
    // One overlapping record and one trivially rejected record.
    w.write_record(&record_on(&poly, &[(0, 0), (1, 0), (2, 1), (3, 2), (4, 3)]))
        .unwrap();
    w.write_record(&record_on(&poly, &[(0, 0), (1, 0)])).unwrap();
    let input = w.into_inner();

    let mut out = Vec::new();
    let summary = verify_stream(&poly, input.as_slice(), &mut out).unwrap();
    assert_eq!(summary.records_in, 2);
    assert_eq!(summary.records_out, 1);
    let text = String::from_utf8(out.clone()).unwrap();
    assert!(text.contains("\"exact_overlap\":{\"kind\":\"edge-edge\"}"), "{text}");
    // Everything before the added field is the input line verbatim.
    let first_in = std::str::from_utf8(&input).unwrap().lines().next().unwrap();
    assert!(text.starts_with(&first_in[..first_in.len() - 1]));

    // Re-running the verifier on its own output changes nothing.
    let mut again = Vec::new();
    let summary2 = verify_stream(&poly, out.as_slice(), &mut again).unwrap();
    assert_eq!(summary2.records_in, 1);
    assert_eq!(summary2.records_out, 1);
    assert_eq!(out, again);
}
