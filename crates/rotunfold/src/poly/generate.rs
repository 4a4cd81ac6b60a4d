//! Generators for canonical polyhedron structures.
//!
//! Used by tests, benches, and quick experiments that do not want to carry
//! JSON fixtures around. Every generator returns a structure that passes the
//! same validation as a loaded document.
//!
//! Vertex layout conventions (for deriving the CCW edge cycles):
//! top ring `t_i` at angle `2πi/n`, bottom ring `b_i` below (prism) or
//! rotated by `π/n` (antiprism). Face 0 is the top cap, face 1 the bottom
//! cap, side faces follow.

use super::{EdgeId, FaceId, Polyhedron};

fn build(class: &str, name: &str, faces: Vec<(Vec<u32>, Vec<usize>)>) -> Polyhedron {
    let gons = faces.iter().map(|(e, _)| e.len()).collect();
    let edges_of = faces
        .iter()
        .map(|(e, _)| e.iter().map(|&id| EdgeId(id)).collect())
        .collect();
    let neighbor_of = faces
        .iter()
        .map(|(_, n)| n.iter().map(|&f| FaceId(f)).collect())
        .collect();
    let poly = Polyhedron {
        class: class.to_string(),
        name: name.to_string(),
        gons,
        edges_of,
        neighbor_of,
    };
    poly.validate().expect("generated structure is consistent");
    poly
}

/// Regular tetrahedron.
pub fn tetrahedron() -> Polyhedron {
    // Vertices A,B,C,D; edges AB=0, BC=1, CA=2, AD=3, BD=4, CD=5.
    // Faces CCW from outside: ABC, BDC, ACD, ADB.
    build(
        "platonic",
        "tetrahedron",
        vec![
            (vec![0, 1, 2], vec![3, 1, 2]),
            (vec![4, 5, 1], vec![3, 2, 0]),
            (vec![2, 5, 3], vec![0, 1, 3]),
            (vec![3, 4, 0], vec![2, 1, 0]),
        ],
    )
}

/// Cube.
pub fn cube() -> Polyhedron {
    // Bottom ring 0..4 CCW from above, top ring 4..8; face 0 bottom, 1 top,
    // then front/right/back/left. Edges: ring bottom 0..4, ring top 4..8,
    // verticals 8..12.
    build(
        "platonic",
        "cube",
        vec![
            (vec![3, 2, 1, 0], vec![5, 4, 3, 2]),
            (vec![4, 5, 6, 7], vec![2, 3, 4, 5]),
            (vec![0, 9, 4, 8], vec![0, 3, 1, 5]),
            (vec![1, 10, 5, 9], vec![0, 4, 1, 2]),
            (vec![2, 11, 6, 10], vec![0, 5, 1, 3]),
            (vec![3, 8, 7, 11], vec![0, 2, 1, 4]),
        ],
    )
}

/// n-gonal prism: two n-gon caps and n squares.
pub fn prism(n: usize) -> Polyhedron {
    assert!(n >= 3, "prism needs n >= 3");
    let nu = n as u32;
    let q = |i: usize| 2 + i % n;
    let mut faces = Vec::with_capacity(n + 2);
    // Top cap: edges t_i t_{i+1}, each shared with square Q_i.
    faces.push(((0..nu).collect(), (0..n).map(q).collect()));
    // Bottom cap, CCW seen from below: b_0, b_{n-1}, ..., b_1.
    faces.push((
        (0..nu).rev().map(|i| nu + i).collect(),
        (0..n).rev().map(q).collect(),
    ));
    // Square Q_i = (t_i, b_i, b_{i+1}, t_{i+1}).
    for i in 0..n {
        let iu = i as u32;
        faces.push((
            vec![2 * nu + iu, nu + iu, 2 * nu + (iu + 1) % nu, iu],
            vec![q(i + n - 1), 1, q(i + 1), 0],
        ));
    }
    build("prism", &format!("p{n:02}"), faces)
}

/// n-gonal antiprism: two n-gon caps and 2n triangles.
///
/// Side faces interleave: `Td_i = (t_i, b_i, t_{i+1})` hangs off the top
/// cap, `Tu_i = (b_i, b_{i+1}, t_{i+1})` off the bottom cap.
pub fn antiprism(n: usize) -> Polyhedron {
    assert!(n >= 3, "antiprism needs n >= 3");
    let nu = n as u32;
    let td = |i: usize| 2 + 2 * (i % n);
    let tu = |i: usize| 3 + 2 * (i % n);
    let mut faces = Vec::with_capacity(2 * n + 2);
    // Edge ids: top ring i, bottom ring n+i, slants t_i b_i = 2n+i and
    // b_i t_{i+1} = 3n+i.
    faces.push(((0..nu).collect(), (0..n).map(td).collect()));
    faces.push((
        (0..nu).rev().map(|i| nu + i).collect(),
        (0..n).rev().map(tu).collect(),
    ));
    for i in 0..n {
        let iu = i as u32;
        // Td_i: (t_i, b_i), (b_i, t_{i+1}), (t_{i+1}, t_i)
        faces.push((
            vec![2 * nu + iu, 3 * nu + iu, iu],
            vec![tu(i + n - 1), tu(i), 0],
        ));
        // Tu_i: (b_i, b_{i+1}), (b_{i+1}, t_{i+1}), (t_{i+1}, b_i)
        faces.push((
            vec![nu + iu, 2 * nu + (iu + 1) % nu, 3 * nu + iu],
            vec![1, td(i + 1), td(i)],
        ));
    }
    build("antiprism", &format!("a{n:02}"), faces)
}
