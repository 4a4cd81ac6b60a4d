//! Vertex incidence via union-find over face corners.
//!
//! Corner `(f, k)` is the junction between edge `k` and edge `(k+1) mod n`
//! of face `f`. Two corners are unioned whenever the faces they belong to
//! share the edge between them; the equivalence classes are the polyhedron
//! vertices.

use num_rational::Rational64;

use super::{FaceId, Polyhedron};

/// Assignment of every face corner to a global vertex id.
#[derive(Clone, Debug)]
pub struct VertexIncidence {
    /// `verts[f][k]` = vertex id of corner `(f, k)`.
    verts: Vec<Vec<usize>>,
    num_vertices: usize,
}

impl VertexIncidence {
    pub(super) fn build(poly: &Polyhedron) -> Self {
        // Flat corner arena: corner (f, k) lives at offsets[f] + k.
        let mut offsets = Vec::with_capacity(poly.num_faces());
        let mut total = 0usize;
        for f in 0..poly.num_faces() {
            offsets.push(total);
            total += poly.gon(FaceId(f));
        }
        let mut uf = UnionFind::new(total);

        // Two faces f and g sharing edge e (at positions i and j): the head
        // corner of e in f coincides with the tail corner of e in g, and
        // vice versa. With CCW edge cycles on both faces:
        //   (f, i)            ~ (g, (j - 1) mod gon_g)
        //   (f, (i - 1) mod gon_f) ~ (g, j)
        let mut processed = std::collections::HashSet::new();
        for f in 0..poly.num_faces() {
            let face = FaceId(f);
            let gon_f = poly.gon(face);
            for (i, &e) in poly.edges_of(face).iter().enumerate() {
                if !processed.insert(e) {
                    continue;
                }
                let g = poly.neighbors_of(face)[i];
                let gon_g = poly.gon(g);
                let j = poly
                    .edge_index(g, e)
                    .expect("validated polyhedron: reciprocal edge");
                uf.union(offsets[f] + i, offsets[g.0] + (j + gon_g - 1) % gon_g);
                uf.union(offsets[f] + (i + gon_f - 1) % gon_f, offsets[g.0] + j);
            }
        }

        // Number the equivalence classes in scan order.
        let mut class_of = std::collections::HashMap::new();
        let mut verts = Vec::with_capacity(poly.num_faces());
        for f in 0..poly.num_faces() {
            let gon = poly.gon(FaceId(f));
            let mut face_verts = Vec::with_capacity(gon);
            for k in 0..gon {
                let root = uf.find(offsets[f] + k);
                let next = class_of.len();
                let vid = *class_of.entry(root).or_insert(next);
                face_verts.push(vid);
            }
            verts.push(face_verts);
        }
        let inc = VertexIncidence {
            verts,
            num_vertices: class_of.len(),
        };
        inc.warn_if_not_convex(poly);
        inc
    }

    /// The vertex-chain skip in the exact verifier is only sound for convex
    /// inputs (positive angle defect at every vertex). The angle sum is an
    /// exact rational multiple of 2π, so the check needs no floats.
    fn warn_if_not_convex(&self, poly: &Polyhedron) {
        let mut turns = vec![Rational64::new(0, 1); self.num_vertices];
        for f in 0..poly.num_faces() {
            let gon = poly.gon(FaceId(f)) as i64;
            // Interior angle of a regular n-gon: (n-2)/(2n) full turns.
            let angle = Rational64::new(gon - 2, 2 * gon);
            for &v in &self.verts[f] {
                turns[v] += angle;
            }
        }
        let full = Rational64::new(1, 1);
        for (v, t) in turns.iter().enumerate() {
            if *t >= full {
                tracing::warn!(
                    vertex = v,
                    "face angles at vertex reach a full turn; input is not a \
                     convex regular-faced polyhedron and vertex-chain skipping \
                     may be unsound"
                );
            }
        }
    }

    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    /// Vertex ids around face `f` (one per corner).
    #[inline]
    pub fn vertices_of(&self, f: FaceId) -> &[usize] {
        &self.verts[f.0]
    }

    /// Whether two faces meet at a polyhedron vertex.
    pub fn shares_vertex(&self, f: FaceId, g: FaceId) -> bool {
        self.verts[f.0]
            .iter()
            .any(|v| self.verts[g.0].contains(v))
    }

    /// Corner count per vertex (the vertex degree).
    pub fn vertex_degrees(&self) -> Vec<usize> {
        let mut deg = vec![0usize; self.num_vertices];
        for face_verts in &self.verts {
            for &v in face_verts {
                deg[v] += 1;
            }
        }
        deg
    }
}

/// Union-find over a flat index arena, path-halving + union by size.
struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        UnionFind {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (mut ra, mut rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        if self.size[ra] < self.size[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        self.size[ra] += self.size[rb];
    }
}
