//! Combinatorial polyhedron model.
//!
//! Purpose
//! - Hold the face/edge/neighbour structure of a convex regular-faced
//!   polyhedron as flat index arenas (no cross-referenced heap objects).
//! - Load and validate the `polyhedron.json` / `root_pairs.json` documents.
//! - Derive the vertex incidence (union-find over face corners) for the
//!   exact verifier.
//!
//! Identifiers: faces are dense indices `0..F` wrapped in [`FaceId`];
//! edge identifiers are opaque, appear in exactly two faces, and are not
//! assumed consecutive.

pub mod generate;
mod incidence;

pub use incidence::VertexIncidence;

use std::io::Read;

use serde::Deserialize;

use crate::error::{Result, UnfoldError};
use crate::SCHEMA_VERSION;

/// Dense face index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FaceId(pub usize);

/// Opaque edge identifier (shared by exactly two faces).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EdgeId(pub u32);

/// Immutable combinatorial structure of a polyhedron.
///
/// `edges_of[f]` lists the edges of face `f` counter-clockwise as seen from
/// outside; `neighbor_of[f][k]` is the face across `edges_of[f][k]`.
#[derive(Clone, Debug)]
pub struct Polyhedron {
    class: String,
    name: String,
    gons: Vec<usize>,
    edges_of: Vec<Vec<EdgeId>>,
    neighbor_of: Vec<Vec<FaceId>>,
}

impl Polyhedron {
    /// Parse and validate a `polyhedron.json` document.
    pub fn from_reader(r: impl Read) -> Result<Self> {
        let doc: PolyhedronDoc = serde_json::from_reader(r)?;
        Self::from_doc(doc)
    }

    fn from_doc(doc: PolyhedronDoc) -> Result<Self> {
        if doc.schema_version != SCHEMA_VERSION {
            return Err(UnfoldError::Schema {
                expected: SCHEMA_VERSION,
                found: doc.schema_version,
            });
        }
        let num_faces = doc.faces.len();
        if num_faces == 0 {
            return Err(UnfoldError::Structure("polyhedron has no faces".into()));
        }
        let mut gons = Vec::with_capacity(num_faces);
        let mut edges_of = Vec::with_capacity(num_faces);
        let mut neighbor_of = Vec::with_capacity(num_faces);
        for (idx, face) in doc.faces.iter().enumerate() {
            if face.face_id as usize != idx {
                return Err(UnfoldError::Structure(format!(
                    "face_id {} at position {idx}: faces must be listed in id order",
                    face.face_id
                )));
            }
            let gon = face.gon as usize;
            if gon < 3 {
                return Err(UnfoldError::Structure(format!(
                    "face {idx} has gon {gon}, need at least 3"
                )));
            }
            if face.neighbors.len() != gon {
                return Err(UnfoldError::Structure(format!(
                    "face {idx} lists {} neighbors for gon {gon}",
                    face.neighbors.len()
                )));
            }
            gons.push(gon);
            edges_of.push(face.neighbors.iter().map(|n| EdgeId(n.edge_id)).collect());
            neighbor_of.push(
                face.neighbors
                    .iter()
                    .map(|n| FaceId(n.face_id as usize))
                    .collect(),
            );
        }
        let poly = Polyhedron {
            class: doc.polyhedron.class,
            name: doc.polyhedron.name,
            gons,
            edges_of,
            neighbor_of,
        };
        poly.validate()?;
        Ok(poly)
    }

    /// Structural validation: reciprocal adjacency, each edge on exactly two
    /// faces, all references in range. Fatal before any search begins.
    fn validate(&self) -> Result<()> {
        let f_count = self.num_faces();
        let mut edge_uses: std::collections::HashMap<EdgeId, usize> =
            std::collections::HashMap::new();
        for f in 0..f_count {
            let face = FaceId(f);
            let mut seen_here = std::collections::HashSet::new();
            for (k, (&e, &g)) in self.edges_of[f].iter().zip(&self.neighbor_of[f]).enumerate() {
                if !seen_here.insert(e) {
                    return Err(UnfoldError::Structure(format!(
                        "face {f} lists edge {} twice",
                        e.0
                    )));
                }
                if g.0 >= f_count {
                    return Err(UnfoldError::Structure(format!(
                        "face {f} references missing face {}",
                        g.0
                    )));
                }
                if g == face {
                    return Err(UnfoldError::Structure(format!(
                        "face {f} is its own neighbor across edge {}",
                        e.0
                    )));
                }
                *edge_uses.entry(e).or_insert(0) += 1;
                // Reciprocity: g must carry e, with f as the back-entry.
                match self.edge_index(g, e) {
                    Some(j) if self.neighbor_of[g.0][j] == face => {}
                    Some(_) => {
                        return Err(UnfoldError::Structure(format!(
                            "edge {} of face {f}: back-entry of face {} is not {f}",
                            e.0, g.0
                        )));
                    }
                    None => {
                        return Err(UnfoldError::Structure(format!(
                            "edge {} of face {f} is missing from neighbor face {} (index {k})",
                            e.0, g.0
                        )));
                    }
                }
            }
        }
        for (e, uses) in edge_uses {
            if uses != 2 {
                return Err(UnfoldError::Structure(format!(
                    "edge {} appears in {uses} faces, expected exactly 2",
                    e.0
                )));
            }
        }
        Ok(())
    }

    #[inline]
    pub fn num_faces(&self) -> usize {
        self.gons.len()
    }

    #[inline]
    pub fn class(&self) -> &str {
        &self.class
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn gon(&self, f: FaceId) -> usize {
        self.gons[f.0]
    }

    #[inline]
    pub fn edges_of(&self, f: FaceId) -> &[EdgeId] {
        &self.edges_of[f.0]
    }

    #[inline]
    pub fn neighbors_of(&self, f: FaceId) -> &[FaceId] {
        &self.neighbor_of[f.0]
    }

    #[inline]
    pub fn neighbor(&self, f: FaceId, k: usize) -> FaceId {
        self.neighbor_of[f.0][k]
    }

    /// Position of `edge` within the edge cycle of `f`, if present.
    pub fn edge_index(&self, f: FaceId, edge: EdgeId) -> Option<usize> {
        self.edges_of[f.0].iter().position(|&e| e == edge)
    }

    /// Whether two faces share an edge on the polyhedron.
    pub fn are_neighbors(&self, f: FaceId, g: FaceId) -> bool {
        self.neighbor_of[f.0].contains(&g)
    }

    /// Compute the vertex incidence by union-find over face corners.
    pub fn vertex_incidence(&self) -> VertexIncidence {
        VertexIncidence::build(self)
    }
}

/// One `(base_face, base_edge)` search seed.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub struct RootPair {
    pub base_face: u32,
    pub base_edge: u32,
}

/// Parse and validate a `root_pairs.json` document against a polyhedron.
pub fn root_pairs_from_reader(r: impl Read, poly: &Polyhedron) -> Result<Vec<RootPair>> {
    let doc: RootPairsDoc = serde_json::from_reader(r)?;
    if doc.schema_version != SCHEMA_VERSION {
        return Err(UnfoldError::Schema {
            expected: SCHEMA_VERSION,
            found: doc.schema_version,
        });
    }
    for (i, rp) in doc.root_pairs.iter().enumerate() {
        let face = FaceId(rp.base_face as usize);
        if face.0 >= poly.num_faces() {
            return Err(UnfoldError::Reference(format!(
                "root pair {i}: base_face {} is not a face of {}",
                rp.base_face,
                poly.name()
            )));
        }
        if poly.edge_index(face, EdgeId(rp.base_edge)).is_none() {
            return Err(UnfoldError::Reference(format!(
                "root pair {i}: base_edge {} is not an edge of face {}",
                rp.base_edge, rp.base_face
            )));
        }
    }
    Ok(doc.root_pairs)
}

#[derive(Debug, Deserialize)]
struct RootPairsDoc {
    schema_version: u32,
    root_pairs: Vec<RootPair>,
}

#[derive(Debug, Deserialize)]
struct PolyhedronDoc {
    schema_version: u32,
    polyhedron: PolyhedronMeta,
    faces: Vec<FaceDoc>,
}

#[derive(Debug, Deserialize)]
struct PolyhedronMeta {
    class: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct FaceDoc {
    face_id: u32,
    gon: u32,
    neighbors: Vec<NeighborDoc>,
}

#[derive(Debug, Deserialize)]
struct NeighborDoc {
    edge_id: u32,
    face_id: u32,
}
