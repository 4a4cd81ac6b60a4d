//! Rotational unfolding of convex regular-faced polyhedra.
//!
//! Three streaming stages over one JSON-line record format:
//! - [`unfold`]: depth-first enumeration of path-shaped partial unfoldings
//!   with circumradius-based overlap flagging (raw stream);
//! - [`noniso`]: canonical-form removal of isomorphic paths (noniso stream);
//! - [`exact`]: exact-arithmetic overlap verification and classification
//!   (exact stream).
//!
//! Each stage reads its predecessor's output as read-only and is
//! deterministic: identical inputs give byte-identical outputs.

pub mod error;
pub mod exact;
pub mod geometry;
pub mod noniso;
pub mod poly;
pub mod record;
pub mod unfold;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Schema version shared by input documents and stream records.
pub const SCHEMA_VERSION: u32 = 1;

pub use error::{Result, UnfoldError};
pub use poly::{EdgeId, FaceId, Polyhedron, RootPair};
pub use record::{OverlapKind, UnfoldingRecord};
