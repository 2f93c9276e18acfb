//! In-memory representation of trained gradient-boosted tree ensembles.
//!
//! Parses the interchange payload (per-tree node arrays plus feature-kind
//! declarations) into a validated, read-only model that downstream
//! formulation builders can traverse deterministically.
//!
//! Modules:
//! - `payload`: Serde-typed interchange records
//! - `model`: Validated arena trees, traversal, and prediction
//! - `errors`: Structural and load error types

pub mod errors;
pub mod model;
pub mod payload;

pub use errors::{EnsembleError, MalformedEnsembleError};
pub use model::{Branch, LeafPath, Node, SplitTest, Tree, TreeEnsembleModel};
pub use payload::{EnsemblePayload, FeatureDecl, FeatureKind, NodePayload, TreePayload};

/// Crate version string for metadata and validation reports
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
