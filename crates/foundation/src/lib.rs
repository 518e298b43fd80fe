pub mod bounds;
pub mod geometry;
pub mod ids;

// Foundation crate: small, well-tested primitives only.
pub use bounds::*;
pub use geometry::*;
pub use ids::*;
