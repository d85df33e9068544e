pub mod centroid;
pub mod schema;

// Re-export for convenience
pub use centroid::{parse_centroid, CentroidParseError, CentroidParser, REQUIRED_FIELDS};
pub use schema::*;
