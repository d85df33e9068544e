//! ibom-centroid - centroid file to InteractiveHtmlBom pcbdata converter
//!
//! This library reads pick-and-place centroid files (one line per placed
//! component with position, rotation and side) and builds the board document
//! consumed by the InteractiveHtmlBom viewer: component markers in pixel
//! space, a BOM grouped by footprint and value, and background image links.
//!
//! # Quick Start
//!
//! ```no_run
//! use ibom_centroid::{CentroidCore, ConversionOptions};
//! use std::path::Path;
//!
//! let options = ConversionOptions::new(100.0, 80.0, 25.4 / 600.0);
//! let result = CentroidCore::convert_file(Path::new("board.xy"), &options).unwrap();
//!
//! for group in &result.pcbdata.bom.both {
//!     println!("{} x {} ({})", group.quantity, group.value, group.footprint);
//! }
//! ```
//!
//! # Features
//!
//! - **Record ingestion**: delimited text with comments, quoting and strict row checks
//! - **Coordinate mapping**: millimeters to image pixels, bottom side mirrored
//! - **BOM grouping**: per side and combined, cross-linked to component markers

pub mod board;
pub mod core;
pub mod parser;

// Re-export main types
pub use crate::core::{
    CentroidCore, CentroidError, ConversionOptions, ConversionResult, ConversionStats,
    DEFAULT_SCALE,
};
pub use board::schema::{Bom, BomGroup, Component, Module, PcbData};
pub use board::builder::{BoardGeometry, BoardModel, BoardModelBuilder};
pub use parser::centroid::{CentroidParseError, CentroidParser};
pub use parser::schema::{PlacementRecord, Side};

/// Parse centroid text into placement records (convenience wrapper).
pub fn parse_centroid(content: &str) -> Result<Vec<PlacementRecord>, CentroidError> {
    Ok(parser::centroid::parse_centroid(content)?)
}

/// Convert a centroid file with the given options (convenience wrapper).
pub fn convert_file(
    path: &std::path::Path,
    options: &ConversionOptions,
) -> Result<ConversionResult, CentroidError> {
    CentroidCore::convert_file(path, options)
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        CentroidCore, CentroidError, ConversionOptions, ConversionResult, ConversionStats, PcbData,
        Side,
    };
}
