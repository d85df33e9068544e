//! Core conversion logic shared by the CLI and library users.
//! No argument parsing or output writing happens here.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use crate::board::builder::{BoardGeometry, BoardModelBuilder, DEFAULT_MARKER_SIZE, MM_PER_INCH};
use crate::board::schema::{Component, PcbData};
use crate::parser::centroid::{CentroidParseError, CentroidParser};
use crate::parser::schema::{PlacementRecord, Side};

#[derive(Debug, thiserror::Error)]
pub enum CentroidError {
    #[error("Parse error: {0}")]
    Parse(#[from] CentroidParseError),
    #[error("Invalid options: {0}")]
    InvalidOptions(String),
}

/// Default scale: images rendered at 600 dpi.
pub const DEFAULT_SCALE: f64 = MM_PER_INCH / 600.0;

/// Options for a conversion run (CLI or library).
#[derive(Clone, Debug, PartialEq)]
pub struct ConversionOptions {
    /// Board width in millimeters
    pub width: f64,
    /// Board height in millimeters
    pub height: f64,
    /// Millimeters per pixel of the background images
    pub scale: f64,
    /// Side of the footprint marker square in millimeters
    pub marker_size: f64,
    pub delimiter: char,
    pub comment_marker: char,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            scale: DEFAULT_SCALE,
            marker_size: DEFAULT_MARKER_SIZE,
            delimiter: ',',
            comment_marker: '#',
        }
    }
}

impl ConversionOptions {
    pub fn new(width: f64, height: f64, scale: f64) -> Self {
        Self {
            width,
            height,
            scale,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), CentroidError> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(CentroidError::InvalidOptions(format!(
                "scale must be a positive number, got {}",
                self.scale
            )));
        }
        for (name, value) in [("width", self.width), ("height", self.height)] {
            if !value.is_finite() || value < 0.0 {
                return Err(CentroidError::InvalidOptions(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        if !self.marker_size.is_finite() || self.marker_size <= 0.0 {
            return Err(CentroidError::InvalidOptions(format!(
                "marker size must be a positive number, got {}",
                self.marker_size
            )));
        }
        for (name, c) in [("delimiter", self.delimiter), ("comment marker", self.comment_marker)] {
            if !c.is_ascii() || c == '"' || c == '\n' || c == '\r' {
                return Err(CentroidError::InvalidOptions(format!(
                    "{} must be a single ASCII character other than a quote or newline, got {:?}",
                    name, c
                )));
            }
        }
        if self.delimiter == self.comment_marker {
            return Err(CentroidError::InvalidOptions(
                "delimiter and comment marker must differ".to_string(),
            ));
        }
        let geometry = self.geometry();
        let edges = geometry.edges_bbox();
        if !edges.maxx.is_finite() || !edges.maxy.is_finite() || !geometry.bbox_size().is_finite() {
            return Err(CentroidError::InvalidOptions(format!(
                "board {}x{} mm with {} mm markers overflows pixel space at scale {}",
                self.width, self.height, self.marker_size, self.scale
            )));
        }
        Ok(())
    }

    pub fn geometry(&self) -> BoardGeometry {
        BoardGeometry {
            width: self.width,
            height: self.height,
            scale: self.scale,
            marker_size: self.marker_size,
        }
    }

    fn parser(&self) -> CentroidParser {
        // validate() guarantees both are ASCII
        CentroidParser::new()
            .with_delimiter(self.delimiter as u8)
            .with_comment_marker(self.comment_marker as u8)
    }
}

/// Result of one conversion: the board document plus the flat component list.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub source: String,
    pub pcbdata: PcbData,
    pub components: Vec<Component>,
    pub stats: ConversionStats,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ConversionStats {
    pub components: usize,
    pub top: usize,
    pub bottom: usize,
    pub bom_groups: usize,
}

impl ConversionResult {
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

fn components_to_stats(components: &[Component], bom_groups: usize) -> ConversionStats {
    let top = components.iter().filter(|c| c.layer == Side::Top).count();
    ConversionStats {
        components: components.len(),
        top,
        bottom: components.len() - top,
        bom_groups,
    }
}

/// Core conversion API used by the CLI.
pub struct CentroidCore;

impl CentroidCore {
    /// Convert centroid text held in memory.
    ///
    /// `source_name` is the file name the text came from; it only seeds the
    /// background image URLs.
    pub fn convert_str(
        content: &str,
        source_name: &str,
        options: &ConversionOptions,
    ) -> Result<ConversionResult, CentroidError> {
        options.validate()?;
        let records = options.parser().parse_str(content)?;
        Self::build(&records, source_name, options)
    }

    /// Read and convert a centroid file.
    pub fn convert_file(
        path: &Path,
        options: &ConversionOptions,
    ) -> Result<ConversionResult, CentroidError> {
        options.validate()?;
        let file = File::open(path).map_err(CentroidParseError::from)?;
        let records = options.parser().parse_reader(file)?;
        Self::build(&records, &path.to_string_lossy(), options)
    }

    /// Convert records produced elsewhere.
    ///
    /// Records must carry unique ref designators; that is checked here since
    /// the builder relies on it.
    pub fn convert_records(
        records: &[PlacementRecord],
        source_name: &str,
        options: &ConversionOptions,
    ) -> Result<ConversionResult, CentroidError> {
        options.validate()?;
        check_unique_references(records)?;
        Self::build(records, source_name, options)
    }

    fn build(
        records: &[PlacementRecord],
        source_name: &str,
        options: &ConversionOptions,
    ) -> Result<ConversionResult, CentroidError> {
        let geometry = options.geometry();
        check_pixel_range(records, &geometry)?;

        let model = BoardModelBuilder::new(geometry).build(records, source_name);
        let stats = components_to_stats(&model.components, model.pcbdata.bom.both.len());

        tracing::info!(
            "Converted {}: {} components ({} top, {} bottom) in {} BOM groups",
            source_name,
            stats.components,
            stats.top,
            stats.bottom,
            stats.bom_groups
        );

        Ok(ConversionResult {
            source: source_name.to_string(),
            pcbdata: model.pcbdata,
            components: model.components,
            stats,
        })
    }
}

fn check_unique_references(records: &[PlacementRecord]) -> Result<(), CentroidError> {
    let mut seen: HashMap<&str, u64> = HashMap::new();
    for record in records {
        if let Some(&first_line) = seen.get(record.ref_designator.as_str()) {
            return Err(CentroidParseError::DuplicateReference {
                reference: record.ref_designator.clone(),
                line: record.line,
                first_line,
            }
            .into());
        }
        seen.insert(&record.ref_designator, record.line);
    }
    Ok(())
}

/// Every module center must be a finite pixel position; JSON has no
/// representation for an overflowed coordinate.
fn check_pixel_range(records: &[PlacementRecord], geometry: &BoardGeometry) -> Result<(), CentroidError> {
    for record in records {
        let [x_px, y_px] = record.pixel_center(geometry.width, geometry.height, geometry.scale);
        let (x, y) = record.position;
        let overflow = if !x_px.is_finite() {
            Some(("x", x))
        } else if !y_px.is_finite() {
            Some(("y", y))
        } else {
            None
        };
        if let Some((field, value)) = overflow {
            return Err(CentroidParseError::InvalidNumber {
                line: record.line,
                field,
                value: value.to_string(),
            }
            .into());
        }
    }
    Ok(())
}
