//! Centroid Record Definitions
//!
//! Typed rows read from a pick-and-place centroid file. Positions are kept
//! in the file's physical unit (millimeters); conversion into the viewer's
//! pixel space happens through [`Side::to_pixels`].

use serde::{Deserialize, Serialize};

/// Board face a component is mounted on.
///
/// Serialized with the layer names the viewer expects (`"F"` / `"B"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "F")]
    Top,
    #[serde(rename = "B")]
    Bottom,
}

impl Side {
    /// Map a side token from the centroid file.
    ///
    /// Only the exact token `top` selects the top side; every other token
    /// (including `bottom`, `bot`, or an empty cell) is treated as bottom.
    pub fn from_token(token: &str) -> Self {
        if token == "top" {
            Side::Top
        } else {
            Side::Bottom
        }
    }

    /// Layer name used by the viewer.
    pub fn as_layer(&self) -> &'static str {
        match self {
            Side::Top => "F",
            Side::Bottom => "B",
        }
    }

    /// Convert a physical position into pixel space.
    ///
    /// The Y axis is inverted against the board height. Bottom-side parts
    /// are also mirrored horizontally because that face is viewed from below.
    pub fn to_pixels(&self, position: (f64, f64), width: f64, height: f64, scale: f64) -> [f64; 2] {
        let (x, y) = position;
        let x_px = match self {
            Side::Top => x / scale,
            Side::Bottom => (width - x) / scale,
        };
        [x_px, (height - y) / scale]
    }
}

/// One accepted data row of a centroid file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementRecord {
    pub ref_designator: String,
    pub footprint: String,
    pub value: String,
    /// Raw (x, y) in millimeters, before any flip.
    pub position: (f64, f64),
    /// Degrees, exactly as read.
    pub rotation: f64,
    pub side: Side,
    /// 1-based line in the source text.
    pub line: u64,
}

impl PlacementRecord {
    pub fn pixel_center(&self, width: f64, height: f64, scale: f64) -> [f64; 2] {
        self.side.to_pixels(self.position, width, height, scale)
    }
}
