//! pcbdata Schema Definitions
//!
//! Data structures for the board document consumed by the InteractiveHtmlBom
//! viewer. Field and key names follow the viewer's JSON layout exactly, so the
//! serde attributes here are the wire format.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::parser::schema::Side;

/// Version tag stamped on every generated document.
pub const IBOM_VERSION: &str = "v1.3";

/// Complete board document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PcbData {
    pub edges_bbox: EdgesBBox,
    pub edges: Vec<Drawing>,
    pub silkscreen: LayerDrawings,
    pub fabrication: LayerDrawings,
    pub modules: Vec<Module>,
    pub metadata: Metadata,
    pub bom: Bom,
    pub font_data: BTreeMap<String, serde_json::Value>,
    pub ibom_version: String,
}

/// Board outline extents in pixels
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct EdgesBBox {
    pub minx: f64,
    pub miny: f64,
    pub maxx: f64,
    pub maxy: f64,
}

/// Drawings split by board face
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LayerDrawings {
    #[serde(rename = "F")]
    pub front: Vec<Drawing>,
    #[serde(rename = "B")]
    pub back: Vec<Drawing>,
}

impl LayerDrawings {
    pub fn layer(&self, side: Side) -> &[Drawing] {
        match side {
            Side::Top => &self.front,
            Side::Bottom => &self.back,
        }
    }
}

/// A drawing primitive. Centroid input only ever produces background images.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Drawing {
    /// Image referenced by URL, anchored at `start`
    Url { start: [f64; 2], url: String },
}

/// Placement of one component (the viewer calls these modules)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub center: [f64; 2],
    pub bbox: ModuleBBox,
    pub pads: Vec<serde_json::Value>,
    pub drawings: Vec<Drawing>,
    pub layer: Side,
    #[serde(rename = "ref")]
    pub reference: String,
}

/// Footprint marker box
///
/// `pos` is the anchor point and `relpos` the offset of the box's corner from
/// it, so a square of side `s` centred on the anchor has `relpos = [-s/2, -s/2]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModuleBBox {
    pub angle: f64,
    pub pos: [f64; 2],
    pub relpos: [f64; 2],
    pub size: [f64; 2],
}

impl ModuleBBox {
    /// Axis-aligned square of side `size` centred on `center`.
    pub fn square(center: [f64; 2], size: f64) -> Self {
        Self {
            angle: 0.0,
            pos: center,
            relpos: [size * -0.5, size * -0.5],
            size: [size, size],
        }
    }

    /// (min, max) corners in pixel space.
    pub fn corners(&self) -> ([f64; 2], [f64; 2]) {
        let min = [self.pos[0] + self.relpos[0], self.pos[1] + self.relpos[1]];
        let max = [min[0] + self.size[0], min[1] + self.size[1]];
        (min, max)
    }
}

/// Title block. Centroid files carry none, so these are fixed placeholders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Metadata {
    pub title: String,
    pub company: String,
    pub revision: String,
    pub date: String,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            title: "unamed".to_string(),
            company: "unamed".to_string(),
            revision: "v0.0".to_string(),
            date: String::new(),
        }
    }
}

/// Bill of materials, bucketed by board face
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Bom {
    #[serde(rename = "F")]
    pub front: Vec<BomGroup>,
    #[serde(rename = "B")]
    pub back: Vec<BomGroup>,
    /// Groups ignoring the side
    pub both: Vec<BomGroup>,
    /// Indices of modules left out of the BOM. Always empty for centroid input.
    pub skipped: Vec<usize>,
}

impl Bom {
    pub fn side(&self, side: Side) -> &[BomGroup] {
        match side {
            Side::Top => &self.front,
            Side::Bottom => &self.back,
        }
    }

    pub fn total_quantity(groups: &[BomGroup]) -> usize {
        groups.iter().map(|g| g.quantity).sum()
    }
}

/// Wire form of a BOM row: `[qty, value, footprint, [[ref, index], ...], extra]`
#[derive(Serialize, Deserialize)]
struct BomRow(usize, String, String, Vec<(String, usize)>, Vec<String>);

/// Components sharing footprint and value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BomRow", into = "BomRow")]
pub struct BomGroup {
    pub quantity: usize,
    pub value: String,
    pub footprint: String,
    /// (ref designator, index into `PcbData::modules`), in input order
    pub members: Vec<(String, usize)>,
    pub extra_fields: Vec<String>,
}

impl BomGroup {
    pub fn new(value: &str, footprint: &str) -> Self {
        Self {
            quantity: 0,
            value: value.to_string(),
            footprint: footprint.to_string(),
            members: Vec::new(),
            extra_fields: Vec::new(),
        }
    }

    pub fn push(&mut self, reference: &str, index: usize) {
        self.members.push((reference.to_string(), index));
        self.quantity += 1;
    }

    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|(r, _)| r.as_str())
    }
}

impl From<BomRow> for BomGroup {
    fn from(row: BomRow) -> Self {
        let BomRow(quantity, value, footprint, members, extra_fields) = row;
        Self {
            quantity,
            value,
            footprint,
            members,
            extra_fields,
        }
    }
}

impl From<BomGroup> for BomRow {
    fn from(group: BomGroup) -> Self {
        BomRow(
            group.quantity,
            group.value,
            group.footprint,
            group.members,
            group.extra_fields,
        )
    }
}

/// Ungrouped view of one component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    #[serde(rename = "ref")]
    pub reference: String,
    pub val: String,
    pub footprint: String,
    pub layer: Side,
}
