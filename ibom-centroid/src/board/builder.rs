//! Board Model Builder
//!
//! Turns an ordered list of placement records into the viewer's board
//! document: one module per record, a BOM grouped per side and across both
//! sides, and the board-level extents and background images.
//!
//! Module index `i` always corresponds to record `i`; BOM members refer to
//! modules by that index.

use std::collections::HashMap;
use std::path::Path;

use crate::board::schema::*;
use crate::parser::schema::{PlacementRecord, Side};

/// Millimeters per inch
pub const MM_PER_INCH: f64 = 25.4;

/// Default side of the footprint marker square: 0.1 inch, in millimeters.
pub const DEFAULT_MARKER_SIZE: f64 = 0.1 * MM_PER_INCH;

/// Board dimensions and the pixel scale of the background images.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardGeometry {
    /// Board width in millimeters
    pub width: f64,
    /// Board height in millimeters
    pub height: f64,
    /// Millimeters per pixel
    pub scale: f64,
    /// Side of the footprint marker in millimeters
    pub marker_size: f64,
}

impl BoardGeometry {
    pub fn new(width: f64, height: f64, scale: f64) -> Self {
        Self {
            width,
            height,
            scale,
            marker_size: DEFAULT_MARKER_SIZE,
        }
    }

    /// Marker square side in pixels.
    pub fn bbox_size(&self) -> f64 {
        self.marker_size / self.scale
    }

    pub fn edges_bbox(&self) -> EdgesBBox {
        EdgesBBox {
            minx: 0.0,
            miny: 0.0,
            maxx: self.width / self.scale,
            maxy: self.height / self.scale,
        }
    }
}

/// Output of [`BoardModelBuilder::build`]
#[derive(Debug, Clone)]
pub struct BoardModel {
    pub pcbdata: PcbData,
    pub components: Vec<Component>,
}

/// Builds a [`BoardModel`] from already-validated records.
pub struct BoardModelBuilder {
    geometry: BoardGeometry,
}

impl BoardModelBuilder {
    pub fn new(geometry: BoardGeometry) -> Self {
        Self { geometry }
    }

    /// Build the board document.
    ///
    /// `source_name` is the centroid file name; it only seeds the background
    /// image URLs. An empty record list yields an empty but valid document.
    pub fn build(&self, records: &[PlacementRecord], source_name: &str) -> BoardModel {
        let modules = self.build_modules(records);
        let bom = build_bom(records);
        let components = build_components(records);

        tracing::debug!(
            "Built {} modules, {} front / {} back / {} combined BOM groups",
            modules.len(),
            bom.front.len(),
            bom.back.len(),
            bom.both.len()
        );

        let pcbdata = PcbData {
            edges_bbox: self.geometry.edges_bbox(),
            edges: Vec::new(),
            silkscreen: background_layers(source_name),
            fabrication: LayerDrawings::default(),
            modules,
            metadata: Metadata::default(),
            bom,
            font_data: Default::default(),
            ibom_version: IBOM_VERSION.to_string(),
        };

        BoardModel {
            pcbdata,
            components,
        }
    }

    fn build_modules(&self, records: &[PlacementRecord]) -> Vec<Module> {
        let BoardGeometry {
            width,
            height,
            scale,
            ..
        } = self.geometry;
        let size = self.geometry.bbox_size();

        records
            .iter()
            .map(|record| {
                let center = record.pixel_center(width, height, scale);
                Module {
                    center,
                    bbox: ModuleBBox::square(center, size),
                    pads: Vec::new(),
                    drawings: Vec::new(),
                    layer: record.side,
                    reference: record.ref_designator.clone(),
                }
            })
            .collect()
    }
}

/// Groups records by (footprint, value), keeping first-seen group order.
#[derive(Default)]
struct BomGrouper<'a> {
    groups: Vec<BomGroup>,
    index: HashMap<(&'a str, &'a str), usize>,
}

impl<'a> BomGrouper<'a> {
    fn add(&mut self, record: &'a PlacementRecord, module_index: usize) {
        let key = (record.footprint.as_str(), record.value.as_str());
        let slot = match self.index.get(&key) {
            Some(&slot) => slot,
            None => {
                self.groups
                    .push(BomGroup::new(&record.value, &record.footprint));
                self.index.insert(key, self.groups.len() - 1);
                self.groups.len() - 1
            }
        };
        self.groups[slot].push(&record.ref_designator, module_index);
    }

    fn finish(self) -> Vec<BomGroup> {
        self.groups
    }
}

fn build_bom(records: &[PlacementRecord]) -> Bom {
    let mut front = BomGrouper::default();
    let mut back = BomGrouper::default();
    let mut both = BomGrouper::default();

    for (i, record) in records.iter().enumerate() {
        match record.side {
            Side::Top => front.add(record, i),
            Side::Bottom => back.add(record, i),
        }
        both.add(record, i);
    }

    Bom {
        front: front.finish(),
        back: back.finish(),
        both: both.finish(),
        skipped: Vec::new(),
    }
}

fn build_components(records: &[PlacementRecord]) -> Vec<Component> {
    records
        .iter()
        .map(|r| Component {
            reference: r.ref_designator.clone(),
            val: r.value.clone(),
            footprint: r.footprint.clone(),
            layer: r.side,
        })
        .collect()
}

/// Front/back background image URLs: the source name with its extension
/// replaced by `-front.png` / `-back.png`.
pub fn background_urls(source_name: &str) -> (String, String) {
    let stem = Path::new(source_name).with_extension("");
    let stem = stem.to_string_lossy();
    (format!("{}-front.png", stem), format!("{}-back.png", stem))
}

fn background_layers(source_name: &str) -> LayerDrawings {
    let (front, back) = background_urls(source_name);
    LayerDrawings {
        front: vec![Drawing::Url {
            start: [0.0, 0.0],
            url: front,
        }],
        back: vec![Drawing::Url {
            start: [0.0, 0.0],
            url: back,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(reference: &str, footprint: &str, value: &str, x: f64, y: f64, side: Side) -> PlacementRecord {
        PlacementRecord {
            ref_designator: reference.to_string(),
            footprint: footprint.to_string(),
            value: value.to_string(),
            position: (x, y),
            rotation: 0.0,
            side,
            line: 0,
        }
    }

    fn sample_records() -> Vec<PlacementRecord> {
        vec![
            record("R1", "0402", "10k", 12.5, 8.0, Side::Top),
            record("C1", "0603", "100n", 5.0, 5.0, Side::Bottom),
            record("R2", "0402", "10k", 20.0, 8.0, Side::Top),
            record("R3", "0402", "10k", 30.0, 9.0, Side::Bottom),
            record("R4", "0402", "1k", 31.0, 9.0, Side::Top),
        ]
    }

    fn builder() -> BoardModelBuilder {
        BoardModelBuilder::new(BoardGeometry::new(50.0, 40.0, 0.1))
    }

    #[test]
    fn test_module_placement() {
        let model = builder().build(&sample_records(), "board.xy");
        let modules = &model.pcbdata.modules;
        assert_eq!(modules.len(), 5);

        let r1 = &modules[0];
        assert_eq!(r1.reference, "R1");
        assert_eq!(r1.layer, Side::Top);
        assert!((r1.center[0] - 125.0).abs() < 1e-9);
        assert!((r1.center[1] - 320.0).abs() < 1e-9);

        let c1 = &modules[1];
        assert_eq!(c1.layer, Side::Bottom);
        assert!((c1.center[0] - 450.0).abs() < 1e-9);
        assert!((c1.center[1] - 350.0).abs() < 1e-9);
    }

    #[test]
    fn test_bbox_ignores_rotation() {
        let mut records = sample_records();
        records[0].rotation = 45.0;
        let model = builder().build(&records, "board.xy");
        let bbox = &model.pcbdata.modules[0].bbox;

        assert_eq!(bbox.angle, 0.0);
        assert_eq!(bbox.pos, model.pcbdata.modules[0].center);
        assert!((bbox.size[0] - 25.4).abs() < 1e-9);
        assert!((bbox.relpos[0] + 12.7).abs() < 1e-9);
    }

    #[test]
    fn test_bom_grouping_per_side() {
        let model = builder().build(&sample_records(), "board.xy");
        let bom = &model.pcbdata.bom;

        assert_eq!(bom.front.len(), 2);
        assert_eq!(bom.front[0].quantity, 2);
        assert_eq!(bom.front[0].value, "10k");
        assert_eq!(
            bom.front[0].members,
            vec![("R1".to_string(), 0), ("R2".to_string(), 2)]
        );
        assert_eq!(bom.front[1].members, vec![("R4".to_string(), 4)]);

        assert_eq!(bom.back.len(), 2);
        assert_eq!(bom.back[0].footprint, "0603");
        assert_eq!(bom.back[1].members, vec![("R3".to_string(), 3)]);
    }

    #[test]
    fn test_combined_bucket_ignores_side() {
        let model = builder().build(&sample_records(), "board.xy");
        let both = &model.pcbdata.bom.both;

        assert_eq!(both.len(), 3);
        assert_eq!(both[0].quantity, 3);
        let refs: Vec<&str> = both[0].references().collect();
        assert_eq!(refs, vec!["R1", "R2", "R3"]);
        assert_eq!(both[1].value, "100n");
        assert_eq!(both[2].value, "1k");
    }

    #[test]
    fn test_grouping_key_is_case_sensitive() {
        let records = vec![
            record("R1", "0402", "10k", 0.0, 0.0, Side::Top),
            record("R2", "0402", "10K", 0.0, 0.0, Side::Top),
        ];
        let model = builder().build(&records, "board.xy");
        assert_eq!(model.pcbdata.bom.front.len(), 2);
    }

    #[test]
    fn test_components_keep_input_order() {
        let model = builder().build(&sample_records(), "board.xy");
        let refs: Vec<&str> = model.components.iter().map(|c| c.reference.as_str()).collect();
        assert_eq!(refs, vec!["R1", "C1", "R2", "R3", "R4"]);
        assert_eq!(model.components[1].val, "100n");
        assert_eq!(model.components[1].layer, Side::Bottom);
    }

    #[test]
    fn test_edges_bbox_from_geometry() {
        let model = builder().build(&[], "board.xy");
        let bbox = model.pcbdata.edges_bbox;
        assert_eq!(bbox.minx, 0.0);
        assert_eq!(bbox.miny, 0.0);
        assert!((bbox.maxx - 500.0).abs() < 1e-9);
        assert!((bbox.maxy - 400.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_records() {
        let model = builder().build(&[], "board.xy");
        assert!(model.pcbdata.modules.is_empty());
        assert!(model.pcbdata.bom.front.is_empty());
        assert!(model.pcbdata.bom.back.is_empty());
        assert!(model.pcbdata.bom.both.is_empty());
        assert!(model.components.is_empty());
    }

    #[test]
    fn test_background_urls() {
        assert_eq!(
            background_urls("board.xy"),
            ("board-front.png".to_string(), "board-back.png".to_string())
        );
        assert_eq!(
            background_urls("out/rev.b/board.pos.csv").0,
            "out/rev.b/board.pos-front.png"
        );
        assert_eq!(background_urls("board").1, "board-back.png");
    }

    #[test]
    fn test_silkscreen_carries_backgrounds() {
        let model = builder().build(&[], "panel.xy");
        let silk = &model.pcbdata.silkscreen;
        assert_eq!(
            silk.layer(Side::Top),
            &[Drawing::Url {
                start: [0.0, 0.0],
                url: "panel-front.png".to_string()
            }]
        );
        assert_eq!(silk.back.len(), 1);
        assert!(model.pcbdata.fabrication.front.is_empty());
        assert!(model.pcbdata.edges.is_empty());
    }
}
