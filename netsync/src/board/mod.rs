//! Board document model
//!
//! The mutable physical-design document the updater reconciles: footprints
//! with their pads, the net table, copper zones and vias. All lengths are in
//! millimeters.

pub mod footprint;
pub mod net;

pub use footprint::{is_copper_layer, Attributes, Footprint, FootprintId, Pad};
pub use net::{NetInfo, NetTable, UNCONNECTED};

use serde::{Deserialize, Serialize};

/// 2D position in mm
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Page (drawing sheet) settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageSettings {
    pub paper: String,
    pub width: f64,
    pub height: f64,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self::from_paper("A4")
    }
}

impl PageSettings {
    /// Landscape size of a standard paper name; unknown names fall back to A4.
    pub fn from_paper(paper: &str) -> Self {
        let (width, height) = match paper {
            "A5" => (210.0, 148.0),
            "A3" => (420.0, 297.0),
            "A2" => (594.0, 420.0),
            "A1" => (841.0, 594.0),
            "A0" => (1189.0, 841.0),
            "A" | "USLetter" => (279.4, 215.9),
            "B" | "USLedger" => (431.8, 279.4),
            "USLegal" => (355.6, 215.9),
            _ => (297.0, 210.0),
        };
        Self {
            paper: paper.to_string(),
            width,
            height,
        }
    }

    pub fn center(&self) -> Position {
        Position::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Axis aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Position,
    pub max: Position,
}

impl BoundingBox {
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Position>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bbox = BoundingBox { min: first, max: first };
        for p in iter {
            bbox.min.x = bbox.min.x.min(p.x);
            bbox.min.y = bbox.min.y.min(p.y);
            bbox.max.x = bbox.max.x.max(p.x);
            bbox.max.y = bbox.max.y.max(p.y);
        }
        Some(bbox)
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Position {
        Position::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    /// Largest y; the board's y axis points down
    pub fn bottom(&self) -> f64 {
        self.max.y
    }
}

/// Copper zone (pour) or rule area
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Zone {
    pub uuid: String,
    pub net: u32,
    pub layers: Vec<String>,
    #[serde(default)]
    pub is_rule_area: bool,
    #[serde(default)]
    pub outline: Vec<Position>,
}

impl Zone {
    pub fn new(net: u32, layers: &[&str]) -> Self {
        Self {
            uuid: uuid::Uuid::new_v4().to_string(),
            net,
            layers: layers.iter().map(|l| l.to_string()).collect(),
            is_rule_area: false,
            outline: Vec::new(),
        }
    }

    pub fn is_on_copper_layer(&self) -> bool {
        self.layers.iter().any(|l| is_copper_layer(l))
    }

    /// Copper zone that takes part in net liveness and pruning
    pub fn is_copper_fill(&self) -> bool {
        self.is_on_copper_layer() && !self.is_rule_area
    }

    pub fn shares_layer(&self, layers: &[String]) -> bool {
        self.layers.iter().any(|zl| {
            layers
                .iter()
                .any(|l| l == zl || (l == "*.Cu" && is_copper_layer(zl)) || (zl == "*.Cu" && is_copper_layer(l)))
        })
    }

    /// Point-in-polygon test (even-odd). A zone without an outline covers
    /// the whole board.
    pub fn contains(&self, point: &Position) -> bool {
        if self.outline.len() < 3 {
            return true;
        }
        let mut inside = false;
        let n = self.outline.len();
        let mut j = n - 1;
        for i in 0..n {
            let a = &self.outline[i];
            let b = &self.outline[j];
            if (a.y > point.y) != (b.y > point.y)
                && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }
}

/// Via (vertical interconnect)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Via {
    pub uuid: String,
    pub net: u32,
    pub position: Position,
    #[serde(default)]
    pub size: f64,
    #[serde(default)]
    pub layers: (String, String),   // Start and end layers
}

impl Via {
    pub fn new(net: u32, position: Position) -> Self {
        Self {
            uuid: uuid::Uuid::new_v4().to_string(),
            net,
            position,
            size: 0.8,
            layers: ("F.Cu".to_string(), "B.Cu".to_string()),
        }
    }
}

/// Graphic line on the board outline layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EdgeSegment {
    pub start: Position,
    pub end: Position,
}

/// The whole board document
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Board {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub page: PageSettings,
    #[serde(default)]
    pub nets: NetTable,
    #[serde(default)]
    pub footprints: Vec<Footprint>,
    #[serde(default)]
    pub zones: Vec<Zone>,
    #[serde(default)]
    pub vias: Vec<Via>,
    #[serde(default)]
    pub edges: Vec<EdgeSegment>,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.footprints.is_empty()
            && self.zones.is_empty()
            && self.vias.is_empty()
            && self.edges.is_empty()
    }

    /// Bounding box of the board outline, or of every item when the board
    /// has no outline drawn.
    pub fn edges_bounding_box(&self) -> Option<BoundingBox> {
        if !self.edges.is_empty() {
            return BoundingBox::from_points(self.edges.iter().flat_map(|e| [&e.start, &e.end]));
        }
        let mut points: Vec<Position> = Vec::new();
        for fp in &self.footprints {
            points.push(fp.position);
            points.extend(fp.pads.iter().map(|p| fp.pad_position(p)));
        }
        points.extend(self.zones.iter().flat_map(|z| z.outline.iter().copied()));
        points.extend(self.vias.iter().map(|v| v.position));
        BoundingBox::from_points(points.iter())
    }

    pub fn find_footprint(&self, uuid: &str) -> Option<usize> {
        self.footprints.iter().position(|f| f.uuid == uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_zone() -> Zone {
        let mut zone = Zone::new(1, &["F.Cu"]);
        zone.outline = vec![
            Position::new(0.0, 0.0),
            Position::new(10.0, 0.0),
            Position::new(10.0, 10.0),
            Position::new(0.0, 10.0),
        ];
        zone
    }

    #[test]
    fn test_zone_contains() {
        let zone = square_zone();
        assert!(zone.contains(&Position::new(5.0, 5.0)));
        assert!(!zone.contains(&Position::new(15.0, 5.0)));
    }

    #[test]
    fn test_zone_layer_sharing() {
        let zone = square_zone();
        assert!(zone.shares_layer(&["*.Cu".to_string()]));
        assert!(zone.shares_layer(&["F.Cu".to_string(), "F.Mask".to_string()]));
        assert!(!zone.shares_layer(&["B.Cu".to_string()]));
    }

    #[test]
    fn test_rule_area_is_not_copper_fill() {
        let mut zone = square_zone();
        assert!(zone.is_copper_fill());
        zone.is_rule_area = true;
        assert!(!zone.is_copper_fill());
    }

    #[test]
    fn test_edges_bounding_box() {
        let mut board = Board::new();
        assert!(board.is_empty());
        board.edges.push(EdgeSegment {
            start: Position::new(0.0, 0.0),
            end: Position::new(50.0, 30.0),
        });
        let bbox = board.edges_bounding_box().unwrap();
        assert_eq!(bbox.center(), Position::new(25.0, 15.0));
        assert_eq!(bbox.bottom(), 30.0);
    }

    #[test]
    fn test_page_center() {
        let page = PageSettings::from_paper("A4");
        assert_eq!(page.center(), Position::new(148.5, 105.0));
    }
}
