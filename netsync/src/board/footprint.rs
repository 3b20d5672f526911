//! Footprints and their pads.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::net::UNCONNECTED;
use super::Position;

/// Library identifier of a footprint type, written `library:name`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct FootprintId {
    pub library: String,
    pub name: String,
}

impl FootprintId {
    pub fn new(library: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            library: library.into(),
            name: name.into(),
        }
    }

    /// Parse `library:name`. A string without a colon is a bare name.
    pub fn parse(s: &str) -> Self {
        match s.split_once(':') {
            Some((library, name)) => Self::new(library, name),
            None => Self::new("", s),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

impl fmt::Display for FootprintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.library.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}:{}", self.library, self.name)
        }
    }
}

/// Fabrication attribute bits of a footprint
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attributes(pub u32);

impl Attributes {
    pub const THROUGH_HOLE: u32 = 0x0001;
    pub const SMD: u32 = 0x0002;
    pub const EXCLUDE_FROM_POS_FILES: u32 = 0x0004;
    pub const EXCLUDE_FROM_BOM: u32 = 0x0008;
    pub const BOARD_ONLY: u32 = 0x0010;

    pub fn contains(&self, bit: u32) -> bool {
        self.0 & bit != 0
    }

    pub fn set(&mut self, bit: u32, on: bool) {
        if on {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
    }
}

/// Pad on a footprint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pad {
    pub name: String,
    pub net: u32,                   // Net code, 0 when unconnected
    #[serde(default)]
    pub pin_function: String,
    #[serde(default)]
    pub pin_type: String,
    pub layers: Vec<String>,
    pub offset: Position,           // Relative to the footprint origin (mm)
    #[serde(default)]
    pub size: (f64, f64),
    #[serde(default = "default_visible")]
    pub local_ratsnest_visible: bool,
    #[serde(default)]
    pub locked: bool,
}

fn default_visible() -> bool {
    true
}

impl Pad {
    pub fn new(name: impl Into<String>, layers: &[&str]) -> Self {
        Self {
            name: name.into(),
            net: UNCONNECTED,
            pin_function: String::new(),
            pin_type: String::new(),
            layers: layers.iter().map(|l| l.to_string()).collect(),
            offset: Position::default(),
            size: (1.0, 1.0),
            local_ratsnest_visible: true,
            locked: false,
        }
    }

    pub fn is_on_copper_layer(&self) -> bool {
        self.layers.iter().any(|l| is_copper_layer(l))
    }
}

/// `F.Cu`, `B.Cu`, `In1.Cu` and the `*.Cu` wildcard are copper.
pub fn is_copper_layer(name: &str) -> bool {
    name.ends_with(".Cu")
}

/// Placed instance of a footprint type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Footprint {
    pub uuid: String,
    pub reference: String,
    pub value: String,
    pub fpid: FootprintId,
    #[serde(default)]
    pub path: String,               // Symbol path, e.g. "/<sheet>/<symbol>"
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub locked: bool,
    pub layer: String,
    pub position: Position,
    #[serde(default)]
    pub rotation: f64,              // Degrees
    pub pads: Vec<Pad>,
}

impl Footprint {
    pub fn new(reference: impl Into<String>, fpid: FootprintId) -> Self {
        Self {
            uuid: uuid::Uuid::new_v4().to_string(),
            reference: reference.into(),
            value: String::new(),
            fpid,
            path: String::new(),
            properties: BTreeMap::new(),
            attributes: Attributes::default(),
            locked: false,
            layer: "F.Cu".to_string(),
            position: Position::default(),
            rotation: 0.0,
            pads: Vec::new(),
        }
    }

    pub fn with_pad(mut self, pad: Pad) -> Self {
        self.pads.push(pad);
        self
    }

    pub fn find_pad_by_name(&self, name: &str) -> Option<&Pad> {
        self.pads.iter().find(|p| p.name == name)
    }

    pub fn is_board_only(&self) -> bool {
        self.attributes.contains(Attributes::BOARD_ONLY)
    }

    pub fn is_excluded_from_bom(&self) -> bool {
        self.attributes.contains(Attributes::EXCLUDE_FROM_BOM)
    }

    /// Absolute position of a pad, applying footprint rotation
    pub fn pad_position(&self, pad: &Pad) -> Position {
        let (sin_r, cos_r) = self.rotation.to_radians().sin_cos();
        Position {
            x: self.position.x + pad.offset.x * cos_r - pad.offset.y * sin_r,
            y: self.position.y + pad.offset.x * sin_r + pad.offset.y * cos_r,
        }
    }
}
