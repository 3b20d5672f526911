//! KiCAD PCB Parser
//!
//! Reads KiCAD board files (.kicad_pcb) and footprint files (.kicad_mod)
//! into the board model.
//!
//! Key format details:
//! - All values are in millimeters
//! - Pads and vias carry `(net <code> "<name>")`, zones add `(net_name ..)`
//! - Rule areas are zones with a `(keepout ...)` section
//! - Only `Edge.Cuts` graphics are kept (for the board bounding box)

use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::board::*;
use crate::parser::sexp::{parse_document, ParseError, SExp};

#[derive(Debug, Error)]
pub enum PcbParseError {
    #[error("S-expression parse error: {0}")]
    SExpParse(#[from] ParseError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid PCB format: {0}")]
    InvalidFormat(String),
    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Parser for KiCAD board and footprint files
pub struct PcbParser;

impl PcbParser {
    pub fn parse_pcb(path: &Path) -> Result<Board, PcbParseError> {
        let content = std::fs::read_to_string(path)?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_string();
        Self::parse_pcb_str(&content, &filename)
    }

    pub fn parse_pcb_str(content: &str, filename: &str) -> Result<Board, PcbParseError> {
        let root = parse_document(content)?;
        match root.head() {
            Some("kicad_pcb") => {}
            other => {
                return Err(PcbParseError::InvalidFormat(format!(
                    "Expected kicad_pcb, found {}",
                    other.unwrap_or("atom")
                )))
            }
        }

        let mut board = Board {
            filename: filename.to_string(),
            ..Default::default()
        };

        let items = root.as_list().unwrap_or(&[]);
        // Net declarations come first in the file, but do not rely on it.
        for item in items.iter().filter(|i| i.head() == Some("net")) {
            if let Ok(net) = Self::parse_net(item) {
                board.nets.add(net);
            }
        }

        for item in items.iter().skip(1) {
            match item.head() {
                Some("paper") => {
                    if let Some(paper) = item.atom_at(1) {
                        board.page = PageSettings::from_paper(paper);
                    }
                }
                Some("footprint") | Some("module") => match Self::parse_footprint(item) {
                    Ok(fp) => board.footprints.push(fp),
                    Err(e) => tracing::warn!("Skipping footprint: {}", e),
                },
                Some("via") => match Self::parse_via(item) {
                    Ok(via) => board.vias.push(via),
                    Err(e) => tracing::warn!("Skipping via: {}", e),
                },
                Some("zone") => board.zones.push(Self::parse_zone(item, &board.nets)),
                Some("gr_line") | Some("gr_rect") | Some("gr_arc") => {
                    if item.value_of("layer") == Some("Edge.Cuts") {
                        if let (Some(start), Some(end)) =
                            (Self::parse_xy(item, "start"), Self::parse_xy(item, "end"))
                        {
                            board.edges.push(EdgeSegment { start, end });
                        }
                    }
                }
                _ => {
                    // Tracks, drawings and setup are not needed for synchronization
                }
            }
        }

        tracing::debug!(
            "Parsed board {} ({} footprints, {} nets, {} zones, {} vias)",
            filename,
            board.footprints.len(),
            board.nets.len(),
            board.zones.len(),
            board.vias.len()
        );
        Ok(board)
    }

    /// Parse a standalone footprint file (.kicad_mod).
    pub fn parse_footprint_str(content: &str) -> Result<Footprint, PcbParseError> {
        let root = parse_document(content)?;
        match root.head() {
            Some("footprint") | Some("module") => Self::parse_footprint(&root),
            other => Err(PcbParseError::InvalidFormat(format!(
                "Expected footprint, found {}",
                other.unwrap_or("atom")
            ))),
        }
    }

    fn parse_net(sexp: &SExp) -> Result<NetInfo, PcbParseError> {
        let code = sexp
            .atom_at(1)
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| PcbParseError::MissingField("net code".to_string()))?;
        let name = sexp.atom_at(2).unwrap_or("");
        Ok(NetInfo::new(code, name))
    }

    /// Footprint from a `(footprint ...)` or legacy `(module ...)` list. The
    /// footprint identifier is the second element.
    pub fn parse_footprint(sexp: &SExp) -> Result<Footprint, PcbParseError> {
        let fpid = sexp
            .atom_at(1)
            .map(FootprintId::parse)
            .ok_or_else(|| PcbParseError::MissingField("footprint id".to_string()))?;

        let mut fp = Footprint::new("", fpid);
        if let Some(uuid) = sexp.value_of("uuid").or_else(|| sexp.value_of("tstamp")) {
            fp.uuid = uuid.to_string();
        }
        fp.layer = sexp.value_of("layer").unwrap_or("F.Cu").to_string();
        fp.path = sexp.value_of("path").unwrap_or("").to_string();
        fp.locked = sexp.has_flag("locked") || sexp.value_of("locked") == Some("yes");
        if let Some(at) = sexp.find("at") {
            fp.position = Self::position_of(at);
            fp.rotation = at.atom_at(3).and_then(|s| s.parse().ok()).unwrap_or(0.0);
        }

        let attrs = sexp.atoms_of("attr");
        for attr in &attrs {
            match attr.as_str() {
                "through_hole" => fp.attributes.set(Attributes::THROUGH_HOLE, true),
                "smd" => fp.attributes.set(Attributes::SMD, true),
                "exclude_from_pos_files" => fp.attributes.set(Attributes::EXCLUDE_FROM_POS_FILES, true),
                "exclude_from_bom" => fp.attributes.set(Attributes::EXCLUDE_FROM_BOM, true),
                "board_only" => fp.attributes.set(Attributes::BOARD_ONLY, true),
                _ => {}
            }
        }

        let mut properties = BTreeMap::new();
        for prop in sexp.find_all("property") {
            if let (Some(key), Some(val)) = (prop.atom_at(1), prop.atom_at(2)) {
                match key {
                    "Reference" => fp.reference = val.to_string(),
                    "Value" => fp.value = val.to_string(),
                    // Fields that mirror footprint state are not user properties
                    "Footprint" | "Datasheet" | "Description" => {}
                    _ => {
                        properties.insert(key.to_string(), val.to_string());
                    }
                }
            }
        }
        fp.properties = properties;

        // Older format keeps reference/value in fp_text
        for text in sexp.find_all("fp_text") {
            match (text.atom_at(1), text.atom_at(2)) {
                (Some("reference"), Some(val)) => fp.reference = val.to_string(),
                (Some("value"), Some(val)) => fp.value = val.to_string(),
                _ => {}
            }
        }

        for pad in sexp.find_all("pad") {
            fp.pads.push(Self::parse_pad(pad)?);
        }

        Ok(fp)
    }

    fn parse_pad(sexp: &SExp) -> Result<Pad, PcbParseError> {
        let name = sexp
            .atom_at(1)
            .ok_or_else(|| PcbParseError::MissingField("pad number".to_string()))?;
        let layers = sexp.atoms_of("layers");
        let mut pad = Pad::new(name, &[]);
        pad.layers = layers;
        pad.offset = sexp.find("at").map(Self::position_of).unwrap_or_default();
        if let Some(size) = sexp.find("size") {
            let w = size.atom_at(1).and_then(|s| s.parse().ok()).unwrap_or(0.0);
            let h = size.atom_at(2).and_then(|s| s.parse().ok()).unwrap_or(w);
            pad.size = (w, h);
        }
        pad.net = sexp
            .find("net")
            .and_then(|n| n.atom_at(1))
            .and_then(|s| s.parse().ok())
            .unwrap_or(UNCONNECTED);
        pad.pin_function = sexp.value_of("pinfunction").unwrap_or("").to_string();
        pad.pin_type = sexp.value_of("pintype").unwrap_or("").to_string();
        pad.locked = sexp.has_flag("locked");
        Ok(pad)
    }

    fn parse_via(sexp: &SExp) -> Result<Via, PcbParseError> {
        let at = sexp
            .find("at")
            .ok_or_else(|| PcbParseError::MissingField("via at".to_string()))?;
        let mut via = Via::new(
            sexp.value_of("net").and_then(|s| s.parse().ok()).unwrap_or(UNCONNECTED),
            Self::position_of(at),
        );
        if let Some(uuid) = sexp.value_of("uuid").or_else(|| sexp.value_of("tstamp")) {
            via.uuid = uuid.to_string();
        }
        via.size = sexp.f64_of("size").unwrap_or(via.size);
        let layers = sexp.atoms_of("layers");
        if layers.len() >= 2 {
            via.layers = (layers[0].clone(), layers[1].clone());
        }
        Ok(via)
    }

    fn parse_zone(sexp: &SExp, nets: &NetTable) -> Zone {
        // Prefer the net name: codes in hand-edited files are often stale
        let net = match sexp.value_of("net_name").and_then(|name| nets.find(name)) {
            Some(info) => info.code,
            None => sexp.value_of("net").and_then(|s| s.parse().ok()).unwrap_or(UNCONNECTED),
        };
        let mut layers = sexp.atoms_of("layers");
        if layers.is_empty() {
            layers = sexp.atoms_of("layer");
        }
        let mut zone = Zone::new(net, &[]);
        zone.layers = layers;
        if let Some(uuid) = sexp.value_of("uuid").or_else(|| sexp.value_of("tstamp")) {
            zone.uuid = uuid.to_string();
        }
        zone.is_rule_area = sexp.find("keepout").is_some();
        if let Some(pts) = sexp.find("polygon").and_then(|p| p.find("pts")) {
            zone.outline = Self::parse_pts(pts);
        }
        zone
    }

    fn position_of(at: &SExp) -> Position {
        let x = at.atom_at(1).and_then(|s| s.parse().ok()).unwrap_or(0.0);
        let y = at.atom_at(2).and_then(|s| s.parse().ok()).unwrap_or(0.0);
        Position::new(x, y)
    }

    fn parse_xy(sexp: &SExp, key: &str) -> Option<Position> {
        sexp.find(key).map(Self::position_of)
    }

    fn parse_pts(pts: &SExp) -> Vec<Position> {
        pts.find_all("xy").map(Self::position_of).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOARD: &str = r#"(kicad_pcb (version 20211014) (generator pcbnew)
      (paper "A4")
      (net 0 "")
      (net 1 "GND")
      (net 2 "VCC")
      (footprint "Resistor_SMD:R_0603" (layer "F.Cu") locked
        (uuid "fp-r1")
        (at 100 50 90)
        (property "Reference" "R1")
        (property "Value" "10k")
        (property "Sheetfile" "main.kicad_sch")
        (path "/aaaa-0001")
        (attr smd exclude_from_bom)
        (pad "1" smd rect (at -0.8 0) (size 0.8 0.9) (layers "F.Cu" "F.Paste" "F.Mask") (net 1 "GND") (pintype "passive"))
        (pad "2" smd rect (at 0.8 0) (size 0.8 0.9) (layers "F.Cu" "F.Paste" "F.Mask") (net 2 "VCC")))
      (via (at 110 50) (size 0.8) (drill 0.4) (layers "F.Cu" "B.Cu") (net 1) (uuid "via-1"))
      (zone (net 1) (net_name "GND") (layer "B.Cu") (uuid "zone-1")
        (polygon (pts (xy 90 40) (xy 130 40) (xy 130 70) (xy 90 70))))
      (zone (net 0) (net_name "") (layers "F.Cu" "B.Cu") (uuid "zone-2")
        (keepout (tracks not_allowed))
        (polygon (pts (xy 0 0) (xy 1 0) (xy 1 1))))
      (gr_line (start 80 30) (end 140 30) (layer "Edge.Cuts") (width 0.1))
      (gr_line (start 140 30) (end 140 80) (layer "Edge.Cuts") (width 0.1))
      (gr_line (start 0 0) (end 5 5) (layer "F.SilkS") (width 0.1)))"#;

    #[test]
    fn test_parse_board() {
        let board = PcbParser::parse_pcb_str(BOARD, "test.kicad_pcb").unwrap();
        assert_eq!(board.filename, "test.kicad_pcb");
        assert_eq!(board.nets.find("GND").map(|n| n.code), Some(1));
        assert_eq!(board.footprints.len(), 1);
        assert_eq!(board.vias.len(), 1);
        assert_eq!(board.zones.len(), 2);
        assert_eq!(board.edges.len(), 2);
    }

    #[test]
    fn test_parse_footprint_fields() {
        let board = PcbParser::parse_pcb_str(BOARD, "test.kicad_pcb").unwrap();
        let fp = &board.footprints[0];
        assert_eq!(fp.uuid, "fp-r1");
        assert_eq!(fp.reference, "R1");
        assert_eq!(fp.value, "10k");
        assert_eq!(fp.path, "/aaaa-0001");
        assert_eq!(fp.rotation, 90.0);
        assert!(fp.locked);
        assert!(fp.is_excluded_from_bom());
        assert_eq!(fp.properties.get("Sheetfile").map(String::as_str), Some("main.kicad_sch"));
        assert!(!fp.properties.contains_key("Reference"));
        assert_eq!(fp.pads[0].net, 1);
        assert_eq!(fp.pads[0].pin_type, "passive");
        assert!(fp.pads[1].is_on_copper_layer());
    }

    #[test]
    fn test_parse_zones() {
        let board = PcbParser::parse_pcb_str(BOARD, "test.kicad_pcb").unwrap();
        assert_eq!(board.zones[0].net, 1);
        assert_eq!(board.zones[0].layers, vec!["B.Cu"]);
        assert_eq!(board.zones[0].outline.len(), 4);
        assert!(board.zones[1].is_rule_area);
        assert_eq!(board.zones[1].layers.len(), 2);
    }

    #[test]
    fn test_parse_footprint_file() {
        let fp = PcbParser::parse_footprint_str(
            r#"(footprint "R_0603" (layer "F.Cu")
                 (fp_text reference "REF**" (at 0 -1))
                 (pad "1" smd rect (at -0.8 0) (size 0.8 0.9) (layers "F.Cu") (net 7 "STRAY")))"#,
        )
        .unwrap();
        assert_eq!(fp.reference, "REF**");
        assert_eq!(fp.pads[0].net, 7);
    }

    #[test]
    fn test_rejects_non_board() {
        assert!(matches!(
            PcbParser::parse_pcb_str("(export)", "x"),
            Err(PcbParseError::InvalidFormat(_))
        ));
    }
}
