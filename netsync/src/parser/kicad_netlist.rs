//! KiCad netlist reader (`.net`, S-expression "export" format).
//!
//! Components come from `(components (comp ...))`. Pin connections come from
//! `(nets (net (name ..) (node (ref ..) (pin ..) ...)))` and are attached to
//! their component afterwards, sorted by pin name.

use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::board::FootprintId;
use crate::netlist::{Component, ComponentNet, Netlist};
use crate::parser::sexp::{parse_document, ParseError, SExp};

#[derive(Debug, Error)]
pub enum NetlistParseError {
    #[error("S-expression parse error: {0}")]
    SExpParse(#[from] ParseError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid netlist format: {0}")]
    InvalidFormat(String),
}

pub struct NetlistParser;

impl NetlistParser {
    pub fn parse_netlist(path: &Path) -> Result<Netlist, NetlistParseError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_netlist_str(&content)
    }

    pub fn parse_netlist_str(content: &str) -> Result<Netlist, NetlistParseError> {
        let root = parse_document(content)?;
        if root.head() != Some("export") {
            return Err(NetlistParseError::InvalidFormat(format!(
                "Expected export root, found {}",
                root.head().unwrap_or("atom")
            )));
        }

        let mut netlist = Netlist::new();
        if let Some(components) = root.find("components") {
            for comp in components.find_all("comp") {
                netlist.add_component(Self::parse_component(comp)?);
            }
        }

        let mut pins: BTreeMap<String, Vec<ComponentNet>> = BTreeMap::new();
        if let Some(nets) = root.find("nets") {
            for net in nets.find_all("net") {
                let net_name = net.value_of("name").unwrap_or("").to_string();
                for node in net.find_all("node") {
                    let Some(reference) = node.value_of("ref") else {
                        continue;
                    };
                    pins.entry(reference.to_string())
                        .or_default()
                        .push(ComponentNet {
                            pin_name: node.value_of("pin").unwrap_or("").to_string(),
                            net_name: net_name.clone(),
                            pin_function: node.value_of("pinfunction").unwrap_or("").to_string(),
                            pin_type: node.value_of("pintype").unwrap_or("").to_string(),
                        });
                }
            }
        }

        for component in &mut netlist.components {
            if let Some(mut nets) = pins.remove(&component.reference) {
                nets.sort_by(|a, b| a.pin_name.cmp(&b.pin_name));
                component.nets = nets;
            }
        }

        tracing::debug!("Parsed netlist with {} components", netlist.len());
        Ok(netlist)
    }

    fn parse_component(comp: &SExp) -> Result<Component, NetlistParseError> {
        let reference = comp
            .value_of("ref")
            .ok_or_else(|| NetlistParseError::InvalidFormat("comp without ref".to_string()))?;

        let mut component = Component::new(
            reference,
            FootprintId::parse(comp.value_of("footprint").unwrap_or("")),
        );
        component.value = comp.value_of("value").unwrap_or("").to_string();
        component.path = Self::symbol_path(comp);

        for property in comp.find_all("property") {
            if let Some(name) = property.value_of("name") {
                let value = property.value_of("value").unwrap_or("");
                component.properties.insert(name.to_string(), value.to_string());
            }
        }

        Ok(component)
    }

    /// Sheet path timestamps joined with the symbol timestamp, e.g.
    /// `(sheetpath (tstamps "/abc/"))` + `(tstamps "def")` gives `/abc/def`.
    fn symbol_path(comp: &SExp) -> String {
        let sheet = comp
            .find("sheetpath")
            .and_then(|s| s.value_of("tstamps"))
            .unwrap_or("/");
        let stamp = comp
            .value_of("tstamps")
            .or_else(|| comp.value_of("tstamp"))
            .unwrap_or("");
        if stamp.is_empty() {
            return String::new();
        }
        if sheet.ends_with('/') {
            format!("{}{}", sheet, stamp)
        } else {
            format!("{}/{}", sheet, stamp)
        }
    }
}
