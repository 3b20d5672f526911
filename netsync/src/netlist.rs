//! Netlist model
//!
//! The authoritative, read-only component list exported from a schematic.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::board::FootprintId;

/// Property marking a symbol that has no board representation
pub const EXCLUDE_FROM_BOARD: &str = "exclude_from_board";
/// Property marking a symbol that is left out of the bill of materials
pub const EXCLUDE_FROM_BOM: &str = "exclude_from_bom";

/// Connection of one component pin to a net
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComponentNet {
    pub pin_name: String,
    pub net_name: String,
    #[serde(default)]
    pub pin_function: String,
    #[serde(default)]
    pub pin_type: String,
}

impl ComponentNet {
    pub fn new(pin_name: impl Into<String>, net_name: impl Into<String>) -> Self {
        Self {
            pin_name: pin_name.into(),
            net_name: net_name.into(),
            pin_function: String::new(),
            pin_type: String::new(),
        }
    }
}

/// One schematic symbol instance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Component {
    pub reference: String,
    #[serde(default)]
    pub value: String,
    pub fpid: FootprintId,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub nets: Vec<ComponentNet>,
}

impl Component {
    pub fn new(reference: impl Into<String>, fpid: FootprintId) -> Self {
        Self {
            reference: reference.into(),
            value: String::new(),
            fpid,
            path: String::new(),
            properties: BTreeMap::new(),
            nets: Vec::new(),
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_net(mut self, pin_name: &str, net_name: &str) -> Self {
        self.nets.push(ComponentNet::new(pin_name, net_name));
        self
    }

    /// Net entry for a pad name; empty names never match.
    pub fn net_for_pin(&self, pin_name: &str) -> Option<&ComponentNet> {
        if pin_name.is_empty() {
            return None;
        }
        self.nets.iter().find(|n| n.pin_name == pin_name)
    }

    pub fn has_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    pub fn is_excluded_from_board(&self) -> bool {
        self.has_property(EXCLUDE_FROM_BOARD)
    }
}

/// Ordered list of components
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Netlist {
    pub components: Vec<Component>,
}

impl Netlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_component(&mut self, component: Component) {
        self.components.push(component);
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn component_by_reference(&self, reference: &str) -> Option<&Component> {
        self.components
            .iter()
            .find(|c| c.reference.eq_ignore_ascii_case(reference))
    }

    pub fn component_by_path(&self, path: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.path == path)
    }

    /// Every net name referenced by any component pin
    pub fn net_names(&self) -> BTreeSet<String> {
        self.components
            .iter()
            .flat_map(|c| c.nets.iter().map(|n| n.net_name.clone()))
            .collect()
    }
}
