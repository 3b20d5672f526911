//! Board-wide net table.
//!
//! Net code 0 is the unnamed "no connection" sentinel. It always exists and
//! is never stale.

use serde::{Deserialize, Serialize};

/// Net code of the unconnected sentinel.
pub const UNCONNECTED: u32 = 0;

/// A named electrical net on the board
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetInfo {
    pub code: u32,
    pub name: String,
    #[serde(default = "default_current")]
    pub is_current: bool,
}

fn default_current() -> bool {
    true
}

impl NetInfo {
    pub fn new(code: u32, name: impl Into<String>) -> Self {
        Self {
            code,
            name: name.into(),
            is_current: true,
        }
    }

    pub fn is_unconnected(&self) -> bool {
        self.code == UNCONNECTED
    }
}

/// Ordered list of nets, unique by name and by code
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetTable {
    nets: Vec<NetInfo>,
}

impl Default for NetTable {
    fn default() -> Self {
        Self {
            nets: vec![NetInfo::new(UNCONNECTED, "")],
        }
    }
}

impl NetTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a net. An existing entry with the same code is replaced; the
    /// sentinel cannot be renamed.
    pub fn add(&mut self, net: NetInfo) {
        if net.code == UNCONNECTED {
            return;
        }
        if let Some(existing) = self.nets.iter_mut().find(|n| n.code == net.code) {
            *existing = net;
        } else {
            self.nets.push(net);
        }
    }

    pub fn find(&self, name: &str) -> Option<&NetInfo> {
        self.nets.iter().find(|n| n.name == name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut NetInfo> {
        self.nets.iter_mut().find(|n| n.name == name)
    }

    pub fn by_code(&self, code: u32) -> Option<&NetInfo> {
        self.nets.iter().find(|n| n.code == code)
    }

    /// Name of a net code, empty for the sentinel or unknown codes.
    pub fn name_of(&self, code: u32) -> &str {
        self.by_code(code).map(|n| n.name.as_str()).unwrap_or("")
    }

    /// Smallest code greater than every code in the table
    pub fn next_code(&self) -> u32 {
        self.nets.iter().map(|n| n.code).max().unwrap_or(UNCONNECTED) + 1
    }

    pub fn remove(&mut self, code: u32) -> Option<NetInfo> {
        if code == UNCONNECTED {
            return None;
        }
        let pos = self.nets.iter().position(|n| n.code == code)?;
        Some(self.nets.remove(pos))
    }

    pub fn iter(&self) -> impl Iterator<Item = &NetInfo> {
        self.nets.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut NetInfo> {
        self.nets.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.nets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nets.len() <= 1
    }
}
