use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::NetSyncError;

/// Options for an update pass (CLI or library callers).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UpdateOptions {
    /// Clear nets that end up with a single pad and no copper zone
    pub delete_single_pad_nets: bool,
    /// Remove board footprints that have no matching symbol
    pub delete_unused_components: bool,
    /// Report what would change without touching the board
    pub dry_run: bool,
    /// Swap footprints whose library id differs from the symbol's
    pub replace_footprints: bool,
    /// Match footprints by symbol path instead of reference designator
    pub lookup_by_timestamp: bool,
    /// Warn about copper pads the netlist leaves without a net
    pub warn_for_no_net_pads: bool,
    pub show_global_ratsnest: bool,
    pub add_unlocked_pads: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            delete_single_pad_nets: true,
            delete_unused_components: false,
            dry_run: false,
            replace_footprints: true,
            lookup_by_timestamp: false,
            warn_for_no_net_pads: false,
            show_global_ratsnest: true,
            add_unlocked_pads: true,
        }
    }
}

impl UpdateOptions {
    /// Load options from a JSON file; missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, NetSyncError> {
        let content = std::fs::read_to_string(path)?;
        let options = serde_json::from_str(&content)?;
        Ok(options)
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = UpdateOptions::default();
        assert!(options.delete_single_pad_nets);
        assert!(!options.delete_unused_components);
        assert!(!options.dry_run);
        assert!(options.replace_footprints);
        assert!(!options.lookup_by_timestamp);
        assert!(!options.warn_for_no_net_pads);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("netsync.json");
        std::fs::write(&path, r#"{ "delete_unused_components": true, "dry_run": true }"#).unwrap();

        let options = UpdateOptions::from_file(&path).unwrap();
        assert!(options.delete_unused_components);
        assert!(options.dry_run);
        assert!(options.replace_footprints);
    }

    #[test]
    fn test_bad_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("netsync.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(UpdateOptions::from_file(&path).is_err());
    }
}
