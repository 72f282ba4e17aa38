//! Volume records

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Volume create body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct VolumeCreate {
    /// Volume name
    pub name: String,
    /// Volume driver
    pub driver: String,
    /// Driver options
    pub driver_opts: HashMap<String, String>,
    /// Volume labels
    pub labels: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_create_serializes_engine_names() {
        let mut volume = VolumeCreate {
            driver: "local".to_string(),
            ..VolumeCreate::default()
        };
        volume.driver_opts.insert("type".to_string(), "nfs".to_string());

        let json = serde_json::to_value(&volume).unwrap();
        assert_eq!(json["Driver"], "local");
        assert_eq!(json["DriverOpts"]["type"], "nfs");
    }
}
