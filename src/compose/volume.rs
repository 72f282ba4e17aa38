//! Top level `volumes` entries

use super::binding::{bind_fields, fields, Field};
use super::convert::{self, expected, External};
use crate::error::ComposeResult;
use crate::storage::VolumeCreate;
use serde::Serialize;
use serde_yaml::{Mapping, Value};

/// A named volume declared by the compose file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Volume {
    #[serde(rename = "Create")]
    data: VolumeCreate,
    external: bool,
}

impl Volume {
    /// Parse one entry of the `volumes` section; null declares a default volume
    pub fn new(config: &Value) -> ComposeResult<Self> {
        let mut volume = Self::default();
        match config {
            Value::Null => {}
            Value::Mapping(config) => volume.parse(config)?,
            other => return Err(expected("a map", other)),
        }
        Ok(volume)
    }

    fn parse(&mut self, config: &Mapping) -> ComposeResult<()> {
        let mut external = External::default();
        let data = &mut self.data;
        bind_fields(
            config,
            fields![
                Field::new("driver", &mut data.driver),
                Field::converted("driver_opts", &mut data.driver_opts, convert::string_map),
                Field::converted("labels", &mut data.labels, convert::labels),
                Field::new("name", &mut data.name),
                Field::converted("external", &mut external, convert::external),
            ],
        )?;

        if external.enabled {
            let name = match external.name {
                Some(name) if self.data.name.is_empty() => name,
                _ => std::mem::take(&mut self.data.name),
            };
            self.external = true;
            self.data = VolumeCreate {
                name,
                ..VolumeCreate::default()
            };
        }
        Ok(())
    }

    /// Create body; external volumes are never created
    pub fn create_config(&self) -> VolumeCreate {
        if self.external {
            VolumeCreate::default()
        } else {
            self.data.clone()
        }
    }

    /// The name to look up for an external volume, `None` when the volume is created
    pub fn external_name(&self) -> Option<&str> {
        self.external.then_some(self.data.name.as_str())
    }

    pub fn is_external(&self) -> bool {
        self.external
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(input: &str) -> Value {
        serde_yaml::from_str(input).unwrap()
    }

    #[test]
    fn test_null_volume_is_default() {
        let volume = Volume::new(&Value::Null).unwrap();
        assert_eq!(volume.create_config(), VolumeCreate::default());
        assert_eq!(volume.external_name(), None);
    }

    #[test]
    fn test_parse_volume() {
        let volume = Volume::new(&yaml(
            r#"
            driver: local
            driver_opts: {type: nfs, o: "addr=10.40.0.199,nolock,soft,rw", device: ":/docker/example"}
            labels: {com.example.description: Database volume}
            name: data
            "#,
        ))
        .unwrap();

        let create = volume.create_config();
        assert_eq!(create.name, "data");
        assert_eq!(create.driver, "local");
        assert_eq!(create.driver_opts["type"], "nfs");
        assert_eq!(create.driver_opts["o"], "addr=10.40.0.199,nolock,soft,rw");
        assert_eq!(create.labels["com.example.description"], "Database volume");
    }

    #[test]
    fn test_external_volume() {
        let volume = Volume::new(&yaml("{external: true, name: Test, driver: local}")).unwrap();
        assert_eq!(volume.create_config(), VolumeCreate::default());
        assert_eq!(volume.external_name(), Some("Test"));

        let volume = Volume::new(&yaml("external: {name: legacy}")).unwrap();
        assert_eq!(volume.external_name(), Some("legacy"));
    }

    #[test]
    fn test_integer_for_any_key_fails() {
        for key in ["driver", "driver_opts", "labels", "name", "external"] {
            let mut config = Mapping::new();
            config.insert(Value::String(key.to_string()), yaml("0"));
            let err = Volume::new(&Value::Mapping(config)).unwrap_err();
            assert!(err.to_string().contains(key), "{}: {}", key, err);
        }
    }
}
