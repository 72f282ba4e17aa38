//! Top level `networks` entries

use super::binding::{bind_fields, fields, Field};
use super::convert::{self, expected, External};
use crate::error::{ComposeError, ComposeResult};
use crate::network::{NetworkCreate, NetworkDriver};
use serde::Serialize;
use serde_yaml::{Mapping, Value};

/// A network declared by the compose file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Network {
    #[serde(rename = "Create")]
    data: NetworkCreate,
    external: bool,
    /// Name given with `name:` or the legacy `external: {name: ...}`
    name: String,
}

impl Default for Network {
    fn default() -> Self {
        Self {
            data: NetworkCreate::with_driver(NetworkDriver::Bridge),
            external: false,
            name: String::new(),
        }
    }
}

impl Network {
    /// Parse one entry of the `networks` section; null declares a default bridge network
    pub fn new(config: &Value) -> ComposeResult<Self> {
        let mut network = Self::default();
        match config {
            Value::Null => {}
            Value::Mapping(config) => network.parse(config)?,
            other => return Err(expected("a map", other)),
        }
        Ok(network)
    }

    fn parse(&mut self, config: &Mapping) -> ComposeResult<()> {
        let mut external = External::default();
        let data = &mut self.data;
        bind_fields(
            config,
            fields![
                Field::new("driver", &mut data.driver).validate(validate_driver),
                Field::converted("driver_opts", &mut data.options, convert::string_map),
                Field::new("attachable", &mut data.attachable),
                Field::new("enable_ipv6", &mut data.enable_ipv6),
                Field::converted("ipam", &mut data.ipam, convert::ipam),
                Field::new("internal", &mut data.internal),
                Field::converted("labels", &mut data.labels, convert::labels),
                Field::converted("external", &mut external, convert::external),
                Field::new("name", &mut self.name),
            ],
        )?;

        if external.enabled {
            self.external = true;
            self.data = NetworkCreate::default();
            if let Some(name) = external.name.filter(|_| self.name.is_empty()) {
                self.name = name;
            }
        }
        Ok(())
    }

    /// Create body, zero valued for external networks
    pub fn create_config(&self) -> NetworkCreate {
        self.data.clone()
    }

    /// The name to look up for an external network, `None` when the network is created.
    ///
    /// The name is empty when the file relies on the entry's key.
    pub fn external_name(&self) -> Option<&str> {
        self.external.then_some(self.name.as_str())
    }

    pub fn is_external(&self) -> bool {
        self.external
    }

    /// Explicit name from `name:`, empty when unset
    pub fn name(&self) -> &str {
        &self.name
    }
}

fn validate_driver(driver: &String) -> ComposeResult<()> {
    driver
        .parse::<NetworkDriver>()
        .map(|_| ())
        .map_err(ComposeError::validation)
}
