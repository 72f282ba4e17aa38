//! Compose stack assembly
//!
//! A [`Stack`] is the translated form of one compose document: the schema
//! version plus the services, networks and volumes it declares, each keyed by
//! name in document order.

use super::convert::{as_mapping, key_string};
use super::network::Network;
use super::service::Service;
use super::volume::Volume;
use crate::container::{ContainerConfig, HostConfig};
use crate::error::{ComposeError, ComposeResult};
use crate::network::{NetworkCreate, NetworkingConfig};
use crate::storage::VolumeCreate;
use indexmap::IndexMap;
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use tracing::{debug, info};

/// Oldest supported file format version
pub const MIN_VERSION: f64 = 3.0;

/// Newest supported file format version, assumed when `version` is absent
pub const MAX_VERSION: f64 = 3.8;

/// A translated compose document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Stack {
    version: f64,
    services: IndexMap<String, Service>,
    networks: IndexMap<String, Network>,
    volumes: IndexMap<String, Volume>,
}

impl Stack {
    /// Translate a parsed compose document
    pub fn new(document: &Value) -> ComposeResult<Self> {
        let config = as_mapping(document, "compose file")?;

        let version = verify_version(config)?;
        let services = parse_section(config, "services", Service::new)?;
        let networks = parse_section(config, "networks", Network::new)?;
        let volumes = parse_section(config, "volumes", Volume::new)?;

        info!(
            version,
            services = services.len(),
            networks = networks.len(),
            volumes = volumes.len(),
            "Translated compose stack"
        );

        Ok(Self {
            version,
            services,
            networks,
            volumes,
        })
    }

    pub fn version(&self) -> f64 {
        self.version
    }

    pub fn service(&self, name: &str) -> Option<&Service> {
        self.services.get(name)
    }

    pub fn network(&self, name: &str) -> Option<&Network> {
        self.networks.get(name)
    }

    pub fn volume(&self, name: &str) -> Option<&Volume> {
        self.volumes.get(name)
    }

    /// Service names in document order
    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    pub fn network_names(&self) -> impl Iterator<Item = &str> {
        self.networks.keys().map(String::as_str)
    }

    pub fn volume_names(&self) -> impl Iterator<Item = &str> {
        self.volumes.keys().map(String::as_str)
    }

    /// Create body for a network; a zero record for unknown or external networks
    pub fn network_create(&self, name: &str) -> NetworkCreate {
        match self.networks.get(name) {
            Some(network) => network.create_config(),
            None => {
                debug!(network = name, "Unknown network, using an empty create body");
                NetworkCreate::default()
            }
        }
    }

    /// Create body for a volume; a zero record for unknown or external volumes
    pub fn volume_create(&self, name: &str) -> VolumeCreate {
        match self.volumes.get(name) {
            Some(volume) => volume.create_config(),
            None => {
                debug!(volume = name, "Unknown volume, using an empty create body");
                VolumeCreate::default()
            }
        }
    }

    /// Container config for a service; a zero record for unknown services
    pub fn service_container_create(&self, name: &str) -> ContainerConfig {
        match self.services.get(name) {
            Some(service) => service.container_config().clone(),
            None => {
                debug!(service = name, "Unknown service, using an empty container config");
                ContainerConfig::default()
            }
        }
    }

    pub fn service_host_config(&self, name: &str) -> HostConfig {
        match self.services.get(name) {
            Some(service) => service.host_config().clone(),
            None => {
                debug!(service = name, "Unknown service, using an empty host config");
                HostConfig::default()
            }
        }
    }

    pub fn service_networking_config(&self, name: &str) -> NetworkingConfig {
        match self.services.get(name) {
            Some(service) => service.networking_config().clone(),
            None => {
                debug!(service = name, "Unknown service, using an empty networking config");
                NetworkingConfig::default()
            }
        }
    }

    /// Name of an external network, falling back to its key when the file gives none
    pub fn network_external_name(&self, name: &str) -> Option<String> {
        let external = self.networks.get(name)?.external_name()?;
        let external = if external.is_empty() { name } else { external };
        Some(external.to_string())
    }

    /// Name of an external volume, falling back to its key when the file gives none
    pub fn volume_external_name(&self, name: &str) -> Option<String> {
        let external = self.volumes.get(name)?.external_name()?;
        let external = if external.is_empty() { name } else { external };
        Some(external.to_string())
    }
}

/// Absent means the newest version; otherwise a decimal in the supported band
fn verify_version(config: &Mapping) -> ComposeResult<f64> {
    let raw = match config.get("version") {
        None | Some(Value::Null) => return Ok(MAX_VERSION),
        Some(raw) => raw,
    };

    let version = match raw {
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
    .ok_or_else(|| ComposeError::version("version should be a decimal number such as \"3.8\""))?;

    if !(MIN_VERSION..=MAX_VERSION).contains(&version) {
        return Err(ComposeError::version(format!(
            "Incorrect version {}, supported versions are {:.1} to {:.1}",
            version, MIN_VERSION, MAX_VERSION
        )));
    }
    Ok(version)
}

fn parse_section<T>(
    config: &Mapping,
    section: &str,
    parse: fn(&Value) -> ComposeResult<T>,
) -> ComposeResult<IndexMap<String, T>> {
    let mut entries = IndexMap::new();
    let entities = match config.get(section) {
        None | Some(Value::Null) => return Ok(entries),
        Some(entities) => as_mapping(entities, section)?,
    };

    for (name, entity) in entities {
        let name = key_string(name).map_err(|err| err.at(section))?;
        debug!(section, name = %name, "Parsing entry");
        if entries.contains_key(&name) {
            return Err(
                ComposeError::validation(format!("duplicate {} name {}", section, name)).at(section),
            );
        }
        let parsed = parse(entity).map_err(|err| err.at(name.as_str()).at(section))?;
        entries.insert(name, parsed);
    }
    Ok(entries)
}
