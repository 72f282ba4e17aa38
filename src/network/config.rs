//! Network records
//!
//! Network create bodies and the per-service endpoint settings, serialised
//! with the container engine's field names.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

/// Network driver types accepted in a compose file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkDriver {
    /// Bridge network (default)
    #[default]
    Bridge,
    /// Overlay network
    Overlay,
    /// Host network
    Host,
    /// No networking
    None,
}

impl std::fmt::Display for NetworkDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkDriver::Bridge => write!(f, "bridge"),
            NetworkDriver::Overlay => write!(f, "overlay"),
            NetworkDriver::Host => write!(f, "host"),
            NetworkDriver::None => write!(f, "none"),
        }
    }
}

impl FromStr for NetworkDriver {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "bridge" => Ok(NetworkDriver::Bridge),
            "overlay" => Ok(NetworkDriver::Overlay),
            "host" => Ok(NetworkDriver::Host),
            "none" => Ok(NetworkDriver::None),
            other => Err(format!("{} is not a valid driver", other)),
        }
    }
}

/// Network create body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NetworkCreate {
    /// Network driver
    pub driver: String,
    /// Driver options
    pub options: HashMap<String, String>,
    /// Attachable by standalone containers
    pub attachable: bool,
    /// Enable IPv6
    #[serde(rename = "EnableIPv6")]
    pub enable_ipv6: bool,
    /// IPAM configuration
    #[serde(rename = "IPAM")]
    pub ipam: Ipam,
    /// Internal network (no external access)
    pub internal: bool,
    /// Network labels
    pub labels: HashMap<String, String>,
}

impl NetworkCreate {
    /// Create body for a network declared without any options
    pub fn with_driver(driver: NetworkDriver) -> Self {
        Self {
            driver: driver.to_string(),
            ..Self::default()
        }
    }
}

/// IPAM configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Ipam {
    /// IPAM driver
    pub driver: String,
    /// IP pool configurations
    pub config: Vec<IpamConfig>,
    /// Driver options
    pub options: HashMap<String, String>,
}

/// IPAM pool configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IpamConfig {
    /// Subnet in CIDR format
    pub subnet: String,
}

/// Endpoints a container joins at creation, keyed by network name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NetworkingConfig {
    pub endpoints_config: BTreeMap<String, EndpointSettings>,
}

/// Container attachment to one network
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct EndpointSettings {
    /// Extra DNS names on this network
    pub aliases: Vec<String>,
    /// Links to other services
    pub links: Vec<String>,
    /// Static IPv4 address
    #[serde(rename = "IPAddress")]
    pub ipv4_address: String,
    /// Static IPv6 address
    #[serde(rename = "GlobalIPv6Address")]
    pub ipv6_address: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_driver_parse() {
        assert_eq!("overlay".parse::<NetworkDriver>(), Ok(NetworkDriver::Overlay));
        assert_eq!(
            "macvlan".parse::<NetworkDriver>(),
            Err("macvlan is not a valid driver".to_string())
        );
        assert_eq!(NetworkDriver::default().to_string(), "bridge");
    }

    #[test]
    fn test_network_create_default_is_zero() {
        let config = NetworkCreate::default();
        assert!(config.driver.is_empty());
        assert_eq!(NetworkCreate::with_driver(NetworkDriver::Bridge).driver, "bridge");
    }

    #[test]
    fn test_network_create_serializes_engine_names() {
        let mut config = NetworkCreate::with_driver(NetworkDriver::Bridge);
        config.enable_ipv6 = true;
        config.ipam.config.push(IpamConfig {
            subnet: "172.28.0.0/16".to_string(),
        });

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["EnableIPv6"], true);
        assert_eq!(json["IPAM"]["Config"][0]["Subnet"], "172.28.0.0/16");
    }
}
