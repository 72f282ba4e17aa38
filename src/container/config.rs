//! Container create records
//!
//! These mirror the container engine's `ContainerConfig` and `HostConfig`
//! create bodies and serialise to the engine's field names.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// A `port/proto` key such as `80/tcp`
pub type Port = String;

/// Set of exposed ports
pub type PortSet = BTreeSet<Port>;

/// Container port to host bindings
pub type PortMap = BTreeMap<Port, Vec<PortBinding>>;

/// Container configuration (the portable part of a container create body)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContainerConfig {
    /// Hostname
    pub hostname: String,
    /// Domain name
    pub domainname: String,
    /// User to run as
    pub user: String,
    /// Exposed ports
    #[serde(with = "set_as_map")]
    pub exposed_ports: PortSet,
    /// Allocate a TTY
    pub tty: bool,
    /// Keep stdin open
    pub open_stdin: bool,
    /// Environment as `KEY=VALUE` strings
    pub env: Vec<String>,
    /// Command to run
    pub cmd: Vec<String>,
    /// Healthcheck
    #[serde(skip_serializing_if = "Option::is_none")]
    pub healthcheck: Option<HealthConfig>,
    /// Image name/tag
    pub image: String,
    /// Volume-kind mounts rendered as `source:target:mode`
    #[serde(with = "set_as_map")]
    pub volumes: BTreeSet<String>,
    /// Working directory
    pub working_dir: String,
    /// Entry point
    pub entrypoint: Vec<String>,
    /// MAC address
    pub mac_address: String,
    /// Container labels
    pub labels: HashMap<String, String>,
    /// Signal sent to stop the container
    pub stop_signal: String,
    /// Seconds to wait before killing the container
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_timeout: Option<i64>,
}

/// Healthcheck configuration, durations in nanoseconds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct HealthConfig {
    pub test: Vec<String>,
    pub interval: i64,
    pub timeout: i64,
    pub start_period: i64,
    pub retries: i64,
}

/// Host configuration (the non-portable part of a container create body)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct HostConfig {
    /// Bind-kind mounts rendered as `source:target:mode`
    pub binds: Vec<String>,
    /// Logging driver
    pub log_config: LogConfig,
    /// Network mode (bridge, host, none, service:..., container:...)
    pub network_mode: String,
    /// Port bindings
    pub port_bindings: PortMap,
    /// Restart policy
    pub restart_policy: RestartPolicy,
    /// Capabilities to add
    pub cap_add: Vec<String>,
    /// Capabilities to drop
    pub cap_drop: Vec<String>,
    /// DNS servers
    pub dns: Vec<String>,
    /// DNS search domains
    pub dns_search: Vec<String>,
    /// Extra `/etc/hosts` entries
    pub extra_hosts: Vec<String>,
    /// IPC namespace mode
    pub ipc_mode: String,
    /// PID namespace mode
    pub pid_mode: String,
    /// Links to containers outside the project
    pub links: Vec<String>,
    /// Privileged mode
    pub privileged: bool,
    /// Read-only root filesystem
    pub readonly_rootfs: bool,
    /// Security options
    pub security_opt: Vec<String>,
    /// Tmpfs mounts, path to mount options
    pub tmpfs: HashMap<String, String>,
    /// User namespace mode
    pub userns_mode: String,
    /// Size of /dev/shm in bytes
    pub shm_size: i64,
    /// Namespaced kernel parameters
    pub sysctls: HashMap<String, String>,
    /// Run an init process inside the container
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init: Option<bool>,
    /// Structured mounts that have no short string form
    pub mounts: Vec<Mount>,
    /// Resource settings
    #[serde(flatten)]
    pub resources: Resources,
}

/// Resource settings embedded in the host config
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Resources {
    pub cgroup_parent: String,
    pub devices: Vec<DeviceMapping>,
    pub ulimits: Vec<Ulimit>,
}

/// Logging driver and its options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct LogConfig {
    #[serde(rename = "Type")]
    pub driver: String,
    pub config: HashMap<String, String>,
}

/// Restart policy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RestartPolicy {
    pub name: String,
    pub maximum_retry_count: i64,
}

/// Host device exposed to the container
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeviceMapping {
    pub path_on_host: String,
    pub path_in_container: String,
    pub cgroup_permissions: String,
}

/// Resource limit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Ulimit {
    pub name: String,
    pub soft: i64,
    pub hard: i64,
}

/// Host side of a port binding, empty strings mean "any"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PortBinding {
    pub host_ip: String,
    pub host_port: String,
}

impl PortBinding {
    pub fn new(host_ip: &str, host_port: &str) -> Self {
        Self {
            host_ip: host_ip.to_string(),
            host_port: host_port.to_string(),
        }
    }
}

/// Mount type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MountKind {
    /// Named or anonymous volume
    #[default]
    Volume,
    /// Host path
    Bind,
    /// In-memory filesystem
    Tmpfs,
}

impl fmt::Display for MountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MountKind::Volume => write!(f, "volume"),
            MountKind::Bind => write!(f, "bind"),
            MountKind::Tmpfs => write!(f, "tmpfs"),
        }
    }
}

/// Structured mount
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Mount {
    #[serde(rename = "Type")]
    pub kind: MountKind,
    pub source: String,
    pub target: String,
    pub read_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_options: Option<BindOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_options: Option<VolumeOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmpfs_options: Option<TmpfsOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BindOptions {
    pub propagation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VolumeOptions {
    pub no_copy: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TmpfsOptions {
    pub size_bytes: i64,
}

/// The engine encodes sets as objects with empty values: `{"80/tcp": {}}`
mod set_as_map {
    use serde::de::IgnoredAny;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::{BTreeMap, BTreeSet};

    #[derive(Serialize)]
    struct Empty {}

    pub fn serialize<S: Serializer>(set: &BTreeSet<String>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(set.iter().map(|key| (key, Empty {})))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BTreeSet<String>, D::Error> {
        let map = BTreeMap::<String, IgnoredAny>::deserialize(deserializer)?;
        Ok(map.into_keys().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_config_serializes_engine_names() {
        let mut config = ContainerConfig {
            image: "nginx".to_string(),
            open_stdin: true,
            ..ContainerConfig::default()
        };
        config.exposed_ports.insert("80/tcp".to_string());

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["Image"], "nginx");
        assert_eq!(json["OpenStdin"], true);
        assert_eq!(json["ExposedPorts"], serde_json::json!({"80/tcp": {}}));
        assert!(json.get("StopTimeout").is_none());
    }

    #[test]
    fn test_host_config_flattens_resources() {
        let mut config = HostConfig::default();
        config.resources.cgroup_parent = "m-executor".to_string();
        config.log_config.driver = "json-file".to_string();

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["CgroupParent"], "m-executor");
        assert_eq!(json["LogConfig"]["Type"], "json-file");
        assert!(json.get("Resources").is_none());

        let back: HostConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }
}
