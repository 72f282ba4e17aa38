//! Top level `services` entries
//!
//! A service is translated in three passes over the same mapping, one per
//! output record: the container config, the host config and the networking
//! config. Keys that belong to none of them are ignored.

use super::binding::{bind_fields, fields, Field};
use super::convert::{self, expected, key_string, ports, units};
use crate::container::{ContainerConfig, HealthConfig, HostConfig, LogConfig};
use crate::error::{ComposeError, ComposeResult};
use crate::network::{EndpointSettings, NetworkingConfig};
use serde::Serialize;
use serde_yaml::{Mapping, Value};

/// Healthcheck test that disables an image's healthcheck
const HEALTHCHECK_DISABLED: &str = "NONE";

/// A service translated into container create records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Service {
    #[serde(rename = "Config")]
    container_config: ContainerConfig,
    host_config: HostConfig,
    networking_config: NetworkingConfig,
}

impl Service {
    /// Parse one entry of the `services` section; null declares an empty service
    pub fn new(config: &Value) -> ComposeResult<Self> {
        let mut service = Self::default();
        match config {
            Value::Null => {}
            Value::Mapping(config) => {
                service.parse_container_config(config)?;
                service.parse_host_config(config)?;
                service.parse_networking_config(config)?;
            }
            other => return Err(expected("a map", other)),
        }
        Ok(service)
    }

    pub fn container_config(&self) -> &ContainerConfig {
        &self.container_config
    }

    pub fn host_config(&self) -> &HostConfig {
        &self.host_config
    }

    pub fn networking_config(&self) -> &NetworkingConfig {
        &self.networking_config
    }

    fn parse_container_config(&mut self, config: &Mapping) -> ComposeResult<()> {
        let container = &mut self.container_config;
        bind_fields(
            config,
            fields![
                Field::new("hostname", &mut container.hostname),
                Field::new("domainname", &mut container.domainname),
                Field::new("user", &mut container.user),
                Field::converted("expose", &mut container.exposed_ports, convert::exposed_ports),
                Field::new("tty", &mut container.tty),
                Field::new("stdin_open", &mut container.open_stdin),
                Field::converted("environment", &mut container.env, convert::environment),
                Field::converted("command", &mut container.cmd, convert::string_list),
                Field::converted("healthcheck", &mut container.healthcheck, healthcheck),
                Field::new("image", &mut container.image),
                Field::converted("volumes", &mut container.volumes, convert::container_volumes),
                Field::new("working_dir", &mut container.working_dir),
                Field::converted("entrypoint", &mut container.entrypoint, convert::string_list),
                Field::new("mac_address", &mut container.mac_address),
                Field::converted("labels", &mut container.labels, convert::labels),
                Field::new("stop_signal", &mut container.stop_signal),
                Field::converted(
                    "stop_grace_period",
                    &mut container.stop_timeout,
                    convert::stop_grace_period
                ),
            ],
        )
    }

    fn parse_host_config(&mut self, config: &Mapping) -> ComposeResult<()> {
        let host = &mut self.host_config;
        bind_fields(
            config,
            fields![
                Field::converted("volumes", &mut host.binds, convert::binds),
                Field::converted("volumes", &mut host.mounts, convert::tmpfs_mounts),
                Field::converted("logging", &mut host.log_config, log_config),
                Field::new("network_mode", &mut host.network_mode),
                Field::converted("ports", &mut host.port_bindings, ports::port_bindings),
                Field::converted("restart", &mut host.restart_policy, convert::restart_policy),
                Field::converted("cap_add", &mut host.cap_add, convert::string_list),
                Field::converted("cap_drop", &mut host.cap_drop, convert::string_list),
                Field::converted("dns", &mut host.dns, convert::string_list),
                Field::converted("dns_search", &mut host.dns_search, convert::string_list),
                Field::converted("extra_hosts", &mut host.extra_hosts, convert::extra_hosts),
                Field::new("ipc", &mut host.ipc_mode),
                Field::new("pid", &mut host.pid_mode),
                Field::converted("external_links", &mut host.links, convert::string_list),
                Field::new("privileged", &mut host.privileged),
                Field::new("read_only", &mut host.readonly_rootfs),
                Field::converted("security_opt", &mut host.security_opt, convert::string_list),
                Field::converted("tmpfs", &mut host.tmpfs, convert::tmpfs),
                Field::new("userns_mode", &mut host.userns_mode),
                Field::converted("shm_size", &mut host.shm_size, units::shm_size),
                Field::converted("sysctls", &mut host.sysctls, convert::sysctls),
                Field::new("init", &mut host.init),
                Field::new("cgroup_parent", &mut host.resources.cgroup_parent),
                Field::converted("devices", &mut host.resources.devices, convert::devices),
                Field::converted("ulimits", &mut host.resources.ulimits, convert::ulimits),
            ],
        )
    }

    /// One endpoint per joined network, each carrying the service's links
    fn parse_networking_config(&mut self, config: &Mapping) -> ComposeResult<()> {
        let links = match config.get("links") {
            None | Some(Value::Null) => Vec::new(),
            Some(links) => convert::string_list(links).map_err(|err| err.at("links"))?,
        };

        let networks = match config.get("networks") {
            None | Some(Value::Null) => return Ok(()),
            Some(networks) => networks,
        };

        let endpoints = &mut self.networking_config.endpoints_config;
        match networks {
            Value::Mapping(networks) => {
                for (name, entry) in networks {
                    let name = key_string(name).map_err(|err| err.at("networks"))?;
                    let settings = endpoint(&name, entry, &links)
                        .map_err(|err| err.at(name.as_str()).at("networks"))?;
                    endpoints.insert(name, settings);
                }
            }
            Value::Sequence(networks) => {
                for entry in networks {
                    let name = entry.as_str().ok_or_else(|| {
                        expected("a network name", entry).at("networks")
                    })?;
                    let settings = endpoint(name, &Value::Null, &links)?;
                    endpoints.insert(name.to_string(), settings);
                }
            }
            other => return Err(expected("a map or a list", other).at("networks")),
        }
        Ok(())
    }
}

fn endpoint(name: &str, entry: &Value, links: &[String]) -> ComposeResult<EndpointSettings> {
    let mut endpoint = EndpointSettings {
        links: links.to_vec(),
        ..EndpointSettings::default()
    };
    match entry {
        Value::Null => {}
        Value::Mapping(config) => bind_fields(
            config,
            fields![
                Field::converted("aliases", &mut endpoint.aliases, convert::string_list),
                Field::new("ipv4_address", &mut endpoint.ipv4_address),
                Field::new("ipv6_address", &mut endpoint.ipv6_address),
            ],
        )?,
        _ => {
            return Err(ComposeError::shape(format!(
                "{} is not a valid network entry",
                name
            )))
        }
    }
    Ok(endpoint)
}

/// `{test, interval, timeout, start_period, retries, disable}`
fn healthcheck(value: &Value) -> ComposeResult<HealthConfig> {
    let config = value.as_mapping().ok_or_else(|| expected("a map", value))?;
    let mut health = HealthConfig::default();
    let mut disable = false;
    bind_fields(
        config,
        fields![
            Field::converted("test", &mut health.test, convert::string_list),
            Field::converted("interval", &mut health.interval, units::duration),
            Field::converted("timeout", &mut health.timeout, units::duration),
            Field::converted("start_period", &mut health.start_period, units::duration),
            Field::new("retries", &mut health.retries),
            Field::new("disable", &mut disable),
        ],
    )?;

    if disable {
        health.test = vec![HEALTHCHECK_DISABLED.to_string()];
    }
    Ok(health)
}

/// `{driver, options}`
fn log_config(value: &Value) -> ComposeResult<LogConfig> {
    let config = value.as_mapping().ok_or_else(|| expected("a map", value))?;
    let mut log = LogConfig::default();
    bind_fields(
        config,
        fields![
            Field::new("driver", &mut log.driver),
            Field::converted("options", &mut log.config, convert::string_map),
        ],
    )?;
    Ok(log)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{DeviceMapping, MountKind, PortBinding, RestartPolicy};

    fn yaml(input: &str) -> Value {
        serde_yaml::from_str(input).unwrap()
    }

    fn service(input: &str) -> Service {
        Service::new(&yaml(input)).unwrap()
    }

    #[test]
    fn test_null_service_is_default() {
        assert_eq!(Service::new(&Value::Null).unwrap(), Service::default());
    }

    #[test]
    fn test_container_config() {
        let service = service(
            r#"
            image: redis:alpine
            hostname: cache
            domainname: example.com
            user: "1000"
            working_dir: /data
            mac_address: "02:42:ac:11:65:43"
            tty: true
            stdin_open: true
            command: redis-server --appendonly yes
            entrypoint: [/docker-entrypoint.sh]
            environment:
              REDIS_PASSWORD: secret
            labels: [com.example.tier=cache]
            expose: ["6379"]
            stop_signal: SIGTERM
            stop_grace_period: 1m30s
            "#,
        );

        let config = service.container_config();
        assert_eq!(config.image, "redis:alpine");
        assert_eq!(config.hostname, "cache");
        assert_eq!(config.domainname, "example.com");
        assert_eq!(config.user, "1000");
        assert_eq!(config.working_dir, "/data");
        assert_eq!(config.mac_address, "02:42:ac:11:65:43");
        assert!(config.tty && config.open_stdin);
        assert_eq!(config.cmd, vec!["redis-server", "--appendonly", "yes"]);
        assert_eq!(config.entrypoint, vec!["/docker-entrypoint.sh"]);
        assert_eq!(config.env, vec!["REDIS_PASSWORD=secret"]);
        assert_eq!(config.labels["com.example.tier"], "cache");
        assert!(config.exposed_ports.contains("6379/tcp"));
        assert_eq!(config.stop_signal, "SIGTERM");
        assert_eq!(config.stop_timeout, Some(90));
    }

    #[test]
    fn test_healthcheck() {
        let service = service(
            r#"
            healthcheck:
              test: ["CMD", "curl", "-f", "http://localhost"]
              interval: 1m30s
              timeout: 10s
              start_period: 40s
              retries: 3
            "#,
        );

        let health = service.container_config().healthcheck.clone().unwrap();
        assert_eq!(health.test, vec!["CMD", "curl", "-f", "http://localhost"]);
        assert_eq!(health.interval, 90_000_000_000);
        assert_eq!(health.timeout, 10_000_000_000);
        assert_eq!(health.start_period, 40_000_000_000);
        assert_eq!(health.retries, 3);
    }

    #[test]
    fn test_healthcheck_disable() {
        let service = service("healthcheck: {disable: true}");
        let health = service.container_config().healthcheck.clone().unwrap();
        assert_eq!(health.test, vec!["NONE"]);
    }

    #[test]
    fn test_volumes_are_routed() {
        let service = service(
            r#"
            volumes:
              - /directory
              - ./reldir:/target:rw
              - ~/home:/target:rw
              - type: volume
                source: mydata
                target: /data
                volume:
                  nocopy: true
              - type: tmpfs
                target: /cache
            "#,
        );

        let volumes: Vec<&str> = service
            .container_config()
            .volumes
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(volumes, vec!["/directory:rw", "mydata:/data:rw,nocopy"]);
        assert_eq!(
            service.host_config().binds,
            vec!["./reldir:/target:rw", "~/home:/target:rw"]
        );
        assert_eq!(service.host_config().mounts[0].kind, MountKind::Tmpfs);
    }

    #[test]
    fn test_host_config() {
        let service = service(
            r#"
            network_mode: host
            restart: on-failure:5
            cap_add: [ALL]
            cap_drop: [NET_ADMIN, SYS_ADMIN]
            dns: 8.8.8.8
            dns_search: [dc1.example.com]
            extra_hosts: ["somehost:162.242.195.82"]
            ipc: host
            pid: host
            external_links: [redis_1]
            privileged: true
            read_only: true
            security_opt: ["label:user:USER"]
            tmpfs: ["/tmp:rw,size=787448k,mode=1777"]
            userns_mode: host
            shm_size: 64M
            sysctls: {net.core.somaxconn: 1024}
            init: true
            cgroup_parent: m-executor-abcd
            devices: ["/dev/ttyUSB0:/dev/ttyUSB0"]
            ulimits: {nproc: 65535}
            logging:
              driver: json-file
              options:
                max-size: 12m
            "#,
        );

        let host = service.host_config();
        assert_eq!(host.network_mode, "host");
        assert_eq!(
            host.restart_policy,
            RestartPolicy {
                name: "on-failure".to_string(),
                maximum_retry_count: 5
            }
        );
        assert_eq!(host.cap_add, vec!["ALL"]);
        assert_eq!(host.cap_drop, vec!["NET_ADMIN", "SYS_ADMIN"]);
        assert_eq!(host.dns, vec!["8.8.8.8"]);
        assert_eq!(host.dns_search, vec!["dc1.example.com"]);
        assert_eq!(host.extra_hosts, vec!["somehost:162.242.195.82"]);
        assert_eq!(host.ipc_mode, "host");
        assert_eq!(host.pid_mode, "host");
        assert_eq!(host.links, vec!["redis_1"]);
        assert!(host.privileged && host.readonly_rootfs);
        assert_eq!(host.security_opt, vec!["label:user:USER"]);
        assert_eq!(host.tmpfs["/tmp"], "rw,size=787448k,mode=1777");
        assert_eq!(host.userns_mode, "host");
        assert_eq!(host.shm_size, 64_000_000);
        assert_eq!(host.sysctls["net.core.somaxconn"], "1024");
        assert_eq!(host.init, Some(true));
        assert_eq!(host.resources.cgroup_parent, "m-executor-abcd");
        assert_eq!(
            host.resources.devices,
            vec![DeviceMapping {
                path_on_host: "/dev/ttyUSB0".to_string(),
                path_in_container: "/dev/ttyUSB0".to_string(),
                cgroup_permissions: "rwm".to_string(),
            }]
        );
        assert_eq!(host.resources.ulimits[0].soft, 65535);
        assert_eq!(host.log_config.driver, "json-file");
        assert_eq!(host.log_config.config["max-size"], "12m");
    }

    #[test]
    fn test_port_bindings() {
        let service = service(r#"ports: ["3000", "4000-4001", "127.0.0.1::9000", "10000:10000/udp"]"#);
        let ports = &service.host_config().port_bindings;

        assert_eq!(ports["3000/tcp"], vec![PortBinding::new("", "")]);
        assert_eq!(ports["4000/tcp"], vec![PortBinding::new("", "")]);
        assert_eq!(ports["4001/tcp"], vec![PortBinding::new("", "")]);
        assert_eq!(ports["9000/tcp"], vec![PortBinding::new("127.0.0.1", "")]);
        assert_eq!(ports["10000/udp"], vec![PortBinding::new("", "10000")]);
    }

    #[test]
    fn test_networking_config() {
        let service = service(
            r#"
            links: [db, test]
            networks:
              front:
                aliases: [web, www]
                ipv4_address: 172.16.238.10
                ipv6_address: "2001:3984:3989::10"
              back:
            "#,
        );

        let endpoints = &service.networking_config().endpoints_config;
        let front = &endpoints["front"];
        assert_eq!(front.aliases, vec!["web", "www"]);
        assert_eq!(front.links, vec!["db", "test"]);
        assert_eq!(front.ipv4_address, "172.16.238.10");
        assert_eq!(front.ipv6_address, "2001:3984:3989::10");

        let back = &endpoints["back"];
        assert!(back.aliases.is_empty());
        assert_eq!(back.links, vec!["db", "test"]);
    }

    #[test]
    fn test_network_list_form() {
        let service = service("networks: [front, back]");
        let endpoints = &service.networking_config().endpoints_config;
        assert_eq!(endpoints.len(), 2);
        assert!(endpoints["front"].links.is_empty());
    }

    #[test]
    fn test_invalid_network_entry() {
        let err = Service::new(&yaml("networks: {front: 0}")).unwrap_err();
        assert_eq!(err.to_string(), "networks.front: front is not a valid network entry");

        let err = Service::new(&yaml("networks: 0")).unwrap_err();
        assert_eq!(err.path(), ["networks"]);

        let err = Service::new(&yaml("{links: {a: [1]}, networks: [front]}")).unwrap_err();
        assert_eq!(err.path(), ["links", "a"]);
    }

    #[test]
    fn test_integer_for_any_key_fails() {
        for key in [
            "hostname",
            "domainname",
            "user",
            "expose",
            "tty",
            "stdin_open",
            "environment",
            "command",
            "healthcheck",
            "image",
            "volumes",
            "working_dir",
            "entrypoint",
            "mac_address",
            "labels",
            "stop_signal",
            "stop_grace_period",
            "logging",
            "network_mode",
            "ports",
            "restart",
            "cap_add",
            "cap_drop",
            "dns",
            "dns_search",
            "extra_hosts",
            "ipc",
            "pid",
            "external_links",
            "privileged",
            "read_only",
            "security_opt",
            "tmpfs",
            "userns_mode",
            "shm_size",
            "sysctls",
            "init",
            "cgroup_parent",
            "devices",
            "ulimits",
            "links",
            "networks",
        ] {
            let mut config = Mapping::new();
            config.insert(Value::String(key.to_string()), yaml("0"));
            let err = Service::new(&Value::Mapping(config)).unwrap_err();
            assert!(err.to_string().contains(key), "{}: {}", key, err);
        }
    }
}
