//! Host config coercers: devices, tmpfs, sysctls, restart policy, ulimits

use super::{expected, key_string, scalar_string, string_list, string_map};
use crate::compose::binding::{bind_fields, fields, Field};
use crate::container::{DeviceMapping, RestartPolicy, Ulimit};
use crate::error::{ComposeError, ComposeResult};
use serde_yaml::Value;
use std::collections::HashMap;
use tracing::warn;

const RESTART_POLICIES: &[&str] = &["no", "always", "on-failure", "unless-stopped"];

/// Default cgroup permissions for a device: read, write, mknod
const DEFAULT_DEVICE_PERMISSIONS: &str = "rwm";

/// `host:container[:permissions]`
pub fn devices(value: &Value) -> ComposeResult<Vec<DeviceMapping>> {
    string_list(value)?
        .iter()
        .enumerate()
        .map(|(index, device)| {
            let parts: Vec<&str> = device.split(':').collect();
            let (host, container, permissions) = match parts.as_slice() {
                [host, container] => (*host, *container, DEFAULT_DEVICE_PERMISSIONS),
                [host, container, permissions] => (*host, *container, *permissions),
                _ => ("", "", ""),
            };
            if host.is_empty() || container.is_empty() {
                return Err(ComposeError::validation(format!(
                    "{} is not a valid device mapping",
                    device
                ))
                .at(index.to_string()));
            }
            Ok(DeviceMapping {
                path_on_host: host.to_string(),
                path_in_container: container.to_string(),
                cgroup_permissions: permissions.to_string(),
            })
        })
        .collect()
}

/// `path:options` entries; entries without options are skipped
pub fn tmpfs(value: &Value) -> ComposeResult<HashMap<String, String>> {
    let mut mounts = HashMap::new();
    for entry in string_list(value)? {
        match entry.split_once(':') {
            Some((path, options)) => {
                mounts.insert(path.to_string(), options.to_string());
            }
            None => warn!(entry = %entry, "Skipping tmpfs entry without options"),
        }
    }
    Ok(mounts)
}

/// Kernel parameters, as a map or a list of `key=value`.
///
/// List entries without exactly one `=` are skipped.
pub fn sysctls(value: &Value) -> ComposeResult<HashMap<String, String>> {
    match value {
        Value::Mapping(_) => string_map(value),
        Value::Sequence(items) => {
            let mut sysctls = HashMap::new();
            for (index, item) in items.iter().enumerate() {
                let entry = scalar_string(item)
                    .ok_or_else(|| expected("a string", item).at(index.to_string()))?;
                match entry.split_once('=') {
                    Some((key, value)) if !value.contains('=') => {
                        sysctls.insert(key.to_string(), value.to_string());
                    }
                    _ => warn!(entry = %entry, "Skipping sysctl entry that is not key=value"),
                }
            }
            Ok(sysctls)
        }
        other => Err(expected("a map or a list", other)),
    }
}

/// `name[:max_retries]`, retries only with `on-failure`
pub fn restart_policy(value: &Value) -> ComposeResult<RestartPolicy> {
    let spec = value.as_str().ok_or_else(|| expected("a string", value))?;
    let (name, retries) = match spec.split_once(':') {
        Some((name, retries)) => (name, Some(retries)),
        None => (spec, None),
    };

    if !RESTART_POLICIES.contains(&name) {
        return Err(ComposeError::validation(format!(
            "{} is not a valid restart policy",
            name
        )));
    }

    let maximum_retry_count = match retries {
        None => 0,
        Some(retries) if name == "on-failure" => retries
            .parse::<u32>()
            .map(i64::from)
            .map_err(|_| ComposeError::coercion(format!("{} should be a number", retries)))?,
        Some(_) => {
            return Err(ComposeError::validation(format!(
                "{} does not take a retry count",
                name
            )))
        }
    };

    Ok(RestartPolicy {
        name: name.to_string(),
        maximum_retry_count,
    })
}

/// Resource limits: `name: n` or `name: {soft: n, hard: n}`
pub fn ulimits(value: &Value) -> ComposeResult<Vec<Ulimit>> {
    let limits = value.as_mapping().ok_or_else(|| expected("a map", value))?;
    let mut ulimits = Vec::with_capacity(limits.len());

    for (name, limit) in limits {
        let name = key_string(name)?;
        let (soft, hard) = soft_hard(limit).map_err(|err| err.at(&name))?;
        ulimits.push(Ulimit { name, soft, hard });
    }
    Ok(ulimits)
}

fn soft_hard(limit: &Value) -> ComposeResult<(i64, i64)> {
    match limit {
        Value::Number(n) => n
            .as_i64()
            .map(|single| (single, single))
            .ok_or_else(|| expected("an integer", limit)),
        Value::Mapping(config) => {
            let mut soft: Option<i64> = None;
            let mut hard: Option<i64> = None;
            bind_fields(
                config,
                fields![Field::new("soft", &mut soft), Field::new("hard", &mut hard)],
            )?;
            match (soft, hard) {
                (Some(soft), Some(hard)) if soft <= hard => Ok((soft, hard)),
                (Some(_), Some(_)) => Err(ComposeError::validation(
                    "soft limit must not exceed hard limit",
                )),
                _ => Err(ComposeError::validation("soft and hard limits are required")),
            }
        }
        other => Err(expected("an integer or a map", other)),
    }
}

/// `/etc/hosts` entries as `host:ip`, from a list or a `host: ip` map
pub fn extra_hosts(value: &Value) -> ComposeResult<Vec<String>> {
    match value {
        Value::Mapping(_) => {
            let hosts = string_map(value)?;
            let mut hosts: Vec<String> = hosts
                .into_iter()
                .map(|(host, ip)| format!("{}:{}", host, ip))
                .collect();
            hosts.sort();
            Ok(hosts)
        }
        _ => string_list(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(input: &str) -> Value {
        serde_yaml::from_str(input).unwrap()
    }

    #[test]
    fn test_devices() {
        let devices = devices(&yaml(r#"["/dev/ttyUSB0:/dev/ttyUSB0", "/dev/sda:/dev/xvda:r"]"#)).unwrap();
        assert_eq!(
            devices[0],
            DeviceMapping {
                path_on_host: "/dev/ttyUSB0".to_string(),
                path_in_container: "/dev/ttyUSB0".to_string(),
                cgroup_permissions: "rwm".to_string(),
            }
        );
        assert_eq!(devices[1].path_in_container, "/dev/xvda");
        assert_eq!(devices[1].cgroup_permissions, "r");
    }

    #[test]
    fn test_invalid_device() {
        let err = devices(&yaml(r#"["/a:/b:rwm:extra"]"#)).unwrap_err();
        assert_eq!(err.to_string(), "0: /a:/b:rwm:extra is not a valid device mapping");

        let err = devices(&yaml(r#"["/dev/fuse"]"#)).unwrap_err();
        assert_eq!(err.path(), ["0"]);
    }

    #[test]
    fn test_tmpfs_skips_entries_without_options() {
        let tmpfs = tmpfs(&yaml(r#"["/tmp:rw,size=787448k,mode=1777", "/run"]"#)).unwrap();
        assert_eq!(tmpfs.len(), 1);
        assert_eq!(tmpfs["/tmp"], "rw,size=787448k,mode=1777");
    }

    #[test]
    fn test_sysctls_forms() {
        let from_map = sysctls(&yaml("{net.core.somaxconn: 1024}")).unwrap();
        assert_eq!(from_map["net.core.somaxconn"], "1024");

        let from_list = sysctls(&yaml(
            r#"["net.core.somaxconn=1024", "broken", "kernel.msgmax=1=2"]"#,
        ))
        .unwrap();
        assert_eq!(from_list, from_map);
    }

    #[test]
    fn test_restart_policy() {
        let policy = restart_policy(&yaml("on-failure:5")).unwrap();
        assert_eq!(policy.name, "on-failure");
        assert_eq!(policy.maximum_retry_count, 5);

        let policy = restart_policy(&yaml("unless-stopped")).unwrap();
        assert_eq!(policy.maximum_retry_count, 0);
    }

    #[test]
    fn test_invalid_restart_policy() {
        let err = restart_policy(&yaml("sometimes")).unwrap_err();
        assert_eq!(err.to_string(), "sometimes is not a valid restart policy");

        let err = restart_policy(&yaml("on-failure:five")).unwrap_err();
        assert_eq!(err.to_string(), "five should be a number");

        assert!(restart_policy(&yaml("always:3")).is_err());
        assert!(restart_policy(&yaml("on-failure:-1")).is_err());
    }

    #[test]
    fn test_ulimits() {
        let ulimits = ulimits(&yaml("{nproc: 65535, nofile: {soft: 20000, hard: 40000}}")).unwrap();
        assert_eq!(
            ulimits,
            vec![
                Ulimit {
                    name: "nproc".to_string(),
                    soft: 65535,
                    hard: 65535
                },
                Ulimit {
                    name: "nofile".to_string(),
                    soft: 20000,
                    hard: 40000
                },
            ]
        );
    }

    #[test]
    fn test_ulimit_forms_agree() {
        assert_eq!(
            ulimits(&yaml("{nproc: 5}")).unwrap(),
            ulimits(&yaml("{nproc: {soft: 5, hard: 5}}")).unwrap()
        );
    }

    #[test]
    fn test_invalid_ulimits() {
        let err = ulimits(&yaml("{nofile: {soft: 20000}}")).unwrap_err();
        assert_eq!(err.to_string(), "nofile: soft and hard limits are required");

        let err = ulimits(&yaml("{nofile: {soft: 2, hard: 1}}")).unwrap_err();
        assert_eq!(err.path(), ["nofile"]);

        let err = ulimits(&yaml("{nofile: {soft: a, hard: 1}}")).unwrap_err();
        assert_eq!(err.to_string(), "nofile: soft should be type int");
    }

    #[test]
    fn test_extra_hosts_forms() {
        assert_eq!(
            extra_hosts(&yaml(r#"["somehost:162.242.195.82"]"#)).unwrap(),
            vec!["somehost:162.242.195.82"]
        );
        assert_eq!(
            extra_hosts(&yaml("{somehost: 162.242.195.82}")).unwrap(),
            vec!["somehost:162.242.195.82"]
        );
    }
}
