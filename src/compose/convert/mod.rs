//! Value coercers
//!
//! Compose fields often accept several surface forms (a list or a map, a
//! short string or a long mapping). Each coercer here takes one raw YAML
//! value and returns a single canonical form, or an error describing why the
//! value could not be converted. Coercers never see null: the binding engine
//! treats null as "unset" before calling them.

pub mod host;
pub mod ipam;
pub mod mounts;
pub mod ports;
pub mod units;

use super::binding::{bind_fields, fields, Field};
use crate::error::{ComposeError, ComposeResult};
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;

pub use host::{devices, extra_hosts, restart_policy, sysctls, tmpfs, ulimits};
pub use ipam::ipam;
pub use mounts::{binds, container_volumes, tmpfs_mounts, MountSpec};
pub use ports::{exposed_ports, port_bindings};
pub use units::{duration, shm_size, stop_grace_period};

/// Describe the kind of a raw value for error messages
pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(n) if n.is_f64() => "a float",
        Value::Number(_) => "an integer",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a map",
        Value::Tagged(_) => "a tagged value",
    }
}

pub(crate) fn expected(what: &str, value: &Value) -> ComposeError {
    ComposeError::shape(format!("expected {} but found {}", what, kind_of(value)))
}

/// Render a scalar as a string; null renders as the empty string
pub(crate) fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}

/// Mapping keys may be any scalar in YAML; compose keys are always used as strings
pub(crate) fn key_string(key: &Value) -> ComposeResult<String> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(ComposeError::shape(format!(
            "keys should be strings but found {}",
            kind_of(other)
        ))),
    }
}

/// A string, or a number used where a string is expected
pub fn string_or_number(value: &Value) -> ComposeResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(expected("a string or a number", other)),
    }
}

/// Ordered list of strings.
///
/// Accepts a list of scalars, a map (rendered as `key=value`, null values as
/// `key=`), or a single string split on whitespace.
pub fn string_list(value: &Value) -> ComposeResult<Vec<String>> {
    match value {
        Value::Sequence(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                scalar_string(item).ok_or_else(|| expected("a string", item).at(index.to_string()))
            })
            .collect(),
        Value::Mapping(map) => map
            .iter()
            .map(|(key, item)| {
                let key = key_string(key)?;
                let item = scalar_string(item).ok_or_else(|| expected("a string", item).at(&key))?;
                Ok(format!("{}={}", key, item))
            })
            .collect(),
        Value::String(s) => Ok(s.split_whitespace().map(str::to_string).collect()),
        other => Err(expected("a list, a map or a string", other)),
    }
}

/// String to string map.
///
/// Accepts a map of scalars or a list of `key=value` entries. A bare `key`
/// maps to the empty string.
pub fn string_map(value: &Value) -> ComposeResult<HashMap<String, String>> {
    match value {
        Value::Mapping(map) => map
            .iter()
            .map(|(key, item)| {
                let key = key_string(key)?;
                let item = scalar_string(item).ok_or_else(|| expected("a string", item).at(&key))?;
                Ok((key, item))
            })
            .collect(),
        Value::Sequence(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                scalar_string(item)
                    .ok_or_else(|| expected("a string", item))
                    .and_then(|entry| split_pair(&entry))
                    .map_err(|err| err.at(index.to_string()))
            })
            .collect(),
        other => Err(expected("a map or a list", other)),
    }
}

fn split_pair(entry: &str) -> ComposeResult<(String, String)> {
    let mut parts = entry.split('=');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(key), None, _) if !key.is_empty() => Ok((key.to_string(), String::new())),
        (Some(key), Some(value), None) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(ComposeError::coercion(format!(
            "{:?} should be a key=value pair",
            entry
        ))),
    }
}

/// Labels, as a map or a list of `key=value`
pub fn labels(value: &Value) -> ComposeResult<HashMap<String, String>> {
    string_map(value)
}

/// Environment as `KEY=VALUE` strings, from a map or a list
pub fn environment(value: &Value) -> ComposeResult<Vec<String>> {
    string_list(value)
}

/// The `external` flag of a network or volume
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct External {
    pub enabled: bool,
    /// Name given by the legacy `external: {name: ...}` form
    pub name: Option<String>,
}

pub fn external(value: &Value) -> ComposeResult<External> {
    match value {
        Value::Bool(enabled) => Ok(External {
            enabled: *enabled,
            name: None,
        }),
        Value::Mapping(map) => {
            let mut name: Option<String> = None;
            bind_fields(map, fields![Field::new("name", &mut name)])?;
            Ok(External {
                enabled: true,
                name,
            })
        }
        other => Err(expected("a bool or a map", other)),
    }
}

/// Borrow a mapping or fail with `<what> should be a map`
pub(crate) fn as_mapping<'v>(value: &'v Value, what: &str) -> ComposeResult<&'v Mapping> {
    value
        .as_mapping()
        .ok_or_else(|| ComposeError::shape(format!("{} should be a map", what)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(input: &str) -> Value {
        serde_yaml::from_str(input).unwrap()
    }

    #[test]
    fn test_string_list_forms() {
        let expected = vec!["/bin/bash", "script"];
        assert_eq!(string_list(&yaml("[/bin/bash, script]")).unwrap(), expected);
        assert_eq!(string_list(&yaml("/bin/bash   script")).unwrap(), expected);
    }

    #[test]
    fn test_string_list_stringifies_scalars() {
        assert_eq!(
            string_list(&yaml("[a, 1, true, null]")).unwrap(),
            vec!["a", "1", "true", ""]
        );
    }

    #[test]
    fn test_string_list_from_map() {
        let mut env = string_list(&yaml("{test1: var, test2: null, test3: 1, test4: true}")).unwrap();
        env.sort();
        assert_eq!(env, vec!["test1=var", "test2=", "test3=1", "test4=true"]);
    }

    #[test]
    fn test_string_list_rejects_other_shapes() {
        let err = string_list(&yaml("0")).unwrap_err();
        assert_eq!(err.to_string(), "expected a list, a map or a string but found an integer");

        let err = string_list(&yaml("[a, [b]]")).unwrap_err();
        assert_eq!(err.path(), ["1"]);
    }

    #[test]
    fn test_string_map_forms_agree() {
        let from_map = string_map(&yaml("{Some: Label, Empty: null}")).unwrap();
        let from_list = string_map(&yaml("[Some=Label, Empty]")).unwrap();
        assert_eq!(from_map, from_list);
        assert_eq!(from_map["Some"], "Label");
        assert_eq!(from_map["Empty"], "");
    }

    #[test]
    fn test_string_map_rejects_extra_equals() {
        let err = string_map(&yaml("[a=b=c]")).unwrap_err();
        assert_eq!(err.to_string(), "0: \"a=b=c\" should be a key=value pair");
    }

    #[test]
    fn test_string_map_rejects_nested_values() {
        let err = string_map(&yaml("{key: [1]}")).unwrap_err();
        assert_eq!(err.to_string(), "key: expected a string but found a list");
        assert!(string_map(&yaml("just a string")).is_err());
    }

    #[test]
    fn test_external_forms() {
        assert_eq!(
            external(&yaml("true")).unwrap(),
            External {
                enabled: true,
                name: None
            }
        );
        assert_eq!(
            external(&yaml("{name: shared}")).unwrap(),
            External {
                enabled: true,
                name: Some("shared".to_string())
            }
        );
        assert!(external(&yaml("0")).is_err());
    }
}
