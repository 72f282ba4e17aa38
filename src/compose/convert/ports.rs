//! Exposed ports and port bindings

use super::{expected, scalar_string, string_list, string_or_number};
use crate::compose::binding::{bind_fields, fields, Field};
use crate::container::{PortBinding, PortMap, PortSet};
use crate::error::{ComposeError, ComposeResult};
use serde_yaml::{Mapping, Value};
use std::net::IpAddr;

const PROTOCOLS: &[&str] = &["tcp", "udp", "sctp"];

const PUBLISH_MODES: &[&str] = &["host", "ingress"];

/// Split `port/proto`, defaulting the protocol to tcp
fn split_proto(raw: &str) -> Result<(&str, &str), String> {
    let (port, proto) = match raw.split_once('/') {
        Some((port, "")) => (port, "tcp"),
        Some((port, proto)) => (port, proto),
        None => (raw, "tcp"),
    };
    if !PROTOCOLS.contains(&proto) {
        return Err(format!("invalid proto: {}", proto));
    }
    Ok((port, proto))
}

/// Parse `80` or `8000-8010` into an inclusive range
fn parse_range(raw: &str) -> Result<(u16, u16), String> {
    let parse = |port: &str| {
        port.parse::<u16>()
            .map_err(|_| format!("invalid port: {}", raw))
    };
    match raw.split_once('-') {
        Some((start, end)) => {
            let (start, end) = (parse(start)?, parse(end)?);
            if end < start {
                return Err(format!("invalid range specified: {}", raw));
            }
            Ok((start, end))
        }
        None => {
            let port = parse(raw)?;
            Ok((port, port))
        }
    }
}

/// Split `[ip:][host:]container` from the right
fn split_parts(raw: &str) -> (String, &str, &str) {
    let parts: Vec<&str> = raw.split(':').collect();
    let count = parts.len();
    let container = parts[count - 1];
    match count {
        1 => (String::new(), "", container),
        2 => (String::new(), parts[0], container),
        3 => (parts[0].to_string(), parts[1], container),
        _ => (parts[..count - 2].join(":"), parts[count - 2], container),
    }
}

fn check_host_ip(ip: &str) -> Result<(), String> {
    if !ip.is_empty() && ip.parse::<IpAddr>().is_err() {
        return Err(format!("invalid IP address: {}", ip));
    }
    Ok(())
}

/// Parse one short form port spec into `bindings`.
///
/// A container port range expands element-wise. A host range must have the
/// same length, except that a single container port may take a whole host
/// range, which the engine then picks from.
fn parse_port_spec(raw: &str, bindings: &mut PortMap) -> Result<(), String> {
    let (ip, host, container) = split_parts(raw);
    let ip = ip
        .strip_prefix('[')
        .and_then(|ip| ip.strip_suffix(']'))
        .unwrap_or(&ip)
        .to_string();
    check_host_ip(&ip)?;

    let (container, proto) = split_proto(container)?;
    if container.is_empty() {
        return Err(format!("no port specified: {}", raw));
    }
    let (start, end) = parse_range(container)?;

    let host_range = if host.is_empty() {
        None
    } else {
        Some(parse_range(host)?)
    };
    let same_length = match host_range {
        Some((host_start, host_end)) => host_end - host_start == end - start,
        None => true,
    };
    if !same_length && end != start {
        return Err(format!(
            "invalid ranges specified for container and host ports: {}",
            raw
        ));
    }

    for offset in 0..=(end - start) {
        let host_port = match host_range {
            None => String::new(),
            Some((host_start, _)) if same_length => (host_start + offset).to_string(),
            Some(_) => host.to_string(),
        };
        bindings
            .entry(format!("{}/{}", start + offset, proto))
            .or_default()
            .push(PortBinding::new(&ip, &host_port));
    }
    Ok(())
}

/// Long form: `{target, published, host_ip, protocol, mode}`
fn parse_port_mapping(config: &Mapping, bindings: &mut PortMap) -> ComposeResult<()> {
    let mut target: Option<i64> = None;
    let mut published = String::new();
    let mut host_ip = String::new();
    let mut protocol = String::new();
    let mut mode = String::new();
    bind_fields(
        config,
        fields![
            Field::new("target", &mut target),
            Field::converted("published", &mut published, string_or_number),
            Field::new("host_ip", &mut host_ip),
            Field::new("protocol", &mut protocol),
            Field::new("mode", &mut mode).validate(valid_mode),
        ],
    )?;

    let target = target.ok_or_else(|| ComposeError::validation("target is required"))?;
    let target = u16::try_from(target)
        .map_err(|_| ComposeError::coercion(format!("{} is not a valid port", target)))?;
    if protocol.is_empty() {
        protocol.push_str("tcp");
    }
    if !PROTOCOLS.contains(&protocol.as_str()) {
        return Err(ComposeError::validation(format!("invalid proto: {}", protocol)));
    }
    check_host_ip(&host_ip).map_err(ComposeError::validation)?;
    if !published.is_empty() {
        parse_range(&published).map_err(ComposeError::coercion)?;
    }

    bindings
        .entry(format!("{}/{}", target, protocol))
        .or_default()
        .push(PortBinding {
            host_ip,
            host_port: published,
        });
    Ok(())
}

fn valid_mode(mode: &String) -> ComposeResult<()> {
    if PUBLISH_MODES.contains(&mode.as_str()) {
        Ok(())
    } else {
        Err(ComposeError::validation(format!(
            "{} is not a valid publish mode",
            mode
        )))
    }
}

/// `expose` entries canonicalized to `port/proto`, ranges expanded
pub fn exposed_ports(value: &Value) -> ComposeResult<PortSet> {
    let mut ports = PortSet::new();
    for (index, spec) in string_list(value)?.iter().enumerate() {
        let (start, end, proto) = split_proto(spec)
            .and_then(|(range, proto)| parse_range(range).map(|(start, end)| (start, end, proto)))
            .map_err(|err| ComposeError::coercion(err).at(index.to_string()))?;
        for port in start..=end {
            ports.insert(format!("{}/{}", port, proto));
        }
    }
    Ok(ports)
}

/// `ports` entries as container port to host bindings.
///
/// Entries may be short form strings, bare integers or long form mappings.
pub fn port_bindings(value: &Value) -> ComposeResult<PortMap> {
    let mut bindings = PortMap::new();
    let items = match value {
        Value::Sequence(items) => items.clone(),
        Value::String(_) => string_list(value)?.into_iter().map(Value::String).collect(),
        other => return Err(expected("a list", other)),
    };

    for (index, item) in items.iter().enumerate() {
        let result = match item {
            Value::Mapping(config) => parse_port_mapping(config, &mut bindings),
            Value::String(_) | Value::Number(_) => {
                let spec = scalar_string(item).unwrap_or_default();
                parse_port_spec(&spec, &mut bindings).map_err(ComposeError::coercion)
            }
            other => Err(expected("a string or a map", other)),
        };
        result.map_err(|err| err.at(index.to_string()))?;
    }
    Ok(bindings)
}
