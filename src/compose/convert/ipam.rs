//! Network IPAM settings

use super::{expected, string_map};
use crate::compose::binding::{bind_fields, fields, Field};
use crate::error::{ComposeError, ComposeResult};
use crate::network::{Ipam, IpamConfig};
use regex::Regex;
use serde_yaml::Value;
use std::net::Ipv6Addr;

const IPV4_CIDR: &str = r"^(([0-9]|[1-9][0-9]|1[0-9]{2}|2[0-4][0-9]|25[0-5])\.){3}([0-9]|[1-9][0-9]|1[0-9]{2}|2[0-4][0-9]|25[0-5])/([0-9]|[1-2][0-9]|3[0-2])$";

fn is_ipv4_cidr(subnet: &str) -> bool {
    Regex::new(IPV4_CIDR)
        .map(|pattern| pattern.is_match(subnet))
        .unwrap_or(false)
}

fn is_ipv6_cidr(subnet: &str) -> bool {
    match subnet.split_once('/') {
        Some((address, prefix)) => {
            address.parse::<Ipv6Addr>().is_ok()
                && !prefix.is_empty()
                && prefix.bytes().all(|b| b.is_ascii_digit())
                && prefix.parse::<u8>().map_or(false, |bits| bits <= 128)
        }
        None => false,
    }
}

/// `address/prefix` for IPv4 or IPv6
pub fn is_valid_cidr(subnet: &str) -> bool {
    is_ipv4_cidr(subnet) || is_ipv6_cidr(subnet)
}

/// `{driver, config: [{subnet}], options}`
pub fn ipam(value: &Value) -> ComposeResult<Ipam> {
    let config = value.as_mapping().ok_or_else(|| expected("a map", value))?;
    let mut ipam = Ipam::default();
    bind_fields(
        config,
        fields![
            Field::new("driver", &mut ipam.driver),
            Field::converted("config", &mut ipam.config, pools),
            Field::converted("options", &mut ipam.options, string_map),
        ],
    )?;
    Ok(ipam)
}

fn pools(value: &Value) -> ComposeResult<Vec<IpamConfig>> {
    let items = value.as_sequence().ok_or_else(|| expected("a list", value))?;
    items
        .iter()
        .enumerate()
        .map(|(index, item)| pool(item).map_err(|err| err.at(index.to_string())))
        .collect()
}

fn pool(item: &Value) -> ComposeResult<IpamConfig> {
    let config = item.as_mapping().ok_or_else(|| expected("a map", item))?;
    if config.keys().any(|key| key.as_str() != Some("subnet")) {
        return Err(ComposeError::validation("only subnet is supported in a pool"));
    }

    let mut subnet = String::new();
    bind_fields(
        config,
        fields![Field::new("subnet", &mut subnet).validate(valid_subnet)],
    )?;
    if subnet.is_empty() {
        return Err(ComposeError::validation("pool did not contain a subnet"));
    }
    Ok(IpamConfig { subnet })
}

fn valid_subnet(subnet: &String) -> ComposeResult<()> {
    if is_valid_cidr(subnet) {
        Ok(())
    } else {
        Err(ComposeError::validation("subnet was not valid"))
    }
}
