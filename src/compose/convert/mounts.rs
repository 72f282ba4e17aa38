//! Service volume entries
//!
//! Each entry of a service's `volumes` list is parsed into a [`MountSpec`],
//! then routed by kind: volume mounts become container volume strings, bind
//! mounts become host binds and tmpfs mounts become structured mounts.

use super::expected;
use super::units::size_or_bytes;
use crate::compose::binding::{bind_fields, fields, Field};
use crate::container::{BindOptions, Mount, MountKind, TmpfsOptions, VolumeOptions};
use crate::error::{ComposeError, ComposeResult};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeSet;

const PROPAGATION_MODES: &[&str] = &["rprivate", "private", "rshared", "shared", "rslave", "slave"];

/// One parsed volume entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountSpec {
    pub kind: MountKind,
    /// Volume name or host path, empty for anonymous volumes
    pub source: String,
    pub target: String,
    pub read_only: bool,
    pub nocopy: bool,
    /// Bind propagation mode, empty when unset
    pub propagation: String,
    pub tmpfs_size: Option<i64>,
}

impl MountSpec {
    /// Render as `[source:]target:mode`
    pub fn render(&self) -> String {
        let mut mode = vec![if self.read_only { "ro" } else { "rw" }];
        match self.kind {
            MountKind::Volume if self.nocopy => mode.push("nocopy"),
            MountKind::Bind if !self.propagation.is_empty() => mode.push(&self.propagation),
            _ => {}
        }

        let mut parts = Vec::with_capacity(3);
        if !self.source.is_empty() {
            parts.push(self.source.clone());
        }
        if !self.target.is_empty() {
            parts.push(self.target.clone());
        }
        parts.push(mode.join(","));
        parts.join(":")
    }
}

impl From<&MountSpec> for Mount {
    fn from(spec: &MountSpec) -> Self {
        Mount {
            kind: spec.kind,
            source: spec.source.clone(),
            target: spec.target.clone(),
            read_only: spec.read_only,
            bind_options: (spec.kind == MountKind::Bind && !spec.propagation.is_empty()).then(|| {
                BindOptions {
                    propagation: spec.propagation.clone(),
                }
            }),
            volume_options: (spec.kind == MountKind::Volume && spec.nocopy)
                .then_some(VolumeOptions { no_copy: true }),
            tmpfs_options: spec
                .tmpfs_size
                .map(|size_bytes| TmpfsOptions { size_bytes }),
        }
    }
}

/// Host paths start with `.`, `/` or `~`; anything else names a volume
fn infer_kind(source: &str) -> MountKind {
    if source.starts_with(['.', '/', '~']) {
        MountKind::Bind
    } else {
        MountKind::Volume
    }
}

/// Parse `[source:]target[:options]`.
///
/// A one or two character spec is an anonymous volume target. Options are a
/// comma separated list of `ro`, `rw`, `nocopy` and propagation modes; others
/// are ignored.
pub fn parse_volume_spec(spec: &str) -> ComposeResult<MountSpec> {
    match spec.len() {
        0 => return Err(ComposeError::coercion("invalid empty volume spec")),
        1 | 2 => {
            return Ok(MountSpec {
                target: spec.to_string(),
                ..MountSpec::default()
            })
        }
        _ => {}
    }

    let mut mount = MountSpec::default();
    let sections: Vec<&str> = spec.split(':').collect();
    let last = sections.len() - 1;

    for (index, section) in sections.iter().enumerate() {
        if section.is_empty() {
            return Err(ComposeError::coercion(format!(
                "invalid spec: {}: empty section between colons",
                spec
            )));
        }
        if mount.source.is_empty() && index == last {
            mount.target = section.to_string();
        } else if mount.source.is_empty() {
            mount.source = section.to_string();
        } else if mount.target.is_empty() {
            mount.target = section.to_string();
        } else if index != last {
            return Err(ComposeError::coercion(format!(
                "invalid spec: {}: too many colons",
                spec
            )));
        } else {
            apply_options(&mut mount, section);
        }
    }

    mount.kind = infer_kind(&mount.source);
    Ok(mount)
}

fn apply_options(mount: &mut MountSpec, options: &str) {
    for option in options.split(',') {
        match option {
            "ro" => mount.read_only = true,
            "rw" => mount.read_only = false,
            "nocopy" => mount.nocopy = true,
            mode if PROPAGATION_MODES.contains(&mode) => mount.propagation = mode.to_string(),
            _ => {}
        }
    }
}

fn mount_kind(value: &Value) -> ComposeResult<MountKind> {
    match value.as_str() {
        Some("volume") => Ok(MountKind::Volume),
        Some("bind") => Ok(MountKind::Bind),
        Some("tmpfs") => Ok(MountKind::Tmpfs),
        Some(other) => Err(ComposeError::validation(format!(
            "{} is not a valid mount type",
            other
        ))),
        None => Err(expected("a string", value)),
    }
}

fn bind_propagation(value: &Value) -> ComposeResult<String> {
    let config = value.as_mapping().ok_or_else(|| expected("a map", value))?;
    let mut propagation = String::new();
    bind_fields(
        config,
        fields![Field::new("propagation", &mut propagation).validate(valid_propagation)],
    )?;
    Ok(propagation)
}

fn valid_propagation(mode: &String) -> ComposeResult<()> {
    if PROPAGATION_MODES.contains(&mode.as_str()) {
        Ok(())
    } else {
        Err(ComposeError::validation(format!(
            "{} is not a valid propagation mode",
            mode
        )))
    }
}

fn volume_nocopy(value: &Value) -> ComposeResult<bool> {
    let config = value.as_mapping().ok_or_else(|| expected("a map", value))?;
    let mut nocopy = false;
    bind_fields(config, fields![Field::new("nocopy", &mut nocopy)])?;
    Ok(nocopy)
}

fn tmpfs_size(value: &Value) -> ComposeResult<Option<i64>> {
    let config = value.as_mapping().ok_or_else(|| expected("a map", value))?;
    let mut size = None;
    bind_fields(config, fields![Field::converted("size", &mut size, size_or_bytes)])?;
    Ok(size)
}

/// Long form: `{type, source, target, read_only, bind, volume, tmpfs}`
fn parse_volume_mapping(config: &Mapping) -> ComposeResult<MountSpec> {
    let mut kind: Option<MountKind> = None;
    let mut mount = MountSpec::default();
    bind_fields(
        config,
        fields![
            Field::converted("type", &mut kind, mount_kind),
            Field::new("source", &mut mount.source),
            Field::new("target", &mut mount.target),
            Field::new("read_only", &mut mount.read_only),
            Field::converted("bind", &mut mount.propagation, bind_propagation),
            Field::converted("volume", &mut mount.nocopy, volume_nocopy),
            Field::converted("tmpfs", &mut mount.tmpfs_size, tmpfs_size),
        ],
    )?;

    if mount.target.is_empty() {
        return Err(ComposeError::validation("target is required"));
    }
    mount.kind = kind.unwrap_or_else(|| infer_kind(&mount.source));
    if mount.kind == MountKind::Bind && mount.source.is_empty() {
        return Err(ComposeError::validation("source is required for a bind mount"));
    }
    Ok(mount)
}

/// Parse every entry of a `volumes` list
pub fn mount_specs(value: &Value) -> ComposeResult<Vec<MountSpec>> {
    let items = value
        .as_sequence()
        .ok_or_else(|| expected("a list of strings or maps", value))?;
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let spec = match item {
                Value::String(spec) => parse_volume_spec(spec),
                Value::Mapping(config) => parse_volume_mapping(config),
                other => Err(expected("a string or a map", other)),
            };
            spec.map_err(|err| err.at(index.to_string()))
        })
        .collect()
}

fn rendered(value: &Value, kind: MountKind) -> ComposeResult<Vec<String>> {
    Ok(mount_specs(value)?
        .iter()
        .filter(|spec| spec.kind == kind)
        .map(MountSpec::render)
        .collect())
}

/// Volume kind entries, for the container config
pub fn container_volumes(value: &Value) -> ComposeResult<BTreeSet<String>> {
    Ok(rendered(value, MountKind::Volume)?.into_iter().collect())
}

/// Bind kind entries, for the host config
pub fn binds(value: &Value) -> ComposeResult<Vec<String>> {
    rendered(value, MountKind::Bind)
}

/// Tmpfs kind entries, which only exist as structured mounts
pub fn tmpfs_mounts(value: &Value) -> ComposeResult<Vec<Mount>> {
    Ok(mount_specs(value)?
        .iter()
        .filter(|spec| spec.kind == MountKind::Tmpfs)
        .map(Mount::from)
        .collect())
}
