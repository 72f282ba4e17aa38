//! Container records
//!
//! This module provides the container create records produced for each
//! compose service: the container config, the host config and their parts.

pub mod config;

pub use config::{
    BindOptions, ContainerConfig, DeviceMapping, HealthConfig, HostConfig, LogConfig, Mount,
    MountKind, Port, PortBinding, PortMap, PortSet, Resources, RestartPolicy, TmpfsOptions, Ulimit,
    VolumeOptions,
};
