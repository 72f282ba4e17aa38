//! Network records
//!
//! This module provides the network create body and the endpoint settings
//! a service uses to join networks.

pub mod config;

pub use config::{EndpointSettings, Ipam, IpamConfig, NetworkCreate, NetworkDriver, NetworkingConfig};
