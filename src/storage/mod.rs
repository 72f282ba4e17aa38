//! Storage records
//!
//! This module provides the volume create body.

pub mod volume;

pub use volume::VolumeCreate;
