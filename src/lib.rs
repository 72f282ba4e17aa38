//! Rune Compose - translate Docker Compose files into container engine records
//!
//! Rune Compose reads a compose document (file format 3.0 to 3.8) and
//! produces the request bodies a Docker-compatible engine expects:
//!
//! - Network create bodies
//! - Volume create bodies
//! - Container, host and networking configs for each service

pub mod compose;
pub mod container;
pub mod error;
pub mod network;
pub mod storage;

pub use compose::{ComposeParser, Stack};
pub use error::{ComposeError, ComposeResult, Result, RuneError};
