//! Docker Compose translation
//!
//! This module turns a compose document into the records a container engine
//! consumes: network and volume create bodies, and per service container,
//! host and networking configs.

pub mod binding;
pub mod convert;
pub mod network;
pub mod parser;
pub mod service;
pub mod stack;
pub mod volume;

pub use network::Network;
pub use parser::{ComposeParser, DEFAULT_COMPOSE_FILES};
pub use service::Service;
pub use stack::Stack;
pub use volume::Volume;
