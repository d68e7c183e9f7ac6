// Common utilities and shared code

pub mod config;
pub mod error;

pub use config::{ClientConfig, ServerConfig, WireConfig};
pub use error::{Error, Result};
