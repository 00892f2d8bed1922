//! RuralAid Core — error type, configuration, data directory layout.

pub mod config;
pub mod error;

pub use config::{DataPaths, RuralAidConfig};
pub use error::{Error, Result};
