//! Cerebro Core — errors, configuration, shared graph domain types.

pub mod config;
pub mod error;
pub mod types;

pub use config::{CerebroConfig, DataPaths};
pub use error::{Error, Result};
pub use types::*;
