pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::{CliConfig, JobCommand};

pub use adapters::storage::LocalStorage;
pub use config::{JobKind, Settings};
pub use core::etl::EtlEngine;
pub use utils::error::{EtlError, Result};
