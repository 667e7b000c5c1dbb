pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{Cli, Command};

pub use adapters::{PrideArchive, ProcessRunner};
pub use config::Settings;
pub use core::engine::TaskEngine;
pub use utils::error::{Result, ToolkitError};
