pub mod settings;

#[cfg(feature = "cli")]
pub mod args;
#[cfg(feature = "cli")]
pub mod cli;

pub use settings::Settings;

#[cfg(feature = "cli")]
pub use cli::{Cli, Command};
