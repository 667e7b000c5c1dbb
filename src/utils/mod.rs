pub mod error;
pub mod logger;
pub mod monitor;
pub mod paths;
pub mod validation;
