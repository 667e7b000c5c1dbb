pub mod run;

#[cfg(feature = "cli")]
pub mod tasks;
