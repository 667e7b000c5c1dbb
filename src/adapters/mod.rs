// Adapters layer: concrete implementations for external systems (processes,
// the PRIDE archive, XML and TSV files).

pub mod pepxml;
pub mod pride;
pub mod process;
pub mod protxml;
pub mod tables;

pub use pride::PrideArchive;
pub use process::ProcessRunner;
