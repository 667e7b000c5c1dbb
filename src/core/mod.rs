pub mod changelog;
pub mod checksums;
pub mod compare;
pub mod docker;
pub mod engine;
pub mod fasta;
pub mod fdr;
pub mod manifest;

pub use crate::domain::model::{ExternalCommand, TaskReport};
pub use crate::domain::ports::{CommandRunner, RemoteArchive, Task};
pub use crate::utils::error::Result;
pub use engine::TaskEngine;
