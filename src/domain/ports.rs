use crate::domain::model::{ExternalCommand, TaskReport};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Runs external programs (docker, sudo). A non-zero exit is an error.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &ExternalCommand) -> Result<()>;
}

/// A remote file archive such as the PRIDE repository.
#[async_trait]
pub trait RemoteArchive: Send + Sync {
    async fn contains(&self, file_name: &str) -> Result<bool>;

    /// Downloads `file_name` to `destination`, returning the number of bytes written.
    async fn fetch(&self, file_name: &str, destination: &Path) -> Result<u64>;
}

/// One toolkit subcommand, fully configured and ready to run.
#[async_trait]
pub trait Task: Send + Sync {
    fn name(&self) -> &'static str;
    async fn run(&self) -> Result<TaskReport>;
}

#[async_trait]
impl<T: Task + ?Sized> Task for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn run(&self) -> Result<TaskReport> {
        (**self).run().await
    }
}
