use crate::domain::model::ExternalCommand;
use crate::domain::ports::CommandRunner;
use crate::utils::error::{Result, ToolkitError};
use async_trait::async_trait;
use tokio::process::Command;

/// Spawns commands as child processes sharing this process's stdio, so tool
/// output streams straight to the terminal.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &ExternalCommand) -> Result<()> {
        tracing::info!("Running: {}", command);

        let mut child = Command::new(&command.program);
        child.args(&command.args).kill_on_drop(true);
        if let Some(dir) = &command.current_dir {
            child.current_dir(dir);
        }

        let status = child.status().await.inspect_err(|e| {
            tracing::error!("Failed to start {}: {}", command.program, e);
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(ToolkitError::CommandFailed {
                program: command.program.clone(),
                code: status.code(),
            })
        }
    }
}
