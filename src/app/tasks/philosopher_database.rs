use crate::config::args::PhilosopherDatabaseArgs;
use crate::core::docker::{collect_mount_points, DockerRun, ToolImages};
use crate::domain::model::TaskReport;
use crate::domain::ports::{CommandRunner, Task};
use crate::utils::error::{Result, ToolkitError};
use crate::utils::paths::resolve_file;
use async_trait::async_trait;
use std::sync::Arc;

/// Initialises a Philosopher workspace next to the FASTA and builds the
/// target-decoy database from it.
pub struct PhilosopherDatabase {
    args: PhilosopherDatabaseArgs,
    images: ToolImages,
    runner: Arc<dyn CommandRunner>,
}

impl PhilosopherDatabase {
    pub fn new(
        args: PhilosopherDatabaseArgs,
        images: ToolImages,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            args,
            images,
            runner,
        }
    }
}

#[async_trait]
impl Task for PhilosopherDatabase {
    fn name(&self) -> &'static str {
        "PhilosopherDatabase"
    }

    async fn run(&self) -> Result<TaskReport> {
        let fasta = resolve_file(&self.args.fasta, "proteome FASTA file")?;
        let fasta_dir = fasta
            .parent()
            .ok_or_else(|| ToolkitError::InvalidInput {
                path: fasta.clone(),
                reason: "FASTA file has no parent directory".to_string(),
            })?
            .to_path_buf();

        let image = self
            .args
            .docker_image
            .as_deref()
            .unwrap_or(&self.images.fragpipe_image);
        let docker = DockerRun::new(image, &fasta_dir).mounts(collect_mount_points([&fasta]));
        let philosopher = self.images.philosopher_exe.as_str();
        let fasta_arg = fasta.display().to_string();

        let steps: [Vec<&str>; 2] = [
            vec![philosopher, "workspace", "--init", "--nocheck"],
            vec![philosopher, "database", "--custom", fasta_arg.as_str()],
        ];
        for step in steps {
            self.runner.run(&docker.command(step)).await?;
        }

        tracing::info!("✅ Target-decoy database written to {}", fasta_dir.display());
        Ok(TaskReport::new(self.name()).with_output(fasta_dir))
    }
}
