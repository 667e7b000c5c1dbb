use crate::config::args::RunFragPipeArgs;
use crate::core::docker::{collect_mount_points, DockerRun, ToolImages};
use crate::core::manifest::{read_fragpipe_manifest, read_workflow_database};
use crate::domain::model::TaskReport;
use crate::domain::ports::{CommandRunner, Task};
use crate::utils::error::Result;
use crate::utils::paths::{resolve_directory, resolve_file};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

pub struct RunFragPipe {
    args: RunFragPipeArgs,
    images: ToolImages,
    runner: Arc<dyn CommandRunner>,
}

impl RunFragPipe {
    pub fn new(args: RunFragPipeArgs, images: ToolImages, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            args,
            images,
            runner,
        }
    }
}

#[async_trait]
impl Task for RunFragPipe {
    fn name(&self) -> &'static str {
        "RunFragPipe"
    }

    async fn run(&self) -> Result<TaskReport> {
        let workflow = resolve_file(&self.args.workflow, "workflow file")?;
        let manifest = resolve_file(&self.args.manifest, "manifest file")?;
        let mzml_files = read_fragpipe_manifest(&manifest)?;
        let tools = resolve_directory(&self.args.config_tools_folder, "config tools folder")?;
        let output_dir = resolve_directory(&self.args.output_dir, "output directory")?;
        let database = read_workflow_database(&workflow)?;
        tracing::info!(
            "Workflow database: {}; {} mzML files",
            database.display(),
            mzml_files.len()
        );

        let mut paths: Vec<PathBuf> = vec![
            workflow.clone(),
            manifest.clone(),
            tools.clone(),
            output_dir.clone(),
            database,
        ];
        paths.extend(mzml_files.iter().cloned());

        let image = self
            .args
            .docker_image
            .as_deref()
            .unwrap_or(&self.images.fragpipe_image);
        let docker = DockerRun::new(image, &output_dir).mounts(collect_mount_points(&paths));

        let mut fragpipe = vec![
            self.images.fragpipe_exe.clone(),
            "--headless".to_string(),
            "--workflow".to_string(),
            workflow.display().to_string(),
            "--manifest".to_string(),
            manifest.display().to_string(),
            "--workdir".to_string(),
            output_dir.display().to_string(),
            "--config-tools-folder".to_string(),
            tools.display().to_string(),
        ];
        if self.args.dry_run {
            fragpipe.push("--dry-run".to_string());
        }
        if self.args.ram > 0 {
            fragpipe.extend(["--ram".to_string(), self.args.ram.to_string()]);
        }
        if self.args.threads > 0 {
            fragpipe.extend(["--threads".to_string(), self.args.threads.to_string()]);
        }

        self.runner.run(&docker.command(fragpipe)).await?;

        tracing::info!("✅ FragPipe finished; results in {}", output_dir.display());
        Ok(TaskReport::new(self.name())
            .with_output(output_dir)
            .with_count("mzml_files", mzml_files.len()))
    }
}
