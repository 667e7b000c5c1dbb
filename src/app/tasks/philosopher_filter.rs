use crate::config::args::PhilosopherFilterArgs;
use crate::core::docker::{collect_mount_points, DockerRun, ToolImages};
use crate::domain::model::TaskReport;
use crate::domain::ports::{CommandRunner, Task};
use crate::utils::error::Result;
use crate::utils::paths::{resolve_directory, resolve_file};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Runs Philosopher's picked-FDR filter and report in a fresh workspace.
pub struct PhilosopherFilter {
    args: PhilosopherFilterArgs,
    images: ToolImages,
    runner: Arc<dyn CommandRunner>,
}

impl PhilosopherFilter {
    pub fn new(args: PhilosopherFilterArgs, images: ToolImages, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            args,
            images,
            runner,
        }
    }

    /// Philosopher arguments of each step, executable first.
    fn steps(&self, pepxml: &Path, protxml: &Path, database: &Path) -> Vec<Vec<String>> {
        let a = &self.args;
        let step = |args: Vec<String>| -> Vec<String> {
            std::iter::once(self.images.philosopher_exe.clone())
                .chain(args)
                .collect()
        };
        let owned = |args: &[&str]| args.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        vec![
            step(owned(&["workspace", "--clean", "--nocheck"])),
            step(owned(&["workspace", "--init", "--nocheck"])),
            step(vec![
                "database".to_string(),
                "--annotate".to_string(),
                database.display().to_string(),
                "--prefix".to_string(),
                a.tag.clone(),
            ]),
            step(vec![
                "filter".to_string(),
                "--picked".to_string(),
                "--pep".to_string(),
                a.pep.to_string(),
                "--prot".to_string(),
                a.prot.to_string(),
                "--psm".to_string(),
                a.psm.to_string(),
                "--ion".to_string(),
                a.ion.to_string(),
                "--minPepLen".to_string(),
                a.min_pep_len.to_string(),
                "--group".to_string(),
                "--tag".to_string(),
                a.tag.clone(),
                "--pepxml".to_string(),
                pepxml.display().to_string(),
                "--protxml".to_string(),
                protxml.display().to_string(),
                "--razor".to_string(),
            ]),
            step(owned(&["report", "--removecontam"])),
        ]
    }
}

#[async_trait]
impl Task for PhilosopherFilter {
    fn name(&self) -> &'static str {
        "PhilosopherFilter"
    }

    async fn run(&self) -> Result<TaskReport> {
        let pepxml = resolve_directory(&self.args.pepxml, "pepXML directory")?;
        let protxml = resolve_file(&self.args.protxml, "protXML file")?;
        let database = resolve_file(&self.args.database, "FASTA database file")?;
        let work_dir = match &self.args.work_dir {
            Some(dir) => resolve_directory(dir, "working directory")?,
            None => std::env::current_dir()?,
        };

        let image = self
            .args
            .docker_image
            .as_deref()
            .unwrap_or(&self.images.fragpipe_image);
        let mounts: Vec<PathBuf> = collect_mount_points([&pepxml, &protxml, &work_dir, &database]);
        let docker = DockerRun::new(image, &work_dir).mounts(&mounts);

        let steps = self.steps(&pepxml, &protxml, &database);
        for step in &steps {
            self.runner.run(&docker.command(step.iter().cloned())).await?;
        }

        tracing::info!("✅ Philosopher filter finished in {}", work_dir.display());
        Ok(TaskReport::new(self.name())
            .with_output(work_dir)
            .with_count("philosopher_steps", steps.len()))
    }
}
