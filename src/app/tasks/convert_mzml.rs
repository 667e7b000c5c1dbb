use crate::config::args::Convert2MzmlArgs;
use crate::core::docker::{collect_mount_points, DockerRun, ToolImages};
use crate::core::manifest::read_conversion_jobs;
use crate::domain::model::TaskReport;
use crate::domain::ports::{CommandRunner, Task};
use crate::utils::error::Result;
use crate::utils::paths::{resolve_directory, resolve_file};
use async_trait::async_trait;
use std::sync::Arc;

const PEAK_PICKING_FILTER: &str = "peakPicking true 1-";
const TITLE_MAKER_FILTER: &str = "titleMaker <RunId>.<ScanNumber>.<ScanNumber>.<ChargeState>";

/// Converts each listed raw file to centroided 64-bit mzML with msconvert.
pub struct Convert2Mzml {
    args: Convert2MzmlArgs,
    images: ToolImages,
    runner: Arc<dyn CommandRunner>,
}

impl Convert2Mzml {
    pub fn new(args: Convert2MzmlArgs, images: ToolImages, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            args,
            images,
            runner,
        }
    }
}

#[async_trait]
impl Task for Convert2Mzml {
    fn name(&self) -> &'static str {
        "Convert2MzML"
    }

    async fn run(&self) -> Result<TaskReport> {
        let input = resolve_file(&self.args.input_file, "conversion input CSV")?;
        let output_dir = resolve_directory(&self.args.output_dir, "mzML output directory")?;
        let cwd = std::env::current_dir()?;
        tracing::info!("Reading input file: {}", input.display());
        let jobs = read_conversion_jobs(&input)?;

        for job in &jobs {
            tracing::info!("Converting {}", job.sample_id);
            let wiff = resolve_file(&job.wiff, &format!("raw file for {}", job.sample_id))?;
            let mounts = collect_mount_points([&cwd, &wiff, &output_dir]);
            let command = DockerRun::new(&self.images.msconvert_image, &cwd)
                .platform(&self.images.msconvert_platform)
                .mounts(&mounts)
                .command([
                    "wine".to_string(),
                    "msconvert".to_string(),
                    wiff.display().to_string(),
                    "-o".to_string(),
                    output_dir.display().to_string(),
                    "--mzML".to_string(),
                    "--64".to_string(),
                    "--filter".to_string(),
                    PEAK_PICKING_FILTER.to_string(),
                    "--filter".to_string(),
                    TITLE_MAKER_FILTER.to_string(),
                ]);
            self.runner.run(&command).await?;
        }

        tracing::info!("✅ Conversion completed");
        Ok(TaskReport::new(self.name())
            .with_output(output_dir)
            .with_count("converted", jobs.len()))
    }
}
