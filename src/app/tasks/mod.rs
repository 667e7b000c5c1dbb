pub mod add_contaminants;
pub mod check_changelog;
pub mod combine_fasta;
pub mod compare_samples;
pub mod compute_fdr;
pub mod convert_mzml;
pub mod download_data;
pub mod philosopher_database;
pub mod philosopher_filter;
pub mod run_fragpipe;

pub use add_contaminants::AddContaminants;
pub use check_changelog::CheckChangelog;
pub use combine_fasta::CombineFasta;
pub use compare_samples::CompareSamples;
pub use compute_fdr::ComputeFdr;
pub use convert_mzml::Convert2Mzml;
pub use download_data::DownloadData;
pub use philosopher_database::PhilosopherDatabase;
pub use philosopher_filter::PhilosopherFilter;
pub use run_fragpipe::RunFragPipe;

use crate::config::{Command, Settings};
use crate::domain::ports::{CommandRunner, Task};
use std::sync::Arc;

/// Builds the task for a parsed subcommand.
pub fn build_task(command: Command, settings: &Settings, runner: Arc<dyn CommandRunner>) -> Box<dyn Task> {
    let images = settings.docker.clone();
    match command {
        Command::AddContaminants(args) => Box::new(AddContaminants::new(args)),
        Command::CombineFasta(args) => Box::new(CombineFasta::new(args)),
        Command::ComputeFdr(args) => Box::new(ComputeFdr::new(args)),
        Command::Convert2Mzml(args) => Box::new(Convert2Mzml::new(args, images, runner)),
        Command::DownloadData(args) => Box::new(DownloadData::new(args, settings.clone())),
        Command::PhilosopherDatabase(args) => {
            Box::new(PhilosopherDatabase::new(args, images, runner))
        }
        Command::PhilosopherFilter(args) => Box::new(PhilosopherFilter::new(args, images, runner)),
        Command::RunFragPipe(args) => Box::new(RunFragPipe::new(args, images, runner)),
        Command::CheckChangelog(args) => Box::new(CheckChangelog::new(args)),
        Command::CompareSamples(args) => Box::new(CompareSamples::new(args)),
    }
}
