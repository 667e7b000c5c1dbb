use super::args::*;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "protkit", version)]
#[command(about = "Proteomics toolkit: dataset downloads, FASTA preparation, FragPipe and Philosopher runs, FDR")]
pub struct Cli {
    /// Shut the host down after the command finishes (skipped on Ctrl-C)
    #[arg(long, global = true)]
    pub shutdown: bool,

    /// TOML settings file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Log as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Log CPU and memory usage of this process
    #[arg(long, global = true)]
    pub monitor: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Append cRAP contaminant entries to a FASTA database
    #[command(name = "AddContaminants")]
    AddContaminants(AddContaminantsArgs),

    /// Combine FASTA files, tagging each with its PE= tier
    #[command(name = "CombineFasta")]
    CombineFasta(CombineFastaArgs),

    /// Target-decoy FDR for PSMs, proteins and protein groups
    #[command(name = "ComputeFDR")]
    ComputeFdr(ComputeFdrArgs),

    /// Convert vendor raw files to mzML with msconvert
    #[command(name = "Convert2MzML")]
    Convert2Mzml(Convert2MzmlArgs),

    /// Download dataset files from the PRIDE archive
    #[command(name = "DownloadData")]
    DownloadData(DownloadDataArgs),

    /// Build a target-decoy database with Philosopher
    #[command(name = "PhilosopherDatabase")]
    PhilosopherDatabase(PhilosopherDatabaseArgs),

    /// Filter search results with Philosopher
    #[command(name = "PhilosopherFilter")]
    PhilosopherFilter(PhilosopherFilterArgs),

    /// Run a FragPipe workflow headless
    #[command(name = "RunFragPipe")]
    RunFragPipe(RunFragPipeArgs),

    /// Check a dated changelog for malformed or misordered sections
    #[command(name = "CheckChangelog")]
    CheckChangelog(CheckChangelogArgs),

    /// Compare mixture samples against the matching individual samples
    #[command(name = "CompareSamples")]
    CompareSamples(CompareSamplesArgs),
}

impl Validate for Command {
    fn validate(&self) -> Result<()> {
        match self {
            Command::AddContaminants(a) => a.validate(),
            Command::CombineFasta(a) => a.validate(),
            Command::ComputeFdr(a) => a.validate(),
            Command::Convert2Mzml(a) => a.validate(),
            Command::DownloadData(a) => a.validate(),
            Command::PhilosopherDatabase(a) => a.validate(),
            Command::PhilosopherFilter(a) => a.validate(),
            Command::RunFragPipe(a) => a.validate(),
            Command::CheckChangelog(a) => a.validate(),
            Command::CompareSamples(a) => a.validate(),
        }
    }
}
