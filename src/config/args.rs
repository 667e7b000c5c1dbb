use crate::core::compare::ComparisonLevel;
use crate::utils::error::{Result, ToolkitError};
use crate::utils::validation::{
    validate_fraction, validate_non_empty_string, validate_path, validate_positive_number,
    validate_range, Validate,
};
use clap::Args;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

#[derive(Debug, Clone, Args)]
pub struct AddContaminantsArgs {
    /// Existing FASTA database to extend
    #[arg(long)]
    pub database: PathBuf,

    /// cRAP FASTA whose entries are appended
    #[arg(long)]
    pub crap: PathBuf,

    /// Destination of the expanded FASTA
    #[arg(long)]
    pub output: PathBuf,

    /// Prefix put in front of every contaminant header
    #[arg(long, default_value = "contam_")]
    pub prefix: String,
}

impl Validate for AddContaminantsArgs {
    fn validate(&self) -> Result<()> {
        validate_path("--database", &self.database)?;
        validate_path("--crap", &self.crap)?;
        validate_path("--output", &self.output)?;
        validate_non_empty_string("--prefix", &self.prefix)
    }
}

#[derive(Debug, Clone, Args)]
pub struct CombineFastaArgs {
    /// TSV with database_name, database_order and fasta_path columns
    #[arg(long)]
    pub manifest: PathBuf,

    /// Destination of the combined FASTA
    #[arg(long)]
    pub output: PathBuf,
}

impl Validate for CombineFastaArgs {
    fn validate(&self) -> Result<()> {
        validate_path("--manifest", &self.manifest)?;
        validate_path("--output", &self.output)
    }
}

#[derive(Debug, Clone, Args)]
pub struct ComputeFdrArgs {
    /// Directory holding the *.pep.xml files
    #[arg(long)]
    pub pep: PathBuf,

    /// protXML file with the protein groups
    #[arg(long)]
    pub prot: Option<PathBuf>,

    /// Output directory for the FDR tables
    #[arg(long)]
    pub output: PathBuf,

    #[arg(long, default_value = "rev_")]
    pub decoy_prefix: String,

    #[arg(long, default_value = "contam_")]
    pub contam_prefix: String,

    /// FASTA used for the search; required with --group-fdr
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Compute FDR separately for each PE= tier of the database
    #[arg(long)]
    pub group_fdr: bool,

    /// Skip protein-group FDR
    #[arg(long)]
    pub nopg_fdr: bool,
}

impl Validate for ComputeFdrArgs {
    fn validate(&self) -> Result<()> {
        validate_path("--pep", &self.pep)?;
        validate_path("--output", &self.output)?;
        validate_non_empty_string("--decoy-prefix", &self.decoy_prefix)?;
        validate_non_empty_string("--contam-prefix", &self.contam_prefix)?;
        if self.group_fdr && self.database.is_none() {
            return Err(ToolkitError::MissingConfigError {
                field: "--database (required with --group-fdr)".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Args)]
pub struct Convert2MzmlArgs {
    /// CSV with sample_id and wiff columns
    #[arg(long)]
    pub input_file: PathBuf,

    /// Directory receiving the mzML files
    #[arg(long)]
    pub output_dir: PathBuf,
}

impl Validate for Convert2MzmlArgs {
    fn validate(&self) -> Result<()> {
        validate_path("--input-file", &self.input_file)?;
        validate_path("--output-dir", &self.output_dir)
    }
}

#[derive(Debug, Clone, Args)]
pub struct DownloadDataArgs {
    /// Dataset to download
    #[arg(long)]
    pub dataset: String,

    /// Archive server root, overriding download.base_url
    #[arg(long)]
    pub base_url: Option<String>,
}

impl Validate for DownloadDataArgs {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("--dataset", &self.dataset)?;
        if let Some(url) = &self.base_url {
            crate::utils::validation::validate_url("--base-url", url)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Args)]
pub struct PhilosopherDatabaseArgs {
    /// Proteome FASTA from which to build the target-decoy database
    #[arg(long)]
    pub fasta: PathBuf,

    /// Image providing FragPipe and Philosopher
    #[arg(long)]
    pub docker_image: Option<String>,
}

impl Validate for PhilosopherDatabaseArgs {
    fn validate(&self) -> Result<()> {
        validate_path("--fasta", &self.fasta)?;
        validate_optional_image(&self.docker_image)
    }
}

#[derive(Debug, Clone, Args)]
pub struct PhilosopherFilterArgs {
    /// Directory with the pepXML files to filter
    #[arg(long)]
    pub pepxml: PathBuf,

    /// protXML accompanying the pepXML files
    #[arg(long)]
    pub protxml: PathBuf,

    /// FASTA database used for the search
    #[arg(long)]
    pub database: PathBuf,

    #[arg(long, default_value_t = 0.01)]
    pub pep: f64,

    #[arg(long, default_value_t = 0.01)]
    pub prot: f64,

    #[arg(long, default_value_t = 0.01)]
    pub psm: f64,

    #[arg(long, default_value_t = 0.01)]
    pub ion: f64,

    #[arg(long, default_value_t = 8)]
    pub min_pep_len: usize,

    /// Decoy tag prefix
    #[arg(long, default_value = "rev_")]
    pub tag: String,

    #[arg(long)]
    pub docker_image: Option<String>,

    /// Directory Philosopher runs in (default: current directory)
    #[arg(long)]
    pub work_dir: Option<PathBuf>,
}

impl Validate for PhilosopherFilterArgs {
    fn validate(&self) -> Result<()> {
        validate_path("--pepxml", &self.pepxml)?;
        validate_path("--protxml", &self.protxml)?;
        validate_path("--database", &self.database)?;
        validate_fraction("--pep", self.pep)?;
        validate_fraction("--prot", self.prot)?;
        validate_fraction("--psm", self.psm)?;
        validate_fraction("--ion", self.ion)?;
        validate_positive_number("--min-pep-len", self.min_pep_len, 1)?;
        validate_non_empty_string("--tag", &self.tag)?;
        validate_optional_image(&self.docker_image)
    }
}

#[derive(Debug, Clone, Args)]
pub struct RunFragPipeArgs {
    /// FragPipe workflow file
    #[arg(long)]
    pub workflow: PathBuf,

    /// FragPipe manifest listing the mzML files
    #[arg(long)]
    pub manifest: PathBuf,

    /// Directory containing MSFragger, IonQuant and diaTracer
    #[arg(long)]
    pub config_tools_folder: PathBuf,

    #[arg(long)]
    pub output_dir: PathBuf,

    #[arg(long)]
    pub docker_image: Option<String>,

    /// Only validate the workflow
    #[arg(long)]
    pub dry_run: bool,

    /// RAM in GB for FragPipe (0: FragPipe decides)
    #[arg(long, default_value_t = 0)]
    pub ram: u32,

    /// CPU threads for FragPipe (0: cores minus one)
    #[arg(long, default_value_t = 0)]
    pub threads: u32,
}

impl Validate for RunFragPipeArgs {
    fn validate(&self) -> Result<()> {
        validate_path("--workflow", &self.workflow)?;
        validate_path("--manifest", &self.manifest)?;
        validate_path("--config-tools-folder", &self.config_tools_folder)?;
        validate_path("--output-dir", &self.output_dir)?;
        validate_optional_image(&self.docker_image)
    }
}

#[derive(Debug, Clone, Args)]
pub struct CheckChangelogArgs {
    /// Changelog to check
    #[arg(long, default_value = "CHANGELOG.md")]
    pub path: PathBuf,

    /// Fail on warnings as well as errors
    #[arg(long)]
    pub strict: bool,

    /// Print the parsed report as JSON
    #[arg(long)]
    pub json: bool,
}

impl Validate for CheckChangelogArgs {
    fn validate(&self) -> Result<()> {
        validate_path("--path", &self.path)
    }
}

#[derive(Debug, Clone, Args)]
pub struct CompareSamplesArgs {
    /// Mixture sample as NAME=DIR (a ComputeFDR output directory)
    #[arg(long = "mixture", value_parser = parse_named_path, required = true)]
    pub mixtures: Vec<(String, PathBuf)>,

    /// Individual sample as NAME=DIR
    #[arg(long = "individual", value_parser = parse_named_path)]
    pub individuals: Vec<(String, PathBuf)>,

    /// Individual sample holding each tier, as TIER=NAME[,TIER=NAME...]
    #[arg(
        long = "tier-sample",
        value_parser = parse_tier_sample,
        value_delimiter = ',',
        default_value = "1=ecoli_01,2=yeast_01,3=human_01"
    )]
    pub tier_samples: Vec<(String, String)>,

    #[arg(long, value_enum, default_value_t = ComparisonLevel::Protein)]
    pub level: ComparisonLevel,

    /// Maximum q-value of an accepted identification
    #[arg(long, default_value_t = 0.01)]
    pub qvalue: f64,

    #[arg(long, default_value = "contam_")]
    pub contam_prefix: String,

    #[arg(long)]
    pub output: PathBuf,
}

impl CompareSamplesArgs {
    pub fn tier_sample_map(&self) -> HashMap<String, String> {
        self.tier_samples.iter().cloned().collect()
    }
}

impl Validate for CompareSamplesArgs {
    fn validate(&self) -> Result<()> {
        validate_range("--qvalue", self.qvalue, 0.0, 1.0)?;
        validate_path("--output", &self.output)?;
        let mut seen = HashSet::new();
        for (name, _) in self.mixtures.iter().chain(&self.individuals) {
            if !seen.insert(name) {
                return Err(ToolkitError::InvalidConfigValueError {
                    field: "--mixture/--individual".to_string(),
                    value: name.clone(),
                    reason: "sample names must be unique".to_string(),
                });
            }
        }
        Ok(())
    }
}

fn validate_optional_image(image: &Option<String>) -> Result<()> {
    match image {
        Some(image) => validate_non_empty_string("--docker-image", image),
        None => Ok(()),
    }
}

fn split_pair(value: &str) -> std::result::Result<(&str, &str), String> {
    let (left, right) = value
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", value))?;
    let (left, right) = (left.trim(), right.trim());
    if left.is_empty() || right.is_empty() {
        return Err(format!("expected KEY=VALUE, got '{}'", value));
    }
    Ok((left, right))
}

pub fn parse_named_path(value: &str) -> std::result::Result<(String, PathBuf), String> {
    let (name, path) = split_pair(value)?;
    Ok((name.to_string(), PathBuf::from(path)))
}

pub fn parse_tier_sample(value: &str) -> std::result::Result<(String, String), String> {
    let (tier, sample) = split_pair(value)?;
    Ok((tier.to_string(), sample.to_string()))
}
