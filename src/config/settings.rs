use crate::adapters::pride::PRIDE_BASE_URL;
use crate::core::docker::ToolImages;
use crate::utils::error::{Result, ToolkitError};
use crate::utils::validation::{validate_non_empty_string, validate_path, validate_url, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Settings shared by every subcommand, read from an optional TOML file.
///
/// ```toml
/// [paths]
/// data_dir = "${HOME}/proteomics"
///
/// [docker]
/// fragpipe_image = "fcyucn/fragpipe:23.1"
///
/// [download]
/// base_url = "https://ftp.pride.ebi.ac.uk/"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub paths: PathsSettings,
    pub docker: ToolImages,
    pub download: DownloadSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsSettings {
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadSettings {
    pub base_url: String,
    pub show_progress: bool,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            base_url: PRIDE_BASE_URL.to_string(),
            show_progress: true,
        }
    }
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var regex"))
}

impl Settings {
    /// Reads the settings file when given, then applies environment
    /// overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_overrides(|name| std::env::var(name).ok());
        Ok(settings)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ToolkitError::ConfigError {
            message: format!("cannot read settings file {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&content, |name| std::env::var(name).ok())
    }

    pub fn from_toml_str(content: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let processed = substitute_env_vars(content, lookup);
        toml::from_str(&processed).map_err(|e| ToolkitError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// `DATA_DIR` in the environment wins over `paths.data_dir`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(DATA_DIR_ENV).filter(|d| !d.trim().is_empty()) {
            self.paths.data_dir = Some(PathBuf::from(dir));
        }
    }

    pub fn data_dir(&self) -> Result<&Path> {
        self.paths
            .data_dir
            .as_deref()
            .ok_or_else(|| ToolkitError::MissingConfigError {
                field: format!("{} (environment) or paths.data_dir (settings)", DATA_DIR_ENV),
            })
    }
}

/// Replaces `${VAR}` with the variable's value; unknown variables are left
/// untouched.
fn substitute_env_vars(content: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    env_var_pattern()
        .replace_all(content, |caps: &regex::Captures| {
            let name = &caps[1];
            lookup(name).unwrap_or_else(|| format!("${{{}}}", name))
        })
        .into_owned()
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_url("download.base_url", &self.download.base_url)?;
        if let Some(dir) = &self.paths.data_dir {
            validate_path("paths.data_dir", dir)?;
        }
        validate_non_empty_string("docker.fragpipe_image", &self.docker.fragpipe_image)?;
        validate_non_empty_string("docker.fragpipe_exe", &self.docker.fragpipe_exe)?;
        validate_non_empty_string("docker.philosopher_exe", &self.docker.philosopher_exe)?;
        validate_non_empty_string("docker.msconvert_image", &self.docker.msconvert_image)?;
        Ok(())
    }
}
