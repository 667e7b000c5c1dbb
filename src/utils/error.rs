use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolkitError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("XML parsing error: {0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{description} not found: {}", path.display())]
    NotFound { description: String, path: PathBuf },

    #[error("Invalid input {}: {reason}", path.display())]
    InvalidInput { path: PathBuf, reason: String },

    #[error("Manifest error in {}: {message}", path.display())]
    ManifestError { path: PathBuf, message: String },

    #[error("Workflow error in {}: {message}", path.display())]
    WorkflowError { path: PathBuf, message: String },

    #[error("Command `{program}` failed with exit code {code:?}")]
    CommandFailed { program: String, code: Option<i32> },

    #[error("Download of {file} failed: HTTP {status}")]
    DownloadError { file: String, status: u16 },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("No identifications were loaded: {message}")]
    NoIdentifications { message: String },

    #[error("Changelog rejected: {errors} error(s), {warnings} warning(s)")]
    ChangelogRejected { errors: usize, warnings: usize },

    #[error("Interrupted by user")]
    Interrupted,
}

pub type Result<T> = std::result::Result<T, ToolkitError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Configuration,
    ExternalTool,
    Network,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ToolkitError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ToolkitError::NotFound { .. }
            | ToolkitError::InvalidInput { .. }
            | ToolkitError::ManifestError { .. }
            | ToolkitError::WorkflowError { .. } => ErrorCategory::Input,
            ToolkitError::ConfigError { .. }
            | ToolkitError::InvalidConfigValueError { .. }
            | ToolkitError::MissingConfigError { .. } => ErrorCategory::Configuration,
            ToolkitError::CommandFailed { .. } => ErrorCategory::ExternalTool,
            ToolkitError::HttpError(_) | ToolkitError::DownloadError { .. } => {
                ErrorCategory::Network
            }
            ToolkitError::CsvError(_)
            | ToolkitError::SerializationError(_)
            | ToolkitError::XmlError(_)
            | ToolkitError::NoIdentifications { .. }
            | ToolkitError::ChangelogRejected { .. } => ErrorCategory::Data,
            ToolkitError::IoError(_) | ToolkitError::Interrupted => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ToolkitError::ChangelogRejected { errors: 0, .. } => ErrorSeverity::Low,
            ToolkitError::HttpError(_) | ToolkitError::DownloadError { .. } => {
                ErrorSeverity::Medium
            }
            ToolkitError::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            ToolkitError::Interrupted => 130,
            _ => match self.severity() {
                ErrorSeverity::Low => 4,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            },
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ToolkitError::NotFound { .. } => "Check the path and that the file was produced by the previous step",
            ToolkitError::InvalidInput { .. } => "Pass a path of the expected kind (file or directory)",
            ToolkitError::ManifestError { .. } => "Check the manifest columns and the paths it lists",
            ToolkitError::WorkflowError { .. } => "Set database.db-path in the FragPipe workflow to an existing FASTA",
            ToolkitError::CommandFailed { .. } => "Inspect the tool output above; make sure docker is running and the image is pulled",
            ToolkitError::HttpError(_) | ToolkitError::DownloadError { .. } => "Retry later; files already recorded in SHA512SUMS.txt are not downloaded again",
            ToolkitError::ConfigError { .. }
            | ToolkitError::InvalidConfigValueError { .. }
            | ToolkitError::MissingConfigError { .. } => "Fix the command-line flags, the settings file or the .env file",
            ToolkitError::NoIdentifications { .. } => "Make sure the search produced pepXML files with hits",
            ToolkitError::ChangelogRejected { .. } => "Fix the reported changelog lines",
            ToolkitError::CsvError(_) => "Check that the table is well-formed and tab/comma separated as expected",
            ToolkitError::XmlError(_) => "The XML file looks truncated or malformed; regenerate it",
            ToolkitError::SerializationError(_) => "Report this as a bug",
            ToolkitError::IoError(_) => "Check disk space and file permissions",
            ToolkitError::Interrupted => "Re-run the command when ready",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => format!("Input problem: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::ExternalTool => format!("External tool failed: {}", self),
            ErrorCategory::Network => format!("Network problem: {}", self),
            ErrorCategory::Data => format!("Data problem: {}", self),
            ErrorCategory::System => format!("System problem: {}", self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_follow_severity() {
        let err = ToolkitError::CommandFailed {
            program: "docker".to_string(),
            code: Some(2),
        };
        assert_eq!(err.category(), ErrorCategory::ExternalTool);
        assert_eq!(err.exit_code(), 1);

        let err = ToolkitError::DownloadError {
            file: "a.wiff".to_string(),
            status: 503,
        };
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert_eq!(err.exit_code(), 2);

        assert_eq!(ToolkitError::Interrupted.exit_code(), 130);
    }

    #[test]
    fn test_changelog_with_only_warnings_is_low_severity() {
        let err = ToolkitError::ChangelogRejected {
            errors: 0,
            warnings: 2,
        };
        assert_eq!(err.severity(), ErrorSeverity::Low);

        let err = ToolkitError::ChangelogRejected {
            errors: 1,
            warnings: 0,
        };
        assert_eq!(err.severity(), ErrorSeverity::High);
    }

    #[test]
    fn test_not_found_message_names_description() {
        let err = ToolkitError::NotFound {
            description: "FASTA database".to_string(),
            path: PathBuf::from("/tmp/db.fasta"),
        };
        assert_eq!(err.to_string(), "FASTA database not found: /tmp/db.fasta");
        assert!(err.user_friendly_message().starts_with("Input problem"));
    }
}
