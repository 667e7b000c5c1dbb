use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// A program invocation, kept as an argument vector (never a shell string).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
}

impl ExternalCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// POSIX-quoted command line, for logs.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(quote_arg)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for ExternalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

pub fn quote_arg(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "@%+=:,./-_".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', "'\"'\"'"))
    }
}

/// What a subcommand produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskReport {
    pub task: String,
    pub outputs: Vec<PathBuf>,
    pub counts: BTreeMap<String, usize>,
}

impl TaskReport {
    pub fn new(task: &str) -> Self {
        Self {
            task: task.to_string(),
            ..Default::default()
        }
    }

    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.outputs.push(path.into());
        self
    }

    pub fn with_count(mut self, key: &str, value: usize) -> Self {
        self.counts.insert(key.to_string(), value);
        self
    }
}

/// Database tier of an accession.
///
/// Orders contaminants first, then numbered tiers (`PE=` values, or `0` when
/// tiers are not in use), then accessions missing from the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Contaminant,
    Level(i64),
    Unknown,
}

impl Tier {
    pub const UNGROUPED: Tier = Tier::Level(0);
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Contaminant => write!(f, "-1"),
            Tier::Level(n) => write!(f, "{}", n),
            Tier::Unknown => write!(f, "unknown"),
        }
    }
}

impl Serialize for Tier {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecoyStatus {
    Decoy,
    Target,
}

impl DecoyStatus {
    pub fn is_target(self) -> bool {
        self == DecoyStatus::Target
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DecoyStatus::Target => "target",
            DecoyStatus::Decoy => "decoy",
        }
    }
}

/// Rank-1 peptide-spectrum match read from a pepXML file.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumMatch {
    pub spectrum: String,
    pub retention_time: Option<f64>,
    pub precursor_neutral_mass: f64,
    pub charge: u8,
    pub peptide: String,
    pub modified_peptide: String,
    /// Primary protein first, then alternatives, as reported by the search engine.
    pub proteins: Vec<String>,
    pub hyperscore: Option<f64>,
    pub nextscore: Option<f64>,
    pub expect: Option<f64>,
    pub probability: Option<f64>,
}

const PROTON_MASS: f64 = 1.007_276_466_8;

impl SpectrumMatch {
    pub fn observed_mz(&self) -> Option<f64> {
        if self.charge == 0 {
            return None;
        }
        let z = f64::from(self.charge);
        Some((self.precursor_neutral_mass + z * PROTON_MASS) / z)
    }
}

/// A protein and the proteins indistinguishable from it, as reported in protXML.
#[derive(Debug, Clone, PartialEq)]
pub struct ProteinGroup {
    pub accessions: Vec<String>,
    pub probability: f64,
}

impl ProteinGroup {
    pub fn leading_accession(&self) -> Option<&str> {
        self.accessions.first().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_quotes_only_when_needed() {
        let cmd = ExternalCommand::new("docker")
            .args(["run", "--rm", "-v", "/data:/data"])
            .arg("peakPicking true 1-")
            .arg("titleMaker <RunId>");
        assert_eq!(
            cmd.command_line(),
            "docker run --rm -v /data:/data 'peakPicking true 1-' 'titleMaker <RunId>'"
        );
        assert_eq!(quote_arg(""), "''");
        assert_eq!(quote_arg("it's"), "'it'\"'\"'s'");
    }

    #[test]
    fn test_tier_ordering() {
        let mut tiers = vec![Tier::Unknown, Tier::Level(2), Tier::Contaminant, Tier::Level(1)];
        tiers.sort();
        assert_eq!(
            tiers,
            vec![Tier::Contaminant, Tier::Level(1), Tier::Level(2), Tier::Unknown]
        );
        assert_eq!(Tier::Contaminant.to_string(), "-1");
        assert_eq!(Tier::UNGROUPED.to_string(), "0");
    }

    #[test]
    fn test_decoys_sort_before_targets() {
        assert!(DecoyStatus::Decoy < DecoyStatus::Target);
    }

    #[test]
    fn test_observed_mz() {
        let psm = SpectrumMatch {
            spectrum: "run.100.100.2".to_string(),
            retention_time: Some(60.0),
            precursor_neutral_mass: 1000.0,
            charge: 2,
            peptide: "PEPTIDEK".to_string(),
            modified_peptide: "PEPTIDEK".to_string(),
            proteins: vec!["P1".to_string()],
            hyperscore: None,
            nextscore: None,
            expect: None,
            probability: None,
        };
        let mz = psm.observed_mz().unwrap();
        assert!((mz - 501.007276).abs() < 1e-5);
    }
}
