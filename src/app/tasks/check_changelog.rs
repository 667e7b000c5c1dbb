use crate::config::args::CheckChangelogArgs;
use crate::core::changelog::{check_changelog, FindingSeverity};
use crate::domain::model::TaskReport;
use crate::domain::ports::Task;
use crate::utils::error::{Result, ToolkitError};
use crate::utils::paths::resolve_file;
use async_trait::async_trait;

pub struct CheckChangelog {
    args: CheckChangelogArgs,
}

impl CheckChangelog {
    pub fn new(args: CheckChangelogArgs) -> Self {
        Self { args }
    }
}

#[async_trait]
impl Task for CheckChangelog {
    fn name(&self) -> &'static str {
        "CheckChangelog"
    }

    async fn run(&self) -> Result<TaskReport> {
        let path = resolve_file(&self.args.path, "changelog")?;
        let text = std::fs::read_to_string(&path)?;
        let report = check_changelog(&text);

        for finding in &report.findings {
            match finding.severity() {
                FindingSeverity::Error => tracing::error!("{}: {}", path.display(), finding),
                FindingSeverity::Warning => tracing::warn!("{}: {}", path.display(), finding),
            }
        }
        if self.args.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        let (errors, warnings) = (report.errors(), report.warnings());
        if errors > 0 || (self.args.strict && warnings > 0) {
            return Err(ToolkitError::ChangelogRejected { errors, warnings });
        }

        tracing::info!(
            "✅ {} sections, {} entries, {} warnings",
            report.sections.len(),
            report.entry_count(),
            warnings
        );
        Ok(TaskReport::new(self.name())
            .with_count("sections", report.sections.len())
            .with_count("entries", report.entry_count())
            .with_count("warnings", warnings))
    }
}
