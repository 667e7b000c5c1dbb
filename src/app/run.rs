//! What happens around a task: settings and argument checks before it,
//! reporting, the optional host shutdown and the exit code after it.

use crate::config::settings::Settings;
use crate::domain::model::{ExternalCommand, TaskReport};
use crate::domain::ports::CommandRunner;
use crate::utils::error::{Result, ToolkitError};
use crate::utils::validation::Validate;
use std::path::Path;

/// Loads the settings and validates them together with the subcommand's
/// arguments.
pub fn prepare(config: Option<&Path>, command: &dyn Validate) -> Result<Settings> {
    let settings = Settings::load(config)?;
    settings.validate()?;
    command.validate()?;
    Ok(settings)
}

pub fn shutdown_command() -> ExternalCommand {
    ExternalCommand::new("sudo").args(["shutdown", "now"])
}

fn report_error(e: &ToolkitError) {
    tracing::error!(
        "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
}

/// Reports the outcome, shuts the host down when asked and returns the
/// process exit code.
///
/// Shutdown follows success and failure alike, including failed settings or
/// argument checks; only an interrupted run skips it. A failing shutdown
/// request is logged and leaves the exit code alone.
pub async fn finish(result: &Result<TaskReport>, shutdown: bool, runner: &dyn CommandRunner) -> i32 {
    let exit_code = match result {
        Ok(report) => {
            tracing::info!("✅ {} completed successfully", report.task);
            println!("✅ {} completed successfully", report.task);
            0
        }
        Err(e) => {
            report_error(e);
            e.exit_code()
        }
    };

    if shutdown {
        if matches!(result, Err(ToolkitError::Interrupted)) {
            tracing::warn!("Interrupted; skipping shutdown");
        } else {
            let command = shutdown_command();
            tracing::info!("Shutting down: {}", command);
            if let Err(e) = runner.run(&command).await {
                tracing::error!("❌ Shutdown request failed: {}", e);
            }
        }
    }

    exit_code
}
