use clap::Parser;
use protkit::app::run::{finish, prepare};
use protkit::app::tasks::build_task;
use protkit::utils::error::ToolkitError;
use protkit::utils::logger;
use protkit::{Cli, ProcessRunner, TaskEngine};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI: {:?}", cli);

    if cli.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let runner = Arc::new(ProcessRunner::new());
    let result = match prepare(cli.config.as_deref(), &cli.command) {
        Ok(settings) => {
            let task = build_task(cli.command, &settings, runner.clone());
            let engine = TaskEngine::new_with_monitoring(task, cli.monitor);
            tokio::select! {
                result = engine.run() => result,
                _ = tokio::signal::ctrl_c() => Err(ToolkitError::Interrupted),
            }
        }
        Err(e) => Err(e),
    };

    let exit_code = finish(&result, cli.shutdown, &*runner).await;
    std::process::exit(exit_code);
}
