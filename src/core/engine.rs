use crate::domain::model::TaskReport;
use crate::domain::ports::Task;
use crate::utils::error::Result;
use crate::utils::monitor::ResourceMonitor;

/// Runs one task, logging its outcome and, when enabled, resource usage.
pub struct TaskEngine<T: Task> {
    task: T,
    monitor: ResourceMonitor,
}

impl<T: Task> TaskEngine<T> {
    pub fn new(task: T) -> Self {
        Self::new_with_monitoring(task, false)
    }

    pub fn new_with_monitoring(task: T, monitor_enabled: bool) -> Self {
        Self {
            task,
            monitor: ResourceMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<TaskReport> {
        let name = self.task.name();
        tracing::info!("Starting {}", name);
        self.monitor.log_phase("Start");

        let result = self.task.run().await;
        self.monitor.log_phase(name);

        match &result {
            Ok(report) => {
                for (key, value) in &report.counts {
                    tracing::info!("{}: {}", key, value);
                }
                for output in &report.outputs {
                    tracing::info!("📁 Output: {}", output.display());
                }
            }
            Err(e) => tracing::debug!("{} failed: {:?}", name, e),
        }

        self.monitor.log_final();
        result
    }
}
