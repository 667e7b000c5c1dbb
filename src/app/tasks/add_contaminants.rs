use crate::config::args::AddContaminantsArgs;
use crate::core::fasta::append_contaminants;
use crate::domain::model::TaskReport;
use crate::domain::ports::Task;
use crate::utils::error::Result;
use crate::utils::paths::{absolute, ensure_parent, resolve_file};
use async_trait::async_trait;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};

pub struct AddContaminants {
    args: AddContaminantsArgs,
}

impl AddContaminants {
    pub fn new(args: AddContaminantsArgs) -> Self {
        Self { args }
    }
}

#[async_trait]
impl Task for AddContaminants {
    fn name(&self) -> &'static str {
        "AddContaminants"
    }

    async fn run(&self) -> Result<TaskReport> {
        let database = resolve_file(&self.args.database, "FASTA database")?;
        let crap = resolve_file(&self.args.crap, "cRAP FASTA")?;
        let output = absolute(&self.args.output)?;
        ensure_parent(&output)?;

        tracing::info!(
            "Appending contaminants from {} to {}",
            crap.display(),
            database.display()
        );

        let mut writer = BufWriter::new(File::create(&output)?);
        let appended = append_contaminants(
            BufReader::new(File::open(&database)?),
            BufReader::new(File::open(&crap)?),
            &mut writer,
            &self.args.prefix,
        )?;
        writer.flush()?;

        tracing::info!(
            "✅ Appended {} contaminant entries with prefix '{}'",
            appended,
            self.args.prefix
        );
        Ok(TaskReport::new(self.name())
            .with_output(output)
            .with_count("contaminant_entries", appended))
    }
}
