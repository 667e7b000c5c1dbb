#![cfg(feature = "cli")]

use anyhow::Result;
use async_trait::async_trait;
use protkit::app::run::{finish, prepare, shutdown_command};
use protkit::app::tasks::{Convert2Mzml, PhilosopherDatabase, PhilosopherFilter, RunFragPipe};
use protkit::config::args::{
    AddContaminantsArgs, Convert2MzmlArgs, PhilosopherDatabaseArgs, PhilosopherFilterArgs,
    RunFragPipeArgs,
};
use protkit::core::docker::ToolImages;
use protkit::domain::model::{ExternalCommand, TaskReport};
use protkit::domain::ports::{CommandRunner, Task};
use protkit::ToolkitError;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Records commands instead of running them; fails from the given call on.
#[derive(Default)]
struct RecordingRunner {
    commands: Mutex<Vec<ExternalCommand>>,
    fail_at: Option<usize>,
}

impl RecordingRunner {
    fn failing_at(call: usize) -> Self {
        Self {
            commands: Mutex::new(Vec::new()),
            fail_at: Some(call),
        }
    }

    fn commands(&self) -> Vec<ExternalCommand> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, command: &ExternalCommand) -> protkit::Result<()> {
        let mut commands = self.commands.lock().unwrap();
        commands.push(command.clone());
        if self.fail_at.is_some_and(|n| commands.len() > n) {
            return Err(ToolkitError::CommandFailed {
                program: command.program.clone(),
                code: Some(1),
            });
        }
        Ok(())
    }
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}

/// Arguments that follow the image name.
fn tool_args(command: &ExternalCommand, image: &str) -> Vec<String> {
    let pos = command
        .args
        .iter()
        .position(|a| a == image)
        .expect("image in docker command");
    command.args[pos + 1..].to_vec()
}

fn has_pair(args: &[String], flag: &str, value: &str) -> bool {
    args.windows(2).any(|w| w[0] == flag && w[1] == value)
}

#[tokio::test]
async fn test_philosopher_database_runs_in_fasta_directory() -> Result<()> {
    let temp = TempDir::new()?;
    let fasta = write(temp.path(), "db/proteome.fasta", ">P1\nPEPTIDE\n");
    let fasta = fasta.canonicalize()?;
    let runner = Arc::new(RecordingRunner::default());
    let images = ToolImages::default();

    let task = PhilosopherDatabase::new(
        PhilosopherDatabaseArgs {
            fasta: fasta.clone(),
            docker_image: Some("custom/fragpipe:1".to_string()),
        },
        images.clone(),
        runner.clone(),
    );
    let report = task.run().await?;

    let commands = runner.commands();
    assert_eq!(commands.len(), 2);
    let dir = fasta.parent().unwrap().display().to_string();
    assert_eq!(commands[0].program, "docker");
    assert!(has_pair(&commands[0].args, "-w", &dir));
    assert!(has_pair(&commands[0].args, "-v", &format!("{}:{}", dir, dir)));
    assert_eq!(
        tool_args(&commands[0], "custom/fragpipe:1"),
        vec![images.philosopher_exe.clone(), "workspace".into(), "--init".into(), "--nocheck".into()]
    );
    assert_eq!(
        tool_args(&commands[1], "custom/fragpipe:1"),
        vec![
            images.philosopher_exe.clone(),
            "database".into(),
            "--custom".into(),
            fasta.display().to_string()
        ]
    );
    assert_eq!(report.outputs, vec![fasta.parent().unwrap().to_path_buf()]);
    Ok(())
}

#[tokio::test]
async fn test_philosopher_database_missing_fasta_runs_nothing() {
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(RecordingRunner::default());
    let task = PhilosopherDatabase::new(
        PhilosopherDatabaseArgs {
            fasta: temp.path().join("missing.fasta"),
            docker_image: None,
        },
        ToolImages::default(),
        runner.clone(),
    );
    assert!(matches!(task.run().await, Err(ToolkitError::NotFound { .. })));
    assert!(runner.commands().is_empty());
}

fn filter_args(root: &Path) -> PhilosopherFilterArgs {
    let search = root.join("search");
    std::fs::create_dir_all(&search).unwrap();
    PhilosopherFilterArgs {
        pepxml: search.clone(),
        protxml: write(&search, "combined.prot.xml", "<protein_summary/>"),
        database: write(root, "db/db.fasta", ">P1\nPEPTIDE\n"),
        pep: 0.05,
        prot: 0.01,
        psm: 0.02,
        ion: 0.03,
        min_pep_len: 7,
        tag: "decoy_".to_string(),
        docker_image: None,
        work_dir: Some(root.join("work")),
    }
}

#[tokio::test]
async fn test_philosopher_filter_runs_five_steps_in_order() -> Result<()> {
    let temp = TempDir::new()?;
    let runner = Arc::new(RecordingRunner::default());
    let images = ToolImages::default();
    let task = PhilosopherFilter::new(filter_args(temp.path()), images.clone(), runner.clone());

    let report = task.run().await?;
    assert_eq!(report.counts["philosopher_steps"], 5);

    let commands = runner.commands();
    let steps: Vec<Vec<String>> = commands
        .iter()
        .map(|c| tool_args(c, &images.fragpipe_image))
        .collect();
    let subcommands: Vec<&str> = steps.iter().map(|s| s[1].as_str()).collect();
    assert_eq!(
        subcommands,
        vec!["workspace", "workspace", "database", "filter", "report"]
    );
    assert_eq!(steps[0][2], "--clean");
    assert_eq!(steps[1][2], "--init");
    assert!(has_pair(&steps[2], "--prefix", "decoy_"));

    let filter = &steps[3];
    assert_eq!(filter[2], "--picked");
    assert!(has_pair(filter, "--pep", "0.05"));
    assert!(has_pair(filter, "--prot", "0.01"));
    assert!(has_pair(filter, "--psm", "0.02"));
    assert!(has_pair(filter, "--ion", "0.03"));
    assert!(has_pair(filter, "--minPepLen", "7"));
    assert!(has_pair(filter, "--tag", "decoy_"));
    assert!(filter.contains(&"--group".to_string()));
    assert_eq!(filter.last().map(String::as_str), Some("--razor"));
    assert_eq!(steps[4][2], "--removecontam");

    let work = temp.path().join("work").canonicalize()?;
    assert!(has_pair(&commands[0].args, "-w", &work.display().to_string()));
    Ok(())
}

#[tokio::test]
async fn test_philosopher_filter_stops_at_first_failure() {
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(RecordingRunner::failing_at(2));
    let task = PhilosopherFilter::new(filter_args(temp.path()), ToolImages::default(), runner.clone());

    assert!(matches!(
        task.run().await,
        Err(ToolkitError::CommandFailed { .. })
    ));
    assert_eq!(runner.commands().len(), 3);
}

struct FragPipeFixture {
    _temp: TempDir,
    args: RunFragPipeArgs,
    database: PathBuf,
}

fn fragpipe_fixture() -> FragPipeFixture {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let database = write(root, "db/2024-01-01-decoys.fasta", ">P1\nPEPTIDE\n");
    let mzml_a = write(root, "mzml/a.mzML", "<mzML/>");
    let mzml_b = write(root, "mzml/b.mzML", "<mzML/>");
    let workflow = write(
        root,
        "dia.workflow",
        &format!(
            "# FragPipe workflow\ndatabase.db-path=\"{}\"  # combined database\nmsfragger.num_threads=0\n",
            database.display()
        ),
    );
    let manifest = write(
        root,
        "samples.fp-manifest",
        &format!(
            "{}\tA\t1\tDIA\n\n{}\tB\t1\tDIA\n",
            mzml_a.display(),
            mzml_b.display()
        ),
    );
    std::fs::create_dir_all(root.join("tools")).unwrap();

    let args = RunFragPipeArgs {
        workflow,
        manifest,
        config_tools_folder: root.join("tools"),
        output_dir: root.join("results"),
        docker_image: None,
        dry_run: false,
        ram: 0,
        threads: 0,
    };
    FragPipeFixture {
        args,
        database: database.canonicalize().unwrap(),
        _temp: temp,
    }
}

#[tokio::test]
async fn test_run_fragpipe_builds_headless_command() -> Result<()> {
    let fixture = fragpipe_fixture();
    let mut args = fixture.args.clone();
    args.ram = 32;
    args.threads = 8;
    args.dry_run = true;

    let runner = Arc::new(RecordingRunner::default());
    let images = ToolImages::default();
    let report = RunFragPipe::new(args.clone(), images.clone(), runner.clone())
        .run()
        .await?;
    assert_eq!(report.counts["mzml_files"], 2);

    let commands = runner.commands();
    assert_eq!(commands.len(), 1);
    let fragpipe = tool_args(&commands[0], &images.fragpipe_image);
    assert_eq!(fragpipe[0], images.fragpipe_exe);
    assert_eq!(fragpipe[1], "--headless");
    let output = args.output_dir.canonicalize()?.display().to_string();
    assert!(has_pair(&fragpipe, "--workdir", &output));
    assert!(fragpipe.contains(&"--dry-run".to_string()));
    assert!(has_pair(&fragpipe, "--ram", "32"));
    assert!(has_pair(&fragpipe, "--threads", "8"));

    // The workflow directory holds every other input, so it is the only mount.
    let root = fixture.args.workflow.parent().unwrap().canonicalize()?.display().to_string();
    let mounts: Vec<&String> = commands[0]
        .args
        .windows(2)
        .filter(|w| w[0] == "-v")
        .map(|w| &w[1])
        .collect();
    assert_eq!(mounts, vec![&format!("{}:{}", root, root)]);
    Ok(())
}

#[tokio::test]
async fn test_run_fragpipe_omits_default_resources() -> Result<()> {
    let fixture = fragpipe_fixture();
    let runner = Arc::new(RecordingRunner::default());
    let images = ToolImages::default();
    RunFragPipe::new(fixture.args.clone(), images.clone(), runner.clone())
        .run()
        .await?;

    let fragpipe = tool_args(&runner.commands()[0], &images.fragpipe_image);
    assert!(!fragpipe.contains(&"--ram".to_string()));
    assert!(!fragpipe.contains(&"--threads".to_string()));
    assert!(!fragpipe.contains(&"--dry-run".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_run_fragpipe_rejects_missing_database() {
    let fixture = fragpipe_fixture();
    std::fs::remove_file(&fixture.database).unwrap();
    let runner = Arc::new(RecordingRunner::default());

    let result = RunFragPipe::new(fixture.args.clone(), ToolImages::default(), runner.clone())
        .run()
        .await;
    assert!(matches!(result, Err(ToolkitError::WorkflowError { .. })));
    assert!(runner.commands().is_empty());
}

#[tokio::test]
async fn test_convert_mzml_runs_msconvert_per_row() -> Result<()> {
    let temp = TempDir::new()?;
    let wiff_a = write(temp.path(), "raw/A.wiff", "");
    let wiff_b = write(temp.path(), "raw/B.wiff", "");
    let input = write(
        temp.path(),
        "samples.csv",
        &format!(
            "sample_id,wiff\nA,{}\nB,{}\n",
            wiff_a.display(),
            wiff_b.display()
        ),
    );

    let runner = Arc::new(RecordingRunner::default());
    let images = ToolImages::default();
    let report = Convert2Mzml::new(
        Convert2MzmlArgs {
            input_file: input,
            output_dir: temp.path().join("mzml"),
        },
        images.clone(),
        runner.clone(),
    )
    .run()
    .await?;
    assert_eq!(report.counts["converted"], 2);

    let commands = runner.commands();
    assert_eq!(commands.len(), 2);
    assert!(has_pair(&commands[0].args, "--platform", "linux/amd64"));
    let msconvert = tool_args(&commands[0], &images.msconvert_image);
    assert_eq!(&msconvert[..2], ["wine", "msconvert"]);
    assert_eq!(msconvert[2], wiff_a.canonicalize()?.display().to_string());
    assert!(msconvert.contains(&"--mzML".to_string()));
    assert!(msconvert.contains(&"--64".to_string()));
    assert!(has_pair(&msconvert, "--filter", "peakPicking true 1-"));
    assert!(has_pair(
        &msconvert,
        "--filter",
        "titleMaker <RunId>.<ScanNumber>.<ScanNumber>.<ChargeState>"
    ));

    let raw_dir = wiff_a.parent().unwrap().canonicalize()?;
    let mounted = commands[0]
        .args
        .windows(2)
        .filter(|w| w[0] == "-v")
        .filter_map(|w| w[1].split(':').next())
        .any(|m| raw_dir.starts_with(m));
    assert!(mounted);
    Ok(())
}

#[tokio::test]
async fn test_shutdown_after_success() {
    let runner = RecordingRunner::default();
    let result = Ok(TaskReport::new("CombineFasta"));
    assert_eq!(finish(&result, true, &runner).await, 0);
    assert_eq!(runner.commands(), vec![shutdown_command()]);
    assert_eq!(shutdown_command().command_line(), "sudo shutdown now");
}

#[tokio::test]
async fn test_shutdown_after_failure_keeps_exit_code() {
    let runner = RecordingRunner::default();
    let result = Err(ToolkitError::CommandFailed {
        program: "docker".to_string(),
        code: Some(125),
    });
    assert_eq!(finish(&result, true, &runner).await, 1);
    assert_eq!(runner.commands(), vec![shutdown_command()]);
}

#[tokio::test]
async fn test_shutdown_after_rejected_arguments() {
    let runner = RecordingRunner::default();
    let args = AddContaminantsArgs {
        database: PathBuf::from("db.fasta"),
        crap: PathBuf::from("crap.fasta"),
        output: PathBuf::from("out.fasta"),
        prefix: String::new(),
    };
    let result = prepare(None, &args).map(|_| TaskReport::new("AddContaminants"));
    assert!(matches!(
        result,
        Err(ToolkitError::InvalidConfigValueError { .. })
    ));

    assert_eq!(finish(&result, true, &runner).await, 1);
    assert_eq!(runner.commands(), vec![shutdown_command()]);
}

#[tokio::test]
async fn test_no_shutdown_when_interrupted() {
    let runner = RecordingRunner::default();
    let result = Err(ToolkitError::Interrupted);
    assert_eq!(finish(&result, true, &runner).await, 130);
    assert!(runner.commands().is_empty());
}

#[tokio::test]
async fn test_failed_shutdown_is_not_fatal() {
    let runner = RecordingRunner::failing_at(0);
    let result = Ok(TaskReport::new("ComputeFDR"));
    assert_eq!(finish(&result, true, &runner).await, 0);
    assert_eq!(runner.commands().len(), 1);
}

#[tokio::test]
async fn test_no_shutdown_unless_requested() {
    let runner = RecordingRunner::default();
    let result = Err(ToolkitError::ChangelogRejected {
        errors: 2,
        warnings: 0,
    });
    assert_eq!(finish(&result, false, &runner).await, 1);
    assert!(runner.commands().is_empty());
}

#[tokio::test]
async fn test_shutdown_after_unreadable_settings() -> Result<()> {
    let dir = TempDir::new()?;
    let runner = RecordingRunner::default();
    let args = AddContaminantsArgs {
        database: PathBuf::from("db.fasta"),
        crap: PathBuf::from("crap.fasta"),
        output: PathBuf::from("out.fasta"),
        prefix: "contam_".to_string(),
    };
    let missing = dir.path().join("protkit.toml");
    let result = prepare(Some(&missing), &args).map(|_| TaskReport::new("AddContaminants"));
    assert!(matches!(result, Err(ToolkitError::ConfigError { .. })));

    assert_ne!(finish(&result, true, &runner).await, 0);
    assert_eq!(runner.commands(), vec![shutdown_command()]);
    Ok(())
}
