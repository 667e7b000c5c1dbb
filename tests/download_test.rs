#![cfg(feature = "cli")]

use anyhow::Result;
use httpmock::prelude::*;
use httpmock::Method::HEAD;
use protkit::app::tasks::download_data::{sync_dataset, Dataset};
use protkit::core::checksums::{parse_checksums, CHECKSUM_FILE};
use protkit::{PrideArchive, ToolkitError};
use sha2::{Digest, Sha512};
use tempfile::TempDir;

const DATASET: Dataset = Dataset {
    name: "test-dataset",
    accession: "PXD000000",
    path: "pride/data/archive/2022/02/PXD000000/",
    molecule: "Protein",
    assay: "DIA",
    files: &["b.wiff", "a.wiff", "c.wiff"],
};

fn remote(name: &str) -> String {
    format!("/{}{}", DATASET.path, name)
}

fn sha512_hex(data: &[u8]) -> String {
    format!("{:x}", Sha512::digest(data))
}

fn archive(server: &MockServer) -> PrideArchive {
    PrideArchive::new(&server.base_url(), DATASET.path)
        .unwrap()
        .with_progress(false)
}

#[tokio::test]
async fn test_sync_downloads_available_files_and_records_checksums() -> Result<()> {
    let temp = TempDir::new()?;
    let server = MockServer::start();

    for (name, body) in [("a.wiff", "alpha"), ("b.wiff", "beta")] {
        server.mock(|when, then| {
            when.method(HEAD).path(remote(name));
            then.status(200);
        });
        server.mock(|when, then| {
            when.method(GET).path(remote(name));
            then.status(200).body(body);
        });
    }
    server.mock(|when, then| {
        when.method(HEAD).path(remote("c.wiff"));
        then.status(404);
    });

    let report = sync_dataset(&DATASET, &archive(&server), temp.path()).await?;
    assert_eq!(report.counts["downloaded"], 2);
    assert_eq!(report.counts["missing"], 1);
    assert_eq!(report.counts["already_downloaded"], 0);

    assert_eq!(std::fs::read_to_string(temp.path().join("a.wiff"))?, "alpha");
    assert!(!temp.path().join("a.wiff.part").exists());
    assert!(!temp.path().join("c.wiff").exists());

    // Registry order, not download order.
    let content = std::fs::read_to_string(temp.path().join(CHECKSUM_FILE))?;
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(
        lines,
        vec![
            format!("{}  b.wiff", sha512_hex(b"beta")),
            format!("{}  a.wiff", sha512_hex(b"alpha")),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_sync_skips_verified_files_and_refetches_corrupt_ones() -> Result<()> {
    let temp = TempDir::new()?;
    let server = MockServer::start();

    std::fs::write(temp.path().join("a.wiff"), "alpha")?;
    std::fs::write(temp.path().join("b.wiff"), "corrupted")?;
    std::fs::write(
        temp.path().join(CHECKSUM_FILE),
        format!(
            "{}  a.wiff\n{}  b.wiff\n",
            sha512_hex(b"alpha"),
            sha512_hex(b"beta")
        ),
    )?;

    let mut gets = Vec::new();
    for (name, body) in [("a.wiff", "alpha"), ("b.wiff", "beta"), ("c.wiff", "gamma")] {
        server.mock(|when, then| {
            when.method(HEAD).path(remote(name));
            then.status(200);
        });
        gets.push(server.mock(|when, then| {
            when.method(GET).path(remote(name));
            then.status(200).body(body);
        }));
    }

    let report = sync_dataset(&DATASET, &archive(&server), temp.path()).await?;
    assert_eq!(report.counts["already_downloaded"], 1);
    assert_eq!(report.counts["downloaded"], 2);
    gets[0].assert_hits(0);
    gets[1].assert_hits(1);
    gets[2].assert_hits(1);

    assert_eq!(std::fs::read_to_string(temp.path().join("b.wiff"))?, "beta");
    let recorded = parse_checksums(&std::fs::read_to_string(temp.path().join(CHECKSUM_FILE))?);
    assert_eq!(recorded.len(), 3);
    assert_eq!(recorded["c.wiff"], sha512_hex(b"gamma"));

    // Nothing left to do on the next run.
    let report = sync_dataset(&DATASET, &archive(&server), temp.path()).await?;
    assert_eq!(report.counts["already_downloaded"], 3);
    assert_eq!(report.counts["downloaded"], 0);
    gets[1].assert_hits(1);
    Ok(())
}

#[tokio::test]
async fn test_sync_keeps_checksums_of_files_finished_before_a_failure() -> Result<()> {
    let temp = TempDir::new()?;
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(HEAD).path(remote("c.wiff"));
        then.status(404);
    });
    for name in ["a.wiff", "b.wiff"] {
        server.mock(|when, then| {
            when.method(HEAD).path(remote(name));
            then.status(200);
        });
    }
    server.mock(|when, then| {
        when.method(GET).path(remote("b.wiff"));
        then.status(200).body("beta");
    });
    server.mock(|when, then| {
        when.method(GET).path(remote("a.wiff"));
        then.status(502);
    });

    let result = sync_dataset(&DATASET, &archive(&server), temp.path()).await;
    assert!(matches!(
        result,
        Err(ToolkitError::DownloadError { status: 502, .. })
    ));

    let recorded = parse_checksums(&std::fs::read_to_string(temp.path().join(CHECKSUM_FILE))?);
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded["b.wiff"], sha512_hex(b"beta"));
    assert!(!temp.path().join("a.wiff.part").exists());
    Ok(())
}

#[tokio::test]
async fn test_sync_fails_on_server_error() {
    let temp = TempDir::new().unwrap();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(HEAD);
        then.status(503);
    });

    let result = sync_dataset(&DATASET, &archive(&server), temp.path()).await;
    assert!(matches!(
        result,
        Err(ToolkitError::DownloadError { status: 503, .. })
    ));
    assert!(!temp.path().join(CHECKSUM_FILE).exists());
}

#[tokio::test]
async fn test_download_data_task_uses_dataset_layout() -> Result<()> {
    use protkit::app::tasks::DownloadData;
    use protkit::config::args::DownloadDataArgs;
    use protkit::domain::ports::Task;
    use protkit::Settings;

    let temp = TempDir::new()?;
    let server = MockServer::start();
    let head = server.mock(|when, then| {
        when.method(HEAD);
        then.status(404);
    });

    let mut settings = Settings::default();
    settings.paths.data_dir = Some(temp.path().to_path_buf());
    settings.download.show_progress = false;
    let task = DownloadData::new(
        DownloadDataArgs {
            dataset: "van_puyvelde-2022".to_string(),
            base_url: Some(server.base_url()),
        },
        settings,
    );

    let report = task.run().await?;
    assert_eq!(report.counts["missing"], 10);
    assert_eq!(report.counts["downloaded"], 0);
    head.assert_hits(10);
    assert!(temp
        .path()
        .join("data/van_puyvelde-2022/Protein/DIA/Raw")
        .is_dir());
    Ok(())
}

#[tokio::test]
async fn test_download_data_requires_data_dir() {
    use protkit::app::tasks::DownloadData;
    use protkit::config::args::DownloadDataArgs;
    use protkit::domain::ports::Task;
    use protkit::Settings;

    let task = DownloadData::new(
        DownloadDataArgs {
            dataset: "van_puyvelde-2022".to_string(),
            base_url: None,
        },
        Settings::default(),
    );
    assert!(matches!(
        task.run().await,
        Err(ToolkitError::MissingConfigError { .. })
    ));
}
