//! Builds `docker run` invocations for the containerised tools.

use crate::domain::model::ExternalCommand;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub const FRAGPIPE_DOCKER_IMAGE: &str = "fcyucn/fragpipe:23.1";
pub const FRAGPIPE_EXE: &str = "/fragpipe_bin/fragpipe-23.1/fragpipe-23.1/bin/fragpipe";
pub const PHILOSOPHER_EXE: &str =
    "/fragpipe_bin/fragpipe-23.1/fragpipe-23.1/tools/Philosopher/philosopher-v5.1.2";
pub const MSCONVERT_DOCKER_IMAGE: &str = "chambm/pwiz-skyline-i-agree-to-the-vendor-licenses";
pub const MSCONVERT_PLATFORM: &str = "linux/amd64";

/// Images and in-container executables. Loaded from the `[docker]` settings
/// section; every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolImages {
    pub fragpipe_image: String,
    pub fragpipe_exe: String,
    pub philosopher_exe: String,
    pub msconvert_image: String,
    pub msconvert_platform: String,
}

impl Default for ToolImages {
    fn default() -> Self {
        Self {
            fragpipe_image: FRAGPIPE_DOCKER_IMAGE.to_string(),
            fragpipe_exe: FRAGPIPE_EXE.to_string(),
            philosopher_exe: PHILOSOPHER_EXE.to_string(),
            msconvert_image: MSCONVERT_DOCKER_IMAGE.to_string(),
            msconvert_platform: MSCONVERT_PLATFORM.to_string(),
        }
    }
}

/// Directories to bind-mount so that every given path is visible inside the
/// container at the same location.
///
/// Files contribute their parent directory, directories themselves. Mounts
/// nested under another mount are dropped.
pub fn collect_mount_points<I, P>(paths: I) -> Vec<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let candidates: BTreeSet<PathBuf> = paths
        .into_iter()
        .filter_map(|p| {
            let p = p.as_ref();
            if p.is_dir() {
                Some(p.to_path_buf())
            } else {
                p.parent().map(Path::to_path_buf)
            }
        })
        .filter(|p| !p.as_os_str().is_empty())
        .collect();

    let mut mounts: Vec<PathBuf> = Vec::new();
    // BTreeSet order puts a parent directly before its descendants.
    for candidate in candidates {
        if !mounts.iter().any(|m| candidate.starts_with(m)) {
            mounts.push(candidate);
        }
    }
    mounts
}

/// `docker run --rm [--platform P] -w <work_dir> -v <m>:<m>... <image>`.
#[derive(Debug, Clone)]
pub struct DockerRun {
    image: String,
    work_dir: PathBuf,
    mounts: Vec<PathBuf>,
    platform: Option<String>,
}

impl DockerRun {
    pub fn new(image: impl Into<String>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            image: image.into(),
            work_dir: work_dir.into(),
            mounts: Vec::new(),
            platform: None,
        }
    }

    pub fn mounts<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.mounts.extend(paths.into_iter().map(|p| p.as_ref().to_path_buf()));
        self
    }

    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        let platform = platform.into();
        self.platform = (!platform.is_empty()).then_some(platform);
        self
    }

    /// The full command with `tool_args` appended after the image name.
    pub fn command<I, S>(&self, tool_args: I) -> ExternalCommand
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut mounts: Vec<&PathBuf> = self.mounts.iter().collect();
        if !mounts.iter().any(|m| self.work_dir.starts_with(m)) {
            mounts.push(&self.work_dir);
        }

        let mut cmd = ExternalCommand::new("docker").args(["run", "--rm"]);
        if let Some(platform) = &self.platform {
            cmd = cmd.args(["--platform", platform.as_str()]);
        }
        cmd = cmd.arg("-w").arg(self.work_dir.display().to_string());
        for mount in mounts {
            let m = mount.display().to_string();
            cmd = cmd.arg("-v").arg(format!("{}:{}", m, m));
        }
        cmd.arg(self.image.clone()).args(tool_args)
    }
}
