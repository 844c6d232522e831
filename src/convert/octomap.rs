//! External octree-to-JSON converter process

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;

use crate::core::error::Error;
use crate::core::types::Result;
use crate::voxel::VoxelMap;

/// Runs `octomap2json <file>` and parses its stdout as a map payload
#[derive(Clone, Debug)]
pub struct OctomapConverter {
    binary: PathBuf,
}

impl OctomapConverter {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self { binary: binary.into() }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Convert an octree file into a voxel map
    ///
    /// Spawn failures and non-zero exits become
    /// [`Error::ConversionTransportFailure`]; the exit status is attached when
    /// the process ran, along with its stderr.
    pub async fn convert(&self, input: &Path) -> Result<VoxelMap> {
        log::info!("Converting {} with {}", input.display(), self.binary.display());

        let output = Command::new(&self.binary)
            .arg(input)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::ConversionTransportFailure {
                status: None,
                message: format!("failed to run {}: {}", self.binary.display(), e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let err = Error::ConversionTransportFailure {
                status: output.status.code(),
                message: if stderr.is_empty() { "converter exited with an error".to_string() } else { stderr },
            };
            log::error!("{}", err);
            return Err(err);
        }

        super::parse_payload(&output.stdout)
    }
}
