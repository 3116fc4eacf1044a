//! Artifact Generator
//!
//! Turns a [`GeneratorConfig`] into the four artifacts on disk. Either all
//! four land in the output directory or none do: artifacts are first
//! rendered in memory, then written to hidden staging files, then renamed
//! into place. Any failure removes what this run already produced.
//!
//! Concurrent runs against the same directory are not serialised. Staging
//! names carry the process id, but the final renames may interleave.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::clock::{Clock, SystemClock};
use crate::config::GeneratorConfig;
use crate::error::{Result, RpcError};
use crate::export::{self, ArtifactKind, RenderedArtifact};
use crate::layout::LayoutDocument;

/// Suffix of staging files.
pub const STAGING_SUFFIX: &str = ".partial";

/// One artifact written to disk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WrittenArtifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub size_bytes: u64,
    /// Hex SHA-256 of the file contents.
    pub sha256: String,
}

/// Everything a successful run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactSet {
    pub output_dir: PathBuf,
    pub channel_count: usize,
    pub polygon_count: usize,
    pub generated_at: DateTime<Utc>,
    pub artifacts: Vec<WrittenArtifact>,
}

impl ArtifactSet {
    /// Paths of the written files, in write order.
    pub fn paths(&self) -> Vec<&Path> {
        self.artifacts.iter().map(|a| a.path.as_path()).collect()
    }

    pub fn get(&self, kind: ArtifactKind) -> Option<&WrittenArtifact> {
        self.artifacts.iter().find(|a| a.kind == kind)
    }
}

/// Generates artifact sets, reading time from `C`.
#[derive(Debug, Clone, Default)]
pub struct Generator<C: Clock = SystemClock> {
    clock: C,
}

impl Generator<SystemClock> {
    pub fn new() -> Self {
        Self { clock: SystemClock }
    }
}

impl<C: Clock> Generator<C> {
    pub fn with_clock(clock: C) -> Self {
        Self { clock }
    }

    /// Build the layout for `config` and write all four artifacts.
    ///
    /// # Errors
    /// - `SelfTestFailed` if the layout is missing geometry (nothing written)
    /// - `OutputDirectoryError` if the output directory cannot be created
    /// - `OutputWriteError` naming the artifact whose write failed; every
    ///   file from this run has been removed by then
    pub fn generate(&self, config: &GeneratorConfig) -> Result<ArtifactSet> {
        info!(
            "Generating {}-channel interface into {}",
            config.channel_count(),
            config.output_dir().display()
        );

        let document = LayoutDocument::build(config);
        document.self_test()?;
        debug!("Self-test passed: {} polygons", document.polygon_count());

        let generated_at = self.clock.now();
        let rendered = export::render_all(&document, config, generated_at)?;
        let artifacts = write_all(config.output_dir(), &rendered)?;

        info!(
            "Wrote {} artifacts to {}",
            artifacts.len(),
            config.output_dir().display()
        );

        Ok(ArtifactSet {
            output_dir: config.output_dir().to_path_buf(),
            channel_count: document.channel_count(),
            polygon_count: document.polygon_count(),
            generated_at,
            artifacts,
        })
    }
}

/// Generate with the system clock.
pub fn generate(config: &GeneratorConfig) -> Result<ArtifactSet> {
    Generator::new().generate(config)
}

/// Staging path for `kind` in `dir`.
pub fn staging_path(dir: &Path, kind: ArtifactKind) -> PathBuf {
    dir.join(format!(
        ".{}.{}{}",
        kind.file_name(),
        std::process::id(),
        STAGING_SUFFIX
    ))
}

/// Files touched by one run, for rollback.
#[derive(Debug, Default)]
struct WriteTransaction {
    staged: Vec<PathBuf>,
    committed: Vec<PathBuf>,
}

impl WriteTransaction {
    /// Best-effort removal of everything this run created.
    fn rollback(self) {
        for path in self.staged.iter().chain(self.committed.iter()) {
            match fs::remove_file(path) {
                Ok(()) => debug!("Removed {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Cleanup could not remove {}: {}", path.display(), e),
            }
        }
    }
}

fn write_all(dir: &Path, rendered: &[RenderedArtifact]) -> Result<Vec<WrittenArtifact>> {
    fs::create_dir_all(dir).map_err(|e| RpcError::OutputDirectoryError {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut txn = WriteTransaction::default();

    // Stage every artifact before touching any final name.
    let mut staged = Vec::with_capacity(rendered.len());
    for artifact in rendered {
        let staging = staging_path(dir, artifact.kind);
        if let Err(e) = fs::write(&staging, &artifact.bytes) {
            // A partial write may have left a file behind
            if staging.is_file() {
                txn.staged.push(staging);
            }
            txn.rollback();
            return Err(RpcError::OutputWriteError {
                artifact: artifact.kind,
                path: dir.join(artifact.kind.file_name()),
                source: e,
            });
        }
        debug!("Staged {} at {}", artifact.kind, staging.display());
        txn.staged.push(staging.clone());
        staged.push((artifact, staging));
    }

    let mut written = Vec::with_capacity(staged.len());
    for (artifact, staging) in staged {
        let target = dir.join(artifact.kind.file_name());
        if let Err(e) = fs::rename(&staging, &target) {
            txn.rollback();
            return Err(RpcError::OutputWriteError {
                artifact: artifact.kind,
                path: target,
                source: e,
            });
        }
        txn.staged.retain(|p| p != &staging);
        txn.committed.push(target.clone());

        written.push(WrittenArtifact {
            kind: artifact.kind,
            path: target,
            size_bytes: artifact.bytes.len() as u64,
            sha256: format!("{:x}", Sha256::digest(&artifact.bytes)),
        });
    }

    Ok(written)
}
