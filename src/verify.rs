//! Cross-artifact consistency check
//!
//! Re-reads an output directory and confirms all four artifacts agree on the
//! channel count, and reports staging files left behind by interrupted runs.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Serialize;
use walkdir::WalkDir;

use crate::error::{Result, RpcError};
use crate::export::plot::CHANNEL_POINT_MARKER;
use crate::export::{ArtifactKind, Metadata, SkeletonSummary};
use crate::generator::STAGING_SUFFIX;

/// Marker of one channel group in the SVG layout.
const SVG_CHANNEL_MARKER: &str = "class=\"channel\"";

/// Channel counts seen in each artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifyReport {
    pub output_dir: PathBuf,
    pub channel_count: usize,
    pub svg_channel_groups: usize,
    pub plot_channel_points: usize,
    pub gds_channel_records: usize,
    pub stale_staging_files: Vec<PathBuf>,
}

/// Check the artifacts in `dir` describe the same channels.
///
/// # Errors
/// - `ArtifactRead` if an artifact is missing or unreadable
/// - `VerificationFailed` on any count or ordering mismatch
/// - `InvalidSkeleton` if the GDS stream is malformed
pub fn verify(dir: &Path) -> Result<VerifyReport> {
    let metadata_bytes = read_artifact(dir, ArtifactKind::Metadata)?;
    let metadata =
        Metadata::from_json(&metadata_bytes).map_err(|e| RpcError::VerificationFailed {
            reason: format!(
                "{} is not valid metadata: {}",
                ArtifactKind::Metadata.file_name(),
                e
            ),
        })?;
    check_metadata(&metadata)?;
    let n = metadata.channel_count;

    let svg = String::from_utf8_lossy(&read_artifact(dir, ArtifactKind::Layout)?).into_owned();
    let svg_channel_groups = svg.matches(SVG_CHANNEL_MARKER).count();
    expect_count(ArtifactKind::Layout, "channel groups", svg_channel_groups, n)?;

    let plot = String::from_utf8_lossy(&read_artifact(dir, ArtifactKind::Plot)?).into_owned();
    let plot_channel_points = plot.matches(CHANNEL_POINT_MARKER).count();
    expect_count(ArtifactKind::Plot, "channel points", plot_channel_points, n)?;

    let skeleton = SkeletonSummary::parse(&read_artifact(dir, ArtifactKind::Gds)?)?;
    expect_count(
        ArtifactKind::Gds,
        "channel records",
        skeleton.channel_records,
        n,
    )?;

    let stale_staging_files = stale_staging_files(dir);
    for path in &stale_staging_files {
        warn!("Stale staging file: {}", path.display());
    }

    info!("Verified {} channels across all artifacts in {}", n, dir.display());

    Ok(VerifyReport {
        output_dir: dir.to_path_buf(),
        channel_count: n,
        svg_channel_groups,
        plot_channel_points,
        gds_channel_records: skeleton.channel_records,
        stale_staging_files,
    })
}

/// Hidden `*.partial` files directly inside `dir`, sorted by name.
pub fn stale_staging_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            let name = entry.file_name().to_string_lossy();
            name.starts_with('.') && name.ends_with(STAGING_SUFFIX)
        })
        .map(|entry| entry.path().to_path_buf())
        .collect();
    files.sort();
    files
}

fn read_artifact(dir: &Path, kind: ArtifactKind) -> Result<Vec<u8>> {
    let path = dir.join(kind.file_name());
    fs::read(&path).map_err(|e| RpcError::ArtifactRead {
        artifact: kind,
        path,
        source: e,
    })
}

fn check_metadata(metadata: &Metadata) -> Result<()> {
    let n = metadata.channel_count;
    if n == 0 {
        return Err(RpcError::VerificationFailed {
            reason: "metadata declares zero channels".to_string(),
        });
    }
    expect_count(ArtifactKind::Metadata, "channel entries", metadata.channels.len(), n)?;

    for (position, channel) in metadata.channels.iter().enumerate() {
        if channel.index != position {
            return Err(RpcError::VerificationFailed {
                reason: format!(
                    "metadata channel at position {} has index {}",
                    position, channel.index
                ),
            });
        }
    }
    if let Some(pair) = metadata.channels.windows(2).find(|w| w[1].x <= w[0].x) {
        return Err(RpcError::VerificationFailed {
            reason: format!(
                "channel x positions not strictly increasing at index {}",
                pair[1].index
            ),
        });
    }
    Ok(())
}

fn expect_count(kind: ArtifactKind, what: &str, found: usize, expected: usize) -> Result<()> {
    if found != expected {
        return Err(RpcError::VerificationFailed {
            reason: format!(
                "{} has {} {}, metadata declares {}",
                kind.file_name(),
                found,
                what,
                expected
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::generator::{generate, staging_path};
    use tempfile::tempdir;

    #[test]
    fn test_verify_fresh_output() {
        let dir = tempdir().unwrap();
        generate(&GeneratorConfig::new(6, dir.path()).unwrap()).unwrap();

        let report = verify(dir.path()).unwrap();
        assert_eq!(report.channel_count, 6);
        assert_eq!(report.svg_channel_groups, 6);
        assert_eq!(report.plot_channel_points, 6);
        assert_eq!(report.gds_channel_records, 6);
        assert!(report.stale_staging_files.is_empty());
    }

    #[test]
    fn test_verify_missing_artifact() {
        let dir = tempdir().unwrap();
        generate(&GeneratorConfig::new(3, dir.path()).unwrap()).unwrap();
        fs::remove_file(dir.path().join(ArtifactKind::Plot.file_name())).unwrap();

        match verify(dir.path()) {
            Err(RpcError::ArtifactRead { artifact, .. }) => {
                assert_eq!(artifact, ArtifactKind::Plot)
            }
            other => panic!("Expected ArtifactRead, got {:?}", other),
        }
    }

    #[test]
    fn test_verify_detects_mixed_runs() {
        let dir = tempdir().unwrap();
        let other = tempdir().unwrap();
        generate(&GeneratorConfig::new(8, dir.path()).unwrap()).unwrap();
        generate(&GeneratorConfig::new(4, other.path()).unwrap()).unwrap();

        // Metadata from a 4-channel run next to an 8-channel layout
        let name = ArtifactKind::Metadata.file_name();
        fs::copy(other.path().join(name), dir.path().join(name)).unwrap();

        let err = verify(dir.path()).unwrap_err();
        assert!(matches!(err, RpcError::VerificationFailed { .. }));
        assert!(err.to_string().contains("layout.svg"));
    }

    #[test]
    fn test_reports_stale_staging_files() {
        let dir = tempdir().unwrap();
        generate(&GeneratorConfig::new(2, dir.path()).unwrap()).unwrap();
        let leftover = staging_path(dir.path(), ArtifactKind::Gds);
        fs::write(&leftover, b"partial").unwrap();

        let report = verify(dir.path()).unwrap();
        assert_eq!(report.stale_staging_files, vec![leftover]);
    }
}
