//! Integration Tests
//!
//! End-to-end tests for layout generation and artifact export.

use std::fs;
use std::path::Path;

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use tempfile::tempdir;
use test_case::test_case;

use rpcgen::clock::FixedClock;
use rpcgen::export::{ArtifactKind, Metadata, SkeletonSummary};
use rpcgen::{generate, verify, ConfigFile, Generator, GeneratorConfig, RpcError};

fn fixed_clock() -> FixedClock {
    FixedClock(Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap())
}

fn read(dir: &Path, kind: ArtifactKind) -> Vec<u8> {
    fs::read(dir.join(kind.file_name())).unwrap()
}

fn metadata_without_timestamp(dir: &Path) -> serde_json::Value {
    let mut value: serde_json::Value =
        serde_json::from_slice(&read(dir, ArtifactKind::Metadata)).unwrap();
    value.as_object_mut().unwrap().remove("generated_at");
    value
}

// === Artifact Set Tests ===

#[test_case(1 ; "single channel")]
#[test_case(8 ; "default channel count")]
#[test_case(16 ; "sixteen channels")]
#[test_case(64 ; "wide interface")]
fn test_generates_consistent_artifacts(n: i64) {
    let dir = tempdir().unwrap();
    let config = GeneratorConfig::new(n, dir.path()).unwrap();

    let set = generate(&config).unwrap();
    assert_eq!(set.artifacts.len(), 4);
    for kind in ArtifactKind::ALL {
        assert!(dir.path().join(kind.file_name()).is_file());
    }

    let metadata = Metadata::from_json(&read(dir.path(), ArtifactKind::Metadata)).unwrap();
    assert_eq!(metadata.channel_count, n as usize);
    assert_eq!(metadata.channels.len(), n as usize);

    let skeleton = SkeletonSummary::parse(&read(dir.path(), ArtifactKind::Gds)).unwrap();
    assert_eq!(skeleton.channel_records, n as usize);

    let report = verify(dir.path()).unwrap();
    assert_eq!(report.channel_count, n as usize);
}

#[test]
fn test_eight_channel_scenario() {
    let dir = tempdir().unwrap();
    let config = ConfigFile::default()
        .resolve(&ConfigFile {
            output_dir: Some(dir.path().to_path_buf()),
            ..ConfigFile::default()
        })
        .unwrap();
    assert_eq!(config.channel_count(), 8);

    let set = generate(&config).unwrap();
    assert!(set.polygon_count >= 4 * 8);

    let metadata = Metadata::from_json(&read(dir.path(), ArtifactKind::Metadata)).unwrap();
    let indices: Vec<usize> = metadata.channels.iter().map(|c| c.index).collect();
    assert_eq!(indices, (0..8).collect::<Vec<_>>());
    for pair in metadata.channels.windows(2) {
        assert!(pair[1].x > pair[0].x);
    }
    for channel in &metadata.channels {
        assert!(channel.phase_fidelity >= 0.98 && channel.phase_fidelity <= 0.995);
    }

    let svg = String::from_utf8(read(dir.path(), ArtifactKind::Layout)).unwrap();
    assert_eq!(svg.matches("class=\"channel\"").count(), 8);
    assert!(svg.contains("CH7"));
}

#[test]
fn test_gds_labels_follow_channel_order() {
    let dir = tempdir().unwrap();
    generate(&GeneratorConfig::new(5, dir.path()).unwrap()).unwrap();

    let skeleton = SkeletonSummary::parse(&read(dir.path(), ArtifactKind::Gds)).unwrap();
    assert_eq!(
        skeleton.channel_labels,
        vec!["CH0", "CH1", "CH2", "CH3", "CH4"]
    );
    assert_eq!(skeleton.geometry_records, 0);
}

#[test]
fn test_full_gds_geometry_keeps_channel_count() {
    let dir = tempdir().unwrap();
    let config = GeneratorConfig::new(4, dir.path())
        .unwrap()
        .with_gds_full_geometry(true);
    let set = generate(&config).unwrap();

    let skeleton = SkeletonSummary::parse(&read(dir.path(), ArtifactKind::Gds)).unwrap();
    assert_eq!(skeleton.channel_records, 4);
    assert_eq!(skeleton.geometry_records, set.polygon_count);
    verify(dir.path()).unwrap();
}

// === Invalid Input Tests ===

#[test_case(0 ; "zero channels")]
#[test_case(-3 ; "negative channels")]
fn test_invalid_channel_count_writes_nothing(n: i64) {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out");

    let err = ConfigFile::default()
        .resolve(&ConfigFile {
            channel_count: Some(n),
            output_dir: Some(out.clone()),
            ..ConfigFile::default()
        })
        .unwrap_err();

    assert!(matches!(err, RpcError::InvalidConfiguration { .. }));
    assert!(err.is_configuration_error());
    assert_eq!(err.exit_code(), 2);
    assert!(!out.exists());
}

#[test_case(8, 1e-15 ; "spacing collapses channel positions")]
#[test_case(10_000, 300.0 ; "layout overflows gds coordinates")]
fn test_unrepresentable_spacing_writes_nothing(n: i64, spacing: f64) {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out");

    let err = ConfigFile::default()
        .resolve(&ConfigFile {
            channel_count: Some(n),
            output_dir: Some(out.clone()),
            channel_spacing: Some(spacing),
            ..ConfigFile::default()
        })
        .unwrap_err();

    match err {
        RpcError::InvalidConfiguration { ref parameter, .. } => {
            assert_eq!(parameter, "channel_spacing")
        }
        ref other => panic!("Expected InvalidConfiguration, got {:?}", other),
    }
    assert!(!out.exists());
}

#[test]
fn test_rerun_replaces_previous_set() {
    let dir = tempdir().unwrap();
    generate(&GeneratorConfig::new(8, dir.path()).unwrap()).unwrap();
    generate(&GeneratorConfig::new(3, dir.path()).unwrap()).unwrap();

    let report = verify(dir.path()).unwrap();
    assert_eq!(report.channel_count, 3);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 4);
}

// === Determinism Tests ===

#[test]
fn test_same_inputs_give_identical_artifacts() {
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    let generator = Generator::with_clock(fixed_clock());

    generator
        .generate(&GeneratorConfig::new(8, first.path()).unwrap())
        .unwrap();
    generator
        .generate(&GeneratorConfig::new(8, second.path()).unwrap())
        .unwrap();

    for kind in ArtifactKind::ALL {
        assert_eq!(
            read(first.path(), kind),
            read(second.path(), kind),
            "{} differs",
            kind
        );
    }
}

#[test]
fn test_only_timestamp_varies_between_runs() {
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();

    Generator::with_clock(fixed_clock())
        .generate(&GeneratorConfig::new(6, first.path()).unwrap())
        .unwrap();
    Generator::with_clock(FixedClock(
        Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap(),
    ))
    .generate(&GeneratorConfig::new(6, second.path()).unwrap())
    .unwrap();

    assert_eq!(
        read(first.path(), ArtifactKind::Layout),
        read(second.path(), ArtifactKind::Layout)
    );
    assert_eq!(
        read(first.path(), ArtifactKind::Plot),
        read(second.path(), ArtifactKind::Plot)
    );
    assert_eq!(
        metadata_without_timestamp(first.path()),
        metadata_without_timestamp(second.path())
    );
}

// === Config File Tests ===

#[test]
fn test_config_file_drives_generation() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("artifacts");
    let config_path = dir.path().join("rpcgen.json");
    fs::write(
        &config_path,
        format!(
            r#"{{"channel_count": 12, "output_dir": {:?}, "channel_spacing": 25.0}}"#,
            out.to_string_lossy()
        ),
    )
    .unwrap();

    let config = ConfigFile::load(&config_path)
        .unwrap()
        .resolve(&ConfigFile::default())
        .unwrap();
    generate(&config).unwrap();

    let metadata = Metadata::from_json(&read(&out, ArtifactKind::Metadata)).unwrap();
    assert_eq!(metadata.channel_count, 12);
    approx::assert_relative_eq!(metadata.channel_spacing_um, 25.0);
    approx::assert_relative_eq!(
        metadata.channels[1].x - metadata.channels[0].x,
        25.0,
        epsilon = 1e-9
    );
}
