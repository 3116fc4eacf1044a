//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::Path;

use log::info;

use crate::cli::{Cli, Commands, GenerateArgs};
use crate::config::{ConfigFile, GeneratorConfig};
use crate::error::Result;
use crate::generator::{ArtifactSet, Generator};
use crate::verify::verify;

/// Run whichever command the parsed CLI selects.
pub fn dispatch(cli: &Cli) -> Result<()> {
    match &cli.command {
        Some(Commands::Verify { out }) => verify_artifacts(out),
        None => generate_artifacts(&cli.generate).map(|_| ()),
    }
}

/// Merge the config file (if any) under the CLI flags.
pub fn resolve_config(args: &GenerateArgs) -> Result<GeneratorConfig> {
    let file = match &args.config {
        Some(path) => {
            info!("Loading config: {}", path.display());
            ConfigFile::load(path)?
        }
        None => ConfigFile::default(),
    };
    file.resolve(&args.overrides())
}

/// Generate the four artifacts and print a summary.
pub fn generate_artifacts(args: &GenerateArgs) -> Result<ArtifactSet> {
    let config = resolve_config(args)?;
    let set = Generator::new().generate(&config)?;

    println!(
        "Self-test passed: {} polygons generated for {} channels",
        set.polygon_count, set.channel_count
    );
    for artifact in &set.artifacts {
        println!(
            "  {:<22} {:>8} bytes  sha256 {}",
            artifact.kind.file_name(),
            artifact.size_bytes,
            &artifact.sha256[..16]
        );
    }
    println!("All files generated in {}/", set.output_dir.display());

    Ok(set)
}

/// Verify an output directory and print what was checked.
pub fn verify_artifacts(out: &Path) -> Result<()> {
    info!("Verifying artifacts in: {}", out.display());

    let report = verify(out)?;

    println!("Artifacts in {} are consistent:", out.display());
    println!("  metadata channels : {}", report.channel_count);
    println!("  SVG channel groups: {}", report.svg_channel_groups);
    println!("  plot points       : {}", report.plot_channel_points);
    println!("  GDS channel marks : {}", report.gds_channel_records);
    if !report.stale_staging_files.is_empty() {
        println!("\n--- Warnings ---");
        for path in &report.stale_staging_files {
            println!("Leftover staging file: {}", path.display());
        }
    }

    Ok(())
}
