//! CLI Module
//!
//! Command-line interface for the rpcgen artifact generator.

pub mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::ConfigFile;

/// rpcgen - RPC photonic interface layout and export generator
#[derive(Parser, Debug)]
#[command(name = "rpcgen")]
#[command(version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub generate: GenerateArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Options for a generation run (the default command).
#[derive(Args, Debug, Clone, Default)]
pub struct GenerateArgs {
    /// Number of channels to lay out [default: 8]
    #[arg(short, long, allow_negative_numbers = true)]
    pub channels: Option<i64>,

    /// Output directory [default: .]
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// JSON file with generator settings; flags take precedence
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Ring-to-ring channel spacing in µm
    #[arg(long)]
    pub spacing: Option<f64>,

    /// Also write every drawn polygon into the GDS skeleton
    #[arg(long)]
    pub gds_geometry: bool,
}

impl GenerateArgs {
    /// Flags as config overrides. Unset flags stay `None`.
    pub fn overrides(&self) -> ConfigFile {
        ConfigFile {
            channel_count: self.channels,
            output_dir: self.out.clone(),
            channel_spacing: self.spacing,
            gds_full_geometry: self.gds_geometry.then_some(true),
            ..ConfigFile::default()
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that the artifacts in a directory agree on the channel count
    #[command(name = "verify")]
    Verify {
        /// Directory holding the artifacts
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
}
