//! rpcgen - RPC Photonic Interface Generator
//!
//! Lays out an N-channel Reversible Photonic Computing interface and exports it
//! as four artifacts that always describe the same channel count:
//! - `layout.svg`: the drawn layout, one group per channel
//! - `phase_fidelity.svg`: phase fidelity of each channel against the ramp
//! - `metadata.json`: machine-readable channel and bound data
//! - `skeleton.gds`: a GDSII stream with one marker per channel
//!
//! # Architecture
//!
//! A run is built in three steps:
//! - [`layout`] computes channel positions and polygons in µm
//! - [`export`] renders each artifact in memory from that one document
//! - [`generator`] stages and renames the files so a failed run leaves nothing

pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod export;
pub mod generator;
pub mod layout;
pub mod verify;

pub use config::{ConfigFile, GeneratorConfig};
pub use error::{Result, RpcError};
pub use generator::{generate, ArtifactSet, Generator};
pub use verify::{verify, VerifyReport};
