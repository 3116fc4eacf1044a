//! Generator configuration
//!
//! `GeneratorConfig` is immutable once built: every constructor and `with_*`
//! method validates its input and returns a fresh value. `ConfigFile` holds
//! the optional JSON overrides that the CLI merges under its own flags.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, RpcError};
use crate::layout::document::max_abs_coordinate;

/// Channel count used when none is given.
pub const DEFAULT_CHANNEL_COUNT: i64 = 8;

/// Largest accepted channel count.
pub const MAX_CHANNELS: usize = 10_000;

/// Largest coordinate (µm) a GDS stream can hold: `i32::MAX` nanometres.
pub const MAX_COORDINATE_UM: f64 = 2_147_483.647;

/// Smallest channel spacing (µm): one GDS database unit, so channel
/// positions stay distinct in the skeleton.
pub const MIN_CHANNEL_SPACING_UM: f64 = 1e-3;

/// Layout dimensions, all in µm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutParams {
    /// X where the input bus couplers start.
    pub bus_x_start: f64,
    /// X of channel 0's ring resonator.
    pub ring_origin_x: f64,
    /// Horizontal distance between neighbouring rings.
    pub channel_spacing: f64,
    /// Vertical distance between neighbouring channel lanes.
    pub lane_pitch: f64,
    /// Fixed row on which every channel's anchor sits.
    pub row_y: f64,
    /// X of the compute core block.
    pub core_x: f64,
    /// Edge length of the compute core block.
    pub core_size: f64,
    /// Edge length of modulator and detector squares.
    pub mod_size: f64,
    pub waveguide_width: f64,
    pub ring_radius: f64,
    /// Vertices per ring outline.
    pub ring_segments: usize,
    /// Padding around the geometry in the SVG viewBox.
    pub canvas_margin: f64,
}

impl Default for LayoutParams {
    fn default() -> Self {
        LayoutParams {
            bus_x_start: 100.0,
            ring_origin_x: 150.0,
            channel_spacing: 20.0,
            lane_pitch: 15.0,
            row_y: 0.0,
            core_x: 300.0,
            core_size: 120.0,
            mod_size: 25.0,
            waveguide_width: 0.45,
            ring_radius: 10.0,
            ring_segments: 64,
            canvas_margin: 20.0,
        }
    }
}

/// Validated, immutable generator configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    channel_count: usize,
    output_dir: PathBuf,
    layout: LayoutParams,
    gds_full_geometry: bool,
}

impl GeneratorConfig {
    /// Create a configuration with default layout parameters.
    ///
    /// # Errors
    /// `InvalidConfiguration` if `channel_count` is zero, negative, or above
    /// [`MAX_CHANNELS`].
    pub fn new(channel_count: i64, output_dir: impl Into<PathBuf>) -> Result<Self> {
        Self {
            channel_count: validate_channel_count(channel_count)?,
            output_dir: output_dir.into(),
            layout: LayoutParams::default(),
            gds_full_geometry: false,
        }
        .within_extent("channel_count")
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn layout(&self) -> &LayoutParams {
        &self.layout
    }

    /// Whether the GDS skeleton also carries every drawn polygon.
    pub fn gds_full_geometry(&self) -> bool {
        self.gds_full_geometry
    }

    /// Set the ring-to-ring spacing.
    ///
    /// # Errors
    /// `InvalidConfiguration` if `spacing` is below [`MIN_CHANNEL_SPACING_UM`]
    /// or pushes the layout past [`MAX_COORDINATE_UM`].
    pub fn with_channel_spacing(mut self, spacing: f64) -> Result<Self> {
        let spacing = positive("channel_spacing", spacing)?;
        if spacing < MIN_CHANNEL_SPACING_UM {
            return Err(RpcError::invalid(
                "channel_spacing",
                format!(
                    "must be at least {} µm so channel positions stay distinct, got {}",
                    MIN_CHANNEL_SPACING_UM, spacing
                ),
            ));
        }
        self.layout.channel_spacing = spacing;
        self.within_extent("channel_spacing")
    }

    pub fn with_lane_pitch(mut self, pitch: f64) -> Result<Self> {
        self.layout.lane_pitch = positive("lane_pitch", pitch)?;
        self.within_extent("lane_pitch")
    }

    pub fn with_ring_radius(mut self, radius: f64) -> Result<Self> {
        self.layout.ring_radius = positive("ring_radius", radius)?;
        self.within_extent("ring_radius")
    }

    pub fn with_waveguide_width(mut self, width: f64) -> Result<Self> {
        self.layout.waveguide_width = positive("waveguide_width", width)?;
        self.within_extent("waveguide_width")
    }

    pub fn with_canvas_margin(mut self, margin: f64) -> Result<Self> {
        self.layout.canvas_margin = positive("canvas_margin", margin)?;
        Ok(self)
    }

    pub fn with_gds_full_geometry(mut self, enabled: bool) -> Self {
        self.gds_full_geometry = enabled;
        self
    }
}

impl GeneratorConfig {
    /// Reject layouts whose coordinates overflow 32-bit GDS database units.
    fn within_extent(self, parameter: &str) -> Result<Self> {
        let reach = max_abs_coordinate(self.channel_count, &self.layout);
        if reach > MAX_COORDINATE_UM {
            return Err(RpcError::invalid(
                parameter,
                format!(
                    "layout would reach {:.3} µm from the origin, GDS coordinates stop at {} µm",
                    reach, MAX_COORDINATE_UM
                ),
            ));
        }
        Ok(self)
    }
}

fn validate_channel_count(channel_count: i64) -> Result<usize> {
    if channel_count <= 0 {
        return Err(RpcError::invalid(
            "channel_count",
            format!("must be a positive integer, got {}", channel_count),
        ));
    }
    let count = channel_count as usize;
    if count > MAX_CHANNELS {
        return Err(RpcError::invalid(
            "channel_count",
            format!("must be at most {}, got {}", MAX_CHANNELS, channel_count),
        ));
    }
    Ok(count)
}

fn positive(parameter: &str, value: f64) -> Result<f64> {
    if !value.is_finite() || value <= 0.0 {
        return Err(RpcError::invalid(
            parameter,
            format!("must be a finite positive number, got {}", value),
        ));
    }
    Ok(value)
}

/// Optional overrides loaded from a JSON config file.
///
/// Unset fields fall through to CLI flags or built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub channel_count: Option<i64>,
    pub output_dir: Option<PathBuf>,
    pub channel_spacing: Option<f64>,
    pub lane_pitch: Option<f64>,
    pub ring_radius: Option<f64>,
    pub waveguide_width: Option<f64>,
    pub canvas_margin: Option<f64>,
    pub gds_full_geometry: Option<bool>,
}

impl ConfigFile {
    /// Load overrides from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| RpcError::ConfigFileError {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| RpcError::ConfigParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Build a validated config. Values in `self` lose to `overrides`.
    pub fn resolve(&self, overrides: &ConfigFile) -> Result<GeneratorConfig> {
        let channel_count = overrides
            .channel_count
            .or(self.channel_count)
            .unwrap_or(DEFAULT_CHANNEL_COUNT);
        let output_dir = overrides
            .output_dir
            .clone()
            .or_else(|| self.output_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."));

        let mut config = GeneratorConfig::new(channel_count, output_dir)?;

        if let Some(spacing) = overrides.channel_spacing.or(self.channel_spacing) {
            config = config.with_channel_spacing(spacing)?;
        }
        if let Some(pitch) = overrides.lane_pitch.or(self.lane_pitch) {
            config = config.with_lane_pitch(pitch)?;
        }
        if let Some(radius) = overrides.ring_radius.or(self.ring_radius) {
            config = config.with_ring_radius(radius)?;
        }
        if let Some(width) = overrides.waveguide_width.or(self.waveguide_width) {
            config = config.with_waveguide_width(width)?;
        }
        if let Some(margin) = overrides.canvas_margin.or(self.canvas_margin) {
            config = config.with_canvas_margin(margin)?;
        }
        let full = overrides
            .gds_full_geometry
            .or(self.gds_full_geometry)
            .unwrap_or(false);

        Ok(config.with_gds_full_geometry(full))
    }
}
