//! Channel model
//!
//! A channel is fully determined by its index, the channel count and the
//! layout parameters. Nothing here reads the clock or the environment.

use serde::{Deserialize, Serialize};

use crate::config::LayoutParams;
use crate::layout::geometry::Rgb;

/// Lower end of the phase-fidelity range.
pub const PHASE_FIDELITY_MIN: f64 = 0.98;
/// Upper end of the phase-fidelity range (channel 0).
pub const PHASE_FIDELITY_MAX: f64 = 0.995;
/// Minimum energy-recovery level drawn as the plot threshold.
pub const MIN_ENERGY_RECOVERY: f64 = 0.95;

/// Channel colour saturation and lightness, in percent.
const CHANNEL_SATURATION: f64 = 70.0;
const CHANNEL_LIGHTNESS: f64 = 70.0;

/// Phase fidelity of channel `index` out of `count`.
///
/// Falls linearly from [`PHASE_FIDELITY_MAX`] at index 0 towards
/// [`PHASE_FIDELITY_MIN`], never reaching it for `index < count`.
pub fn phase_fidelity(index: usize, count: usize) -> f64 {
    let span = PHASE_FIDELITY_MAX - PHASE_FIDELITY_MIN;
    PHASE_FIDELITY_MAX - span * index as f64 / count as f64
}

/// One addressable photonic interface line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub index: usize,
    pub label: String,
    /// Anchor x on the layout grid (µm).
    pub x: f64,
    /// Anchor y, the fixed row shared by all channels (µm).
    pub y: f64,
    /// Vertical offset of this channel's drawn lane (µm).
    pub lane_y: f64,
    pub phase_fidelity: f64,
    pub hue_deg: f64,
}

impl Channel {
    /// Derive channel `index` of `count`.
    pub fn new(index: usize, count: usize, params: &LayoutParams) -> Self {
        let centre = (count as f64 - 1.0) / 2.0;
        Channel {
            index,
            label: format!("CH{}", index),
            x: params.ring_origin_x + index as f64 * params.channel_spacing,
            y: params.row_y,
            lane_y: (index as f64 - centre) * params.lane_pitch,
            phase_fidelity: phase_fidelity(index, count),
            hue_deg: index as f64 * 360.0 / count as f64,
        }
    }

    /// All `count` channels in index order.
    pub fn all(count: usize, params: &LayoutParams) -> Vec<Channel> {
        (0..count).map(|i| Channel::new(i, count, params)).collect()
    }

    /// Fill colour for this channel's components.
    pub fn colour(&self) -> Rgb {
        Rgb::from_hsl(self.hue_deg, CHANNEL_SATURATION, CHANNEL_LIGHTNESS)
    }
}
