//! Layout document assembly
//!
//! Builds the full N-channel interface: per channel a ring resonator, the
//! bus coupler, drop riser and return arm waveguides, an IQ modulator and a
//! detector, plus one shared central bus.

use crate::config::{GeneratorConfig, LayoutParams};
use crate::error::{Result, RpcError};
use crate::layout::channel::Channel;
use crate::layout::geometry::{
    ring_resonator, square, waveguide, Bounds, Component, Point, Polygon, Rgb,
};

/// Minimum polygons each channel must contribute for the self-test to pass.
pub const MIN_POLYGONS_PER_CHANNEL: usize = 4;

/// Height of the drop riser above a channel's lane (µm).
const RISER_HEIGHT: f64 = 10.0;
/// Gap before the detector column and after it to the bus end (µm).
const DETECTOR_CLEARANCE: f64 = 50.0;
/// Modulator column offset left of the bus start (µm).
const MODULATOR_OFFSET: f64 = 50.0;
/// Far end of each bus coupler right of the bus start (µm).
const COUPLER_REACH: f64 = 80.0;

/// Channels, parameters and drawn geometry for one generation run.
#[derive(Debug, Clone)]
pub struct LayoutDocument {
    channels: Vec<Channel>,
    params: LayoutParams,
    polygons: Vec<Polygon>,
    detector_x: f64,
}

impl LayoutDocument {
    /// Build the layout described by `config`.
    pub fn build(config: &GeneratorConfig) -> Self {
        Self::from_params(config.channel_count(), config.layout().clone())
    }

    /// Build a layout of `channel_count` channels with explicit parameters.
    pub fn from_params(channel_count: usize, params: LayoutParams) -> Self {
        let channels = Channel::all(channel_count, &params);

        let last_ring_x = channels.last().map(|c| c.x).unwrap_or(params.ring_origin_x);
        let detector_x = detector_column(last_ring_x, &params);

        let mut polygons = Vec::with_capacity(channel_count * 7 + 1);
        for channel in &channels {
            polygons.extend(channel_polygons(channel, &params, detector_x));
        }

        let bus_end = detector_x + DETECTOR_CLEARANCE;
        polygons.extend(waveguide(
            Point::new(0.0, params.row_y),
            Point::new(bus_end, params.row_y),
            params.waveguide_width,
            Rgb::BUS,
        )
        .map(|p| Polygon {
            component: Component::Bus,
            ..p
        }));

        LayoutDocument {
            channels,
            params,
            polygons,
            detector_x,
        }
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn params(&self) -> &LayoutParams {
        &self.params
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    pub fn polygon_count(&self) -> usize {
        self.polygons.len()
    }

    /// X of the detector column.
    pub fn detector_x(&self) -> f64 {
        self.detector_x
    }

    /// Polygons owned by one channel, in drawing order.
    pub fn channel_polygons(&self, index: usize) -> impl Iterator<Item = &Polygon> {
        self.polygons
            .iter()
            .filter(move |p| p.channel == Some(index))
    }

    /// Polygons not owned by any channel.
    pub fn shared_polygons(&self) -> impl Iterator<Item = &Polygon> {
        self.polygons.iter().filter(|p| p.channel.is_none())
    }

    /// Bounding box of the ring resonator of channel `index`.
    pub fn ring_bounds(&self, index: usize) -> Option<Bounds> {
        self.channel_polygons(index)
            .find(|p| p.component == Component::Ring)
            .map(Polygon::bounds)
    }

    /// Bounding box of everything drawn.
    pub fn bounds(&self) -> Bounds {
        self.polygons
            .iter()
            .map(Polygon::bounds)
            .reduce(|a, b| a.union(&b))
            .unwrap_or(Bounds {
                min: Point::new(0.0, 0.0),
                max: Point::new(0.0, 0.0),
            })
    }

    /// Check the layout has at least four polygons per channel.
    pub fn self_test(&self) -> Result<()> {
        let expected = self.channel_count() * MIN_POLYGONS_PER_CHANNEL;
        if self.polygon_count() < expected {
            return Err(RpcError::SelfTestFailed {
                polygons: self.polygon_count(),
                expected,
            });
        }
        Ok(())
    }
}

fn detector_column(last_ring_x: f64, params: &LayoutParams) -> f64 {
    (params.core_x + params.core_size + DETECTOR_CLEARANCE)
        .max(last_ring_x + params.ring_radius + DETECTOR_CLEARANCE)
}

/// Largest absolute coordinate (µm) of any vertex in a layout of
/// `channel_count` channels, computed without building it.
pub fn max_abs_coordinate(channel_count: usize, params: &LayoutParams) -> f64 {
    let half_wg = params.waveguide_width / 2.0;
    let ring_reach = params.ring_radius + half_wg;
    let last_ring_x = params.ring_origin_x
        + channel_count.saturating_sub(1) as f64 * params.channel_spacing;
    let detector_x = detector_column(last_ring_x, params);
    let bus = params.bus_x_start;

    let lane_reach = channel_count.saturating_sub(1) as f64 / 2.0 * params.lane_pitch;
    let above_lane = (params.mod_size / 2.0)
        .max(ring_reach)
        .max(RISER_HEIGHT + half_wg);

    [
        params.ring_origin_x - ring_reach,
        last_ring_x + ring_reach,
        bus - MODULATOR_OFFSET,
        bus + COUPLER_REACH + half_wg,
        detector_x + params.mod_size,
        detector_x + DETECTOR_CLEARANCE,
        params.row_y.abs() + half_wg,
        lane_reach + above_lane,
    ]
    .iter()
    .fold(0.0_f64, |reach, v| reach.max(v.abs()))
}

fn channel_polygons(channel: &Channel, params: &LayoutParams, detector_x: f64) -> Vec<Polygon> {
    let y = channel.lane_y;
    let colour = channel.colour();
    let width = params.waveguide_width;
    let bus = params.bus_x_start;

    let mut polygons = Vec::with_capacity(7);
    polygons.extend(ring_resonator(
        Point::new(channel.x, y),
        params.ring_radius,
        width,
        params.ring_segments,
        colour,
    ));

    let coupler_in = Point::new(bus + 20.0, y);
    let coupler_out = Point::new(bus + COUPLER_REACH, y);
    let riser_top = Point::new(bus + COUPLER_REACH, y + RISER_HEIGHT);
    let return_end = Point::new(bus - 20.0, y);
    polygons.extend(waveguide(coupler_in, coupler_out, width, Rgb::WAVEGUIDE));
    polygons.extend(waveguide(coupler_out, riser_top, width, colour));
    polygons.extend(waveguide(riser_top, return_end, width, colour));

    let half = params.mod_size / 2.0;
    polygons.push(square(
        Point::new(bus - MODULATOR_OFFSET, y - half),
        params.mod_size,
        colour,
        Component::Modulator,
    ));
    polygons.push(square(
        Point::new(detector_x, y - half),
        params.mod_size,
        colour,
        Component::Detector,
    ));

    polygons
        .into_iter()
        .map(|p| p.for_channel(channel.index))
        .collect()
}
