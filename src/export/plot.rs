//! Phase-fidelity plot
//!
//! Vector chart of per-channel phase fidelity over the symbolic adiabatic
//! ramp, with the min-energy-recovery threshold and the forward/reverse
//! half-cycle bands. Drawn with plotters into an in-memory SVG.

use std::f64::consts::PI;
use std::fmt::Display;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::error::{Result, RpcError};
use crate::layout::{
    Channel, LayoutDocument, MIN_ENERGY_RECOVERY, PHASE_FIDELITY_MAX, PHASE_FIDELITY_MIN,
};

const WIDTH: u32 = 800;
const HEIGHT: u32 = 480;

const Y_MIN: f64 = 0.94;
const Y_MAX: f64 = 1.0;

/// Samples along the symbolic ramp curve.
pub const RAMP_SAMPLES: usize = 500;

/// Element each channel point is drawn as. Nothing else in the plot uses it.
pub const CHANNEL_POINT_MARKER: &str = "<circle";

const POINT_RADIUS: i32 = 4;

const RAMP_COLOUR: RGBColor = RGBColor(0x1f, 0x77, 0xb4);
const THRESHOLD_COLOUR: RGBColor = RGBColor(0xd6, 0x27, 0x28);
const FORWARD_COLOUR: RGBColor = RGBColor(0x2c, 0xa0, 0x2c);
const REVERSE_COLOUR: RGBColor = RGBColor(0x1f, 0x77, 0xb4);
const POINT_LEGEND_COLOUR: RGBColor = RGBColor(0x88, 0x88, 0x88);

/// Symbolic phase fidelity at phase position `t` of an `n`-phase cycle.
pub fn ramp(t: f64, n: usize) -> f64 {
    PHASE_FIDELITY_MIN
        + (PHASE_FIDELITY_MAX - PHASE_FIDELITY_MIN) * (2.0 * PI * t / n as f64).sin()
}

/// The ramp sampled evenly over `[0, n]`.
pub fn ramp_points(n: usize) -> Vec<(f64, f64)> {
    (0..RAMP_SAMPLES)
        .map(|k| {
            let t = n as f64 * k as f64 / (RAMP_SAMPLES - 1) as f64;
            (t, ramp(t, n))
        })
        .collect()
}

fn plot_error(e: impl Display) -> RpcError {
    RpcError::PlotRender(e.to_string())
}

fn channel_colour(channel: &Channel) -> RGBColor {
    let [r, g, b] = channel.colour().to_bytes();
    RGBColor(r, g, b)
}

/// Render the plot for the document's channels.
///
/// # Errors
/// `PlotRender` if plotters fails to lay out or draw the chart.
pub fn render(document: &LayoutDocument) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(plot_error)?;
        draw_chart(&root, document)?;
        root.present().map_err(plot_error)?;
    }
    Ok(svg)
}

fn draw_chart(root: &DrawingArea<SVGBackend<'_>, Shift>, document: &LayoutDocument) -> Result<()> {
    let n = document.channel_count();
    let x_max = n as f64;
    let half = x_max / 2.0;

    let mut chart = ChartBuilder::on(root)
        .margin(15)
        .caption("Adiabatic Phase Fidelity Ramp", ("sans-serif", 20))
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..x_max, Y_MIN..Y_MAX)
        .map_err(plot_error)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc(format!("Channel index / phase units ({}-phase cycle)", n))
        .y_desc("Fidelity")
        .x_label_formatter(&|x| format!("{:.0}", x))
        .y_label_formatter(&|y| format!("{:.2}", y))
        .draw()
        .map_err(plot_error)?;

    // Half-cycle bands
    chart
        .draw_series(std::iter::once(Rectangle::new(
            [(0.0, Y_MIN), (half, Y_MAX)],
            FORWARD_COLOUR.mix(0.1).filled(),
        )))
        .map_err(plot_error)?
        .label("Forward (compute)")
        .legend(|(x, y)| {
            Rectangle::new([(x, y - 5), (x + 20, y + 5)], FORWARD_COLOUR.mix(0.2).filled())
        });
    chart
        .draw_series(std::iter::once(Rectangle::new(
            [(half, Y_MIN), (x_max, Y_MAX)],
            REVERSE_COLOUR.mix(0.1).filled(),
        )))
        .map_err(plot_error)?
        .label("Reverse (uncompute/recover)")
        .legend(|(x, y)| {
            Rectangle::new([(x, y - 5), (x + 20, y + 5)], REVERSE_COLOUR.mix(0.2).filled())
        });

    chart
        .draw_series(LineSeries::new(ramp_points(n), RAMP_COLOUR.stroke_width(2)))
        .map_err(plot_error)?
        .label("Symbolic phase fidelity")
        .legend(|(x, y)| {
            PathElement::new(vec![(x, y), (x + 20, y)], RAMP_COLOUR.stroke_width(2))
        });

    chart
        .draw_series(DashedLineSeries::new(
            vec![(0.0, MIN_ENERGY_RECOVERY), (x_max, MIN_ENERGY_RECOVERY)],
            6,
            4,
            THRESHOLD_COLOUR.stroke_width(2),
        ))
        .map_err(plot_error)?
        .label("Min energy recovery")
        .legend(|(x, y)| {
            PathElement::new(vec![(x, y), (x + 20, y)], THRESHOLD_COLOUR.stroke_width(2))
        });

    // Legend swatch is a square so circles stay one per channel
    chart
        .draw_series(document.channels().iter().map(|channel| {
            Circle::new(
                (channel.index as f64, channel.phase_fidelity),
                POINT_RADIUS,
                channel_colour(channel).filled(),
            )
        }))
        .map_err(plot_error)?
        .label("Channel phase fidelity")
        .legend(|(x, y)| {
            Rectangle::new([(x + 6, y - 4), (x + 14, y + 4)], POINT_LEGEND_COLOUR.filled())
        });

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(WHITE.mix(0.85))
        .border_style(BLACK)
        .draw()
        .map_err(plot_error)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutParams;
    use approx::assert_relative_eq;
    use test_case::test_case;

    fn doc(count: usize) -> LayoutDocument {
        LayoutDocument::from_params(count, LayoutParams::default())
    }

    #[test_case(1 ; "single channel")]
    #[test_case(8 ; "default")]
    #[test_case(40 ; "wide")]
    fn test_one_point_per_channel(count: usize) {
        let svg = render(&doc(count)).unwrap();
        assert_eq!(svg.matches(CHANNEL_POINT_MARKER).count(), count);
    }

    #[test]
    fn test_plot_elements_present() {
        let svg = render(&doc(8)).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Adiabatic Phase Fidelity Ramp"));
        assert!(svg.contains("(8-phase cycle)"));
        for label in [
            "Symbolic phase fidelity",
            "Min energy recovery",
            "Forward (compute)",
            "Reverse (uncompute/recover)",
            "Channel phase fidelity",
        ] {
            assert!(svg.contains(label), "legend missing {}", label);
        }
    }

    #[test]
    fn test_ramp_shape() {
        assert_relative_eq!(ramp(0.0, 8), PHASE_FIDELITY_MIN);
        assert_relative_eq!(ramp(2.0, 8), PHASE_FIDELITY_MAX, epsilon = 1e-12);
        assert_relative_eq!(ramp(8.0, 8), PHASE_FIDELITY_MIN, epsilon = 1e-12);
    }

    #[test]
    fn test_ramp_points_span_cycle() {
        let points = ramp_points(8);
        assert_eq!(points.len(), RAMP_SAMPLES);
        assert_relative_eq!(points[0].0, 0.0);
        assert_relative_eq!(points[RAMP_SAMPLES - 1].0, 8.0, epsilon = 1e-12);
        assert!(points.windows(2).all(|w| w[1].0 > w[0].0));
    }

    #[test]
    fn test_render_is_deterministic() {
        assert_eq!(render(&doc(12)).unwrap(), render(&doc(12)).unwrap());
    }
}
