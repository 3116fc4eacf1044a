//! SVG layout preview
//!
//! One `<g class="channel">` group per channel holding that channel's shapes
//! and its `CH{i}` label; shared structures go in a separate group. Layout
//! space is y-up, SVG is y-down, so every y is negated. The output depends
//! only on the document, never on the clock.

use crate::export::{num, xml_escape};
use crate::layout::{Component, LayoutDocument, Point, Polygon};

/// Height reserved above the geometry for the title (µm).
const TITLE_BAND: f64 = 16.0;
const STROKE_WIDTH: f64 = 0.1;
const FILL_OPACITY: f64 = 0.7;
/// Rendered pixels per µm in the width/height attributes.
const PIXELS_PER_UM: f64 = 2.0;

/// Render the layout document as a standalone SVG file.
pub fn render(document: &LayoutDocument) -> String {
    let params = document.params();
    let bounds = document.bounds();
    let margin = params.canvas_margin;

    let view_x = bounds.min.x - margin;
    let view_y = -bounds.max.y - margin - TITLE_BAND;
    let view_w = bounds.width() + 2.0 * margin;
    let view_h = bounds.height() + 2.0 * margin + TITLE_BAND;

    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"{} {} {} {}\" width=\"{}\" height=\"{}\">\n",
        num(view_x),
        num(view_y),
        num(view_w),
        num(view_h),
        num(view_w * PIXELS_PER_UM),
        num(view_h * PIXELS_PER_UM),
    ));

    let title = format!(
        "RPC {}-Channel WDM Interface Layout Preview",
        document.channel_count()
    );
    out.push_str(&format!("  <title>{}</title>\n", xml_escape(&title)));
    out.push_str(&format!(
        "  <text class=\"title\" x=\"{}\" y=\"{}\" font-size=\"8\" text-anchor=\"middle\" font-family=\"sans-serif\">{}</text>\n",
        num(bounds.min.x + bounds.width() / 2.0),
        num(-bounds.max.y - margin - TITLE_BAND / 2.0),
        xml_escape(&title),
    ));

    out.push_str("  <g id=\"shared\" class=\"shared\">\n");
    for polygon in document.shared_polygons() {
        push_polygon(&mut out, polygon, "    ");
    }
    out.push_str("  </g>\n");

    let label_size = (params.lane_pitch * 0.6).min(8.0);
    for channel in document.channels() {
        out.push_str(&format!(
            "  <g id=\"channel-{0}\" class=\"channel\" data-index=\"{0}\">\n",
            channel.index
        ));
        for polygon in document.channel_polygons(channel.index) {
            push_polygon(&mut out, polygon, "    ");
        }
        out.push_str(&format!(
            "    <text class=\"label\" x=\"{}\" y=\"{}\" font-size=\"{}\" text-anchor=\"end\" dominant-baseline=\"middle\" font-family=\"sans-serif\">{}</text>\n",
            num(params.bus_x_start - 53.0),
            num(-channel.lane_y),
            num(label_size),
            xml_escape(&channel.label),
        ));
        out.push_str("  </g>\n");
    }

    out.push_str("</svg>\n");
    out
}

fn push_polygon(out: &mut String, polygon: &Polygon, indent: &str) {
    out.push_str(&format!(
        "{}<polygon class=\"{}\" points=\"{}\" fill=\"{}\" fill-opacity=\"{}\" stroke=\"#000000\" stroke-width=\"{}\"/>\n",
        indent,
        component_class(polygon.component),
        points_attr(&polygon.points),
        polygon.fill.to_hex(),
        FILL_OPACITY,
        STROKE_WIDTH,
    ));
}

fn points_attr(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", num(p.x), num(-p.y)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn component_class(component: Component) -> &'static str {
    match component {
        Component::Ring => "ring",
        Component::RingHole => "ring-hole",
        Component::Waveguide => "waveguide",
        Component::Modulator => "modulator",
        Component::Detector => "detector",
        Component::Bus => "bus",
    }
}
