//! Geometry primitives for the interface layout
//!
//! Coordinates are µm in a y-up frame. Every polygon is stored closed: the
//! first vertex is repeated at the end.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// A point in layout space (µm).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

/// Linear RGB colour with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::grey(1.0);
    pub const WAVEGUIDE: Rgb = Rgb::grey(0.7);
    pub const BUS: Rgb = Rgb::grey(0.6);

    pub const fn grey(level: f64) -> Self {
        Rgb {
            r: level,
            g: level,
            b: level,
        }
    }

    /// Convert HSL (hue in degrees, saturation/lightness in percent) to RGB.
    pub fn from_hsl(hue_deg: f64, saturation: f64, lightness: f64) -> Self {
        let h = hue_deg / 360.0;
        let s = saturation / 100.0;
        let l = lightness / 100.0;
        if s == 0.0 {
            return Rgb::grey(l);
        }

        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;

        Rgb {
            r: hue_to_channel(p, q, h + 1.0 / 3.0),
            g: hue_to_channel(p, q, h),
            b: hue_to_channel(p, q, h - 1.0 / 3.0),
        }
    }

    /// 8-bit RGB components.
    pub fn to_bytes(&self) -> [u8; 3] {
        let byte = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [byte(self.r), byte(self.g), byte(self.b)]
    }

    /// `#rrggbb` form for SVG output.
    pub fn to_hex(&self) -> String {
        let [r, g, b] = self.to_bytes();
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }
}

fn hue_to_channel(p: f64, q: f64, t: f64) -> f64 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Smallest box covering both.
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min: Point::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    /// The box's outline as a closed polygon ring.
    pub fn outline(&self) -> Vec<Point> {
        vec![
            self.min,
            Point::new(self.max.x, self.min.y),
            self.max,
            Point::new(self.min.x, self.max.y),
            self.min,
        ]
    }
}

/// What a polygon depicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Ring,
    RingHole,
    Waveguide,
    Modulator,
    Detector,
    Bus,
}

/// A filled, closed polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub points: Vec<Point>,
    pub fill: Rgb,
    pub component: Component,
    /// Owning channel, `None` for shared structures.
    pub channel: Option<usize>,
}

impl Polygon {
    /// Build a polygon, closing the ring if needed.
    pub fn closed(mut points: Vec<Point>, fill: Rgb, component: Component) -> Self {
        if let (Some(first), Some(last)) = (points.first().copied(), points.last()) {
            if first != *last {
                points.push(first);
            }
        }
        Polygon {
            points,
            fill,
            component,
            channel: None,
        }
    }

    pub fn for_channel(mut self, channel: usize) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn bounds(&self) -> Bounds {
        let mut min = Point::new(f64::INFINITY, f64::INFINITY);
        let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in &self.points {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Bounds { min, max }
    }
}

/// Straight waveguide of the given width between two points.
///
/// Returns `None` for a zero-length segment.
pub fn waveguide(from: Point, to: Point, width: f64, fill: Rgb) -> Option<Polygon> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let length = dx.hypot(dy);
    if length == 0.0 {
        return None;
    }

    // Unit normal to the segment, scaled to half the width.
    let half = width / 2.0;
    let nx = -dy / length * half;
    let ny = dx / length * half;

    Some(Polygon::closed(
        vec![
            Point::new(from.x + nx, from.y + ny),
            Point::new(to.x + nx, to.y + ny),
            Point::new(to.x - nx, to.y - ny),
            Point::new(from.x - nx, from.y - ny),
        ],
        fill,
        Component::Waveguide,
    ))
}

/// Ring resonator placeholder: an outer disc and a white inner disc.
///
/// Each disc has `segments` distinct vertices plus the closing one.
pub fn ring_resonator(
    center: Point,
    radius: f64,
    width: f64,
    segments: usize,
    fill: Rgb,
) -> [Polygon; 2] {
    let circle = |r: f64| -> Vec<Point> {
        (0..segments)
            .map(|i| {
                let theta = 2.0 * PI * i as f64 / segments as f64;
                Point::new(center.x + r * theta.cos(), center.y + r * theta.sin())
            })
            .collect()
    };

    [
        Polygon::closed(circle(radius + width / 2.0), fill, Component::Ring),
        Polygon::closed(circle(radius - width / 2.0), Rgb::WHITE, Component::RingHole),
    ]
}

/// Axis-aligned square with its lower-left corner at `origin`.
pub fn square(origin: Point, size: f64, fill: Rgb, component: Component) -> Polygon {
    Polygon::closed(
        vec![
            origin,
            Point::new(origin.x + size, origin.y),
            Point::new(origin.x + size, origin.y + size),
            Point::new(origin.x, origin.y + size),
        ],
        fill,
        component,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_hsl_primaries() {
        let red = Rgb::from_hsl(0.0, 100.0, 50.0);
        assert_relative_eq!(red.r, 1.0);
        assert_relative_eq!(red.g, 0.0);
        assert_relative_eq!(red.b, 0.0);

        let green = Rgb::from_hsl(120.0, 100.0, 50.0);
        assert_eq!(green.to_hex(), "#00ff00");
        assert_eq!(green.to_bytes(), [0, 255, 0]);

        let grey = Rgb::from_hsl(200.0, 0.0, 40.0);
        assert_eq!(grey, Rgb::grey(0.4));
    }

    #[test]
    fn test_hsl_pastel_channel_colour() {
        // hsl(0, 70%, 70%) used for channel 0
        let c = Rgb::from_hsl(0.0, 70.0, 70.0);
        assert_relative_eq!(c.r, 0.91, epsilon = 1e-9);
        assert_relative_eq!(c.g, 0.49, epsilon = 1e-9);
        assert_relative_eq!(c.b, 0.49, epsilon = 1e-9);
    }

    #[test]
    fn test_polygon_closes_ring() {
        let poly = Polygon::closed(
            vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(0.0, 1.0)],
            Rgb::WHITE,
            Component::Bus,
        );
        assert_eq!(poly.points.len(), 4);
        assert_eq!(poly.points.first(), poly.points.last());

        let sq = square(Point::new(0.0, 0.0), 2.0, Rgb::WHITE, Component::Detector);
        assert_eq!(sq.points.len(), 5);
    }

    #[test]
    fn test_waveguide_width() {
        let wg = waveguide(Point::new(0.0, 0.0), Point::new(10.0, 0.0), 0.45, Rgb::WAVEGUIDE)
            .unwrap();
        let b = wg.bounds();
        assert_relative_eq!(b.width(), 10.0);
        assert_relative_eq!(b.height(), 0.45, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_length_waveguide_is_skipped() {
        let p = Point::new(3.0, 3.0);
        assert!(waveguide(p, p, 0.45, Rgb::WAVEGUIDE).is_none());
    }

    #[test]
    fn test_ring_bounds() {
        let [outer, inner] = ring_resonator(Point::new(50.0, -5.0), 10.0, 0.5, 64, Rgb::WHITE);
        assert_eq!(outer.points.len(), 65);
        assert_eq!(outer.component, Component::Ring);
        assert_eq!(inner.component, Component::RingHole);

        let b = outer.bounds();
        assert_relative_eq!(b.max.x, 60.25, epsilon = 1e-9);
        assert_relative_eq!(b.min.x, 39.75, epsilon = 1e-9);
        assert_relative_eq!(b.max.y, 5.25, epsilon = 1e-9);
    }

    #[test]
    fn test_bounds_union() {
        let a = square(Point::new(0.0, 0.0), 1.0, Rgb::WHITE, Component::Modulator).bounds();
        let b = square(Point::new(5.0, -3.0), 1.0, Rgb::WHITE, Component::Modulator).bounds();
        let u = a.union(&b);
        assert_eq!(u.min, Point::new(0.0, -3.0));
        assert_eq!(u.max, Point::new(6.0, 1.0));
        assert_eq!(u.outline().len(), 5);
    }
}
