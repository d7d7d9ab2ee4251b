use crate::ir::Point;
use std::f64::consts::PI;

const MAX_LATITUDE: f64 = 85.051_128_78;

/// Bounds in longitude/latitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub min: Point,
    pub max: Point,
}

impl GeoBounds {
    pub fn of<I: IntoIterator<Item = Point>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = GeoBounds { min: first, max: first };
        for p in iter {
            bounds.min.x = bounds.min.x.min(p.x);
            bounds.min.y = bounds.min.y.min(p.y);
            bounds.max.x = bounds.max.x.max(p.x);
            bounds.max.y = bounds.max.y.max(p.y);
        }
        Some(bounds)
    }
}

/// Web-Mercator projection scaled and centered so the given bounds fill the
/// viewport minus padding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MercatorFit {
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl MercatorFit {
    pub fn new(bounds: GeoBounds, width: f64, height: f64, padding: f64) -> Self {
        let min = mercator(bounds.min);
        let max = mercator(bounds.max);
        // y grows downward in mercator unit space, so the max latitude is the top.
        let (left, right) = (min.x, max.x);
        let (top, bottom) = (max.y, min.y);
        let span_x = (right - left).abs();
        let span_y = (bottom - top).abs();

        let avail_w = (width - 2.0 * padding).max(1.0);
        let avail_h = (height - 2.0 * padding).max(1.0);
        let scale = match (span_x > f64::EPSILON, span_y > f64::EPSILON) {
            (true, true) => (avail_w / span_x).min(avail_h / span_y),
            (true, false) => avail_w / span_x,
            (false, true) => avail_h / span_y,
            (false, false) => 1.0,
        };

        let center_x = (left + right) / 2.0;
        let center_y = (top + bottom) / 2.0;
        Self {
            scale,
            offset_x: width / 2.0 - center_x * scale,
            offset_y: height / 2.0 - center_y * scale,
        }
    }

    pub fn project(&self, point: Point) -> Point {
        let unit = mercator(point);
        Point::new(unit.x * self.scale + self.offset_x, unit.y * self.scale + self.offset_y)
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }
}

/// Longitude/latitude to Web-Mercator unit square (0..1, y down).
pub fn mercator(point: Point) -> Point {
    let lat = point.y.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (point.x + 180.0) / 360.0;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0;
    Point::new(x, y)
}
