//! Shared geometric utilities.
//!
//! Every stage works over snapped coordinates: coordinates are quantized to a
//! fixed grid ([`SNAP_PRECISION`]) so that nodes produced independently by
//! different noding passes compare bit-identically, and shared polygon edges
//! can be detected by exact key equality instead of fragile float predicates.

use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{Coord, Line, LineString, Point, Polygon, Rect};

/// Quantization grid for coordinate snapping, in coordinate-space units.
///
/// 1e-9 degrees is roughly 0.1 micrometers at the equator: far below any
/// meaningful feature precision, far above f64 rounding noise at
/// geographic magnitudes.
pub const SNAP_PRECISION: f64 = 1e-9;

/// A coordinate snapped to the quantization grid.
pub type QuantKey = (i64, i64);

/// An undirected edge between two snapped coordinates (endpoints ordered).
pub type EdgeKey = (QuantKey, QuantKey);

/// Snap a coordinate to the quantization grid.
pub fn quantize(c: Coord<f64>) -> QuantKey {
    (
        (c.x / SNAP_PRECISION).round() as i64,
        (c.y / SNAP_PRECISION).round() as i64,
    )
}

/// Recover the snapped coordinate for a grid key.
pub fn dequantize(k: QuantKey) -> Coord<f64> {
    Coord {
        x: k.0 as f64 * SNAP_PRECISION,
        y: k.1 as f64 * SNAP_PRECISION,
    }
}

/// Key for an undirected edge: endpoint keys in ascending order, so that the
/// same physical edge hashes identically regardless of traversal direction.
pub fn edge_key(a: Coord<f64>, b: Coord<f64>) -> EdgeKey {
    let (ka, kb) = (quantize(a), quantize(b));
    if ka <= kb {
        (ka, kb)
    } else {
        (kb, ka)
    }
}

/// Signed area of a ring given as a closed or open coordinate sequence
/// (shoelace formula). Positive for counter-clockwise rings.
pub fn ring_signed_area(coords: &[Coord<f64>]) -> f64 {
    if coords.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..coords.len() {
        let a = coords[i];
        let b = coords[(i + 1) % coords.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}

/// Densify a ring into point samples at a fixed spacing.
///
/// Every ring vertex is emitted, plus interpolated points every `spacing`
/// units along each segment. The closing vertex is not duplicated.
pub fn densify_ring(ring: &LineString<f64>, spacing: f64) -> Vec<Point<f64>> {
    let mut samples = Vec::new();
    for segment in ring.lines() {
        samples.push(Point::from(segment.start));
        let dx = segment.end.x - segment.start.x;
        let dy = segment.end.y - segment.start.y;
        let length = (dx * dx + dy * dy).sqrt();
        if length <= spacing || spacing <= 0.0 {
            continue;
        }
        let steps = (length / spacing).floor() as usize;
        for step in 1..=steps {
            let t = step as f64 * spacing / length;
            if t >= 1.0 {
                break;
            }
            samples.push(Point::new(
                segment.start.x + t * dx,
                segment.start.y + t * dy,
            ));
        }
    }
    samples
}

/// Expand a rectangle outward by `factor` of its dimensions on every side.
///
/// Zero-width or zero-height rectangles get a small absolute margin so the
/// result always has positive extent.
pub fn expand_rect(rect: Rect<f64>, factor: f64) -> Rect<f64> {
    let pad_x = (rect.width() * factor).max(SNAP_PRECISION * 1e3);
    let pad_y = (rect.height() * factor).max(SNAP_PRECISION * 1e3);
    Rect::new(
        Coord {
            x: rect.min().x - pad_x,
            y: rect.min().y - pad_y,
        },
        Coord {
            x: rect.max().x + pad_x,
            y: rect.max().y + pad_y,
        },
    )
}

/// Validate a polygon for use as planar-arrangement input.
///
/// Checks each ring for non-finite coordinates, degenerate vertex counts and
/// self-intersection. Returns a human-readable reason on failure.
pub fn validate_polygon(polygon: &Polygon<f64>) -> std::result::Result<(), String> {
    validate_ring(polygon.exterior(), "exterior ring")?;
    for (i, interior) in polygon.interiors().iter().enumerate() {
        validate_ring(interior, &format!("interior ring {i}"))?;
    }
    Ok(())
}

/// Validate a line string: finite coordinates and at least one segment.
pub fn validate_line(line: &LineString<f64>) -> std::result::Result<(), String> {
    if line.0.len() < 2 {
        return Err("line has fewer than 2 points".to_string());
    }
    for c in &line.0 {
        if !c.x.is_finite() || !c.y.is_finite() {
            return Err("line has non-finite coordinates".to_string());
        }
    }
    Ok(())
}

fn validate_ring(ring: &LineString<f64>, label: &str) -> std::result::Result<(), String> {
    for c in &ring.0 {
        if !c.x.is_finite() || !c.y.is_finite() {
            return Err(format!("{label} has non-finite coordinates"));
        }
    }
    let distinct: std::collections::BTreeSet<QuantKey> = ring.0.iter().map(|c| quantize(*c)).collect();
    if distinct.len() < 3 {
        return Err(format!("{label} has fewer than 3 distinct vertices"));
    }

    let segments: Vec<Line<f64>> = ring.lines().collect();
    let n = segments.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            match line_intersection(segments[i], segments[j]) {
                None => {}
                Some(LineIntersection::Collinear { .. }) => {
                    return Err(format!("{label} self-intersects (collinear overlap)"));
                }
                Some(LineIntersection::SinglePoint { intersection, .. }) => {
                    if !adjacent {
                        return Err(format!(
                            "{label} self-intersects near ({:.6}, {:.6})",
                            intersection.x, intersection.y
                        ));
                    }
                    // Adjacent segments may only meet at their shared vertex.
                    let shared = if j == i + 1 {
                        segments[i].end
                    } else {
                        segments[i].start
                    };
                    if quantize(intersection) != quantize(shared) {
                        return Err(format!(
                            "{label} self-intersects near ({:.6}, {:.6})",
                            intersection.x, intersection.y
                        ));
                    }
                }
            }
        }
    }
    Ok(())
}
