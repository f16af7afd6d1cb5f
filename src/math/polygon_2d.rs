use super::{Point2, TOLERANCE};

/// Computes the signed area of a polygon ring (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area_2d(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Arithmetic centroid of a ring's vertices.
#[must_use]
pub fn ring_centroid(points: &[Point2]) -> Point2 {
    if points.is_empty() {
        return Point2::origin();
    }
    let mut x = 0.0;
    let mut y = 0.0;
    for p in points {
        x += p.x;
        y += p.y;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = points.len() as f64;
    Point2::new(x / n, y / n)
}

/// Returns `true` if the ring has at least 3 distinct, finite vertices and
/// non-negligible area. A trailing vertex equal to the first (closed GeoJSON
/// rings) does not count as distinct.
#[must_use]
pub fn is_valid_ring(points: &[Point2]) -> bool {
    if points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return false;
    }
    let mut distinct: Vec<Point2> = Vec::with_capacity(points.len());
    for p in points {
        if distinct
            .last()
            .is_none_or(|prev| (p - prev).norm() > TOLERANCE)
        {
            distinct.push(*p);
        }
    }
    if distinct.len() > 1 && (distinct[0] - distinct[distinct.len() - 1]).norm() <= TOLERANCE {
        distinct.pop();
    }
    distinct.len() >= 3 && signed_area_2d(&distinct).abs() > TOLERANCE
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square() -> Vec<Point2> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 2.0),
        ]
    }

    #[test]
    fn ccw_square_has_positive_area() {
        assert_relative_eq!(signed_area_2d(&square()), 4.0);
    }

    #[test]
    fn cw_square_has_negative_area() {
        let mut pts = square();
        pts.reverse();
        assert_relative_eq!(signed_area_2d(&pts), -4.0);
    }

    #[test]
    fn centroid_of_square() {
        let c = ring_centroid(&square());
        assert_relative_eq!(c.x, 1.0);
        assert_relative_eq!(c.y, 1.0);
    }

    #[test]
    fn degenerate_rings_are_invalid() {
        assert!(!is_valid_ring(&[]));
        assert!(!is_valid_ring(&[Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]));
        // collinear
        assert!(!is_valid_ring(&[
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
        ]));
        // non-finite coordinate
        assert!(!is_valid_ring(&[
            Point2::new(0.0, 0.0),
            Point2::new(f64::NAN, 0.0),
            Point2::new(2.0, 1.0),
        ]));
    }

    #[test]
    fn closed_geojson_ring_is_valid() {
        let mut pts = square();
        pts.push(pts[0]);
        assert!(is_valid_ring(&pts));
    }
}
