use crate::math::{Point2, Point3, Vector2, TOLERANCE};

/// One planned street lamp. The glow fields are driven by the solar regime
/// each frame; positions are fixed at plan time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lamp {
    /// Ground position of the post.
    pub position: Point3,
    /// Opacity of the halo sprite.
    pub glow_opacity: f64,
    /// Emissive intensity of the lantern head.
    pub lantern_emissive: f64,
}

impl Lamp {
    fn at(p: Point2) -> Self {
        Self {
            position: Point3::new(p.x, 0.0, p.y),
            glow_opacity: 0.05,
            lantern_emissive: 0.0,
        }
    }
}

/// Plans lamp positions along road centerlines.
///
/// Walks each polyline at a fixed arc-length interval, carrying the
/// remainder across segment joins so spacing stays even through corners.
/// Each stop yields a lamp on both sides of the line, offset
/// perpendicularly.
#[must_use]
pub fn plan_lamps(centerlines: &[Vec<Point2>], spacing: f64, offset: f64) -> Vec<Lamp> {
    let mut lamps = Vec::new();
    if spacing <= TOLERANCE {
        return lamps;
    }

    for line in centerlines {
        let mut until_next = spacing;
        for pair in line.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let delta = b - a;
            let length = delta.norm();
            if length < TOLERANCE {
                continue;
            }
            let dir = delta / length;
            let perp = Vector2::new(-dir.y, dir.x);

            let mut along = until_next;
            while along <= length {
                let center = a + dir * along;
                lamps.push(Lamp::at(center + perp * offset));
                lamps.push(Lamp::at(center - perp * offset));
                along += spacing;
            }
            until_next = along - length;
        }
    }
    lamps
}
