use crate::bounds::{BoundingBox, LngLat};

/// Region geometry in lon/lat degrees.
///
/// Rings are stored as written by the source; closing duplicates are kept.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(LngLat),
    MultiPoint(Vec<LngLat>),
    LineString(Vec<LngLat>),
    MultiLineString(Vec<Vec<LngLat>>),
    Polygon(Vec<Vec<LngLat>>),
    MultiPolygon(Vec<Vec<Vec<LngLat>>>),
}

impl Geometry {
    /// Visits every position, whatever the nesting depth.
    pub fn for_each_position(&self, mut f: impl FnMut(LngLat)) {
        match self {
            Geometry::Point(p) => f(*p),
            Geometry::MultiPoint(ps) | Geometry::LineString(ps) => ps.iter().copied().for_each(f),
            Geometry::MultiLineString(lines) | Geometry::Polygon(lines) => {
                lines.iter().flatten().copied().for_each(f)
            }
            Geometry::MultiPolygon(polys) => polys.iter().flatten().flatten().copied().for_each(f),
        }
    }

    pub fn position_count(&self) -> usize {
        let mut n = 0;
        self.for_each_position(|_| n += 1);
        n
    }
}

/// Bounding box of every finite position in `geometry`.
///
/// Returns `None` for a missing geometry or one without any usable position.
pub fn compute_bounds(geometry: Option<&Geometry>) -> Option<BoundingBox> {
    let geometry = geometry?;
    let mut out: Option<BoundingBox> = None;
    geometry.for_each_position(|p| {
        if !p.is_finite() {
            return;
        }
        match out.as_mut() {
            Some(b) => b.extend(p),
            None => out = Some(BoundingBox::from_point(p)),
        }
    });
    out
}

#[cfg(test)]
mod tests {
    use super::{Geometry, compute_bounds};
    use crate::bounds::{BoundingBox, LngLat};

    fn ring(points: &[(f64, f64)]) -> Vec<LngLat> {
        points.iter().map(|&(x, y)| LngLat::new(x, y)).collect()
    }

    #[test]
    fn polygon_bounds_cover_all_rings() {
        let outer = ring(&[(0.0, 0.0), (4.0, 0.0), (4.0, 3.0), (0.0, 3.0), (0.0, 0.0)]);
        let hole = ring(&[(1.0, 1.0), (2.0, 1.0), (2.0, 2.0), (1.0, 1.0)]);
        let g = Geometry::Polygon(vec![outer, hole]);
        let b = compute_bounds(Some(&g)).expect("bounds");
        assert_eq!(
            b,
            BoundingBox::new(LngLat::new(0.0, 0.0), LngLat::new(4.0, 3.0))
        );
    }

    #[test]
    fn multipolygon_bounds_span_parts() {
        let a = vec![ring(&[(-120.0, 33.0), (-119.0, 33.0), (-119.0, 34.0)])];
        let b = vec![ring(&[(-118.5, 32.5), (-118.0, 32.5), (-118.0, 33.5)])];
        let g = Geometry::MultiPolygon(vec![a, b]);
        let bounds = compute_bounds(Some(&g)).expect("bounds");
        assert_eq!(bounds.to_corners(), [[-120.0, 32.5], [-118.0, 34.0]]);
        assert_eq!(g.position_count(), 6);
    }

    #[test]
    fn empty_or_missing_geometry_has_no_bounds() {
        assert_eq!(compute_bounds(None), None);
        assert_eq!(compute_bounds(Some(&Geometry::Polygon(Vec::new()))), None);
        assert_eq!(
            compute_bounds(Some(&Geometry::MultiPolygon(vec![vec![Vec::new()]]))),
            None
        );
    }

    #[test]
    fn non_finite_positions_are_ignored() {
        let g = Geometry::LineString(ring(&[(f64::NAN, 1.0), (2.0, 3.0)]));
        let b = compute_bounds(Some(&g)).expect("bounds");
        assert_eq!(b, BoundingBox::from_point(LngLat::new(2.0, 3.0)));
    }

    #[test]
    fn point_bounds_are_degenerate() {
        let g = Geometry::Point(LngLat::new(5.0, 6.0));
        let b = compute_bounds(Some(&g)).expect("bounds");
        assert_eq!(b.center(), LngLat::new(5.0, 6.0));
    }
}
