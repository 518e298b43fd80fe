/// Longitude/latitude pair in degrees (WGS84).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    pub fn is_finite(&self) -> bool {
        self.lng.is_finite() && self.lat.is_finite()
    }
}

/// Axis-aligned lon/lat rectangle.
///
/// Invariant: `min_lng <= max_lng` and `min_lat <= max_lat`. Every constructor
/// orders its inputs, so a value of this type never describes an inverted box.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundingBox {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Builds the smallest box containing both corners, in any order.
    pub fn new(a: LngLat, b: LngLat) -> Self {
        Self {
            min_lng: a.lng.min(b.lng),
            min_lat: a.lat.min(b.lat),
            max_lng: a.lng.max(b.lng),
            max_lat: a.lat.max(b.lat),
        }
    }

    pub fn from_point(p: LngLat) -> Self {
        Self::new(p, p)
    }

    pub fn extend(&mut self, p: LngLat) {
        self.min_lng = self.min_lng.min(p.lng);
        self.min_lat = self.min_lat.min(p.lat);
        self.max_lng = self.max_lng.max(p.lng);
        self.max_lat = self.max_lat.max(p.lat);
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            min_lng: self.min_lng.min(other.min_lng),
            min_lat: self.min_lat.min(other.min_lat),
            max_lng: self.max_lng.max(other.max_lng),
            max_lat: self.max_lat.max(other.max_lat),
        }
    }

    pub fn center(&self) -> LngLat {
        LngLat::new(
            (self.min_lng + self.max_lng) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }

    pub fn contains(&self, p: LngLat) -> bool {
        p.lng >= self.min_lng
            && p.lng <= self.max_lng
            && p.lat >= self.min_lat
            && p.lat <= self.max_lat
    }

    /// `[[min_lng, min_lat], [max_lng, max_lat]]`, the layout map renderers take for fit requests.
    pub fn to_corners(&self) -> [[f64; 2]; 2] {
        [[self.min_lng, self.min_lat], [self.max_lng, self.max_lat]]
    }
}

/// Null-safe union of two optional boxes.
pub fn merge_bounds(a: Option<BoundingBox>, b: Option<BoundingBox>) -> Option<BoundingBox> {
    match (a, b) {
        (None, b) => b,
        (a, None) => a,
        (Some(a), Some(b)) => Some(a.union(&b)),
    }
}

/// Midpoint of a box. Only used as a popup anchor when no interaction point exists.
pub fn centroid_approx(bounds: Option<BoundingBox>) -> Option<LngLat> {
    bounds.map(|b| b.center())
}
