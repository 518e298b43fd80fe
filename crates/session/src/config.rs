use foundation::bounds::BoundingBox;
use layers::ChoroplethStyle;

/// Contiguous United States, `[-125, 24]..[-66, 50]`.
pub const USA_BOUNDS: BoundingBox = BoundingBox {
    min_lng: -125.0,
    min_lat: 24.0,
    max_lng: -66.0,
    max_lat: 50.0,
};

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Occupation table loaded on start.
    pub default_occupation: String,
    /// Display text for the default occupation.
    pub default_occupation_title: Option<String>,
    pub default_salary: Option<f64>,
    /// Zoom target when the state selection is cleared.
    pub country_bounds: BoundingBox,
    pub fit_padding: f64,
    pub fit_duration_ms: u64,
    /// Zoom clamp when fitting a single county.
    pub county_max_zoom: f64,
    pub style: ChoroplethStyle,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_occupation: "11-1011".to_string(),
            default_occupation_title: Some("11-1011 – Chief Executives".to_string()),
            default_salary: Some(150_000.0),
            country_bounds: USA_BOUNDS,
            fit_padding: 30.0,
            fit_duration_ms: 600,
            county_max_zoom: 8.0,
            style: ChoroplethStyle::default(),
        }
    }
}
