use std::sync::Arc;

use foundation::bounds::BoundingBox;
use layers::{ClassifiedCollection, PopupContent};
use scene::{ActivePopup, CountyOption};

/// Camera fit request for the map surface.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomRequest {
    pub bounds: BoundingBox,
    pub max_zoom: Option<f64>,
    pub duration_ms: u64,
    pub padding: f64,
}

/// What the session asks of the rendering collaborator, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutput {
    /// Replace the choropleth data with this view.
    Fill(Arc<ClassifiedCollection>),
    Zoom(ZoomRequest),
    /// Open a popup, replacing any popup already shown.
    PopupOpened {
        popup: ActivePopup,
        content: PopupContent,
    },
    /// Rebuild the open popup's content in place; the anchor is unchanged.
    PopupUpdated {
        popup: ActivePopup,
        content: PopupContent,
    },
    PopupClosed,
    /// Region picker entries for the selected state.
    CountyOptions(Vec<CountyOption>),
}

/// What the collapsed control panel pins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelSummary {
    pub occupation: String,
    pub salary: String,
}
