//! Choropleth layer: classification views, popup payloads and styling.

pub mod classify;
pub mod format;
pub mod popup;
pub mod symbology;

pub use classify::*;
pub use format::*;
pub use popup::*;
pub use symbology::*;
