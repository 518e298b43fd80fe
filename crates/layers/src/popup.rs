use scene::{LevelThresholds, RegionFeature, WageLevel, WageThresholdTable};
use serde::Serialize;

use crate::classify::{Classification, ClassifiedCollection, HOURS_PER_YEAR};
use crate::format::{DASH, format_annual_to_k};
use crate::symbology::{ChoroplethStyle, ColorKey};

/// Petition year the selection odds below were published for.
pub const LOTTERY_YEAR: u16 = 2027;

/// Published per-level selection odds, in percent.
pub const LOTTERY_SELECTION_ODDS: [(WageLevel, f64); 4] = [
    (WageLevel::I, 15.29),
    (WageLevel::II, 30.58),
    (WageLevel::III, 45.87),
    (WageLevel::IV, 61.16),
];

pub fn selection_odds(level: WageLevel) -> Option<f64> {
    LOTTERY_SELECTION_ODDS
        .iter()
        .find(|(l, _)| *l == level)
        .map(|(_, odds)| *odds)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelRow {
    pub level: u8,
    /// `"L III"`.
    pub label: String,
    /// `"$146K+"`, or a dash when the threshold is undefined.
    pub annual_floor: String,
    pub is_active: bool,
    /// `"45.87%"`; only present while the lottery overlay is on.
    pub probability: Option<String>,
}

/// Renderer-agnostic popup payload for one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopupContent {
    pub region_id: String,
    pub title: String,
    pub label: String,
    pub has_data: bool,
    pub level: Option<u8>,
    pub color_key: ColorKey,
    pub color: &'static str,
    pub rows: Vec<LevelRow>,
    pub lottery_caption: Option<String>,
    pub summary: Option<String>,
}

pub fn level_label(classification: Classification) -> String {
    match (classification.has_data, classification.level) {
        (false, _) => "No data".to_string(),
        (true, None) => "Below Level I".to_string(),
        (true, Some(level)) => level.to_string(),
    }
}

/// Builds popup content for `region` from its current classification.
///
/// Thresholds are read from `table`, which must be the table the
/// classification was computed against.
pub fn build_content(
    region: &RegionFeature,
    classification: Classification,
    table: Option<&WageThresholdTable>,
    lottery_enabled: bool,
    style: &ChoroplethStyle,
) -> PopupContent {
    let thresholds = table.and_then(|t| region.region_key().and_then(|k| t.get_region(&k)));
    let current = classification.level;
    let color_key = ColorKey::for_level(current);

    let rows = WageLevel::ALL
        .iter()
        .map(|level| level_row(*level, thresholds, current, lottery_enabled))
        .collect();

    let summary = match current.and_then(selection_odds) {
        Some(odds) if lottery_enabled => Some(format!(
            "You have a {odds}% probability of being selected to file an H-1B petition in {LOTTERY_YEAR}."
        )),
        _ => None,
    };

    PopupContent {
        region_id: region.id.to_string(),
        title: region.display_title(),
        label: level_label(classification),
        has_data: classification.has_data,
        level: current.map(WageLevel::number),
        color_key,
        color: style.badge_for(color_key),
        rows,
        lottery_caption: lottery_enabled
            .then(|| format!("Chances in the {LOTTERY_YEAR} lottery.")),
        summary,
    }
}

fn level_row(
    level: WageLevel,
    thresholds: Option<&LevelThresholds>,
    current: Option<WageLevel>,
    lottery_enabled: bool,
) -> LevelRow {
    let annual_floor = match thresholds.and_then(|t| t.get(level)) {
        Some(hourly) if hourly.is_finite() => {
            format!("{}+", format_annual_to_k(hourly * HOURS_PER_YEAR))
        }
        _ => DASH.to_string(),
    };
    let probability = if lottery_enabled {
        Some(match selection_odds(level) {
            Some(odds) => format!("{odds}%"),
            None => DASH.to_string(),
        })
    } else {
        None
    };
    LevelRow {
        level: level.number(),
        label: format!("L {}", level.roman()),
        annual_floor,
        is_active: current == Some(level),
        probability,
    }
}

impl ClassifiedCollection {
    /// Popup content for `id` resolved against this view, or `None` when the
    /// region is not part of it.
    pub fn popup_content(
        &self,
        id: &str,
        lottery_enabled: bool,
        style: &ChoroplethStyle,
    ) -> Option<PopupContent> {
        let region = self.base().get(id)?;
        let classification = self.classification(id)?;
        Some(build_content(
            region,
            classification,
            self.table().map(|t| &**t),
            lottery_enabled,
            style,
        ))
    }
}
