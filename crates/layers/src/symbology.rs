use scene::WageLevel;
use serde::Serialize;

/// Color slot a region or popup badge resolves to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorKey {
    Level(u8),
    Unclassified,
}

impl ColorKey {
    pub fn for_level(level: Option<WageLevel>) -> Self {
        match level {
            Some(level) => ColorKey::Level(level.number()),
            None => ColorKey::Unclassified,
        }
    }
}

/// Fixed choropleth styling handed to the map renderer.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct ChoroplethStyle {
    /// Fill per level, I through IV.
    pub level_colors: [&'static str; 4],
    /// Fill for "no data" and "below level I" regions.
    pub unclassified_fill: &'static str,
    /// Popup badge dot for unclassified regions.
    pub unclassified_badge: &'static str,
    pub fill_opacity: f32,
    pub outline_color: &'static str,
    pub outline_width: f32,
    pub outline_opacity: f32,
}

impl ChoroplethStyle {
    pub fn level_color(&self, level: WageLevel) -> &'static str {
        self.level_colors[usize::from(level.number() - 1)]
    }

    pub fn fill_for(&self, key: ColorKey) -> &'static str {
        match key {
            ColorKey::Level(n) => WageLevel::from_number(n)
                .map(|l| self.level_color(l))
                .unwrap_or(self.unclassified_fill),
            ColorKey::Unclassified => self.unclassified_fill,
        }
    }

    pub fn badge_for(&self, key: ColorKey) -> &'static str {
        match key {
            ColorKey::Unclassified => self.unclassified_badge,
            level => self.fill_for(level),
        }
    }

    /// `(label, color)` rows for a map legend, level I first.
    pub fn legend(&self) -> Vec<(String, &'static str)> {
        WageLevel::ALL
            .iter()
            .map(|l| (l.to_string(), self.level_color(*l)))
            .collect()
    }
}

impl Default for ChoroplethStyle {
    fn default() -> Self {
        Self {
            level_colors: ["#FEF3C7", "#F59E0B", "#8B5CF6", "#4C1D95"],
            unclassified_fill: "#F3F4F6",
            unclassified_badge: "#d1d5db",
            fill_opacity: 0.8,
            outline_color: "#e3e7ed",
            outline_width: 1.0,
            outline_opacity: 0.4,
        }
    }
}

#[cfg(test)]
mod tests {
    use scene::WageLevel;

    use super::{ChoroplethStyle, ColorKey};

    #[test]
    fn level_colors_and_sentinels() {
        let style = ChoroplethStyle::default();
        assert_eq!(style.fill_for(ColorKey::for_level(Some(WageLevel::IV))), "#4C1D95");
        assert_eq!(style.fill_for(ColorKey::for_level(None)), "#F3F4F6");
        assert_eq!(style.badge_for(ColorKey::Unclassified), "#d1d5db");
        assert_eq!(style.badge_for(ColorKey::Level(1)), "#FEF3C7");
        assert_eq!(style.fill_for(ColorKey::Level(9)), "#F3F4F6");
    }

    #[test]
    fn legend_lists_levels_in_order() {
        let legend = ChoroplethStyle::default().legend();
        assert_eq!(legend.len(), 4);
        assert_eq!(legend[0], ("Level I".to_string(), "#FEF3C7"));
        assert_eq!(legend[3].0, "Level IV");
    }
}
