use std::collections::HashMap;

use crate::level::WageLevel;
use crate::region_key::RegionKey;

/// Hourly USD thresholds for one region. Any level may be missing.
///
/// Present values are expected to increase from I to IV; that is not
/// re-validated here.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct LevelThresholds {
    pub i: Option<f64>,
    pub ii: Option<f64>,
    pub iii: Option<f64>,
    pub iv: Option<f64>,
}

impl LevelThresholds {
    pub fn new(i: Option<f64>, ii: Option<f64>, iii: Option<f64>, iv: Option<f64>) -> Self {
        Self { i, ii, iii, iv }
    }

    pub fn get(&self, level: WageLevel) -> Option<f64> {
        match level {
            WageLevel::I => self.i,
            WageLevel::II => self.ii,
            WageLevel::III => self.iii,
            WageLevel::IV => self.iv,
        }
    }

    pub fn is_empty(&self) -> bool {
        WageLevel::ALL.iter().all(|l| self.get(*l).is_none())
    }
}

/// Per-occupation threshold table keyed by [`RegionKey`] text.
///
/// Replaced wholesale whenever a new occupation is selected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WageThresholdTable {
    entries: HashMap<String, LevelThresholds>,
}

impl WageThresholdTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, thresholds: LevelThresholds) {
        self.entries.insert(key.into(), thresholds);
    }

    pub fn get(&self, key: &str) -> Option<&LevelThresholds> {
        self.entries.get(key)
    }

    pub fn get_region(&self, key: &RegionKey) -> Option<&LevelThresholds> {
        self.get(key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, LevelThresholds)> for WageThresholdTable {
    fn from_iter<I: IntoIterator<Item = (K, LevelThresholds)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
