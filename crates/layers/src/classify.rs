use std::sync::Arc;

use scene::{
    LevelThresholds, RegionCollection, RegionFeature, RegionKey, WageLevel, WageThresholdTable,
};
use serde::Serialize;

/// 40 hours × 52 weeks.
pub const HOURS_PER_YEAR: f64 = 2080.0;

pub fn hourly_wage(annual_salary: f64) -> f64 {
    annual_salary / HOURS_PER_YEAR
}

/// Outcome of classifying one region.
///
/// `has_data == false` is "no data" (region absent from the table);
/// `has_data && level.is_none()` is "below level I".
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Classification {
    pub has_data: bool,
    pub level: Option<WageLevel>,
}

impl Classification {
    pub const NO_DATA: Classification = Classification {
        has_data: false,
        level: None,
    };
    pub const BELOW_LEVEL_I: Classification = Classification {
        has_data: true,
        level: None,
    };

    pub fn at(level: WageLevel) -> Self {
        Self {
            has_data: true,
            level: Some(level),
        }
    }
}

/// Highest level whose defined threshold the wage meets.
///
/// Undefined thresholds are skipped rather than read as zero, so an entry
/// with nothing defined is "below level I".
pub fn classify_thresholds(
    thresholds: Option<&LevelThresholds>,
    hourly_wage: f64,
) -> Classification {
    let Some(thresholds) = thresholds else {
        return Classification::NO_DATA;
    };
    WageLevel::ALL
        .iter()
        .rev()
        .find(|level| thresholds.get(**level).is_some_and(|t| hourly_wage >= t))
        .map(|level| Classification::at(*level))
        .unwrap_or(Classification::BELOW_LEVEL_I)
}

/// Classifies one region key against a table. A missing key (unmapped state)
/// is "no data".
pub fn classify(
    table: &WageThresholdTable,
    key: Option<&RegionKey>,
    hourly_wage: f64,
) -> Classification {
    classify_thresholds(key.and_then(|k| table.get_region(k)), hourly_wage)
}

/// Per-bucket region counts for a classified view.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LevelCounts {
    pub no_data: usize,
    pub below_level_i: usize,
    pub level_i: usize,
    pub level_ii: usize,
    pub level_iii: usize,
    pub level_iv: usize,
}

impl LevelCounts {
    fn add(&mut self, c: Classification) {
        match (c.has_data, c.level) {
            (false, _) => self.no_data += 1,
            (true, None) => self.below_level_i += 1,
            (true, Some(WageLevel::I)) => self.level_i += 1,
            (true, Some(WageLevel::II)) => self.level_ii += 1,
            (true, Some(WageLevel::III)) => self.level_iii += 1,
            (true, Some(WageLevel::IV)) => self.level_iv += 1,
        }
    }
}

/// A classified view over the immutable base collection.
///
/// Each pass builds a fresh view; the base and earlier views are never
/// touched. The view keeps the table it was computed from so popups read
/// thresholds and levels from the same snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedCollection {
    base: Arc<RegionCollection>,
    table: Option<Arc<WageThresholdTable>>,
    annual_salary: Option<f64>,
    classes: Vec<Classification>,
}

impl ClassifiedCollection {
    /// Initial view before any table has arrived: every region is "no data".
    pub fn unclassified(base: Arc<RegionCollection>) -> Self {
        let classes = vec![Classification::NO_DATA; base.len()];
        Self {
            base,
            table: None,
            annual_salary: None,
            classes,
        }
    }

    pub fn base(&self) -> &Arc<RegionCollection> {
        &self.base
    }

    pub fn table(&self) -> Option<&Arc<WageThresholdTable>> {
        self.table.as_ref()
    }

    pub fn annual_salary(&self) -> Option<f64> {
        self.annual_salary
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn classification(&self, id: &str) -> Option<Classification> {
        let idx = self.base.position(id)?;
        self.classes.get(idx).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RegionFeature, Classification)> + '_ {
        self.base.iter().zip(self.classes.iter().copied())
    }

    /// Level per region, parallel to the base collection.
    pub fn levels(&self) -> Vec<Option<WageLevel>> {
        self.classes.iter().map(|c| c.level).collect()
    }

    pub fn counts(&self) -> LevelCounts {
        let mut counts = LevelCounts::default();
        for c in &self.classes {
            counts.add(*c);
        }
        counts
    }
}

/// Classifies every region for `annual_salary`.
///
/// Returns `None` when the salary is not a finite number: callers keep their
/// previous view, so a cleared or half-typed input never blanks the map.
pub fn classify_all(
    table: &Arc<WageThresholdTable>,
    base: &Arc<RegionCollection>,
    annual_salary: f64,
) -> Option<ClassifiedCollection> {
    if !annual_salary.is_finite() {
        return None;
    }
    let hourly = hourly_wage(annual_salary);
    let classes = base
        .iter()
        .map(|f| classify(table, f.region_key().as_ref(), hourly))
        .collect();
    Some(ClassifiedCollection {
        base: Arc::clone(base),
        table: Some(Arc::clone(table)),
        annual_salary: Some(annual_salary),
        classes,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use scene::{
        LevelThresholds, RegionCollection, RegionFeature, WageLevel, WageThresholdTable,
        region_key,
    };

    use super::{Classification, HOURS_PER_YEAR, classify, classify_all, hourly_wage};

    fn la_table() -> WageThresholdTable {
        [(
            "CA|los angeles",
            LevelThresholds::new(Some(40.0), Some(55.0), Some(70.0), Some(90.0)),
        )]
        .into_iter()
        .collect()
    }

    fn base() -> Arc<RegionCollection> {
        Arc::new(RegionCollection::new(vec![
            RegionFeature::new("06037", "06", "Los Angeles", None),
            RegionFeature::new("06059", "06", "Orange", None),
            RegionFeature::new("99001", "99", "Ghost", None),
        ]))
    }

    #[test]
    fn salary_150k_is_level_iii() {
        let key = region_key("CA", "Los Angeles County");
        let c = classify(&la_table(), Some(&key), hourly_wage(150_000.0));
        assert_eq!(c, Classification::at(WageLevel::III));
    }

    #[test]
    fn salary_95k_is_level_i() {
        let key = region_key("CA", "Los Angeles");
        let c = classify(&la_table(), Some(&key), 95_000.0 / HOURS_PER_YEAR);
        assert_eq!(c, Classification::at(WageLevel::I));
    }

    #[test]
    fn below_and_missing_are_distinct() {
        let t = la_table();
        let la = region_key("CA", "Los Angeles");
        assert_eq!(classify(&t, Some(&la), 10.0), Classification::BELOW_LEVEL_I);
        let other = region_key("CA", "Orange");
        assert_eq!(classify(&t, Some(&other), 500.0), Classification::NO_DATA);
        assert_eq!(classify(&t, None, 500.0), Classification::NO_DATA);
    }

    #[test]
    fn undefined_thresholds_are_skipped_not_zero() {
        let t: WageThresholdTable = [
            ("CA|gap", LevelThresholds::new(None, Some(30.0), None, Some(80.0))),
            ("CA|bare", LevelThresholds::default()),
        ]
        .into_iter()
        .collect();
        let gap = region_key("CA", "gap");
        assert_eq!(classify(&t, Some(&gap), 29.0), Classification::BELOW_LEVEL_I);
        assert_eq!(classify(&t, Some(&gap), 50.0), Classification::at(WageLevel::II));
        assert_eq!(classify(&t, Some(&gap), 85.0), Classification::at(WageLevel::IV));
        let bare = region_key("CA", "bare");
        assert_eq!(classify(&t, Some(&bare), 1e9), Classification::BELOW_LEVEL_I);
    }

    #[test]
    fn level_never_decreases_as_salary_rises() {
        let t = la_table();
        let key = region_key("CA", "Los Angeles");
        let mut prev = None;
        for salary in (0..=300_000).step_by(2_500) {
            let level = classify(&t, Some(&key), hourly_wage(salary as f64)).level;
            assert!(level >= prev, "salary {salary}: {level:?} < {prev:?}");
            prev = level;
        }
        assert_eq!(prev, Some(WageLevel::IV));
    }

    #[test]
    fn classify_all_is_pure() {
        let table = Arc::new(la_table());
        let base = base();
        let snapshot = (*base).clone();

        let a = classify_all(&table, &base, 150_000.0).expect("finite");
        let b = classify_all(&table, &base, 150_000.0).expect("finite");
        assert_eq!(a, b);
        assert_eq!(*base, snapshot);

        assert_eq!(a.classification("06037"), Some(Classification::at(WageLevel::III)));
        assert_eq!(a.classification("06059"), Some(Classification::NO_DATA));
        assert_eq!(a.classification("99001"), Some(Classification::NO_DATA));
        assert_eq!(a.levels(), vec![Some(WageLevel::III), None, None]);
        assert_eq!(a.counts().level_iii, 1);
        assert_eq!(a.counts().no_data, 2);
    }

    #[test]
    fn non_finite_salary_aborts() {
        let table = Arc::new(la_table());
        assert!(classify_all(&table, &base(), f64::NAN).is_none());
        assert!(classify_all(&table, &base(), f64::INFINITY).is_none());
    }
}
