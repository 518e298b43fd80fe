use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use foundation::bounds::{BoundingBox, merge_bounds};
use foundation::ids::RegionId;

use crate::region::{RegionCollection, RegionFeature};

/// One entry of a per-state region picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountyOption {
    pub name: String,
    pub id: RegionId,
}

/// State and region lookup tables built from the base collection.
///
/// Regions whose state code has no abbreviation are excluded from every table.
/// Rebuilt wholesale if the base collection ever changes.
#[derive(Debug, Clone)]
pub struct LocationIndex {
    collection: Arc<RegionCollection>,
    by_state: BTreeMap<&'static str, Vec<CountyOption>>,
    state_abbrevs: Vec<&'static str>,
    by_id: HashMap<RegionId, usize>,
}

impl LocationIndex {
    pub fn build(collection: Arc<RegionCollection>) -> Self {
        let mut by_state: BTreeMap<&'static str, Vec<CountyOption>> = BTreeMap::new();
        let mut by_id: HashMap<RegionId, usize> = HashMap::new();

        for (idx, feature) in collection.iter().enumerate() {
            let Some(abbr) = feature.state_abbrev() else {
                continue;
            };
            by_id.insert(feature.id.clone(), idx);
            by_state.entry(abbr).or_default().push(CountyOption {
                name: feature.name.clone(),
                id: feature.id.clone(),
            });
        }

        for list in by_state.values_mut() {
            list.sort_by(|a, b| locale_cmp(&a.name, &b.name));
        }

        // BTreeMap keys are already in ascending order.
        let state_abbrevs = by_state.keys().copied().collect();

        Self {
            collection,
            by_state,
            state_abbrevs,
            by_id,
        }
    }

    pub fn collection(&self) -> &Arc<RegionCollection> {
        &self.collection
    }

    pub fn state_abbrevs(&self) -> &[&'static str] {
        &self.state_abbrevs
    }

    /// Regions of `state` ordered by name; empty for unknown states.
    pub fn counties(&self, state: &str) -> &[CountyOption] {
        self.by_state.get(state).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn region(&self, id: &str) -> Option<&RegionFeature> {
        let idx = *self.by_id.get(id)?;
        self.collection.features().get(idx)
    }

    pub fn regions_in_state<'a>(
        &'a self,
        state: &'a str,
    ) -> impl Iterator<Item = &'a RegionFeature> + 'a {
        self.counties(state)
            .iter()
            .filter_map(move |c| self.region(c.id.as_str()))
    }

    /// Union of the bounds of every region in `state`.
    pub fn state_bounds(&self, state: &str) -> Option<BoundingBox> {
        self.regions_in_state(state)
            .fold(None, |acc, f| merge_bounds(acc, f.bounds()))
    }
}

/// Ascending name order approximating a locale-aware collator: case and
/// common Latin diacritics only matter to break ties.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    let primary = a.chars().map(fold_char).cmp(b.chars().map(fold_char));
    primary
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        // Lowercase sorts first on exact ties, as collators do by default.
        .then_with(|| b.cmp(a))
}

fn fold_char(c: char) -> char {
    let c = c.to_lowercase().next().unwrap_or(c);
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        _ => c,
    }
}
