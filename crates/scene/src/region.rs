use std::collections::HashMap;

use foundation::bounds::BoundingBox;
use foundation::geometry::{Geometry, compute_bounds};
use foundation::ids::RegionId;

use crate::region_key::{RegionKey, region_key};
use crate::state_codes::state_abbrev;

/// One administrative region (county or equivalent). Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionFeature {
    pub id: RegionId,
    /// Two-digit numeric state code as published (`"06"` for California).
    pub state_code: String,
    pub name: String,
    pub geometry: Option<Geometry>,
}

impl RegionFeature {
    pub fn new(
        id: impl Into<RegionId>,
        state_code: impl Into<String>,
        name: impl Into<String>,
        geometry: Option<Geometry>,
    ) -> Self {
        Self {
            id: id.into(),
            state_code: state_code.into(),
            name: name.into(),
            geometry,
        }
    }

    pub fn state_abbrev(&self) -> Option<&'static str> {
        state_abbrev(&self.state_code)
    }

    /// Wage-table key for this region, or `None` when its state code is unmapped.
    ///
    /// Tables are keyed by the full county name, so the " County" suffix is
    /// appended before normalization exactly like the table builder does.
    pub fn region_key(&self) -> Option<RegionKey> {
        let state = self.state_abbrev()?;
        Some(region_key(state, &format!("{} County", self.name)))
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        compute_bounds(self.geometry.as_ref())
    }

    /// `"Los Angeles, CA"`; the state part is omitted when unmapped.
    pub fn display_title(&self) -> String {
        match self.state_abbrev() {
            Some(state) => format!("{}, {state}", self.name),
            None => self.name.clone(),
        }
    }
}

/// The base region collection. Loaded once per session and never mutated;
/// classification produces separate views over it.
#[derive(Debug, Clone, Default)]
pub struct RegionCollection {
    features: Vec<RegionFeature>,
    positions: HashMap<RegionId, usize>,
}

impl RegionCollection {
    /// Later duplicates of an id shadow earlier ones in `position` lookups.
    pub fn new(features: Vec<RegionFeature>) -> Self {
        let positions = features
            .iter()
            .enumerate()
            .map(|(idx, f)| (f.id.clone(), idx))
            .collect();
        Self {
            features,
            positions,
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn features(&self) -> &[RegionFeature] {
        &self.features
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegionFeature> + '_ {
        self.features.iter()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn get(&self, id: &str) -> Option<&RegionFeature> {
        self.position(id).and_then(|idx| self.features.get(idx))
    }
}

impl PartialEq for RegionCollection {
    fn eq(&self, other: &Self) -> bool {
        self.features == other.features
    }
}
