use std::fmt;

/// Ordinal prevailing-wage level. `Option<WageLevel>` models "no level";
/// `None < Some(_)` keeps the ordering usable for monotonicity checks.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WageLevel {
    I = 1,
    II = 2,
    III = 3,
    IV = 4,
}

impl WageLevel {
    /// Ascending order.
    pub const ALL: [WageLevel; 4] = [WageLevel::I, WageLevel::II, WageLevel::III, WageLevel::IV];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(WageLevel::I),
            2 => Some(WageLevel::II),
            3 => Some(WageLevel::III),
            4 => Some(WageLevel::IV),
            _ => None,
        }
    }

    pub fn roman(self) -> &'static str {
        match self {
            WageLevel::I => "I",
            WageLevel::II => "II",
            WageLevel::III => "III",
            WageLevel::IV => "IV",
        }
    }
}

impl fmt::Display for WageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Level {}", self.roman())
    }
}

#[cfg(test)]
mod tests {
    use super::WageLevel;

    #[test]
    fn numbers_round_trip_and_order() {
        for level in WageLevel::ALL {
            assert_eq!(WageLevel::from_number(level.number()), Some(level));
        }
        assert_eq!(WageLevel::from_number(0), None);
        assert!(None < Some(WageLevel::I));
        assert!(Some(WageLevel::III) < Some(WageLevel::IV));
        assert_eq!(WageLevel::III.to_string(), "Level III");
    }
}
