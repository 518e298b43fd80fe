use foundation::bounds::LngLat;
use foundation::ids::RegionId;

/// The single open popup: which region it describes and where it is pinned.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivePopup {
    pub region_id: RegionId,
    pub anchor: LngLat,
}

/// Interactive selection state driven by user events.
///
/// `salary == None` means the salary input was cleared.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub selected_state: Option<String>,
    pub selected_county_id: Option<RegionId>,
    /// Parent occupation key used to fetch the wage table.
    pub occupation_code: String,
    pub salary: Option<f64>,
    pub lottery_enabled: bool,
    pub panel_collapsed: bool,
    pub active_popup: Option<ActivePopup>,
}

impl Selection {
    pub fn new(occupation_code: impl Into<String>, salary: Option<f64>) -> Self {
        Self {
            selected_state: None,
            selected_county_id: None,
            occupation_code: occupation_code.into(),
            salary,
            lottery_enabled: false,
            panel_collapsed: false,
            active_popup: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidSalaryInput {
    pub input: String,
}

impl std::fmt::Display for InvalidSalaryInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid salary input: {:?}", self.input)
    }
}

impl std::error::Error for InvalidSalaryInput {}

/// Parses salary text as typed into a currency field.
///
/// Thousands separators and an optional leading `$` are accepted. Blank text
/// is an explicit clear and yields `Ok(None)`. Anything that is not a finite,
/// non-negative number is rejected.
pub fn parse_salary(raw: &str) -> Result<Option<f64>, InvalidSalaryInput> {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    let cleaned = cleaned.trim();
    let cleaned = cleaned.strip_prefix('$').unwrap_or(cleaned).trim_start();
    if cleaned.is_empty() {
        return Ok(None);
    }

    let invalid = || InvalidSalaryInput {
        input: raw.to_string(),
    };
    let value: f64 = cleaned.parse().map_err(|_| invalid())?;
    if !value.is_finite() || value < 0.0 {
        return Err(invalid());
    }
    Ok(Some(value))
}
