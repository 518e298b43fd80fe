use std::fmt;

/// `"<state abbrev>|<normalized name>"`, the wage-table lookup key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegionKey(String);

impl RegionKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Region name normalization shared by table building and lookup.
///
/// Lowercases, collapses whitespace runs to one space, trims, then drops a
/// trailing `county` token. Both sides of a lookup must go through this.
pub fn normalize_name(name: &str) -> String {
    let collapsed = name
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    match collapsed.strip_suffix(" county") {
        Some(stripped) => stripped.to_string(),
        None => collapsed,
    }
}

pub fn region_key(state_abbrev: &str, name: &str) -> RegionKey {
    RegionKey(format!(
        "{}|{}",
        state_abbrev.trim().to_uppercase(),
        normalize_name(name)
    ))
}

#[cfg(test)]
mod tests {
    use super::{normalize_name, region_key};

    #[test]
    fn county_suffix_is_case_and_spacing_insensitive() {
        let a = normalize_name("Los Angeles County");
        let b = normalize_name("LOS ANGELES  county");
        let c = normalize_name("los angeles");
        let d = normalize_name("  Los\tAngeles   COUNTY ");
        assert_eq!(a, "los angeles");
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a, d);
    }

    #[test]
    fn table_side_and_lookup_side_keys_match() {
        // Table builders key by the full published name, lookups append " County".
        let built = region_key("ca", "Los Angeles County");
        let looked_up = region_key("CA", &format!("{} County", "Los Angeles"));
        assert_eq!(built, looked_up);
        assert_eq!(built.as_str(), "CA|los angeles");
    }

    #[test]
    fn only_trailing_county_token_is_stripped() {
        assert_eq!(normalize_name("County Line"), "county line");
        assert_eq!(normalize_name("Countyville County"), "countyville");
        assert_eq!(normalize_name("County"), "county");
    }
}
