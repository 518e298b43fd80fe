use std::collections::BTreeMap;

use scene::{LevelThresholds, WageThresholdTable, region_key};
use serde::Deserialize;

/// On-disk shape of one table entry: `{"I": 40.1, "II": 55.0, ...}`.
/// Missing or `null` levels stay undefined.
#[derive(Debug, Default, Deserialize)]
struct RawThresholds {
    #[serde(rename = "I", default)]
    i: Option<f64>,
    #[serde(rename = "II", default)]
    ii: Option<f64>,
    #[serde(rename = "III", default)]
    iii: Option<f64>,
    #[serde(rename = "IV", default)]
    iv: Option<f64>,
}

impl From<RawThresholds> for LevelThresholds {
    fn from(raw: RawThresholds) -> Self {
        LevelThresholds::new(raw.i, raw.ii, raw.iii, raw.iv)
    }
}

#[derive(Debug)]
pub enum WageTableError {
    Json(String),
}

impl std::fmt::Display for WageTableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WageTableError::Json(msg) => write!(f, "invalid wage table: {msg}"),
        }
    }
}

impl std::error::Error for WageTableError {}

/// Parses a per-occupation wage table keyed by `"<ST>|<normalized name>"`.
///
/// Keys are rebuilt through [`region_key`] so a table written with
/// `"CA|Los Angeles County"` still matches lookups. Keys without a `|` are
/// kept as they are.
pub fn parse_wage_table(payload: &str) -> Result<WageThresholdTable, WageTableError> {
    let raw: BTreeMap<String, RawThresholds> =
        serde_json::from_str(payload).map_err(|e| WageTableError::Json(e.to_string()))?;
    Ok(raw
        .into_iter()
        .map(|(k, v)| (normalize_table_key(&k), LevelThresholds::from(v)))
        .collect())
}

fn normalize_table_key(key: &str) -> String {
    match key.split_once('|') {
        Some((state, name)) => region_key(state, name).as_str().to_string(),
        None => key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use scene::{LevelThresholds, RegionFeature, WageLevel};

    use super::parse_wage_table;

    #[test]
    fn parses_sparse_entries() {
        let t = parse_wage_table(
            r#"{
              "CA|los angeles": {"I": 40, "II": 55, "III": 70, "IV": 90},
              "CA|alpine": {"II": 31.5, "IV": null},
              "CA|empty": {}
            }"#,
        )
        .expect("parse");

        assert_eq!(t.len(), 3);
        assert_eq!(
            t.get("CA|los angeles"),
            Some(&LevelThresholds::new(
                Some(40.0),
                Some(55.0),
                Some(70.0),
                Some(90.0)
            ))
        );
        let alpine = t.get("CA|alpine").expect("alpine");
        assert_eq!(alpine.get(WageLevel::II), Some(31.5));
        assert_eq!(alpine.get(WageLevel::IV), None);
        assert!(t.get("CA|empty").expect("empty").is_empty());
    }

    #[test]
    fn keys_are_normalized_like_lookups() {
        let t = parse_wage_table(
            r#"{
              "CA|Los Angeles  County": {"I": 40, "II": 55, "III": 70, "IV": 90},
              " ca |  SAN   Diego ": {"I": 38}
            }"#,
        )
        .expect("parse");

        let la = RegionFeature::new("06037", "06", "Los Angeles", None);
        let key = la.region_key().expect("mapped");
        assert_eq!(key.as_str(), "CA|los angeles");
        assert_eq!(
            t.get_region(&key).and_then(|e| e.get(WageLevel::III)),
            Some(70.0)
        );
        assert_eq!(t.get("CA|san diego").and_then(|e| e.i), Some(38.0));
        assert_eq!(t.get("CA|Los Angeles  County"), None);
    }

    #[test]
    fn rejects_non_object_payloads() {
        assert!(parse_wage_table("[]").is_err());
        assert!(parse_wage_table(r#"{"CA|x": {"I": "forty"}}"#).is_err());
    }
}
