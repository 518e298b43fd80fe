use serde::{Deserialize, Serialize};

/// One occupation directory row (`soc_codes.json`).
///
/// Several leaf codes can share a `parent` table; the parent is what gets
/// fetched, the leaf is what the user picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupationEntry {
    pub code: String,
    pub title: String,
    pub parent: String,
}

impl OccupationEntry {
    /// `"15-1252 – Software Developers"`.
    pub fn display(&self) -> String {
        format!("{} – {}", self.code, self.title)
    }
}

#[derive(Debug)]
pub enum OccupationDirectoryError {
    Json(String),
}

impl std::fmt::Display for OccupationDirectoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OccupationDirectoryError::Json(msg) => write!(f, "invalid occupation directory: {msg}"),
        }
    }
}

impl std::error::Error for OccupationDirectoryError {}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccupationDirectory {
    entries: Vec<OccupationEntry>,
}

impl OccupationDirectory {
    pub fn parse(payload: &str) -> Result<Self, OccupationDirectoryError> {
        let entries: Vec<OccupationEntry> = serde_json::from_str(payload)
            .map_err(|e| OccupationDirectoryError::Json(e.to_string()))?;
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[OccupationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry whose leaf code matches.
    pub fn find(&self, code: &str) -> Option<&OccupationEntry> {
        let code = code.trim();
        self.entries.iter().find(|e| e.code == code)
    }

    /// Table key for a leaf code.
    pub fn parent_key(&self, code: &str) -> Option<&str> {
        self.find(code).map(|e| e.parent.as_str())
    }
}
