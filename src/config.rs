// Engine Configuration
//
// Knobs that change query semantics or output size. Loaded from JSON by the
// CLI, built in code everywhere else.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Configuration shared by every query the engine runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Whether LIKE distinguishes upper and lower case
    pub like_case_sensitive: bool,
    /// Whether NULLs sort before other values in ascending order
    pub nulls_first: bool,
    /// Hard cap on the number of rows a query returns, applied after LIMIT
    pub max_result_rows: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            like_case_sensitive: true,
            nulls_first: true,
            max_result_rows: None,
        }
    }
}

impl EngineConfig {
    pub fn with_like_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.like_case_sensitive = case_sensitive;
        self
    }

    pub fn with_nulls_first(mut self, nulls_first: bool) -> Self {
        self.nulls_first = nulls_first;
        self
    }

    pub fn with_max_result_rows(mut self, max_rows: Option<usize>) -> Self {
        self.max_result_rows = max_rows;
        self
    }

    /// Read a configuration from a JSON file; missing fields keep defaults
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
