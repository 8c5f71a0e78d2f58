use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

/// One row of the theme table: a theme, its compact URL key, description,
/// and the investment type it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeRecord {
    #[serde(alias = "Investment Themes [Text Key]")]
    pub theme_name: String,
    #[serde(default, deserialize_with = "first_string")]
    pub theme_key: Option<String>,
    #[serde(default, alias = "theme_description", deserialize_with = "first_string")]
    pub description: Option<String>,
    /// A theme linked to several types belongs to the first one.
    #[serde(default, alias = "Investment Type", deserialize_with = "first_string")]
    pub investment_type: Option<String>,
}

/// Accepts a string, a list of strings (first non-blank wins), or null.
fn first_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let found = match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Array(items) => items.into_iter().find_map(|v| match v {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
            _ => None,
        }),
        _ => None,
    };
    Ok(found
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

/// Theme name → (type, description, key) lookups.
///
/// Missing entries degrade: a theme without a row has no type, no description,
/// and no compact key.
#[derive(Debug, Clone, Default)]
pub struct ThemeMapping {
    records: Vec<ThemeRecord>,
    by_name: HashMap<String, usize>,
    by_key: HashMap<String, usize>,
}

impl ThemeMapping {
    pub fn from_records(records: Vec<ThemeRecord>) -> Self {
        let mut mapping = Self::default();
        for mut record in records {
            record.theme_name = record.theme_name.trim().to_string();
            if record.theme_name.is_empty() {
                continue;
            }
            let name_key = record.theme_name.to_lowercase();
            if mapping.by_name.contains_key(&name_key) {
                continue;
            }
            let idx = mapping.records.len();
            if let Some(key) = &record.theme_key {
                mapping.by_key.entry(key.to_lowercase()).or_insert(idx);
            }
            mapping.by_name.insert(name_key, idx);
            mapping.records.push(record);
        }
        mapping
    }

    /// Parse the theme table from a JSON array.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let records: Vec<ThemeRecord> = serde_json::from_str(json)?;
        Ok(Self::from_records(records))
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[ThemeRecord] {
        &self.records
    }

    fn record(&self, theme: &str) -> Option<&ThemeRecord> {
        self.by_name
            .get(&theme.trim().to_lowercase())
            .map(|&i| &self.records[i])
    }

    pub fn type_for(&self, theme: &str) -> Option<&str> {
        self.record(theme).and_then(|r| r.investment_type.as_deref())
    }

    pub fn description_for(&self, theme: &str) -> Option<&str> {
        self.record(theme).and_then(|r| r.description.as_deref())
    }

    pub fn key_for(&self, theme: &str) -> Option<&str> {
        self.record(theme).and_then(|r| r.theme_key.as_deref())
    }

    /// Resolve a compact key back to the theme name (case-insensitive).
    pub fn theme_for_key(&self, key: &str) -> Option<&str> {
        self.by_key
            .get(&key.trim().to_lowercase())
            .map(|&i| self.records[i].theme_name.as_str())
    }

    /// Investment types that own at least one theme, in table order.
    pub fn investment_types(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for t in self.records.iter().filter_map(|r| r.investment_type.as_deref()) {
            if !out.contains(&t) {
                out.push(t);
            }
        }
        out
    }
}
