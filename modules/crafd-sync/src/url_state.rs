//! The filter channel and the modal channel, multiplexed onto one query string.
//!
//! `UrlState` keeps every pair exactly as it arrived (still percent-encoded), so a
//! write to one channel can leave every byte of the other channel untouched.

use serde::{Deserialize, Serialize};

use crafd_common::{SortDirection, SortField};

pub const DONORS_KEY: &str = "d";
pub const TYPES_KEY: &str = "t";
pub const THEMES_KEY: &str = "th";
pub const SEARCH_KEY: &str = "q";
pub const SORT_BY_KEY: &str = "sb";
pub const SORT_DIRECTION_KEY: &str = "sd";

pub const ORGANIZATION_KEY: &str = "org";
pub const PROJECT_KEY: &str = "asset";
pub const DONOR_KEY: &str = "donor";

/// Compact key → legacy long-form key. Legacy keys are read, never written.
const FILTER_KEYS: &[(&str, &str)] = &[
    (DONORS_KEY, "donors"),
    (TYPES_KEY, "types"),
    (THEMES_KEY, "themes"),
    (SEARCH_KEY, "search"),
    (SORT_BY_KEY, "sortBy"),
    (SORT_DIRECTION_KEY, "sortDirection"),
];

const MODAL_KEYS: &[&str] = &[ORGANIZATION_KEY, PROJECT_KEY, DONOR_KEY];

const LIST_SEPARATOR: char = ',';

/// Facet values as they appear in the URL: slugs for donors and types, compact
/// keys for themes. Not yet resolved against any data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub donors: Vec<String>,
    pub types: Vec<String>,
    pub themes: Vec<String>,
    pub search: Option<String>,
    pub sort_by: SortField,
    pub sort_direction: SortDirection,
}

impl FilterState {
    pub fn search_text(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Canonical encoded pairs: compact keys in fixed order, empty lists and
    /// default sort values omitted.
    fn to_pairs(&self) -> Vec<RawPair> {
        let mut pairs = Vec::new();
        for (key, values) in [
            (DONORS_KEY, &self.donors),
            (TYPES_KEY, &self.types),
            (THEMES_KEY, &self.themes),
        ] {
            if !values.is_empty() {
                pairs.push(RawPair::new(key, encode_list(values)));
            }
        }
        if let Some(search) = self.search_text() {
            pairs.push(RawPair::new(SEARCH_KEY, urlencoding::encode(search).into_owned()));
        }
        if self.sort_by != SortField::default() {
            pairs.push(RawPair::new(SORT_BY_KEY, self.sort_by.as_str().to_string()));
        }
        if self.sort_direction != SortDirection::default() {
            pairs.push(RawPair::new(
                SORT_DIRECTION_KEY,
                self.sort_direction.as_str().to_string(),
            ));
        }
        pairs
    }
}

/// Which detail overlay is open. At most one at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModalState {
    #[default]
    Closed,
    Organization(String),
    Project(String),
    Donor(String),
}

impl ModalState {
    fn pair(&self) -> Option<RawPair> {
        let (key, value) = match self {
            ModalState::Closed => return None,
            ModalState::Organization(k) => (ORGANIZATION_KEY, k),
            ModalState::Project(k) => (PROJECT_KEY, k),
            ModalState::Donor(k) => (DONOR_KEY, k),
        };
        Some(RawPair::new(key, urlencoding::encode(value).into_owned()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RawPair {
    key: String,
    /// `None` for a bare `key` with no `=`.
    value: Option<String>,
}

impl RawPair {
    fn new(key: &str, value: String) -> Self {
        Self {
            key: key.to_string(),
            value: Some(value),
        }
    }

    fn is_filter(&self) -> bool {
        FILTER_KEYS
            .iter()
            .any(|(compact, legacy)| self.key == *compact || self.key == *legacy)
    }

    fn is_modal(&self) -> bool {
        MODAL_KEYS.contains(&self.key.as_str())
    }

    fn render(&self) -> String {
        match &self.value {
            Some(v) => format!("{}={}", self.key, v),
            None => self.key.clone(),
        }
    }
}

/// A parsed query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlState {
    pairs: Vec<RawPair>,
}

impl UrlState {
    /// Parse a query string, with or without the leading `?`. Never fails.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let pairs = query
            .split('&')
            .filter(|p| !p.is_empty())
            .map(|p| match p.split_once('=') {
                Some((k, v)) => RawPair {
                    key: k.to_string(),
                    value: Some(v.to_string()),
                },
                None => RawPair {
                    key: p.to_string(),
                    value: None,
                },
            })
            .collect();
        Self { pairs }
    }

    /// Serialize pairs in stored order, without a leading `?`.
    pub fn to_query(&self) -> String {
        self.pairs
            .iter()
            .map(RawPair::render)
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Filter-channel pairs exactly as stored, compact and legacy keys alike.
    pub fn filter_pairs(&self) -> Vec<(&str, Option<&str>)> {
        self.pairs
            .iter()
            .filter(|p| p.is_filter())
            .map(|p| (p.key.as_str(), p.value.as_deref()))
            .collect()
    }

    /// Decoded value of the first pair named `key`.
    pub fn get(&self, key: &str) -> Option<String> {
        self.raw(key).map(decode)
    }

    pub fn filter(&self) -> FilterState {
        FilterState {
            donors: self.list(DONORS_KEY),
            types: self.list(TYPES_KEY),
            themes: self.list(THEMES_KEY),
            search: self
                .filter_raw(SEARCH_KEY)
                .map(decode)
                .filter(|s| !s.trim().is_empty()),
            sort_by: self
                .filter_raw(SORT_BY_KEY)
                .and_then(|v| SortField::parse(&decode(v)))
                .unwrap_or_default(),
            sort_direction: self
                .filter_raw(SORT_DIRECTION_KEY)
                .and_then(|v| SortDirection::parse(&decode(v)))
                .unwrap_or_default(),
        }
    }

    /// The open detail overlay. Should several modal keys be present, the first of
    /// `org`, `asset`, `donor` wins.
    pub fn modal(&self) -> ModalState {
        let value = |key: &str| self.get(key).filter(|v| !v.trim().is_empty());
        if let Some(k) = value(ORGANIZATION_KEY) {
            ModalState::Organization(k)
        } else if let Some(k) = value(PROJECT_KEY) {
            ModalState::Project(k)
        } else if let Some(k) = value(DONOR_KEY) {
            ModalState::Donor(k)
        } else {
            ModalState::Closed
        }
    }

    /// Replace the modal channel. Every other pair keeps its bytes and position;
    /// opening one overlay clears the other two.
    pub fn with_modal(&self, modal: &ModalState) -> Self {
        let first_modal = self.pairs.iter().position(RawPair::is_modal);
        let mut pairs: Vec<RawPair> = self.pairs.iter().filter(|p| !p.is_modal()).cloned().collect();
        if let Some(pair) = modal.pair() {
            let at = first_modal.unwrap_or_else(|| {
                pairs
                    .iter()
                    .rposition(RawPair::is_filter)
                    .map(|i| i + 1)
                    .unwrap_or(0)
            });
            pairs.insert(at.min(pairs.len()), pair);
        }
        Self { pairs }
    }

    /// Replace the filter channel with its canonical encoding. Legacy keys are
    /// dropped; modal and unrecognized pairs are carried over unchanged.
    pub fn with_filter(&self, filter: &FilterState) -> Self {
        let mut pairs = filter.to_pairs();
        pairs.extend(self.pairs.iter().filter(|p| p.is_modal()).cloned());
        pairs.extend(
            self.pairs
                .iter()
                .filter(|p| !p.is_modal() && !p.is_filter())
                .cloned(),
        );
        Self { pairs }
    }

    fn raw(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.value.as_deref().unwrap_or(""))
    }

    /// Raw value of a filter key, falling back to its legacy name.
    fn filter_raw(&self, compact: &str) -> Option<&str> {
        self.raw(compact).or_else(|| {
            FILTER_KEYS
                .iter()
                .find(|(c, _)| *c == compact)
                .and_then(|(_, legacy)| self.raw(legacy))
        })
    }

    fn list(&self, compact: &str) -> Vec<String> {
        let Some(raw) = self.filter_raw(compact) else {
            return Vec::new();
        };
        let mut values: Vec<String> = Vec::new();
        for value in raw.split(LIST_SEPARATOR).map(decode) {
            let value = value.trim();
            if !value.is_empty() && !values.iter().any(|v| v == value) {
                values.push(value.to_string());
            }
        }
        values
    }
}

fn encode_list(values: &[String]) -> String {
    values
        .iter()
        .map(|v| urlencoding::encode(v).into_owned())
        .collect::<Vec<_>>()
        .join(",")
}

/// Percent-decode, treating `+` as a space. Invalid UTF-8 falls back to the raw text.
fn decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    let decoded = urlencoding::decode(&spaced).map(|s| s.into_owned());
    decoded.unwrap_or(spaced)
}
