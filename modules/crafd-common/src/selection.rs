use serde::{Deserialize, Serialize};

/// The filter input: facet values already resolved from slugs to display values.
///
/// Donors use AND semantics, investment types and themes use OR semantics.
/// Never mutated in place; the builder methods return a new value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetSelection {
    pub search: Option<String>,
    pub donors: Vec<String>,
    pub investment_types: Vec<String>,
    pub investment_themes: Vec<String>,
}

impl FacetSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_donors<I, S>(mut self, donors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.donors = donors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.investment_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_themes<I, S>(mut self, themes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.investment_themes = themes.into_iter().map(Into::into).collect();
        self
    }

    /// Trimmed search text, or `None` when search is inactive.
    pub fn search_text(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn has_search(&self) -> bool {
        self.search_text().is_some()
    }

    pub fn has_donors(&self) -> bool {
        !self.donors.is_empty()
    }

    pub fn has_types(&self) -> bool {
        !self.investment_types.is_empty()
    }

    pub fn has_themes(&self) -> bool {
        !self.investment_themes.is_empty()
    }

    /// True when no facet of any kind is selected.
    pub fn is_empty(&self) -> bool {
        !self.has_search() && !self.has_donors() && !self.has_types() && !self.has_themes()
    }

    pub fn without_donors(&self) -> Self {
        Self {
            donors: Vec::new(),
            ..self.clone()
        }
    }

    pub fn without_types(&self) -> Self {
        Self {
            investment_types: Vec::new(),
            ..self.clone()
        }
    }

    pub fn without_themes(&self) -> Self {
        Self {
            investment_themes: Vec::new(),
            ..self.clone()
        }
    }
}

// --- Sorting ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Name,
    Donors,
    Assets,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::Donors => "donors",
            SortField::Assets => "assets",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "name" => Some(SortField::Name),
            "donors" => Some(SortField::Donors),
            "assets" => Some(SortField::Assets),
            _ => None,
        }
    }
}

impl std::fmt::Display for SortField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
