use serde::{Deserialize, Serialize};

use crafd_common::{Organization, ThemeMapping};

use crate::slug::{from_slug, to_slug};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeEntry {
    pub name: String,
    /// Compact URL key: the table's key, or the name's slug when the table has none.
    pub key: String,
    pub investment_type: Option<String>,
    pub description: Option<String>,
}

/// Every value each facet can currently take, sorted so slug resolution is
/// deterministic across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetUniverse {
    pub donors: Vec<String>,
    pub investment_types: Vec<String>,
    pub themes: Vec<ThemeEntry>,
}

impl FacetUniverse {
    /// Collect facet values from the unfiltered organizations and the theme table.
    ///
    /// Member states are added as donor candidates only when `include_member_states`
    /// is set, whether or not they fund anything.
    pub fn build(
        organizations: &[Organization],
        themes: &ThemeMapping,
        member_states: &[String],
        include_member_states: bool,
    ) -> Self {
        let mut donors: Vec<String> = Vec::new();
        let mut types: Vec<String> = Vec::new();
        let mut theme_names: Vec<String> = Vec::new();

        for org in organizations {
            for donor in org.all_donor_countries() {
                push_unique(&mut donors, donor);
            }
            for project in &org.projects {
                for t in &project.investment_types {
                    push_unique(&mut types, t);
                }
                for theme in &project.investment_themes {
                    push_unique(&mut theme_names, theme);
                }
            }
        }
        if include_member_states {
            for member in member_states {
                push_unique(&mut donors, member);
            }
        }
        for t in themes.investment_types() {
            push_unique(&mut types, t);
        }
        for record in themes.records() {
            push_unique(&mut theme_names, &record.theme_name);
        }

        donors.sort();
        types.sort();
        theme_names.sort();

        let entries = theme_names
            .into_iter()
            .map(|name| ThemeEntry {
                key: themes
                    .key_for(&name)
                    .map(str::to_string)
                    .unwrap_or_else(|| to_slug(&name)),
                investment_type: themes.type_for(&name).map(str::to_string),
                description: themes.description_for(&name).map(str::to_string),
                name,
            })
            .collect();

        Self {
            donors,
            investment_types: types,
            themes: entries,
        }
    }

    pub fn resolve_donor(&self, slug: &str) -> Option<&str> {
        from_slug(slug, self.donors.iter().map(String::as_str))
    }

    pub fn resolve_type(&self, slug: &str) -> Option<&str> {
        from_slug(slug, self.investment_types.iter().map(String::as_str))
    }

    /// Theme by compact key (case-insensitive), falling back to the name's slug.
    pub fn resolve_theme(&self, key: &str) -> Option<&ThemeEntry> {
        let wanted = key.trim();
        if wanted.is_empty() {
            return None;
        }
        self.themes
            .iter()
            .find(|t| t.key.eq_ignore_ascii_case(wanted))
            .or_else(|| {
                let name = from_slug(wanted, self.themes.iter().map(|t| t.name.as_str()))?;
                self.themes.iter().find(|t| t.name == name)
            })
    }
}

fn push_unique(values: &mut Vec<String>, value: &str) {
    let value = value.trim();
    if !value.is_empty() && !values.iter().any(|v| v == value) {
        values.push(value.to_string());
    }
}
