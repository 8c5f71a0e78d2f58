//! URL facet values → an effective `FacetSelection`.

use tracing::warn;

use crafd_common::FacetSelection;
use crafd_engine::slug::{donor_macro, ALL_DONORS_SLUG};
use crafd_engine::{expand_donor_slugs, to_slug, FacetUniverse};

use crate::url_state::FilterState;

/// Facet values the universe could not resolve. They are left out of the
/// selection and removed from the URL on the next filter write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dropped {
    pub donors: Vec<String>,
    pub types: Vec<String>,
    pub themes: Vec<String>,
}

impl Dropped {
    pub fn is_empty(&self) -> bool {
        self.donors.is_empty() && self.types.is_empty() && self.themes.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolved {
    pub selection: FacetSelection,
    /// The filter with dangling values removed and plain donor tokens slugged. `all`
    /// and composite donor slugs are kept as written as long as they still select
    /// something.
    pub canonical: FilterState,
    pub dropped: Dropped,
}

pub fn resolve(filter: &FilterState, universe: &FacetUniverse) -> Resolved {
    let mut out = Resolved {
        canonical: FilterState {
            search: filter.search_text().map(str::to_string),
            sort_by: filter.sort_by,
            sort_direction: filter.sort_direction,
            ..Default::default()
        },
        ..Default::default()
    };
    let mut donors: Vec<String> = Vec::new();
    let mut types: Vec<String> = Vec::new();
    let mut themes: Vec<String> = Vec::new();

    for token in &filter.donors {
        let names: Vec<&str> = expand_donor_slugs(std::slice::from_ref(token), &universe.donors)
            .iter()
            .filter_map(|slug| universe.resolve_donor(slug))
            .collect();
        if names.is_empty() {
            out.dropped.donors.push(token.clone());
            continue;
        }
        names.into_iter().for_each(|n| push_unique(&mut donors, n));
        if to_slug(token) == ALL_DONORS_SLUG || donor_macro(token).is_some() {
            push_unique(&mut out.canonical.donors, token);
        } else {
            push_unique(&mut out.canonical.donors, &to_slug(token));
        }
    }

    for slug in &filter.types {
        match universe.resolve_type(slug) {
            Some(name) => {
                push_unique(&mut types, name);
                push_unique(&mut out.canonical.types, &to_slug(name));
            }
            None => out.dropped.types.push(slug.clone()),
        }
    }

    for key in &filter.themes {
        match universe.resolve_theme(key) {
            Some(theme) => {
                push_unique(&mut themes, &theme.name);
                push_unique(&mut out.canonical.themes, &theme.key);
            }
            None => out.dropped.themes.push(key.clone()),
        }
    }

    if !out.dropped.is_empty() {
        warn!(
            donors = ?out.dropped.donors,
            types = ?out.dropped.types,
            themes = ?out.dropped.themes,
            "Dropping unresolvable facet values"
        );
    }

    let mut selection = FacetSelection::new()
        .with_donors(donors)
        .with_types(types)
        .with_themes(themes);
    if let Some(search) = &out.canonical.search {
        selection = selection.with_search(search.clone());
    }
    out.selection = selection;
    out
}

fn push_unique(values: &mut Vec<String>, value: &str) {
    if !values.iter().any(|v| v == value) {
        values.push(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crafd_engine::ThemeEntry;

    fn universe() -> FacetUniverse {
        FacetUniverse {
            donors: vec!["Canada".into(), "Germany".into(), "USA".into()],
            investment_types: vec!["Data Sets".into()],
            themes: vec![ThemeEntry {
                name: "Early Warning Systems".into(),
                key: "EWS".into(),
                investment_type: None,
                description: None,
            }],
        }
    }

    #[test]
    fn slugs_resolve_to_display_values() {
        let filter = FilterState {
            donors: vec!["germany".into()],
            types: vec!["DATA-SETS".into()],
            themes: vec!["ews".into()],
            search: Some("  flood ".into()),
            ..Default::default()
        };
        let r = resolve(&filter, &universe());
        assert_eq!(r.selection.donors, vec!["Germany"]);
        assert_eq!(r.selection.investment_types, vec!["Data Sets"]);
        assert_eq!(r.selection.investment_themes, vec!["Early Warning Systems"]);
        assert_eq!(r.selection.search_text(), Some("flood"));
        assert_eq!(r.canonical.types, vec!["data-sets"]);
        assert_eq!(r.canonical.themes, vec!["EWS"]);
        assert!(r.dropped.is_empty());
    }

    #[test]
    fn unknown_values_are_dropped_not_errors() {
        let filter = FilterState {
            donors: vec!["atlantis".into(), "canada".into()],
            themes: vec!["gone".into()],
            ..Default::default()
        };
        let r = resolve(&filter, &universe());
        assert_eq!(r.selection.donors, vec!["Canada"]);
        assert_eq!(r.canonical.donors, vec!["canada"]);
        assert_eq!(r.dropped.donors, vec!["atlantis"]);
        assert_eq!(r.dropped.themes, vec!["gone"]);
        assert!(r.selection.investment_themes.is_empty());
    }

    #[test]
    fn all_selects_every_donor_and_stays_in_the_url() {
        let filter = FilterState {
            donors: vec!["all".into()],
            ..Default::default()
        };
        let r = resolve(&filter, &universe());
        assert_eq!(r.selection.donors, vec!["Canada", "Germany", "USA"]);
        assert_eq!(r.canonical.donors, vec!["all"]);
    }

    #[test]
    fn plain_donor_tokens_are_written_back_as_slugs() {
        let filter = FilterState {
            donors: vec!["GERMANY".into(), "Crafd Donors".into(), "germany".into()],
            ..Default::default()
        };
        let r = resolve(&filter, &universe());
        assert_eq!(r.selection.donors, vec!["Germany", "USA"]);
        assert_eq!(r.canonical.donors, vec!["germany", "Crafd Donors"]);
    }

    #[test]
    fn composite_slug_keeps_only_known_members() {
        let filter = FilterState {
            donors: vec!["crafd-donors".into()],
            ..Default::default()
        };
        let r = resolve(&filter, &universe());
        assert_eq!(r.selection.donors, vec!["Germany", "USA"]);
        assert!(r.dropped.donors.is_empty());
    }
}
