//! Per-organization visibility under a facet selection.
//!
//! Evaluation order for one organization:
//!
//! 1. Donor gate. Every selected donor must be in the org-level donor set, or the
//!    org survives only through projects whose own donor set holds every selected
//!    donor. Failing both hides the organization and all its projects.
//! 2. Search match at organization granularity (name, type) and project
//!    granularity (name, description, parent organization name).
//! 3. Visible projects: when the organization matches the search (or there is no
//!    search) every donor-surviving project is a candidate and only the type/theme
//!    facets narrow it; otherwise each project must match search, type, and theme.
//! 4. The organization is shown when no search and no project facet is active, or
//!    the search matched it, or at least one project is still visible.
//!
//! Investment types match by case-insensitive substring in either direction, which
//! absorbs label drift between the sources feeding the dataset. Themes match
//! case-insensitively after trimming, but exactly.

use crafd_common::{FacetSelection, Organization, Project};

/// Outcome of the donor gate for one organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DonorGate<'a> {
    /// Org-level donors cover the selection; every project passes through.
    Organization,
    /// Only these projects carry every selected donor themselves.
    Projects(Vec<&'a Project>),
    /// Neither the organization nor any project matches.
    Closed,
}

pub fn donor_gate<'a>(org: &'a Organization, donors: &[String]) -> DonorGate<'a> {
    if donors.iter().all(|d| org.has_donor(d)) {
        return DonorGate::Organization;
    }
    let matching: Vec<&Project> = org
        .projects
        .iter()
        .filter(|p| donors.iter().all(|d| p.has_donor(d)))
        .collect();
    if matching.is_empty() {
        DonorGate::Closed
    } else {
        DonorGate::Projects(matching)
    }
}

/// Apply `selection` to every organization. Returns a fresh list of visible
/// organizations, each carrying only its visible projects; the input is untouched.
pub fn apply_filters(organizations: &[Organization], selection: &FacetSelection) -> Vec<Organization> {
    if selection.is_empty() {
        return organizations.to_vec();
    }
    organizations
        .iter()
        .filter_map(|org| filter_organization(org, selection))
        .collect()
}

/// The visible form of one organization, or `None` when it is hidden.
pub fn filter_organization(org: &Organization, selection: &FacetSelection) -> Option<Organization> {
    let candidates: Vec<&Project> = match donor_gate(org, &selection.donors) {
        DonorGate::Organization => org.projects.iter().collect(),
        DonorGate::Projects(projects) => projects,
        DonorGate::Closed => return None,
    };

    let query = selection.search_text().map(str::to_lowercase);
    let org_matches = query
        .as_deref()
        .is_some_and(|q| organization_matches_search(org, q));

    let visible: Vec<Project> = candidates
        .into_iter()
        .filter(|p| {
            let facets = project_matches_types(p, &selection.investment_types)
                && project_matches_themes(p, &selection.investment_themes);
            match query.as_deref() {
                Some(q) if !org_matches => facets && project_matches_search(p, org, q),
                _ => facets,
            }
        })
        .cloned()
        .collect();

    let project_facets = selection.has_types() || selection.has_themes();
    let shown = match (query.is_some(), project_facets) {
        (false, false) => true,
        (true, _) if org_matches => true,
        _ => !visible.is_empty(),
    };

    shown.then(|| org.with_projects(visible))
}

// --- Matchers ---

/// `query` must already be lowercased.
pub fn organization_matches_search(org: &Organization, query: &str) -> bool {
    org.name.to_lowercase().contains(query)
        || org
            .org_type
            .as_deref()
            .is_some_and(|t| t.to_lowercase().contains(query))
}

/// `query` must already be lowercased.
pub fn project_matches_search(project: &Project, parent: &Organization, query: &str) -> bool {
    project.name.to_lowercase().contains(query)
        || project.description.to_lowercase().contains(query)
        || parent.name.to_lowercase().contains(query)
}

/// Tolerant type match: either label contains the other, ignoring case.
pub fn type_matches(selected: &str, project_type: &str) -> bool {
    let selected = selected.trim().to_lowercase();
    let project_type = project_type.trim().to_lowercase();
    if selected.is_empty() || project_type.is_empty() {
        return false;
    }
    project_type.contains(&selected) || selected.contains(&project_type)
}

pub fn theme_matches(selected: &str, project_theme: &str) -> bool {
    let selected = selected.trim();
    !selected.is_empty() && selected.to_lowercase() == project_theme.trim().to_lowercase()
}

/// OR across selected types; an empty selection matches everything.
pub fn project_matches_types(project: &Project, types: &[String]) -> bool {
    types.is_empty()
        || types
            .iter()
            .any(|t| project.investment_types.iter().any(|pt| type_matches(t, pt)))
}

/// OR across selected themes; an empty selection matches everything.
pub fn project_matches_themes(project: &Project, themes: &[String]) -> bool {
    themes.is_empty()
        || themes
            .iter()
            .any(|t| project.investment_themes.iter().any(|pt| theme_matches(t, pt)))
}
