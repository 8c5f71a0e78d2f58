//! Dashboard statistics and chart aggregates over a filtered graph.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crafd_common::{FacetSelection, Organization, Project};

use crate::filter::{apply_filters, project_matches_themes, project_matches_types};
use crate::slug::to_slug;
use crate::universe::FacetUniverse;

/// How many co-financing donors the chart shows before collapsing the rest.
pub const TOP_DONOR_LIMIT: usize = 5;

/// Label used when an organization has no type.
pub const UNSPECIFIED_TYPE: &str = "Unspecified";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub donor_count: usize,
    pub organization_count: usize,
    pub project_count: usize,
}

/// One bar of a chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartCount {
    pub label: String,
    pub value: usize,
}

impl ChartCount {
    fn new(label: impl Into<String>, value: usize) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// How many results a facet value would produce, given every other facet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetCount {
    pub value: String,
    /// Slug (donors, types) or compact key (themes) used in the URL.
    pub key: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetCounts {
    /// Organizations per donor.
    pub donors: Vec<FacetCount>,
    /// Distinct projects per investment type.
    pub investment_types: Vec<FacetCount>,
    /// Distinct projects per investment theme.
    pub investment_themes: Vec<FacetCount>,
}

impl FacetCounts {
    pub fn theme_count(&self, key: &str) -> Option<usize> {
        self.investment_themes
            .iter()
            .find(|c| c.key.eq_ignore_ascii_case(key))
            .map(|c| c.count)
    }
}

/// Everything the dashboard renders for one facet selection. Read-only for consumers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub stats: DashboardStats,
    pub project_types: Vec<ChartCount>,
    pub organization_types: Vec<ChartCount>,
    pub top_donors: Vec<ChartCount>,
    pub facet_counts: FacetCounts,
    /// Visible organizations, each with only its visible projects.
    pub organizations: Vec<Organization>,
    /// The unfiltered list, for cross-references such as "who else supports this asset".
    pub all_organizations: Vec<Organization>,
}

/// Filter `all` by `selection` and compute every aggregate of the result.
pub fn aggregate(
    all: &[Organization],
    selection: &FacetSelection,
    universe: &FacetUniverse,
) -> AggregateResult {
    let visible = apply_filters(all, selection);
    AggregateResult {
        stats: compute_stats(&visible),
        project_types: project_type_counts(&visible),
        organization_types: organization_type_counts(&visible),
        top_donors: top_co_financing_donors(&visible, &selection.donors),
        facet_counts: facet_counts(all, selection, universe),
        organizations: visible,
        all_organizations: all.to_vec(),
    }
}

/// Distinct donors, organizations, and projects. A project is identified by its
/// `(id, name)` pair, so one asset listed under several organizations counts once.
pub fn compute_stats(organizations: &[Organization]) -> DashboardStats {
    let mut donors: HashSet<&str> = HashSet::new();
    let mut projects: HashSet<(&str, &str)> = HashSet::new();
    for org in organizations {
        donors.extend(org.donor_countries.iter().map(String::as_str));
        for project in &org.projects {
            donors.extend(project.donor_countries.iter().map(String::as_str));
            projects.insert(project.dedup_key());
        }
    }
    DashboardStats {
        donor_count: donors.len(),
        organization_count: organizations.len(),
        project_count: projects.len(),
    }
}

/// Distinct projects per investment type label, largest first.
pub fn project_type_counts(organizations: &[Organization]) -> Vec<ChartCount> {
    let mut buckets: Vec<(&str, HashSet<(&str, &str)>)> = Vec::new();
    for org in organizations {
        for project in &org.projects {
            for t in &project.investment_types {
                let idx = match buckets.iter().position(|(label, _)| *label == t.as_str()) {
                    Some(i) => i,
                    None => {
                        buckets.push((t.as_str(), HashSet::new()));
                        buckets.len() - 1
                    }
                };
                buckets[idx].1.insert(project.dedup_key());
            }
        }
    }
    let mut counts: Vec<ChartCount> = buckets
        .into_iter()
        .map(|(label, set)| ChartCount::new(label, set.len()))
        .collect();
    counts.sort_by(|a, b| b.value.cmp(&a.value));
    counts
}

/// Organizations per organization type, largest first.
pub fn organization_type_counts(organizations: &[Organization]) -> Vec<ChartCount> {
    let mut counts: Vec<ChartCount> = Vec::new();
    for org in organizations {
        let label = org
            .org_type
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(UNSPECIFIED_TYPE);
        match counts.iter_mut().find(|c| c.label == label) {
            Some(c) => c.value += 1,
            None => counts.push(ChartCount::new(label, 1)),
        }
    }
    counts.sort_by(|a, b| b.value.cmp(&a.value));
    counts
}

/// Donors ranked by how many distinct organizations they fund, excluding the
/// donors already selected. Ties keep first-seen order. When more donors exist
/// than fit, a trailing `+K other donors` entry with value 0 is appended; it is a
/// display placeholder, not a count.
pub fn top_co_financing_donors(organizations: &[Organization], selected: &[String]) -> Vec<ChartCount> {
    let mut counts: Vec<ChartCount> = Vec::new();
    for org in organizations {
        for donor in org.all_donor_countries() {
            if selected.iter().any(|s| s == donor) {
                continue;
            }
            match counts.iter_mut().find(|c| c.label == donor) {
                Some(c) => c.value += 1,
                None => counts.push(ChartCount::new(donor, 1)),
            }
        }
    }
    counts.sort_by(|a, b| b.value.cmp(&a.value));

    if counts.len() > TOP_DONOR_LIMIT {
        let others = counts.len() - TOP_DONOR_LIMIT;
        counts.truncate(TOP_DONOR_LIMIT);
        counts.push(ChartCount::new(format!("+{others} other donors"), 0));
    }
    counts
}

/// Per-value result counts for each facet, each conditioned on every *other*
/// facet. The graph is re-filtered with the measured facet held out, so values
/// that would become reachable by switching that facet are still counted.
pub fn facet_counts(
    all: &[Organization],
    selection: &FacetSelection,
    universe: &FacetUniverse,
) -> FacetCounts {
    let without_donors = apply_filters(all, &selection.without_donors());
    let donors = universe
        .donors
        .iter()
        .map(|donor| FacetCount {
            key: to_slug(donor),
            count: without_donors
                .iter()
                .filter(|o| o.all_donor_countries().contains(&donor.as_str()))
                .count(),
            value: donor.clone(),
        })
        .collect();

    let without_types = apply_filters(all, &selection.without_types());
    let investment_types = universe
        .investment_types
        .iter()
        .map(|t| {
            let wanted = std::slice::from_ref(t);
            FacetCount {
                key: to_slug(t),
                count: distinct_project_ids(&without_types, |p| project_matches_types(p, wanted)),
                value: t.clone(),
            }
        })
        .collect();

    let without_themes = apply_filters(all, &selection.without_themes());
    let investment_themes = universe
        .themes
        .iter()
        .map(|theme| {
            let wanted = std::slice::from_ref(&theme.name);
            FacetCount {
                key: theme.key.clone(),
                count: distinct_project_ids(&without_themes, |p| {
                    project_matches_themes(p, wanted)
                }),
                value: theme.name.clone(),
            }
        })
        .collect();

    FacetCounts {
        donors,
        investment_types,
        investment_themes,
    }
}

fn distinct_project_ids<F>(organizations: &[Organization], predicate: F) -> usize
where
    F: Fn(&Project) -> bool,
{
    organizations
        .iter()
        .flat_map(|o| o.projects.iter())
        .filter(|p| predicate(*p))
        .map(|p| p.id.as_str())
        .collect::<HashSet<_>>()
        .len()
}
