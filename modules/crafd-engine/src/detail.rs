//! Lookups behind the organization, project, and donor detail views.

use serde::{Deserialize, Serialize};

use crafd_common::{Agency, Organization, Project};

use crate::slug::to_slug;

/// What one donor country funds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonorProfile {
    pub country: String,
    /// Organizations funded at org level or through at least one project.
    pub organizations: Vec<Organization>,
    /// The country's agencies involved, deduplicated by name.
    pub agencies: Vec<Agency>,
    /// Distinct `(id, name)` projects attributed to the donor, directly or through
    /// org-level funding.
    pub project_count: usize,
}

pub fn donor_profile(organizations: &[Organization], country: &str) -> DonorProfile {
    let mut funded: Vec<Organization> = Vec::new();
    let mut agencies: Vec<Agency> = Vec::new();
    let mut projects: Vec<(&str, &str)> = Vec::new();

    for org in organizations {
        let org_level = org.has_donor(country);
        let direct: Vec<&Project> = org.projects.iter().filter(|p| p.has_donor(country)).collect();
        if !org_level && direct.is_empty() {
            continue;
        }

        let attributed: Vec<&Project> = if org_level {
            org.projects.iter().collect()
        } else {
            direct
        };
        for p in attributed {
            if !projects.contains(&p.dedup_key()) {
                projects.push(p.dedup_key());
            }
        }

        let own_agencies = org
            .agencies
            .iter()
            .chain(org.projects.iter().flat_map(|p| p.agencies.iter()))
            .filter(|a| a.country.as_deref() == Some(country));
        for agency in own_agencies {
            if !agencies.iter().any(|a| a.name == agency.name) {
                agencies.push(agency.clone());
            }
        }

        funded.push(org.clone());
    }

    DonorProfile {
        country: country.to_string(),
        organizations: funded,
        agencies,
        project_count: projects.len(),
    }
}

/// Every organization that lists the same physical asset (`(id, name)` match).
pub fn organizations_supporting_project<'a>(
    organizations: &'a [Organization],
    project: &Project,
) -> Vec<&'a Organization> {
    let key = project.dedup_key();
    organizations
        .iter()
        .filter(|o| o.projects.iter().any(|p| p.dedup_key() == key))
        .collect()
}

/// Organization by detail key: short-name slug, then name slug, then raw id.
pub fn find_organization<'a>(organizations: &'a [Organization], key: &str) -> Option<&'a Organization> {
    let slug = to_slug(key);
    organizations
        .iter()
        .find(|o| to_slug(o.key_source()) == slug)
        .or_else(|| organizations.iter().find(|o| to_slug(&o.name) == slug))
        .or_else(|| organizations.iter().find(|o| o.id == key))
}

/// Project by detail key: `product_key`, then name slug, then raw id.
pub fn find_project<'a>(organizations: &'a [Organization], key: &str) -> Option<&'a Project> {
    let slug = to_slug(key);
    let projects = || organizations.iter().flat_map(|o| o.projects.iter());
    projects()
        .find(|p| p.key.as_deref().is_some_and(|k| to_slug(k) == slug))
        .or_else(|| projects().find(|p| to_slug(&p.name) == slug))
        .or_else(|| projects().find(|p| p.id == key))
}
