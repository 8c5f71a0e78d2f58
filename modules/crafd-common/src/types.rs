use serde::{Deserialize, Serialize};

pub const UNNAMED_ORGANIZATION: &str = "Unnamed Organization";
pub const UNNAMED_PROJECT: &str = "Unnamed Project";

// --- Funding ---

/// A funding agency (ministry, development bank, ...) of a donor country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agency {
    pub id: String,
    pub name: String,
    pub country: Option<String>,
    pub website: Option<String>,
}

// --- Projects ---

/// A data asset operated by an organization.
///
/// `donor_countries` holds only the countries attributed to this project through its
/// own agency records. It is never filled in from the owning organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    /// Stable external key (`product_key`), when the source has one.
    pub key: Option<String>,
    pub name: String,
    pub description: String,
    pub website: Option<String>,
    pub investment_types: Vec<String>,
    pub investment_themes: Vec<String>,
    pub donor_countries: Vec<String>,
    pub agencies: Vec<Agency>,
    pub provider: Option<String>,
    /// Back-reference to the owning organization by id.
    pub organization_id: String,
}

impl Project {
    /// The `(id, name)` pair that identifies one physical asset across organizations.
    pub fn dedup_key(&self) -> (&str, &str) {
        (&self.id, &self.name)
    }

    pub fn has_donor(&self, country: &str) -> bool {
        self.donor_countries.iter().any(|c| c == country)
    }
}

// --- Organizations ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub short_name: Option<String>,
    pub org_type: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub hq_country: Option<String>,
    /// Org-level funding countries. No duplicates, source order.
    pub donor_countries: Vec<String>,
    pub agencies: Vec<Agency>,
    pub projects: Vec<Project>,
    pub project_count: usize,
}

impl Organization {
    pub fn has_donor(&self, country: &str) -> bool {
        self.donor_countries.iter().any(|c| c == country)
    }

    /// The string an external key (slug) is derived from: short name if present, else name.
    pub fn key_source(&self) -> &str {
        self.short_name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.name)
    }

    /// Org-level donors followed by any project-level donors not already present.
    pub fn all_donor_countries(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.donor_countries.iter().map(String::as_str).collect();
        for project in &self.projects {
            for country in &project.donor_countries {
                if !out.contains(&country.as_str()) {
                    out.push(country);
                }
            }
        }
        out
    }

    /// Copy of this organization carrying only `projects`, with the count recomputed.
    pub fn with_projects(&self, projects: Vec<Project>) -> Self {
        Self {
            project_count: projects.len(),
            projects,
            ..self.clone()
        }
    }
}

// --- Graph ---

/// The normalized organization → project graph. Built once per raw-data load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityGraph {
    pub organizations: Vec<Organization>,
}

impl EntityGraph {
    /// Project entries across organizations, before any cross-organization dedup.
    pub fn project_count(&self) -> usize {
        self.organizations.iter().map(|o| o.projects.len()).sum()
    }
}
