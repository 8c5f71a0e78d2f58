//! Raw nested records → typed organization/project graph.
//!
//! The input is the nested document built by the ingest pipeline: organizations
//! carrying `fields`, matched `agencies`, `projects` (each with its own `agencies`)
//! and a pre-computed `donor_countries` list.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crafd_common::{
    Agency, CrafdError, EntityGraph, Organization, Project, Result, UNNAMED_ORGANIZATION,
    UNNAMED_PROJECT,
};

use crate::split::split_respecting_parentheses;

pub const UNSPECIFIED_AGENCY: &str = "Unspecified Agency";

// Source field names, in lookup precedence order.
const ORG_NAME_FIELDS: &[&str] = &["Org Full Name", "Org Short Name"];
const ORG_SHORT_NAME_FIELDS: &[&str] = &["Org Short Name"];
const ORG_TYPE_FIELDS: &[&str] = &["Org Type"];
const ORG_WEBSITE_FIELDS: &[&str] = &["Org Website"];
const ORG_DESCRIPTION_FIELDS: &[&str] = &["Org Description"];
const ORG_HQ_FIELDS: &[&str] = &["Org HQ Country"];
const PROJECT_NAME_FIELDS: &[&str] = &["Project/Product Name", "Name"];
const PROJECT_KEY_FIELDS: &[&str] = &["product_key"];
const PROJECT_DESCRIPTION_FIELDS: &[&str] = &["Project Description"];
const PROJECT_WEBSITE_FIELDS: &[&str] = &["Project Website"];
const PROJECT_TYPE_FIELDS: &[&str] = &["Investment Type(s)", "Investment Type"];
const PROJECT_THEME_FIELDS: &[&str] = &["Investment Theme(s)", "Investment Themes"];
const PROJECT_PROVIDER_FIELDS: &[&str] = &["Provider Orgs Full Name", "Provider Org", "Organization"];
const AGENCY_NAME_FIELDS: &[&str] = &["Agency/Department Name", "Agency Name", "Name"];
const AGENCY_COUNTRY_FIELDS: &[&str] = &["Country Name"];
const AGENCY_WEBSITE_FIELDS: &[&str] = &["Agency Website", "Agency Data Portal"];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawOrganization {
    id: Value,
    name: Value,
    fields: Map<String, Value>,
    agencies: Vec<Value>,
    projects: Vec<Value>,
    donor_countries: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawProject {
    id: Value,
    fields: Map<String, Value>,
    agencies: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAgency {
    id: Value,
    fields: Map<String, Value>,
}

/// Normalized graph plus what had to be dropped on the way.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub graph: EntityGraph,
    pub skipped_organizations: usize,
    pub skipped_projects: usize,
}

/// Parse and normalize a nested dataset document (a JSON array of organizations).
pub fn load_dataset(json: &str) -> Result<Normalized> {
    let document: Value = serde_json::from_str(json)?;
    match document {
        Value::Array(records) => Ok(normalize(records)),
        other => Err(CrafdError::Dataset(format!(
            "expected an array of organization records, found {}",
            json_kind(&other)
        ))),
    }
}

/// Normalize raw organization records. Never fails: unidentifiable records are
/// skipped, unnamed ones get a placeholder.
pub fn normalize(records: Vec<Value>) -> Normalized {
    let start = std::time::Instant::now();
    let mut out = Normalized::default();

    for record in records {
        let raw: RawOrganization = match serde_json::from_value(record) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Skipping malformed organization record");
                out.skipped_organizations += 1;
                continue;
            }
        };
        let Some(org_id) = value_id(&raw.id) else {
            out.skipped_organizations += 1;
            continue;
        };
        let (org, skipped) = build_organization(org_id, raw);
        out.skipped_projects += skipped;
        out.graph.organizations.push(org);
    }

    info!(
        organizations = out.graph.organizations.len(),
        projects = out.graph.project_count(),
        skipped_organizations = out.skipped_organizations,
        skipped_projects = out.skipped_projects,
        elapsed_ms = start.elapsed().as_millis(),
        "Dataset normalized"
    );
    out
}

fn build_organization(id: String, raw: RawOrganization) -> (Organization, usize) {
    let name = value_text(&raw.name)
        .or_else(|| field_text(&raw.fields, ORG_NAME_FIELDS))
        .unwrap_or_else(|| UNNAMED_ORGANIZATION.to_string());

    // Org donors come pre-computed and deduplicated upstream; they are not re-derived
    // from the agency records here.
    let donor_countries = unique(value_strings(&raw.donor_countries));

    let mut projects: Vec<Project> = Vec::new();
    let mut skipped = 0;
    for value in raw.projects {
        let Ok(raw_project) = serde_json::from_value::<RawProject>(value) else {
            skipped += 1;
            continue;
        };
        let Some(project_id) = value_id(&raw_project.id) else {
            skipped += 1;
            continue;
        };
        if projects.iter().any(|p| p.id == project_id) {
            continue;
        }
        projects.push(build_project(project_id, &id, raw_project));
    }

    let org = Organization {
        short_name: field_text(&raw.fields, ORG_SHORT_NAME_FIELDS),
        org_type: field_text(&raw.fields, ORG_TYPE_FIELDS),
        website: field_text(&raw.fields, ORG_WEBSITE_FIELDS),
        description: field_text(&raw.fields, ORG_DESCRIPTION_FIELDS),
        hq_country: field_strings(&raw.fields, ORG_HQ_FIELDS).into_iter().next(),
        donor_countries,
        agencies: raw.agencies.into_iter().filter_map(build_agency).collect(),
        project_count: projects.len(),
        projects,
        id,
        name,
    };
    (org, skipped)
}

fn build_project(id: String, organization_id: &str, raw: RawProject) -> Project {
    let agencies: Vec<Agency> = raw.agencies.into_iter().filter_map(build_agency).collect();
    // Only this project's own agency records count. An empty set stays empty.
    let donor_countries = unique(agencies.iter().filter_map(|a| a.country.clone()).collect());

    Project {
        key: field_text(&raw.fields, PROJECT_KEY_FIELDS),
        name: field_text(&raw.fields, PROJECT_NAME_FIELDS)
            .unwrap_or_else(|| UNNAMED_PROJECT.to_string()),
        description: field_text(&raw.fields, PROJECT_DESCRIPTION_FIELDS).unwrap_or_default(),
        website: field_text(&raw.fields, PROJECT_WEBSITE_FIELDS),
        investment_types: field_strings(&raw.fields, PROJECT_TYPE_FIELDS),
        investment_themes: field_strings(&raw.fields, PROJECT_THEME_FIELDS),
        donor_countries,
        agencies,
        provider: field_text(&raw.fields, PROJECT_PROVIDER_FIELDS),
        organization_id: organization_id.to_string(),
        id,
    }
}

fn build_agency(value: Value) -> Option<Agency> {
    let raw: RawAgency = serde_json::from_value(value).ok()?;
    Some(Agency {
        id: value_id(&raw.id).unwrap_or_default(),
        name: field_text(&raw.fields, AGENCY_NAME_FIELDS)
            .unwrap_or_else(|| UNSPECIFIED_AGENCY.to_string()),
        country: field_strings(&raw.fields, AGENCY_COUNTRY_FIELDS).into_iter().next(),
        website: field_text(&raw.fields, AGENCY_WEBSITE_FIELDS),
    })
}

// --- Field helpers ---

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Identifier as a non-empty string. Numbers are accepted and stringified.
fn value_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Free text. Lists are joined with `", "`.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(value_text).collect();
            Some(parts.join(", ")).filter(|s| !s.is_empty())
        }
        _ => None,
    }
}

/// A multi-valued field: list elements as-is, or a delimited string split apart.
fn value_strings(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => split_respecting_parentheses(s),
        Value::Array(items) => items
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.trim().to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn field<'a>(fields: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|n| fields.get(*n))
        .find(|v| !v.is_null())
}

fn field_text(fields: &Map<String, Value>, names: &[&str]) -> Option<String> {
    names.iter().find_map(|n| fields.get(*n).and_then(value_text))
}

fn field_strings(fields: &Map<String, Value>, names: &[&str]) -> Vec<String> {
    field(fields, names)
        .map(|v| unique(value_strings(v)))
        .unwrap_or_default()
}

/// Drop duplicates, keeping first-seen order.
fn unique(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for v in values {
        if !out.contains(&v) {
            out.push(v);
        }
    }
    out
}
