use std::sync::Arc;

use axum::{
    extract::{Path, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use tracing::debug;

use crafd_common::Organization;
use crafd_engine::{
    aggregate, donor_profile, find_organization, find_project, organizations_supporting_project,
    sort_organizations, FacetUniverse,
};
use crafd_sync::{resolve, Lookups, UrlState};

// --- App State ---

pub struct AppState {
    organizations: Arc<Vec<Organization>>,
    lookups: Arc<Lookups>,
    include_member_states: bool,
}

impl AppState {
    pub fn new(organizations: Vec<Organization>, lookups: Arc<Lookups>, include_member_states: bool) -> Self {
        Self {
            organizations: Arc::new(organizations),
            lookups,
            include_member_states,
        }
    }

    /// Built from the current lookup snapshots; empty tables until they load.
    fn universe(&self) -> FacetUniverse {
        FacetUniverse::build(
            &self.organizations,
            &self.lookups.themes.load(),
            &self.lookups.member_states.load(),
            self.include_member_states,
        )
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/dashboard", get(api_dashboard))
        .route("/api/organizations/{key}", get(api_organization))
        .route("/api/projects/{key}/organizations", get(api_project_organizations))
        .route("/api/donors/{slug}", get(api_donor))
        .with_state(state)
}

// --- Handlers ---

async fn health() -> &'static str {
    "ok"
}

async fn api_dashboard(State(state): State<Arc<AppState>>, RawQuery(query): RawQuery) -> Response {
    let url = UrlState::parse(query.as_deref().unwrap_or(""));
    let filter = url.filter();
    let universe = state.universe();
    let resolved = resolve(&filter, &universe);

    let mut result = aggregate(&state.organizations, &resolved.selection, &universe);
    sort_organizations(&mut result.organizations, filter.sort_by, filter.sort_direction);
    debug!(
        organizations = result.stats.organization_count,
        projects = result.stats.project_count,
        "Dashboard computed"
    );
    Json(result).into_response()
}

async fn api_organization(State(state): State<Arc<AppState>>, Path(key): Path<String>) -> Response {
    match find_organization(&state.organizations, &key) {
        Some(org) => Json(org).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn api_project_organizations(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Response {
    match find_project(&state.organizations, &key) {
        Some(project) => {
            Json(organizations_supporting_project(&state.organizations, project)).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn api_donor(State(state): State<Arc<AppState>>, Path(slug): Path<String>) -> Response {
    let universe = state.universe();
    match universe.resolve_donor(&slug) {
        Some(country) => Json(donor_profile(&state.organizations, country)).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use crafd_common::{ThemeMapping, ThemeRecord};
    use crafd_engine::normalize;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        let organizations = normalize(vec![
            json!({
                "id": "org-a",
                "fields": { "Org Full Name": "World Food Programme", "Org Short Name": "WFP" },
                "donor_countries": ["Germany"],
                "projects": [{
                    "id": "p1",
                    "fields": {
                        "Project/Product Name": "Flood Census",
                        "product_key": "flood-census",
                        "Investment Type(s)": ["Data Sets"],
                        "Investment Theme(s)": ["Early Warning Systems"]
                    }
                }]
            }),
            json!({
                "id": "org-b",
                "fields": { "Org Full Name": "Acme Analytics" },
                "projects": [
                    {
                        "id": "p1",
                        "fields": { "Project/Product Name": "Flood Census" }
                    },
                    {
                        "id": "p2",
                        "fields": { "Project/Product Name": "Drought Index" },
                        "agencies": [{
                            "id": "ag1",
                            "fields": { "Agency/Department Name": "GAC", "Country Name": "Canada" }
                        }]
                    }
                ]
            }),
        ])
        .graph
        .organizations;

        let lookups = Arc::new(Lookups::new());
        lookups.themes.populate(ThemeMapping::from_records(vec![ThemeRecord {
            theme_name: "Early Warning Systems".into(),
            theme_key: Some("EWS".into()),
            description: None,
            investment_type: Some("Data Sets".into()),
        }]));
        router(Arc::new(AppState::new(organizations, lookups, false)))
    }

    async fn get(uri: &str) -> (StatusCode, Option<Value>) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).ok())
    }

    #[tokio::test]
    async fn dashboard_resolves_the_query_string() {
        let (status, body) = get("/api/dashboard?d=canada").await;
        assert_eq!(status, StatusCode::OK);
        let body = body.unwrap();
        assert_eq!(body["stats"]["organization_count"], 1);
        assert_eq!(body["organizations"][0]["id"], "org-b");
        assert_eq!(body["organizations"][0]["projects"].as_array().unwrap().len(), 1);
        assert_eq!(body["all_organizations"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn dashboard_sorts_per_query() {
        let (_, body) = get("/api/dashboard?sb=name&sd=asc").await;
        let body = body.unwrap();
        assert_eq!(body["organizations"][0]["name"], "Acme Analytics");
        assert_eq!(body["stats"]["project_count"], 2);
    }

    #[tokio::test]
    async fn organization_by_short_name() {
        let (status, body) = get("/api/organizations/wfp").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.unwrap()["id"], "org-a");

        let (status, _) = get("/api/organizations/nobody").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn project_lists_every_supporting_organization() {
        let (status, body) = get("/api/projects/flood-census/organizations").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.unwrap().as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn donor_profile_by_slug() {
        let (status, body) = get("/api/donors/canada").await;
        assert_eq!(status, StatusCode::OK);
        let body = body.unwrap();
        assert_eq!(body["country"], "Canada");
        assert_eq!(body["agencies"][0]["name"], "GAC");

        let (status, _) = get("/api/donors/atlantis").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn health_is_ok() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
