use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crafd_common::{member_states_from_csv, member_states_from_json, Config, ThemeMapping};
use crafd_engine::load_dataset;
use crafd_sync::Lookups;

mod api;
use api::{router, AppState};

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("crafd=info".parse()?))
        .init();

    let config = Config::from_env()?;

    let raw = tokio::fs::read_to_string(&config.data_path)
        .await
        .with_context(|| format!("reading dataset {}", config.data_path.display()))?;
    let normalized = load_dataset(&raw)?;
    info!(
        organizations = normalized.graph.organizations.len(),
        projects = normalized.graph.project_count(),
        "Dataset loaded"
    );

    // Requests are served right away; the lookup tables fill in when they arrive.
    let lookups = Arc::new(Lookups::new());
    tokio::spawn(load_lookups(
        lookups.clone(),
        config.themes_path.clone(),
        config.member_states_path.clone(),
    ));

    let state = Arc::new(AppState::new(
        normalized.graph.organizations,
        lookups,
        config.include_member_states,
    ));

    let app = router(state).layer(
        tower_http::trace::TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            },
        ),
    );

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!("CRAFd dashboard API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Lookup tables ---

async fn load_lookups(lookups: Arc<Lookups>, themes_path: Option<PathBuf>, member_states_path: Option<PathBuf>) {
    let themes = match themes_path {
        Some(path) => match load_themes(&path).await {
            Ok(mapping) => mapping,
            Err(e) => {
                warn!(error = %e, path = %path.display(), "Failed to load theme table, continuing without it");
                ThemeMapping::default()
            }
        },
        None => ThemeMapping::default(),
    };
    info!(themes = themes.len(), "Theme table ready");
    lookups.themes.populate(themes);

    let members = match member_states_path {
        Some(path) => match load_member_states(&path).await {
            Ok(members) => members,
            Err(e) => {
                warn!(error = %e, path = %path.display(), "Failed to load member states, continuing without them");
                Vec::new()
            }
        },
        None => Vec::new(),
    };
    info!(member_states = members.len(), "Member states ready");
    lookups.member_states.populate(members);
}

async fn load_themes(path: &Path) -> Result<ThemeMapping> {
    let raw = tokio::fs::read_to_string(path).await?;
    Ok(ThemeMapping::from_json(&raw)?)
}

async fn load_member_states(path: &Path) -> Result<Vec<String>> {
    let raw = tokio::fs::read_to_string(path).await?;
    let members = match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => member_states_from_csv(&raw)?,
        _ => member_states_from_json(&raw)?,
    };
    Ok(members)
}
