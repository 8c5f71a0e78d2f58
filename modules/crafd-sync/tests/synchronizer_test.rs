//! Synchronizer behaviour against an in-process data source.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use crafd_common::{FacetSelection, SortDirection, SortField, ThemeMapping, ThemeRecord};
use crafd_engine::{normalize, AggregateResult, FacetUniverse};
use crafd_sync::{
    DataSource, FetchError, FetchOutcome, FetchPhase, FetchRequest, FilterState, LocalSource,
    ModalState, Synchronizer,
};
use serde_json::json;

// ---------------------------------------------------------------------------
// Test source: counts calls and can be told to fail
// ---------------------------------------------------------------------------

struct CountingSource {
    inner: LocalSource,
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl CountingSource {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl DataSource for CountingSource {
    async fn fetch(&self, request: &FetchRequest) -> Result<AggregateResult, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(FetchError::Status {
                status: 503,
                message: "unavailable".into(),
            });
        }
        self.inner.fetch(request).await
    }
}

fn fixture() -> (Arc<FacetUniverse>, CountingSource) {
    let organizations = normalize(vec![
        json!({
            "id": "org-a",
            "fields": { "Org Full Name": "Org A" },
            "donor_countries": ["Germany"],
            "projects": [{
                "id": "p1",
                "fields": {
                    "Project/Product Name": "Flood Census",
                    "Investment Type(s)": ["Data Sets"],
                    "Investment Theme(s)": ["Early Warning Systems"]
                }
            }]
        }),
        json!({
            "id": "org-b",
            "fields": { "Org Full Name": "Org B" },
            "donor_countries": ["Canada"],
            "projects": [{
                "id": "p2",
                "fields": {
                    "Project/Product Name": "Drought Index",
                    "Investment Type(s)": ["Analytics"]
                }
            }]
        }),
    ])
    .graph
    .organizations;

    let themes = ThemeMapping::from_records(vec![ThemeRecord {
        theme_name: "Early Warning Systems".into(),
        theme_key: Some("EWS".into()),
        description: None,
        investment_type: Some("Data Sets".into()),
    }]);
    let universe = Arc::new(FacetUniverse::build(&organizations, &themes, &[], false));
    let source = CountingSource {
        inner: LocalSource::new(Arc::new(organizations), universe.clone()),
        calls: AtomicUsize::new(0),
        failing: AtomicBool::new(false),
    };
    (universe, source)
}

// ---------------------------------------------------------------------------
// Modal channel
// ---------------------------------------------------------------------------

#[tokio::test]
async fn modal_changes_leave_filter_bytes_alone_and_never_fetch() {
    let (universe, source) = fixture();
    let query = "donors=Germany&t=data%2Dsets&q=flood+census&ref=newsletter";
    let mut sync = Synchronizer::new(query, universe, false);
    assert!(sync.refresh(&source).await.is_some());
    assert_eq!(source.calls(), 1);

    let before: Vec<(String, Option<String>)> = sync
        .url()
        .filter_pairs()
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
        .collect();

    for modal in [
        ModalState::Organization("org-a".into()),
        ModalState::Project("flood census".into()),
        ModalState::Donor("germany".into()),
    ] {
        sync.open_modal(modal.clone());
        assert_eq!(sync.modal(), modal);
        let after: Vec<(String, Option<String>)> = sync
            .url()
            .filter_pairs()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
            .collect();
        assert_eq!(before, after);
        assert!(sync.refresh(&source).await.is_none());
    }

    sync.close_modal();
    assert_eq!(sync.query(), query);
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn filter_writes_keep_the_open_modal() {
    let (universe, _source) = fixture();
    let mut sync = Synchronizer::new("asset=flood-census", universe, false);
    sync.update_filter(FilterState {
        donors: vec!["germany".into()],
        ..Default::default()
    });
    assert_eq!(sync.query(), "d=germany&asset=flood-census");
    assert_eq!(sync.modal(), ModalState::Project("flood-census".into()));
}

// ---------------------------------------------------------------------------
// Refetch dedup and stale responses
// ---------------------------------------------------------------------------

#[tokio::test]
async fn same_selection_in_any_order_fetches_once() {
    let (universe, source) = fixture();
    let mut sync = Synchronizer::new("d=germany,canada&t=analytics,data-sets", universe, false);
    assert!(sync.refresh(&source).await.is_some());

    sync.update_filter(FilterState {
        donors: vec!["canada".into(), "germany".into()],
        types: vec!["data-sets".into(), "analytics".into()],
        ..Default::default()
    });
    assert!(sync.refresh(&source).await.is_none());
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn search_keystrokes_do_not_fetch_until_commit() {
    let (universe, source) = fixture();
    let mut sync = Synchronizer::new("", universe, false);
    sync.refresh(&source).await;

    for draft in ["f", "fl", "flood"] {
        sync.search_input(draft);
        assert_eq!(sync.query(), "");
        assert!(sync.refresh(&source).await.is_none());
    }
    assert!(sync.commit_search());
    assert_eq!(sync.query(), "q=flood");
    assert!(sync.refresh(&source).await.is_some());
    assert_eq!(source.calls(), 2);

    // Committing the same text again is a no-op.
    assert!(!sync.commit_search());
}

#[tokio::test]
async fn slow_earlier_response_is_discarded() {
    let (universe, source) = fixture();
    let mut sync = Synchronizer::new("d=germany", universe, false);

    let first = sync.begin_fetch().unwrap();
    let first_result = source.fetch(first.request()).await;

    sync.update_filter(FilterState {
        donors: vec!["canada".into()],
        ..Default::default()
    });
    let second = sync.begin_fetch().unwrap();
    let second_result = source.fetch(second.request()).await;

    assert!(matches!(
        sync.complete_fetch(second, second_result),
        FetchOutcome::Applied { .. }
    ));
    assert_eq!(sync.complete_fetch(first, first_result), FetchOutcome::Stale);

    let shown = sync.result().unwrap();
    assert_eq!(shown.organizations.len(), 1);
    assert_eq!(shown.organizations[0].id, "org-b");
}

#[tokio::test]
async fn returning_to_the_fetched_selection_invalidates_the_in_flight_one() {
    let (universe, source) = fixture();
    let mut sync = Synchronizer::new("d=germany", universe, false);
    sync.refresh(&source).await;

    sync.update_filter(FilterState {
        donors: vec!["canada".into()],
        ..Default::default()
    });
    let in_flight = sync.begin_fetch().unwrap();
    let late = source.fetch(in_flight.request()).await;

    sync.update_filter(FilterState {
        donors: vec!["germany".into()],
        ..Default::default()
    });
    assert!(sync.begin_fetch().is_none());
    assert_eq!(sync.phase(), FetchPhase::Settled);
    assert_eq!(sync.complete_fetch(in_flight, late), FetchOutcome::Stale);
    assert_eq!(sync.result().unwrap().organizations[0].id, "org-a");
}

#[tokio::test]
async fn response_for_a_replaced_filter_is_stale_before_the_next_fetch_starts() {
    let (universe, source) = fixture();
    let mut sync = Synchronizer::new("d=canada&th=EWS", universe, false);

    let old = sync.begin_fetch().unwrap();
    let old_result = source.fetch(old.request()).await;
    assert_eq!(
        old_result.as_ref().unwrap().facet_counts.theme_count("EWS"),
        Some(0)
    );

    let mut filter = sync.filter();
    filter.donors = vec!["germany".into()];
    sync.update_filter(filter);

    assert_eq!(sync.complete_fetch(old, old_result), FetchOutcome::Stale);
    assert_eq!(sync.query(), "d=germany&th=EWS");
    assert!(sync.result().is_none());

    let outcome = sync.refresh(&source).await;
    assert_eq!(
        outcome,
        Some(FetchOutcome::Applied {
            removed_themes: vec![]
        })
    );
    assert_eq!(sync.query(), "d=germany&th=EWS");
}

#[tokio::test]
async fn committed_search_makes_the_in_flight_response_stale() {
    let (universe, source) = fixture();
    let mut sync = Synchronizer::new("d=germany", universe, false);

    let old = sync.begin_fetch().unwrap();
    let old_result = source.fetch(old.request()).await;
    sync.search_input("drought");
    assert!(sync.commit_search());

    assert_eq!(sync.complete_fetch(old, old_result), FetchOutcome::Stale);
    assert!(sync.needs_fetch());
}

// ---------------------------------------------------------------------------
// Navigation and late universe
// ---------------------------------------------------------------------------

#[tokio::test]
async fn back_forward_navigation_reresolves_without_rewriting_the_url() {
    let (universe, _source) = fixture();
    let mut sync = Synchronizer::new("d=germany&q=flood", universe, false);
    sync.search_input("unsent draft");

    sync.navigate("d=canada,atlantis&q=drought");
    assert_eq!(sync.query(), "d=canada,atlantis&q=drought");
    assert_eq!(sync.selection().donors, vec!["Canada"]);
    assert_eq!(sync.dropped().donors, vec!["atlantis"]);
    assert_eq!(sync.search().draft(), "drought");
    assert_eq!(sync.search().committed(), Some("drought"));
    assert!(sync.needs_fetch());
}

#[tokio::test]
async fn later_universe_resolves_previously_dropped_donor() {
    let (full, _source) = fixture();
    let partial = Arc::new(FacetUniverse {
        donors: vec!["Germany".into()],
        ..Default::default()
    });
    let mut sync = Synchronizer::new("d=canada", partial, false);
    assert!(sync.selection().donors.is_empty());
    assert_eq!(sync.dropped().donors, vec!["canada"]);

    sync.set_universe(full);
    assert_eq!(sync.selection().donors, vec!["Canada"]);
    assert!(sync.dropped().is_empty());
    assert_eq!(sync.query(), "d=canada");
}

#[tokio::test]
async fn sorted_organizations_follow_the_url_sort() {
    let (universe, source) = fixture();
    let mut sync = Synchronizer::new("", universe, false);
    assert!(sync.sorted_organizations().is_empty());
    sync.refresh(&source).await;

    let names = |sync: &Synchronizer| -> Vec<String> {
        sync.sorted_organizations().into_iter().map(|o| o.name).collect()
    };
    // Default order is name, descending.
    assert_eq!(names(&sync), vec!["Org B", "Org A"]);

    sync.navigate("sb=name&sd=asc");
    assert_eq!(sync.selection(), &FacetSelection::new());
    assert!(sync.refresh(&source).await.is_none());
    assert_eq!(names(&sync), vec!["Org A", "Org B"]);

    sync.set_sort(SortField::Donors, SortDirection::Desc);
    assert_eq!(sync.query(), "sb=donors");
    // Equal donor counts fall back to name order.
    assert_eq!(names(&sync), vec!["Org A", "Org B"]);
    assert_eq!(source.calls(), 1);
}

// ---------------------------------------------------------------------------
// Theme validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn new_theme_is_kept_until_a_fetch_that_includes_it() {
    let (universe, source) = fixture();
    let mut sync = Synchronizer::new("d=canada", universe, false);
    sync.refresh(&source).await;
    // Under the Canada selection the theme already counts zero projects.
    assert_eq!(
        sync.result().unwrap().facet_counts.theme_count("EWS"),
        Some(0)
    );

    let mut filter = sync.filter();
    filter.themes = vec!["ews".into()];
    sync.update_filter(filter);
    assert_eq!(sync.query(), "d=canada&th=EWS");

    let outcome = sync.refresh(&source).await;
    assert_eq!(
        outcome,
        Some(FetchOutcome::Applied {
            removed_themes: vec!["EWS".into()]
        })
    );
    assert_eq!(sync.query(), "d=canada");
    assert!(sync.needs_fetch());
    assert!(sync.refresh(&source).await.is_some());
    assert_eq!(source.calls(), 3);
}

#[tokio::test]
async fn matching_theme_survives_validation() {
    let (universe, source) = fixture();
    let mut sync = Synchronizer::new("d=germany&th=EWS", universe, false);
    let outcome = sync.refresh(&source).await;
    assert_eq!(
        outcome,
        Some(FetchOutcome::Applied {
            removed_themes: vec![]
        })
    );
    assert_eq!(sync.query(), "d=germany&th=EWS");
    assert_eq!(sync.phase(), FetchPhase::Settled);
}

// ---------------------------------------------------------------------------
// Failure handling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_fetch_keeps_previous_result() {
    let (universe, source) = fixture();
    let mut sync = Synchronizer::new("", universe, false);
    sync.refresh(&source).await;
    let before = sync.result().cloned();

    source.set_failing(true);
    sync.update_filter(FilterState {
        donors: vec!["germany".into()],
        ..Default::default()
    });
    let outcome = sync.refresh(&source).await;
    assert!(matches!(outcome, Some(FetchOutcome::Failed(FetchError::Status { status: 503, .. }))));
    assert_eq!(sync.result().cloned(), before);
    assert!(sync.last_error().is_some());
    assert_eq!(sync.phase(), FetchPhase::Settled);
    assert!(!sync.is_loading());

    // Recovery clears the error.
    source.set_failing(false);
    assert!(sync.refresh(&source).await.is_some());
    assert!(sync.last_error().is_none());
    assert_eq!(sync.result().unwrap().organizations.len(), 1);
}

#[tokio::test]
async fn member_state_toggle_is_part_of_the_signature() {
    let (universe, _source) = fixture();
    let off = Synchronizer::new("d=germany", universe.clone(), false);
    let on = Synchronizer::new("d=germany", universe, true);
    assert_ne!(off.signature(), on.signature());
}
