//! Filter/modal synchronizer: owns the URL, decides when to fetch, and settles
//! fetch results.
//!
//! Fetch lifecycle:
//!
//! ```text
//! Idle ──begin_fetch──▶ Fetching ──ok──▶ Validating ──▶ Settled
//!                          │                               ▲
//!                          └──err── Settled (previous result kept) or Idle (none yet)
//! ```
//!
//! `begin_fetch` hands out a `FetchTicket` carrying the signature it was issued
//! for. A response is applied only while its signature is both the latest one
//! requested and the one the URL currently resolves to; anything else is
//! discarded as stale. Theme validation runs in
//! `Validating`, against the response of the fetch that already included those
//! themes, never against older data.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crafd_common::{FacetSelection, Organization, SortDirection, SortField};
use crafd_engine::{sort_organizations, AggregateResult, FacetUniverse};

use crate::resolve::{resolve, Dropped, Resolved};
use crate::search::SearchBuffer;
use crate::signature::FilterSignature;
use crate::source::{DataSource, FetchError, FetchRequest};
use crate::url_state::{FilterState, ModalState, UrlState};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchPhase {
    #[default]
    Idle,
    Fetching,
    Validating,
    Settled,
}

/// Permission to run one fetch, issued by `begin_fetch`.
#[derive(Debug, Clone)]
pub struct FetchTicket {
    id: u64,
    signature: FilterSignature,
    request: FetchRequest,
    theme_keys: Vec<String>,
}

impl FetchTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn signature(&self) -> &FilterSignature {
        &self.signature
    }

    pub fn request(&self) -> &FetchRequest {
        &self.request
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response is now the current result. Lists theme keys removed from the
    /// filter channel because they matched nothing.
    Applied { removed_themes: Vec<String> },
    /// A newer selection was requested while this fetch was in flight.
    Stale,
    /// The fetch failed; the previous result is still current.
    Failed(FetchError),
}

pub struct Synchronizer {
    url: UrlState,
    universe: Arc<FacetUniverse>,
    include_member_states: bool,
    resolved: Resolved,
    search: SearchBuffer,
    phase: FetchPhase,
    result: Option<AggregateResult>,
    last_error: Option<FetchError>,
    last_fetched: Option<FilterSignature>,
    latest_requested: Option<FilterSignature>,
    next_ticket: u64,
}

impl Synchronizer {
    pub fn new(query: &str, universe: Arc<FacetUniverse>, include_member_states: bool) -> Self {
        let url = UrlState::parse(query);
        let resolved = resolve(&url.filter(), &universe);
        let search = SearchBuffer::new(resolved.canonical.search.clone());
        Self {
            url,
            universe,
            include_member_states,
            resolved,
            search,
            phase: FetchPhase::Idle,
            result: None,
            last_error: None,
            last_fetched: None,
            latest_requested: None,
            next_ticket: 0,
        }
    }

    // --- Read side ---

    pub fn query(&self) -> String {
        self.url.to_query()
    }

    pub fn url(&self) -> &UrlState {
        &self.url
    }

    pub fn filter(&self) -> FilterState {
        self.url.filter()
    }

    pub fn modal(&self) -> ModalState {
        self.url.modal()
    }

    pub fn selection(&self) -> &FacetSelection {
        &self.resolved.selection
    }

    /// Values in the URL that no longer resolve. Gone from the URL after the next
    /// filter write.
    pub fn dropped(&self) -> &Dropped {
        &self.resolved.dropped
    }

    pub fn signature(&self) -> FilterSignature {
        FilterSignature::of(&self.resolved.selection, self.include_member_states)
    }

    pub fn phase(&self) -> FetchPhase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == FetchPhase::Fetching
    }

    pub fn result(&self) -> Option<&AggregateResult> {
        self.result.as_ref()
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    pub fn search(&self) -> &SearchBuffer {
        &self.search
    }

    /// Visible organizations of the current result, in the URL's sort order.
    pub fn sorted_organizations(&self) -> Vec<Organization> {
        let Some(result) = &self.result else {
            return Vec::new();
        };
        let mut organizations = result.organizations.clone();
        sort_organizations(
            &mut organizations,
            self.resolved.canonical.sort_by,
            self.resolved.canonical.sort_direction,
        );
        organizations
    }

    /// True when the current selection has neither been fetched nor is in flight.
    pub fn needs_fetch(&self) -> bool {
        let signature = self.signature();
        let fetched = self.last_fetched.as_ref() == Some(&signature);
        let in_flight =
            self.phase == FetchPhase::Fetching && self.latest_requested.as_ref() == Some(&signature);
        !fetched && !in_flight
    }

    // --- Write side ---

    /// Adopt a URL that changed outside the synchronizer (initial load, back/forward).
    pub fn navigate(&mut self, query: &str) {
        self.url = UrlState::parse(query);
        self.resolved = resolve(&self.url.filter(), &self.universe);
        self.search.reset_to(self.resolved.canonical.search.clone());
    }

    /// Swap in a rebuilt facet universe, e.g. once the lookup tables load.
    pub fn set_universe(&mut self, universe: Arc<FacetUniverse>) {
        self.universe = universe;
        self.resolved = resolve(&self.url.filter(), &self.universe);
    }

    /// Write the filter channel. Values that do not resolve are dropped from the
    /// URL here; the modal channel is carried over unchanged.
    pub fn update_filter(&mut self, filter: FilterState) {
        let resolved = resolve(&filter, &self.universe);
        self.url = self.url.with_filter(&resolved.canonical);
        self.search.reset_to(resolved.canonical.search.clone());
        self.resolved = resolved;
    }

    pub fn set_sort(&mut self, sort_by: SortField, sort_direction: SortDirection) {
        let mut filter = self.filter();
        filter.sort_by = sort_by;
        filter.sort_direction = sort_direction;
        self.update_filter(filter);
    }

    /// Write the modal channel only. Never affects the signature.
    pub fn open_modal(&mut self, modal: ModalState) {
        self.url = self.url.with_modal(&modal);
    }

    pub fn close_modal(&mut self) {
        self.open_modal(ModalState::Closed);
    }

    pub fn search_input(&mut self, text: impl Into<String>) {
        self.search.input(text);
    }

    /// Promote the search draft into the filter channel. Returns whether the URL changed.
    pub fn commit_search(&mut self) -> bool {
        let Some(search) = self.search.commit() else {
            return false;
        };
        let mut filter = self.filter();
        filter.search = search;
        self.update_filter(filter);
        true
    }

    // --- Fetch lifecycle ---

    /// Start a fetch for the current selection, or `None` when it is already
    /// fetched or in flight.
    pub fn begin_fetch(&mut self) -> Option<FetchTicket> {
        let signature = self.signature();

        if self.last_fetched.as_ref() == Some(&signature) {
            if self.latest_requested.as_ref() != Some(&signature) {
                // Back to the selection already on screen; whatever is in flight is now stale.
                self.latest_requested = Some(signature.clone());
                self.phase = FetchPhase::Settled;
            }
            debug!(signature = %signature, "Selection already fetched, skipping");
            return None;
        }
        if self.phase == FetchPhase::Fetching && self.latest_requested.as_ref() == Some(&signature) {
            debug!(signature = %signature, "Fetch already in flight, skipping");
            return None;
        }

        self.next_ticket += 1;
        self.phase = FetchPhase::Fetching;
        self.latest_requested = Some(signature.clone());
        debug!(ticket = self.next_ticket, signature = %signature, "Fetch started");

        Some(FetchTicket {
            id: self.next_ticket,
            signature,
            request: FetchRequest {
                selection: self.resolved.selection.clone(),
                include_member_states: self.include_member_states,
                query: UrlState::default().with_filter(&self.resolved.canonical).to_query(),
            },
            theme_keys: self.resolved.canonical.themes.clone(),
        })
    }

    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        outcome: Result<AggregateResult, FetchError>,
    ) -> FetchOutcome {
        // The filter channel may have moved on without a new fetch being started yet.
        let superseded = self.latest_requested.as_ref() != Some(&ticket.signature);
        if superseded || ticket.signature != self.signature() {
            info!(ticket = ticket.id, signature = %ticket.signature, "Discarding stale response");
            return FetchOutcome::Stale;
        }

        match outcome {
            Err(error) => {
                warn!(ticket = ticket.id, error = %error, "Dashboard fetch failed, keeping previous result");
                self.last_error = Some(error.clone());
                self.phase = if self.result.is_some() {
                    FetchPhase::Settled
                } else {
                    FetchPhase::Idle
                };
                FetchOutcome::Failed(error)
            }
            Ok(result) => {
                self.phase = FetchPhase::Validating;
                let removed_themes = self.validate_themes(&ticket, &result);
                self.result = Some(result);
                self.last_fetched = Some(ticket.signature);
                self.last_error = None;
                self.phase = FetchPhase::Settled;
                FetchOutcome::Applied { removed_themes }
            }
        }
    }

    /// `begin_fetch`, run it against `source`, then `complete_fetch`.
    pub async fn refresh(&mut self, source: &dyn DataSource) -> Option<FetchOutcome> {
        let ticket = self.begin_fetch()?;
        let outcome = source.fetch(ticket.request()).await;
        Some(self.complete_fetch(ticket, outcome))
    }

    /// Drop selected themes that the fresh result shows matching nothing. Only the
    /// themes the ticket was issued with are checked.
    fn validate_themes(&mut self, ticket: &FetchTicket, result: &AggregateResult) -> Vec<String> {
        let invalid: Vec<String> = ticket
            .theme_keys
            .iter()
            .filter(|key| result.facet_counts.theme_count(key) == Some(0))
            .cloned()
            .collect();
        if invalid.is_empty() {
            return invalid;
        }

        info!(themes = ?invalid, "Removing themes with no matching projects");
        let mut filter = self.resolved.canonical.clone();
        filter.themes.retain(|k| !invalid.contains(k));
        self.update_filter(filter);
        invalid
    }
}
