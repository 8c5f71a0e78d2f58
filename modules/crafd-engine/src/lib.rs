//! Faceted filter and aggregation engine over the organization → project graph.
//!
//! Pipeline: raw nested records are normalized once per load (`normalize`), then
//! every facet selection is applied (`filter`) and summarized (`aggregate`). Slugs
//! (`slug`) keep facet values URL-safe and reversible against a `FacetUniverse`.

pub mod aggregate;
pub mod detail;
pub mod filter;
pub mod normalize;
pub mod slug;
pub mod sort;
pub mod split;
pub mod universe;

pub use aggregate::{
    aggregate, compute_stats, facet_counts, AggregateResult, ChartCount, DashboardStats,
    FacetCount, FacetCounts,
};
pub use detail::{
    donor_profile, find_organization, find_project, organizations_supporting_project, DonorProfile,
};
pub use filter::{apply_filters, filter_organization};
pub use normalize::{load_dataset, normalize, Normalized};
pub use slug::{expand_donor_slugs, from_slug, to_slug};
pub use sort::sort_organizations;
pub use universe::{FacetUniverse, ThemeEntry};
