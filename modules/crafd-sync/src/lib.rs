pub mod lookup;
pub mod resolve;
pub mod search;
pub mod signature;
pub mod source;
pub mod synchronizer;
pub mod url_state;

pub use lookup::{LookupCache, Lookups};
pub use resolve::{resolve, Dropped, Resolved};
pub use search::SearchBuffer;
pub use signature::FilterSignature;
pub use source::{DataSource, FetchError, FetchRequest, HttpSource, LocalSource};
pub use synchronizer::{FetchOutcome, FetchPhase, FetchTicket, Synchronizer};
pub use url_state::{FilterState, ModalState, UrlState};
