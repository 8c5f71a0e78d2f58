use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::{debug, info};

use crafd_common::ThemeMapping;

/// Process-wide lookup table that is populated at most once.
///
/// Readers never block: before population they see `T::default()`, afterwards the
/// populated value. The swap is atomic, so no reader observes a partial table.
pub struct LookupCache<T> {
    name: &'static str,
    inner: ArcSwap<T>,
    claimed: AtomicBool,
    initialized: AtomicBool,
}

impl<T: Default> LookupCache<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: ArcSwap::new(Arc::new(T::default())),
            claimed: AtomicBool::new(false),
            initialized: AtomicBool::new(false),
        }
    }

    /// Current snapshot. Cheap; callers may hold it across await points.
    pub fn load(&self) -> Arc<T> {
        self.inner.load_full()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Store `value` if nothing has been stored yet. Returns false when another
    /// caller got there first; their value stays.
    pub fn populate(&self, value: T) -> bool {
        if self
            .claimed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(cache = self.name, "Lookup cache already populated, ignoring");
            return false;
        }
        self.inner.store(Arc::new(value));
        self.initialized.store(true, Ordering::Release);
        info!(cache = self.name, "Lookup cache populated");
        true
    }

    /// Back to the empty, unpopulated state.
    pub fn reset(&self) {
        self.inner.store(Arc::new(T::default()));
        self.initialized.store(false, Ordering::Release);
        self.claimed.store(false, Ordering::SeqCst);
    }
}

/// The two tables every aggregation reads.
pub struct Lookups {
    pub themes: LookupCache<ThemeMapping>,
    pub member_states: LookupCache<Vec<String>>,
}

impl Lookups {
    pub fn new() -> Self {
        Self {
            themes: LookupCache::new("themes"),
            member_states: LookupCache::new("member_states"),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.themes.is_initialized() && self.member_states.is_initialized()
    }
}

impl Default for Lookups {
    fn default() -> Self {
        Self::new()
    }
}
