//! Debounced city search.
//!
//! Every keystroke calls [`SearchDebouncer::search`]. A new call cancels the
//! pending timer of the previous one, and a request that is already in flight
//! when newer input arrives has its results dropped, so only the latest query
//! ever reaches the caller.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::geocode::CitySearch;
use crate::types::CitySearchResult;

pub struct SearchDebouncer<S: CitySearch> {
    searcher: Arc<S>,
    delay: Duration,
    min_query_len: usize,
    generation: AtomicU64,
    pending: Mutex<Option<CancellationToken>>,
}

impl<S: CitySearch> SearchDebouncer<S> {
    pub fn new(searcher: Arc<S>, delay: Duration, min_query_len: usize) -> Self {
        Self {
            searcher,
            delay,
            min_query_len,
            generation: AtomicU64::new(0),
            pending: Mutex::new(None),
        }
    }

    /// Debounce then search.
    ///
    /// Returns `None` when this query was superseded by a later call, and
    /// `Some(results)` otherwise. Queries below the minimum length resolve
    /// immediately to an empty list.
    pub async fn search(&self, query: &str) -> Option<Vec<CitySearchResult>> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        if let Some(previous) = self.pending.lock().replace(token.clone()) {
            previous.cancel();
        }

        if query.trim().chars().count() < self.min_query_len {
            return Some(Vec::new());
        }

        tokio::select! {
            _ = token.cancelled() => {
                tracing::trace!("Search for '{}' superseded before firing", query);
                return None;
            }
            _ = tokio::time::sleep(self.delay) => {}
        }

        let results = self.searcher.search_city(query).await;

        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!("Discarding stale results for '{}'", query);
            return None;
        }
        Some(results)
    }

    /// Drop any pending search, e.g. when the search field is cleared.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(token) = self.pending.lock().take() {
            token.cancel();
        }
    }
}
