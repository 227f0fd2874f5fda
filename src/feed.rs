//! The paginated feed behind the news list screen.
//!
//! Posts accumulate across fetches and are shown either as a 10-post window
//! at the current display page or, while a search query is set, as every
//! post whose title or author contains the query.
//!
//! Display pages are 1-based; display page `p` is backed by API page `p - 1`.
//! Mounting fetches API page 0 while `current_page` is 1.
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::{Post, PostFetcher};

pub const PAGE_SIZE: usize = 10;
pub const FIRST_PAGE: u32 = 1;
pub const INITIAL_FETCH_PAGE: u32 = 0;

/// FeedState is everything the list screen renders from.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct FeedState {
    /// Append-only; never truncated or deduplicated while mounted.
    pub posts: Vec<Post>,
    pub current_page: u32,
    /// API page index of the most recent successful fetch.
    pub last_fetched_page: Option<u32>,
    pub is_fetching_more: bool,
    pub search_query: String,
    /// Message of the most recent failed fetch, cleared by the next success.
    pub last_error: Option<String>,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            posts: Vec::new(),
            current_page: FIRST_PAGE,
            last_fetched_page: None,
            is_fetching_more: false,
            search_query: String::new(),
            last_error: None,
        }
    }
}

impl FeedState {
    pub fn visible_posts(&self) -> Vec<&Post> {
        if !self.search_query.is_empty() {
            let needle = self.search_query.to_lowercase();
            return self.posts.iter().filter(|p| p.matches(&needle)).collect();
        }

        // Page 0 and pages past the end are empty, not errors.
        let Some(index) = (self.current_page as usize).checked_sub(1) else {
            return Vec::new();
        };
        let start = index.saturating_mul(PAGE_SIZE).min(self.posts.len());
        let end = start.saturating_add(PAGE_SIZE).min(self.posts.len());
        self.posts[start..end].iter().collect()
    }

    pub fn total_pages(&self) -> u32 {
        pages_for(self.posts.len())
    }
}

fn pages_for(posts: usize) -> u32 {
    u32::try_from(posts.div_ceil(PAGE_SIZE)).unwrap_or(u32::MAX)
}

/// FetchOutcome reports what a fetch-driving event ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Another fetch was in flight or the page was already fetched.
    Skipped,
    /// The page arrived and this many posts were appended.
    Appended(usize),
    /// The fetch failed; state was left as it was.
    Failed,
    /// The screen was unmounted or remounted while the fetch was in flight.
    Discarded,
}

struct Inner {
    state: FeedState,
    generation: u64,
}

/// Ticket carries what a fetch needs to merge its result back.
struct Ticket {
    generation: u64,
    page: u32,
    /// The cursor value set when the fetch was started from a scroll-end.
    advanced_to: Option<u32>,
}

/// FeedController owns the feed state and turns UI events into fetches.
///
/// The state lock is never held across an await; starting a fetch checks
/// and sets `is_fetching_more` under one lock, so at most one fetch is in
/// flight per controller.
pub struct FeedController<F> {
    fetcher: F,
    inner: Mutex<Inner>,
}

impl<F: PostFetcher> FeedController<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            inner: Mutex::new(Inner {
                state: FeedState::default(),
                generation: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts a fresh feed and fetches the first page.
    pub async fn mount(&self) -> FetchOutcome {
        let ticket = {
            let mut inner = self.lock();
            inner.generation += 1;
            inner.state = FeedState {
                is_fetching_more: true,
                ..FeedState::default()
            };
            Ticket {
                generation: inner.generation,
                page: INITIAL_FETCH_PAGE,
                advanced_to: None,
            }
        };
        self.run_fetch(ticket).await
    }

    /// Drops all state. Fetches still in flight are discarded on completion.
    pub fn unmount(&self) {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.state = FeedState::default();
    }

    /// Called when the list is scrolled to its end. Advances the cursor and
    /// fetches the next API page unless a fetch is running or that page was
    /// the last one fetched. Until a first page has loaded, it retries that
    /// page and leaves the cursor alone.
    pub async fn on_end_reached(&self) -> FetchOutcome {
        let ticket = {
            let mut inner = self.lock();
            let generation = inner.generation;
            let state = &mut inner.state;
            if state.is_fetching_more || state.last_fetched_page == Some(state.current_page) {
                debug!(
                    current_page = state.current_page,
                    last_fetched_page = ?state.last_fetched_page,
                    in_flight = state.is_fetching_more,
                    "end reached, nothing to fetch"
                );
                return FetchOutcome::Skipped;
            }
            // Nothing has loaded yet: retry the first page in place.
            if state.last_fetched_page.is_none() {
                state.is_fetching_more = true;
                Ticket {
                    generation,
                    page: INITIAL_FETCH_PAGE,
                    advanced_to: None,
                }
            } else {
                let page = state.current_page;
                let Some(next) = page.checked_add(1) else {
                    debug!(current_page = page, "cursor at its maximum, nothing to fetch");
                    return FetchOutcome::Skipped;
                };
                state.current_page = next;
                state.is_fetching_more = true;
                Ticket {
                    generation,
                    page,
                    advanced_to: Some(next),
                }
            }
        };
        self.run_fetch(ticket).await
    }

    /// Jumps to a display page. Does not fetch and does not clamp.
    pub fn on_page_select(&self, page: u32) {
        self.lock().state.current_page = page;
    }

    pub fn on_search_change(&self, query: impl Into<String>) {
        self.lock().state.search_query = query.into();
    }

    pub fn visible_posts(&self) -> Vec<Post> {
        self.lock()
            .state
            .visible_posts()
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn total_pages(&self) -> u32 {
        self.lock().state.total_pages()
    }

    /// Returns the post at `index` in the visible list, for the detail view.
    pub fn select_post(&self, index: usize) -> Option<Post> {
        self.lock().state.visible_posts().get(index).map(|p| (*p).clone())
    }

    pub fn snapshot(&self) -> FeedState {
        self.lock().state.clone()
    }

    async fn run_fetch(&self, ticket: Ticket) -> FetchOutcome {
        debug!(page = ticket.page, "fetch started");
        let result = self.fetcher.fetch_page(ticket.page).await;

        let mut inner = self.lock();
        if inner.generation != ticket.generation {
            debug!(page = ticket.page, "discarding fetch for an unmounted feed");
            return FetchOutcome::Discarded;
        }

        let state = &mut inner.state;
        state.is_fetching_more = false;
        match result {
            Ok(posts) => {
                let count = posts.len();
                state.posts.extend(posts);
                state.last_fetched_page = Some(ticket.page);
                state.last_error = None;
                debug!(page = ticket.page, count, total = state.posts.len(), "fetch merged");
                FetchOutcome::Appended(count)
            }
            Err(err) => {
                warn!(page = ticket.page, error = %err, "error fetching posts");
                // Undo the advance so the next scroll-end asks for the same page,
                // unless the user has picked another page since.
                if let Some(advanced) = ticket.advanced_to {
                    if state.current_page == advanced {
                        state.current_page = advanced - 1;
                    }
                }
                state.last_error = Some(err.to_string());
                FetchOutcome::Failed
            }
        }
    }
}
