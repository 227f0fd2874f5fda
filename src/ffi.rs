use std::sync::Arc;

use crate::config::Config;
use crate::feed::{FeedController, FeedState};
use crate::{http::HnFetcher, Error, Post};

/// FFIFeed is the concrete entry point for FFI consumers (e.g. Swift or Kotlin
/// via UniFFI). It wraps FeedController with fixed concrete types so the FFI
/// layer sees no generics.
///
/// Events are fire-and-forget: after awaiting one, the screen re-reads
/// `visible_posts`/`snapshot` to render.
#[cfg_attr(feature = "uniffi", derive(uniffi::Object))]
pub struct FFIFeed(FeedController<HnFetcher>);

#[cfg_attr(feature = "uniffi", uniffi::export(async_runtime = "tokio"))]
impl FFIFeed {
    #[cfg_attr(feature = "uniffi", uniffi::constructor)]
    pub fn new() -> Result<Arc<Self>, Error> {
        Self::with_config(&Config::load()?)
    }

    pub async fn mount(&self) {
        self.0.mount().await;
    }

    pub fn unmount(&self) {
        self.0.unmount();
    }

    pub async fn on_end_reached(&self) {
        self.0.on_end_reached().await;
    }

    pub fn on_page_select(&self, page: u32) {
        self.0.on_page_select(page);
    }

    pub fn on_search_change(&self, query: String) {
        self.0.on_search_change(query);
    }

    pub fn visible_posts(&self) -> Vec<Post> {
        self.0.visible_posts()
    }

    pub fn total_pages(&self) -> u32 {
        self.0.total_pages()
    }

    pub fn select_post(&self, index: u32) -> Option<Post> {
        self.0.select_post(index as usize)
    }

    pub fn snapshot(&self) -> FeedState {
        self.0.snapshot()
    }

    pub fn format_details(&self, post: Post) -> String {
        crate::detail::format_details(&post)
    }

    pub fn card_lines(&self, post: Post) -> Vec<String> {
        crate::detail::card_lines(&post)
    }
}

impl FFIFeed {
    pub fn with_config(config: &Config) -> Result<Arc<Self>, Error> {
        let fetcher = HnFetcher::new(config)?;
        Ok(Arc::new(Self(FeedController::new(fetcher))))
    }
}
