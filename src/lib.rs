use std::future::Future;

use serde_json::Value;
use tracing::warn;

pub mod config;
pub mod detail;
pub mod feed;
pub mod ffi;
pub mod http;

#[cfg(feature = "uniffi")]
uniffi::setup_scaffolding!();

/// Post is one story hit from the search API.
///
/// Only the fields the screen renders are typed; the full record is kept as
/// pretty-printed JSON for the raw detail view.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct Post {
    pub title: String,
    pub author: String,
    pub url: Option<String>,
    pub created_at: String,
    pub tags: Vec<String>,
    pub raw_json: String,
}

impl Post {
    /// Builds a post from a single API hit. Returns None when one of the
    /// required text fields (title, author, created_at) is missing.
    pub fn from_hit(hit: &Value) -> Option<Post> {
        let text = |key: &str| hit.get(key).and_then(Value::as_str).map(str::to_owned);

        let (Some(title), Some(author), Some(created_at)) =
            (text("title"), text("author"), text("created_at"))
        else {
            let object_id = hit.get("objectID").and_then(Value::as_str).unwrap_or("?");
            warn!(object_id, "skipping hit without title, author or created_at");
            return None;
        };

        let url = text("url").filter(|u| !u.is_empty());

        let tags = hit
            .get("_tags")
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        let raw_json = serde_json::to_string_pretty(hit).unwrap_or_else(|_| hit.to_string());

        Some(Post {
            title,
            author,
            url,
            created_at,
            tags,
            raw_json,
        })
    }

    /// Case-insensitive substring match against title or author.
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle) || self.author.to_lowercase().contains(needle)
    }
}

/// PostFetcher is the surface for retrieving one page of posts from the
/// search API.
pub trait PostFetcher {
    fn fetch_page(&self, page: u32) -> impl Future<Output = Result<Vec<Post>, Error>> + Send;
}

#[derive(Debug, thiserror::Error)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Error))]
#[cfg_attr(feature = "uniffi", uniffi(flat_error))]
pub enum Error {
    #[error("not found")]
    NotFound,

    #[error("network error: {0}")]
    Network(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Network(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Network(format!("malformed response body: {err}"))
    }
}
