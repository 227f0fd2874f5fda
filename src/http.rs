use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::{Error, Post, PostFetcher};

/// HnFetcher pulls story pages from the Algolia-backed Hacker News search API.
pub struct HnFetcher {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Vec<Value>,
    #[serde(rename = "nbPages")]
    nb_pages: Option<u32>,
}

impl HnFetcher {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    fn page_url(&self, page: u32) -> String {
        format!("{}?tags=story&page={page}", self.base_url)
    }
}

impl PostFetcher for HnFetcher {
    async fn fetch_page(&self, page: u32) -> Result<Vec<Post>, Error> {
        let url = self.page_url(page);
        debug!(%url, "fetching page");

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        match status.as_u16() {
            200..=299 => {}
            400..=499 => {
                return Err(Error::Network(format!("request rejected with {status}")));
            }
            _ => {
                return Err(Error::Network(format!(
                    "error received from the remote server ({status})"
                )));
            }
        }

        let body = response.text().await?;
        let search: SearchResponse = serde_json::from_str(&body)?;

        let posts: Vec<Post> = search.hits.iter().filter_map(Post::from_hit).collect();
        debug!(
            page,
            hits = search.hits.len(),
            kept = posts.len(),
            nb_pages = ?search.nb_pages,
            "page fetched"
        );

        Ok(posts)
    }
}
