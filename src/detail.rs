//! Text renderings of a single post for the list card and the detail screens.
use crate::Post;

const NO_URL: &str = "No URL available";

/// Lines shown on a post's card in the list.
pub fn card_lines(post: &Post) -> Vec<String> {
    vec![
        post.title.clone(),
        format!("Author: {}", post.author),
        match &post.url {
            Some(url) => format!("URL: {url}"),
            None => NO_URL.to_string(),
        },
        format!("Created At: {}", post.created_at),
        format!("Tags: {}", post.tags.join(", ")),
    ]
}

/// The detail screen body:
///
/// ```text
/// Title: Show HN: A tiny database
///
/// Author: pg
///
/// URL: https://example.com/db
///
/// Created At: 2026-01-10T12:00:00Z
///
/// Tags: story, author_pg
/// ```
pub fn format_details(post: &Post) -> String {
    [
        format!("Title: {}", post.title),
        format!("Author: {}", post.author),
        format!("URL: {}", post.url.as_deref().unwrap_or(NO_URL)),
        format!("Created At: {}", post.created_at),
        format!("Tags: {}", post.tags.join(", ")),
    ]
    .join("\n\n")
}

/// The record exactly as the API sent it, indented by two spaces.
pub fn raw_json(post: &Post) -> &str {
    &post.raw_json
}
