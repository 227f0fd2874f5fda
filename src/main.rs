use std::io::{self, Write};

use anyhow::Context;
use chrono::DateTime;
use clap::{Parser, Subcommand};
use hnfeed::{
    config::Config,
    detail,
    feed::{FeedController, FIRST_PAGE},
    http::HnFetcher,
    Error, PostFetcher,
};
use tracing_subscriber::EnvFilter;

/// Renders the API's RFC 3339 timestamp as `YYYY-MM-DD HH:MM:SS`,
/// falling back to the raw text when it does not parse.
fn format_created_at(created_at: &str) -> String {
    DateTime::parse_from_rfc3339(created_at)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|_| created_at.to_string())
}

#[derive(Parser)]
#[command(name = "hnfeed")]
struct Cli {
    /// Override the search endpoint
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Scroll to the end this many times after the first page loads
    #[arg(long, global = true, default_value_t = 0)]
    scrolls: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the posts on one page
    Page {
        #[arg(default_value_t = FIRST_PAGE)]
        page: u32,
    },
    /// List every loaded post whose title or author contains the query
    Search { query: String },
    /// Show one post from a page
    Show {
        /// Index of the post within the page
        index: usize,
        #[arg(long, default_value_t = FIRST_PAGE)]
        page: u32,
        /// Print the raw record instead of the formatted details
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load().context("failed to load config")?;
    let config = apply_flags(config, cli.base_url, cli.timeout).context("invalid flags")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(io::stderr)
        .init();

    let controller = FeedController::new(HnFetcher::new(&config)?);
    load(&controller, cli.scrolls).await?;

    match cli.command {
        Commands::Page { page } => handle_page(&controller, page, io::stdout())?,
        Commands::Search { query } => handle_search(&controller, query, io::stdout())?,
        Commands::Show { index, page, json } => {
            handle_show(&controller, page, index, json, io::stdout())?
        }
    }

    Ok(())
}

/// Lets `--base-url`/`--timeout` win over the config, then re-validates.
fn apply_flags(
    mut config: Config,
    base_url: Option<String>,
    timeout: Option<u64>,
) -> Result<Config, Error> {
    if let Some(base_url) = base_url {
        config.base_url = base_url;
    }
    if let Some(timeout) = timeout {
        config.timeout_secs = timeout;
    }
    config.validate()
}

/// Mounts the feed and scrolls `scrolls` times. Fails only when nothing at
/// all could be loaded.
async fn load<F: PostFetcher>(controller: &FeedController<F>, scrolls: u32) -> anyhow::Result<()> {
    controller.mount().await;
    for _ in 0..scrolls {
        controller.on_end_reached().await;
    }

    let state = controller.snapshot();
    if state.posts.is_empty() {
        if let Some(err) = state.last_error {
            anyhow::bail!("could not load any posts: {err}");
        }
    }
    Ok(())
}

fn handle_page<F: PostFetcher>(
    controller: &FeedController<F>,
    page: u32,
    mut out: impl Write,
) -> anyhow::Result<()> {
    controller.on_page_select(page);
    write_posts(controller, &mut out)?;
    let state = controller.snapshot();
    writeln!(
        out,
        "page {} of {} ({} posts loaded)",
        state.current_page,
        state.total_pages(),
        state.posts.len()
    )?;
    Ok(())
}

fn handle_search<F: PostFetcher>(
    controller: &FeedController<F>,
    query: String,
    mut out: impl Write,
) -> anyhow::Result<()> {
    controller.on_search_change(query.as_str());
    let matches = write_posts(controller, &mut out)?;
    writeln!(out, "{matches} matches for {query:?}")?;
    Ok(())
}

fn handle_show<F: PostFetcher>(
    controller: &FeedController<F>,
    page: u32,
    index: usize,
    json: bool,
    mut out: impl Write,
) -> anyhow::Result<()> {
    controller.on_page_select(page);
    let post = controller
        .select_post(index)
        .ok_or(Error::NotFound)
        .with_context(|| format!("no post {index} on page {page}"))?;

    if json {
        writeln!(out, "{}", detail::raw_json(&post))?;
    } else {
        writeln!(out, "{}", detail::format_details(&post))?;
    }
    Ok(())
}

/// Writes the controller's visible posts as a table and returns how many
/// there were.
fn write_posts<F: PostFetcher>(
    controller: &FeedController<F>,
    out: &mut impl Write,
) -> io::Result<usize> {
    let posts = controller.visible_posts();
    let rows: Vec<Vec<String>> = posts
        .iter()
        .enumerate()
        .map(|(i, p)| {
            vec![
                i.to_string(),
                p.title.clone(),
                p.author.clone(),
                format_created_at(&p.created_at),
            ]
        })
        .collect();
    write_table(&["#", "Title", "Author", "Created"], &rows, out)?;
    Ok(posts.len())
}

const MAX_COL_WIDTH: usize = 36;

fn display_width(s: &str) -> usize {
    s.chars().count()
}

fn truncate(s: &str, max: usize) -> String {
    if display_width(s) <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max - 3).collect();
        format!("{head}...")
    }
}

fn write_table(headers: &[&str], rows: &[Vec<String>], mut out: impl Write) -> io::Result<()> {
    let mut col_widths: Vec<usize> = headers.iter().map(|h| display_width(h)).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            col_widths[i] = col_widths[i].max(display_width(cell));
        }
    }
    for w in col_widths.iter_mut() {
        *w = (*w).min(MAX_COL_WIDTH);
    }

    let last = col_widths.len() - 1;
    let pad = |i: usize, cell: &str| {
        if i == last {
            cell.to_string()
        } else {
            format!("{:<width$}", truncate(cell, col_widths[i]), width = col_widths[i])
        }
    };

    let header_parts: Vec<String> = headers.iter().enumerate().map(|(i, h)| pad(i, *h)).collect();
    writeln!(out, "{}", header_parts.join("  "))?;

    let sep_parts: Vec<String> = col_widths.iter().map(|&w| "-".repeat(w)).collect();
    writeln!(out, "{}", sep_parts.join("  "))?;

    for row in rows {
        let parts: Vec<String> = row.iter().enumerate().map(|(i, cell)| pad(i, cell.as_str())).collect();
        writeln!(out, "{}", parts.join("  "))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hnfeed::Post;
    use serde_json::json;
    use std::path::PathBuf;

    struct MockFetcher {}

    impl PostFetcher for MockFetcher {
        async fn fetch_page(&self, page: u32) -> Result<Vec<Post>, Error> {
            if page > 0 {
                return Ok(vec![]);
            }
            let hits = [
                json!({
                    "created_at": "2025-11-20T14:19:14Z",
                    "title": "Systems design 3: LLMs and the semantic revolution",
                    "url": "https://apenwarr.ca/log/20251120",
                    "author": "apenwarr",
                    "_tags": ["story", "author_apenwarr"]
                }),
                json!({
                    "created_at": "2025-07-11T12:00:00Z",
                    "title": "Billionaire math",
                    "url": "https://apenwarr.ca/log/20250711",
                    "author": "apenwarr",
                    "_tags": ["story", "author_apenwarr"]
                }),
                json!({
                    "created_at": "yesterday",
                    "title": "Ask HN: Who is hiring?",
                    "url": null,
                    "author": "whoishiring",
                    "_tags": ["story", "ask_hn"]
                }),
            ];
            Ok(hits.iter().filter_map(Post::from_hit).collect())
        }
    }

    struct FailingFetcher {}

    impl PostFetcher for FailingFetcher {
        async fn fetch_page(&self, _page: u32) -> Result<Vec<Post>, Error> {
            Err(Error::Network("connection refused".into()))
        }
    }

    fn golden(name: &str) -> String {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("testdata")
            .join(name);
        std::fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read golden file {}: {e}", path.display()))
    }

    async fn mock_controller() -> FeedController<MockFetcher> {
        let controller = FeedController::new(MockFetcher {});
        load(&controller, 1).await.unwrap();
        controller
    }

    #[tokio::test]
    async fn page_output() {
        let mut buf = Vec::new();
        handle_page(&mock_controller().await, 1, &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();
        assert_eq!(output, golden("page.txt"));
    }

    #[tokio::test]
    async fn search_output() {
        let mut buf = Vec::new();
        handle_search(&mock_controller().await, "APENWARR".into(), &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();
        assert_eq!(output, golden("search.txt"));
    }

    #[tokio::test]
    async fn show_output() {
        let mut buf = Vec::new();
        handle_show(&mock_controller().await, 1, 1, false, &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();
        assert_eq!(output, golden("show.txt"));
    }

    #[tokio::test]
    async fn show_json_output() {
        let mut buf = Vec::new();
        handle_show(&mock_controller().await, 1, 2, true, &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();
        assert_eq!(output, golden("show_json.txt"));
    }

    #[tokio::test]
    async fn show_missing_post_is_an_error() {
        let mut buf = Vec::new();
        let result = handle_show(&mock_controller().await, 2, 0, false, &mut buf);
        assert!(result.is_err());
        assert!(buf.is_empty());
    }

    #[tokio::test]
    async fn load_fails_when_nothing_arrives() {
        let controller = FeedController::new(FailingFetcher {});
        let err = load(&controller, 0).await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn flags_override_config() {
        let config = apply_flags(
            Config::default(),
            Some("http://localhost:9000/search".into()),
            Some(3),
        )
        .unwrap();
        assert_eq!(config.base_url, "http://localhost:9000/search");
        assert_eq!(config.timeout_secs, 3);
    }

    #[test]
    fn zero_timeout_flag_is_rejected() {
        let result = apply_flags(Config::default(), None, Some(0));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn empty_base_url_flag_is_rejected() {
        let result = apply_flags(Config::default(), Some("  ".into()), None);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo wörld", 8), "héllo...");
        assert_eq!(truncate("short", 8), "short");
    }

    #[test]
    fn created_at_falls_back_to_raw_text() {
        assert_eq!(format_created_at("2025-07-11T12:00:00Z"), "2025-07-11 12:00:00");
        assert_eq!(format_created_at("yesterday"), "yesterday");
    }
}
