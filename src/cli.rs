//! Command-line interface definitions for the news collector.
//!
//! Every source is opt-in: pass the flags for the sources to collect in this
//! run. Directories can also come from the environment.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments for the news collector.
///
/// # Examples
///
/// ```sh
/// # Hacker News and Medium posts from the last 2 days
/// news_collector -o ./beans --hacker-news --medium
///
/// # Two news sitemaps, with a response cache
/// news_collector -o ./beans \
///     --sitemap https://example.com/news-sitemap.xml \
///     --sitemap https://example.org/sitemap_news.xml \
///     --window-days 1 --cache-dir ./.cache
///
/// # Ad hoc pages
/// news_collector -o ./beans --url https://example.com/story
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Output directory for bean JSON files
    #[arg(short, long, env = "NEWS_COLLECTOR_OUTPUT_DIR")]
    pub output_dir: String,

    /// Google News sitemap to collect (repeatable)
    #[arg(long = "sitemap", value_name = "URL")]
    pub sitemaps: Vec<String>,

    /// Collect Hacker News top stories
    #[arg(long)]
    pub hacker_news: bool,

    /// Collect recent Medium posts
    #[arg(long)]
    pub medium: bool,

    /// Article page to extract directly (repeatable)
    #[arg(long = "url", value_name = "URL")]
    pub urls: Vec<String>,

    /// Page linked from a Reddit post (repeatable)
    #[arg(long = "reddit-link", value_name = "URL")]
    pub reddit_links: Vec<String>,

    /// Keep dated items from this many days back
    #[arg(short, long, default_value_t = 2)]
    pub window_days: u32,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Directory for cached responses
    #[arg(long, env = "CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Requests each source keeps in flight
    #[arg(short, long, default_value_t = crate::fetch::DEFAULT_PARALLELISM)]
    pub parallelism: usize,
}

impl Cli {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Whether any source or page was requested.
    pub fn has_work(&self) -> bool {
        self.hacker_news
            || self.medium
            || !self.sitemaps.is_empty()
            || !self.urls.is_empty()
            || !self.reddit_links.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "news_collector",
            "--output-dir",
            "./beans",
            "--sitemap",
            "https://a.test/news.xml",
            "--sitemap",
            "https://b.test/news.xml",
            "--hacker-news",
            "--timeout-secs",
            "5",
        ]);

        assert_eq!(cli.output_dir, "./beans");
        assert_eq!(cli.sitemaps.len(), 2);
        assert!(cli.hacker_news);
        assert!(!cli.medium);
        assert_eq!(cli.window_days, 2);
        assert_eq!(cli.timeout(), Some(Duration::from_secs(5)));
        assert_eq!(cli.parallelism, crate::fetch::DEFAULT_PARALLELISM);
        assert!(cli.has_work());
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "news_collector",
            "-o",
            "/tmp/beans",
            "-w",
            "7",
            "-p",
            "2",
            "--url",
            "https://a.test/story",
            "--reddit-link",
            "https://b.test/post",
        ]);

        assert_eq!(cli.output_dir, "/tmp/beans");
        assert_eq!(cli.window_days, 7);
        assert_eq!(cli.parallelism, 2);
        assert_eq!(cli.urls, vec!["https://a.test/story"]);
        assert_eq!(cli.reddit_links, vec!["https://b.test/post"]);
        assert_eq!(cli.timeout(), None);
    }

    #[test]
    fn test_no_sources_means_no_work() {
        let cli = Cli::parse_from(["news_collector", "-o", "./beans"]);
        assert!(!cli.has_work());
    }
}
