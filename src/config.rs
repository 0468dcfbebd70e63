//! Configuration for the website source: crawl limits, content selectors,
//! and chunk processing.
//!
//! All structs carry serde derives so a deployment can load them from a JSON
//! or TOML file; the `Default` impls encode the values a small marketing-site
//! corpus needs out of the box.

use serde::{Deserialize, Serialize};

use crate::chunking::{DEFAULT_OVERLAP, DEFAULT_TARGET_SIZE};

/// Complete configuration for crawling and processing one website corpus.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WebsiteConfig {
    /// Seed URL the crawl starts from. Must be set; an empty value is
    /// rejected when the crawler is constructed.
    pub base_url: String,
    pub crawling: CrawlLimits,
    pub pages: PageFilters,
    pub selectors: ContentSelectors,
    pub processing: ProcessingConfig,
}

impl WebsiteConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

/// Budget and pacing limits for a crawl.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlLimits {
    /// Maximum link-depth from the seed URL (0 = seed page only).
    pub max_depth: usize,
    /// Maximum number of pages to extract.
    pub max_pages: usize,
    /// Delay between sequential fetches, in milliseconds.
    pub request_delay_ms: u64,
    /// Per-request timeout, in milliseconds.
    pub request_timeout_ms: u64,
    pub user_agent: String,
}

impl Default for CrawlLimits {
    fn default() -> Self {
        Self {
            max_depth: 2,
            max_pages: 50,
            request_delay_ms: 1000,
            request_timeout_ms: 10_000,
            user_agent: "ragmill-crawler/0.1 (content ingestion)".to_string(),
        }
    }
}

/// Path patterns that keep a discovered link out of the crawl frontier.
///
/// A pattern starting with `*` matches as a path suffix (`*.pdf`); any other
/// pattern matches as a path substring (`/admin`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PageFilters {
    pub exclude: Vec<String>,
}

impl PageFilters {
    pub fn excludes(&self, path: &str) -> bool {
        self.exclude.iter().any(|pattern| {
            if let Some(suffix) = pattern.strip_prefix('*') {
                path.ends_with(suffix)
            } else {
                path.contains(pattern.as_str())
            }
        })
    }
}

impl Default for PageFilters {
    fn default() -> Self {
        Self {
            exclude: [
                "/admin",
                "/login",
                "/register",
                "/cart",
                "/checkout",
                "/account",
                "/api",
                "/wp-admin",
                "/wp-content",
                "*.pdf",
                "*.jpg",
                "*.png",
                "*.gif",
                "*.css",
                "*.js",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
        }
    }
}

/// CSS selectors steering text extraction from fetched pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentSelectors {
    /// Candidate main-content containers, tried in order; `body` is the
    /// fallback when none yields text.
    pub main_content: Vec<String>,
    /// Elements whose text is never collected (navigation, chrome, ads).
    pub exclude: Vec<String>,
    /// Elements whose text is collected from within the chosen container.
    pub text_elements: Vec<String>,
}

impl Default for ContentSelectors {
    fn default() -> Self {
        Self {
            main_content: [
                "main",
                "article",
                ".content",
                ".main-content",
                "#content",
                ".post-content",
                ".page-content",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
            exclude: [
                "nav",
                "header",
                "footer",
                ".navigation",
                ".navbar",
                ".sidebar",
                ".ads",
                ".advertisement",
                ".social-share",
                ".comments",
                ".related-posts",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
            text_elements: [
                "h1",
                "h2",
                "h3",
                "h4",
                "h5",
                "h6",
                "p",
                "li",
                "td",
                "th",
                "blockquote",
                "div",
                "span",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
        }
    }
}

/// Chunk sizing and boilerplate stripping applied to extracted text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Chunks shorter than this (in characters) are discarded.
    pub min_chunk_length: usize,
    /// Target chunk window size in characters.
    pub max_chunk_length: usize,
    /// Overlap between consecutive chunk windows in characters.
    pub chunk_overlap: usize,
    pub remove_boilerplate: bool,
    /// Phrases stripped from page text before chunking. Matched
    /// case-insensitively on word boundaries, treated as literals.
    pub boilerplate_patterns: Vec<String>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            min_chunk_length: 100,
            max_chunk_length: DEFAULT_TARGET_SIZE,
            chunk_overlap: DEFAULT_OVERLAP,
            remove_boilerplate: true,
            boilerplate_patterns: [
                "cookie policy",
                "privacy policy",
                "terms of service",
                "all rights reserved",
                "copyright",
                "follow us on",
                "subscribe to our newsletter",
                "read more",
                "learn more",
                "click here",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_filters_match_prefix_and_suffix_patterns() {
        let filters = PageFilters::default();
        assert!(filters.excludes("/admin/settings"));
        assert!(filters.excludes("/assets/logo.png"));
        assert!(filters.excludes("/docs/manual.pdf"));
        assert!(!filters.excludes("/services"));
        assert!(!filters.excludes("/pdf-guide"));
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = WebsiteConfig::new("https://example.com/");
        let encoded = serde_json::to_string(&config).unwrap();
        let decoded: WebsiteConfig = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.base_url, "https://example.com/");
        assert_eq!(decoded.crawling.max_pages, 50);
        assert_eq!(decoded.processing.chunk_overlap, 200);
    }
}
