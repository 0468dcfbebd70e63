//! Bounded same-host crawler feeding the ingestion pipeline.
//!
//! Each URL moves through unvisited → fetching → extracted or failed, and
//! is attempted at most once per crawl. The frontier is breadth-first from
//! the seed and stops when the page budget or link-depth limit is reached,
//! or when no unvisited in-scope links remain. A fixed delay between
//! sequential fetches bounds the request rate.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use chrono::{DateTime, Utc};
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;

use crate::chunking::normalize_text;
use crate::config::WebsiteConfig;
use crate::types::RagError;

/// One successfully fetched and extracted page.
#[derive(Debug, Clone)]
pub struct CrawledPage {
    pub url: Url,
    pub title: String,
    pub description: String,
    /// Cleaned text content, ready for chunking.
    pub content: String,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug)]
pub struct Crawler {
    client: Client,
    config: WebsiteConfig,
    base: Url,
    title_selector: Selector,
    description_selector: Selector,
    link_selector: Selector,
    body_selector: Selector,
    main_selectors: Vec<Selector>,
    exclude_selectors: Vec<Selector>,
    text_selector: Selector,
    boilerplate: Option<Regex>,
}

impl Crawler {
    /// Validates the configuration and compiles its selectors.
    pub fn new(config: WebsiteConfig) -> Result<Self, RagError> {
        if config.base_url.trim().is_empty() {
            return Err(RagError::InvalidDocument(
                "crawler base_url is not configured".to_string(),
            ));
        }
        let base = Url::parse(&config.base_url)
            .map_err(|err| RagError::InvalidDocument(format!("base_url: {err}")))?;
        if base.host_str().is_none() {
            return Err(RagError::InvalidDocument(
                "crawler base_url has no host".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.crawling.request_timeout_ms))
            .user_agent(config.crawling.user_agent.clone())
            .use_rustls_tls()
            .build()?;

        let main_selectors = config
            .selectors
            .main_content
            .iter()
            .map(|raw| parse_selector(raw))
            .collect::<Result<_, _>>()?;
        let exclude_selectors = config
            .selectors
            .exclude
            .iter()
            .map(|raw| parse_selector(raw))
            .collect::<Result<_, _>>()?;
        let text_selector = parse_selector(&config.selectors.text_elements.join(", "))?;

        let boilerplate = if config.processing.remove_boilerplate
            && !config.processing.boilerplate_patterns.is_empty()
        {
            let alternation = config
                .processing
                .boilerplate_patterns
                .iter()
                .map(|pattern| regex::escape(pattern))
                .collect::<Vec<_>>()
                .join("|");
            Some(
                Regex::new(&format!(r"(?i)\b(?:{alternation})\b"))
                    .map_err(|err| RagError::InvalidDocument(err.to_string()))?,
            )
        } else {
            None
        };

        Ok(Self {
            client,
            base,
            title_selector: parse_selector("title")?,
            description_selector: parse_selector(r#"meta[name="description"]"#)?,
            link_selector: parse_selector("a[href]")?,
            body_selector: parse_selector("body")?,
            main_selectors,
            exclude_selectors,
            text_selector,
            boilerplate,
            config,
        })
    }

    /// Crawls from the configured seed and returns every page that yielded
    /// usable text, in visit order.
    ///
    /// Fetch failures mark the URL as visited (never retried within the
    /// crawl) and move on; pages with no extractable content still
    /// contribute their links to the frontier.
    pub async fn crawl(&self) -> Result<Vec<CrawledPage>, RagError> {
        let limits = &self.config.crawling;
        let delay = Duration::from_millis(limits.request_delay_ms);
        let mut visited: HashSet<String> = HashSet::new();
        let mut pages: Vec<CrawledPage> = Vec::new();
        let mut frontier: VecDeque<(Url, usize)> = VecDeque::new();
        frontier.push_back((self.base.clone(), 0));

        info!(seed = %self.base, "starting crawl");

        while let Some((url, depth)) = frontier.pop_front() {
            if pages.len() >= limits.max_pages {
                info!(max_pages = limits.max_pages, "page budget exhausted");
                break;
            }
            if !visited.insert(url.as_str().to_string()) {
                continue;
            }

            debug!(%url, depth, "fetching");
            let body = match self.fetch(&url).await {
                Ok(body) => body,
                Err(err) => {
                    warn!(%url, %err, "fetch failed, skipping page");
                    continue;
                }
            };

            let parsed = self.parse_page(&url, &body);
            if let Some(page) = parsed.page {
                debug!(%url, chars = page.content.chars().count(), "extracted content");
                pages.push(page);
            }

            if depth < limits.max_depth {
                for link in parsed.links {
                    if !visited.contains(link.as_str()) {
                        frontier.push_back((link, depth + 1));
                    }
                }
            }

            if !delay.is_zero() && !frontier.is_empty() {
                sleep(delay).await;
            }
        }

        info!(
            pages = pages.len(),
            visited = visited.len(),
            "crawl complete"
        );
        Ok(pages)
    }

    async fn fetch(&self, url: &Url) -> Result<String, RagError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }

    // Parsing is synchronous on purpose: `Html` is not `Send`, so it must
    // not live across an await point.
    fn parse_page(&self, url: &Url, body: &str) -> ParsedPage {
        let document = Html::parse_document(body);

        let title = document
            .select(&self.title_selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Untitled".to_string());
        let description = document
            .select(&self.description_selector)
            .next()
            .and_then(|el| el.value().attr("content"))
            .unwrap_or_default()
            .to_string();

        let content = self.clean_content(&self.extract_content(&document));
        let links = self.extract_links(&document, url);

        let page = if content.is_empty() {
            None
        } else {
            Some(CrawledPage {
                url: url.clone(),
                title,
                description,
                content,
                last_updated: Utc::now(),
            })
        };

        ParsedPage { page, links }
    }

    /// Tries the configured main-content containers in order and falls back
    /// to `body` when none yields text.
    fn extract_content(&self, document: &Html) -> String {
        for selector in &self.main_selectors {
            if let Some(root) = document.select(selector).next() {
                let text = self.collect_text(root);
                if !text.trim().is_empty() {
                    return text;
                }
            }
        }
        document
            .select(&self.body_selector)
            .next()
            .map(|body| self.collect_text(body))
            .unwrap_or_default()
    }

    fn collect_text(&self, root: ElementRef<'_>) -> String {
        let mut out = String::new();
        for element in root.select(&self.text_selector) {
            if self.is_excluded(&element) {
                continue;
            }
            let text = element.text().collect::<String>();
            let text = text.trim();
            if !text.is_empty() {
                out.push_str(text);
                out.push('\n');
            }
        }
        out
    }

    fn is_excluded(&self, element: &ElementRef<'_>) -> bool {
        self.exclude_selectors.iter().any(|selector| {
            selector.matches(element)
                || element
                    .ancestors()
                    .filter_map(ElementRef::wrap)
                    .any(|ancestor| selector.matches(&ancestor))
        })
    }

    fn clean_content(&self, text: &str) -> String {
        let collapsed = normalize_text(text);
        match &self.boilerplate {
            Some(pattern) => normalize_text(&pattern.replace_all(&collapsed, "")),
            None => collapsed,
        }
    }

    /// Same-host links below the current page, minus excluded paths and
    /// fragments, deduplicated in document order.
    fn extract_links(&self, document: &Html, page_url: &Url) -> Vec<Url> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut links = Vec::new();
        for element in document.select(&self.link_selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let Ok(mut link) = page_url.join(href) else {
                continue;
            };
            link.set_fragment(None);
            if !matches!(link.scheme(), "http" | "https") {
                continue;
            }
            if link.host_str() != self.base.host_str() {
                continue;
            }
            if self.config.pages.excludes(link.path()) {
                continue;
            }
            if seen.insert(link.as_str().to_string()) {
                links.push(link);
            }
        }
        links
    }
}

struct ParsedPage {
    page: Option<CrawledPage>,
    links: Vec<Url>,
}

fn parse_selector(raw: &str) -> Result<Selector, RagError> {
    Selector::parse(raw).map_err(|err| RagError::InvalidDocument(format!("selector {raw:?}: {err}")))
}
