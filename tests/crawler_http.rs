//! Crawler behavior against a local mock HTTP server: budgets, depth
//! limits, revisit prevention, and link scoping.

use httpmock::prelude::*;

use ragmill::config::WebsiteConfig;
use ragmill::crawler::Crawler;

fn html_page(body: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{href}">link</a>"#))
        .collect();
    format!(
        "<html><head><title>Page</title></head><body>\
         <main><p>{body}</p></main>{anchors}</body></html>"
    )
}

fn test_config(base_url: String) -> WebsiteConfig {
    let mut config = WebsiteConfig::new(base_url);
    config.crawling.request_delay_ms = 0;
    config
}

#[tokio::test]
async fn crawl_follows_internal_links_and_skips_excluded_paths() {
    let server = MockServer::start_async().await;

    let root = server
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200).header("content-type", "text/html").body(html_page(
                "Welcome to the landing page with plenty of text.",
                &["/a", "/b", "/admin/secret", "https://elsewhere.test/offsite"],
            ));
        })
        .await;
    let page_a = server
        .mock_async(|when, then| {
            when.method(GET).path("/a");
            then.status(200).header("content-type", "text/html").body(html_page(
                "Page A content about services.",
                &["/", "/c"],
            ));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/b");
            then.status(200)
                .header("content-type", "text/html")
                .body(html_page("Page B content about the team.", &[]));
        })
        .await;
    let page_c = server
        .mock_async(|when, then| {
            when.method(GET).path("/c");
            then.status(200)
                .header("content-type", "text/html")
                .body(html_page("Page C sits at depth two.", &["/d"]));
        })
        .await;
    let page_d = server
        .mock_async(|when, then| {
            when.method(GET).path("/d");
            then.status(200)
                .header("content-type", "text/html")
                .body(html_page("Page D would be depth three.", &[]));
        })
        .await;
    let admin = server
        .mock_async(|when, then| {
            when.method(GET).path("/admin/secret");
            then.status(200)
                .header("content-type", "text/html")
                .body(html_page("Never fetched.", &[]));
        })
        .await;

    let crawler = Crawler::new(test_config(server.url("/"))).unwrap();
    let pages = crawler.crawl().await.unwrap();

    let paths: Vec<&str> = pages.iter().map(|p| p.url.path()).collect();
    assert_eq!(paths, vec!["/", "/a", "/b", "/c"]);

    // The seed was fetched exactly once despite the back-link from /a.
    assert_eq!(root.hits_async().await, 1);
    assert_eq!(page_a.hits_async().await, 1);
    assert_eq!(page_c.hits_async().await, 1);
    // Depth limit: links found on a depth-2 page are not followed.
    assert_eq!(page_d.hits_async().await, 0);
    assert_eq!(admin.hits_async().await, 0);
}

#[tokio::test]
async fn crawl_stops_at_the_page_budget() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200).header("content-type", "text/html").body(html_page(
                "Seed page.",
                &["/p1", "/p2", "/p3", "/p4"],
            ));
        })
        .await;
    for i in 1..=4 {
        let body = html_page(&format!("Content of page {i}."), &[]);
        server
            .mock_async(move |when, then| {
                when.method(GET).path(format!("/p{i}"));
                then.status(200)
                    .header("content-type", "text/html")
                    .body(body);
            })
            .await;
    }

    let mut config = test_config(server.url("/"));
    config.crawling.max_pages = 2;
    let crawler = Crawler::new(config).unwrap();
    let pages = crawler.crawl().await.unwrap();

    assert_eq!(pages.len(), 2);
}

#[tokio::test]
async fn failed_fetches_are_skipped_not_fatal() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200).header("content-type", "text/html").body(html_page(
                "Seed page with one dead link.",
                &["/missing", "/ok"],
            ));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/missing");
            then.status(404);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/ok");
            then.status(200)
                .header("content-type", "text/html")
                .body(html_page("Healthy page.", &[]));
        })
        .await;

    let crawler = Crawler::new(test_config(server.url("/"))).unwrap();
    let pages = crawler.crawl().await.unwrap();

    let paths: Vec<&str> = pages.iter().map(|p| p.url.path()).collect();
    assert_eq!(paths, vec!["/", "/ok"]);
}

#[tokio::test]
async fn pages_without_extractable_content_still_contribute_links() {
    let server = MockServer::start_async().await;

    // The seed's only text lives in excluded navigation chrome.
    server
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200).header("content-type", "text/html").body(
                r#"<html><body><nav><p>Menu only</p></nav>
                   <a href="/inner">inner</a></body></html>"#
                    .to_string(),
            );
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/inner");
            then.status(200)
                .header("content-type", "text/html")
                .body(html_page("Inner page has real text.", &[]));
        })
        .await;

    let crawler = Crawler::new(test_config(server.url("/"))).unwrap();
    let pages = crawler.crawl().await.unwrap();

    let paths: Vec<&str> = pages.iter().map(|p| p.url.path()).collect();
    assert_eq!(paths, vec!["/inner"]);
}
