//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a mock listing site and run the full
//! crawl cycle end-to-end over HTTP, with the checkpoint in a temp directory.

use catalog_harvest::catalog::{Catalog, Page};
use catalog_harvest::config::{parse_config, Config};
use catalog_harvest::crawler::{run_crawl, Coordinator};
use catalog_harvest::storage::{open_store, CheckpointStore};
use catalog_harvest::HarvestError;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server and the temp directory
fn create_test_config(base_url: &str, dir: &Path, extra: &str) -> Config {
    parse_config(&format!(
        r#"
[site]
base-url = "{base}"

[crawler]
batch-size = 2
batch-delay-ms = 10
navigation-timeout-ms = 2000
content-wait-timeout-ms = 500
{extra}

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[output]
catalog-path = "{dir}/catalog.json"
progress-path = "{dir}/catalog-progress.json"
summary-path = "{dir}/summary.md"
"#,
        base = base_url,
        extra = extra,
        dir = dir.display()
    ))
    .expect("Failed to parse test config")
}

fn listing_html(ids: &[u32]) -> String {
    let cards: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<div class="span4">
                    <h3><a href="/schematic/{id}/build-{id}/" title="Build {id}">Build {id}</a></h3>
                    <img src="/media/{id}.png">
                </div>"#
            )
        })
        .collect();
    format!("<html><body><div class=\"row\">{}</div></body></html>", cards)
}

fn detail_html(id: u32, category: &str) -> String {
    format!(
        r#"<html><head><title>Build {id} Complete | Schematics</title></head><body>
        <div class="span5"><table><tbody>
            <tr><td>Category</td><td>{category}</td></tr>
        </tbody></table></div>
        </body></html>"#
    )
}

async fn mount_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

async fn mount_listing_page(server: &MockServer, page: u32, ids: &[u32]) {
    mount_html(server, &format!("/latest/{}/", page), listing_html(ids)).await;
    for id in ids {
        mount_html(
            server,
            &format!("/schematic/{id}/build-{id}/"),
            detail_html(*id, "Houses"),
        )
        .await;
    }
}

fn read_json(path: &Path) -> serde_json::Value {
    let content = std::fs::read_to_string(path).expect("Failed to read checkpoint");
    serde_json::from_str(&content).expect("Checkpoint is not valid JSON")
}

#[tokio::test]
async fn test_full_crawl_ends_on_empty_listing_page() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();

    // Page 1: three items, one with a failing detail page
    mount_html(&server, "/latest/1/", listing_html(&[1, 2, 3])).await;
    mount_html(&server, "/schematic/1/build-1/", detail_html(1, "Houses")).await;
    mount_html(&server, "/schematic/3/build-3/", detail_html(3, "Castles")).await;
    Mock::given(method("GET"))
        .and(path("/schematic/2/build-2/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    // Page 2: no matching item cards
    mount_html(
        &server,
        "/latest/2/",
        "<html><body><p>Nothing here</p></body></html>".to_string(),
    )
    .await;

    let config = create_test_config(&base_url, dir.path(), "");
    let coordinator = Coordinator::new(config, true).expect("Failed to create coordinator");
    let report = coordinator.run_to_completion().await;

    assert!(report.is_success(), "crawl failed: {:?}", report.error);
    assert_eq!(report.catalog.len(), 1);

    let items = &report.catalog.pages()[0].items;
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].title, "Build 1 Complete");
    assert_eq!(items[0].category, "Houses");
    assert_eq!(items[1].title, "Build 2");
    assert_eq!(items[1].category, "");
    assert_eq!(items[2].title, "Build 3 Complete");
    assert_eq!(items[2].category, "Castles");

    // The wire format matches the catalog consumer
    let json = read_json(&dir.path().join("catalog.json"));
    let pages = json.as_array().expect("root is an array");
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0]["page"], 1);
    let first = &pages[0]["items"][0];
    assert_eq!(first["title"], "Build 1 Complete");
    assert_eq!(
        first["downloadLink"],
        format!("{}/download/1/", base_url).as_str()
    );
    assert_eq!(
        first["fullUrl"],
        format!("{}/schematic/1/build-1/", base_url).as_str()
    );
    assert_eq!(
        first["imageSrc"],
        format!("{}/media/1.png", base_url).as_str()
    );
    assert_eq!(first["category"], "Houses");
}

#[tokio::test]
async fn test_crawl_bounded_by_discovered_page_count() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();

    mount_html(
        &server,
        "/latest/",
        r#"<html><body><div class="pagination"><ul>
            <li><a href="/latest/1/">1</a></li>
            <li><a href="/latest/2/">2</a></li>
            <li><a href="/latest/2/">Next</a></li>
        </ul></div></body></html>"#
            .to_string(),
    )
    .await;
    mount_listing_page(&server, 1, &[11, 12, 13]).await;
    mount_listing_page(&server, 2, &[21]).await;

    Mock::given(method("GET"))
        .and(path("/latest/3/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_html(&[31])))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(&base_url, dir.path(), "");
    let report = run_crawl(config, true).await.expect("Failed to start crawl");

    assert!(report.is_success());
    let pages: Vec<u32> = report.catalog.pages().iter().map(|p| p.page_number).collect();
    assert_eq!(pages, vec![1, 2]);
    assert_eq!(report.catalog.item_count(), 4);
}

#[tokio::test]
async fn test_resume_continues_after_checkpoint() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&base_url, dir.path(), "");

    // A previous run checkpointed page 1
    let previous = Catalog::from_pages(vec![Page::new(1, vec![])]);
    open_store(&config.output).write_catalog(&previous).unwrap();

    Mock::given(method("GET"))
        .and(path("/latest/1/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_html(&[1])))
        .expect(0)
        .mount(&server)
        .await;
    mount_listing_page(&server, 2, &[21, 22]).await;

    let report = run_crawl(config, false).await.expect("Failed to start crawl");

    assert!(report.is_success());
    let pages: Vec<u32> = report.catalog.pages().iter().map(|p| p.page_number).collect();
    assert_eq!(pages, vec![1, 2]);

    let on_disk = read_json(&dir.path().join("catalog.json"));
    assert_eq!(on_disk.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_dead_origin_ends_through_recovery_path() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    // The listing root fails too, so the page count stays unknown
    let config = create_test_config(&base_url, dir.path(), "max-consecutive-failures = 2");
    let report = run_crawl(config, true).await.expect("Failed to start crawl");

    assert!(!report.completed);
    assert!(matches!(
        report.error,
        Some(HarvestError::TooManyFailures { consecutive: 3 })
    ));
    assert!(report.catalog.is_empty());

    // A valid, empty checkpoint is left behind
    let json = read_json(&dir.path().join("catalog.json"));
    assert_eq!(json, serde_json::json!([]));
}

#[tokio::test]
async fn test_resume_fills_checkpoint_gap() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&base_url, dir.path(), "");

    // A previous run skipped page 2
    let previous = Catalog::from_pages(vec![Page::new(1, vec![]), Page::new(3, vec![])]);
    open_store(&config.output).write_catalog(&previous).unwrap();

    mount_listing_page(&server, 2, &[21, 22]).await;
    Mock::given(method("GET"))
        .and(path("/latest/3/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_html(&[31])))
        .expect(0)
        .mount(&server)
        .await;

    let report = run_crawl(config, false).await.expect("Failed to start crawl");

    assert!(report.is_success());
    let pages: Vec<u32> = report.catalog.pages().iter().map(|p| p.page_number).collect();
    assert_eq!(pages, vec![1, 2, 3]);
    assert_eq!(report.catalog.pages()[1].items.len(), 2);

    let on_disk = read_json(&dir.path().join("catalog.json"));
    let numbers: Vec<u64> = on_disk
        .as_array()
        .expect("root is an array")
        .iter()
        .filter_map(|p| p["page"].as_u64())
        .collect();
    assert_eq!(numbers, vec![1, 2, 3]);
}
