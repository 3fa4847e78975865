//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use std::fs;
use std::path::Path;
use sumi_glean::config::{Config, CrawlerConfig, HttpConfig, OutputConfig};
use sumi_glean::crawler::Coordinator;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling the given server into `output`
fn create_test_config(seed: &str, output: &Path, max_pages: u32) -> Config {
    let mut config = Config {
        crawler: CrawlerConfig {
            seed_url: seed.to_string(),
            max_pages,
            concurrency: 3,
            polite_delay_ms: 0,
            polite_jitter_ms: 0,
        },
        http: HttpConfig {
            max_retries: 0,
            timeout_secs: 5,
            ..HttpConfig::default()
        },
        output: OutputConfig {
            directory: output.to_string_lossy().to_string(),
            summary_path: Some("summary.md".to_string()),
            ..OutputConfig::default()
        },
        ..Config::default()
    };
    config.extract.title_suffix = " | Test Site".to_string();
    config
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_raw(body.to_string(), "text/html; charset=utf-8")
}

async fn mount_page(server: &MockServer, page: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(html(body))
        .mount(server)
        .await;
}

fn read_records(dir: &TempDir) -> Vec<serde_json::Value> {
    let raw = fs::read_to_string(dir.path().join("output.json")).unwrap();
    serde_json::from_str(&raw).unwrap()
}

fn recorded_urls(dir: &TempDir) -> Vec<String> {
    let mut urls: Vec<String> = read_records(dir)
        .iter()
        .map(|r| r["url"].as_str().unwrap().to_string())
        .collect();
    urls.sort();
    urls
}

#[tokio::test]
async fn test_full_crawl_single_site() {
    let server = MockServer::start().await;
    let base = server.uri();
    let output = tempfile::tempdir().unwrap();

    mount_page(
        &server,
        "/",
        r#"<html><head><title>Home | Test Site</title></head><body>
           <div id="content"><p>Welcome home</p>
           <a href="/a">Page A</a>
           <a href="/report.pdf">Annual report</a>
           <a href="https://other.test/">Elsewhere</a>
           <a href="mailto:info@site.test">Mail</a>
           </div></body></html>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html(
            r#"<html><head><title>Page A | Test Site</title></head><body>
               <div id="content">Details of A
               <table><tr><th>Name</th><th>Value</th></tr><tr><td>x</td><td>1</td></tr></table>
               </div></body></html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/report.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(b"%PDF-1.4 truncated".to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&base, output.path(), 50);
    let coordinator = Coordinator::new(config, "test-hash").unwrap();
    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.pages_claimed, 2);
    assert_eq!(summary.pages_recorded, 2);
    assert_eq!(summary.tables_extracted, 1);
    assert_eq!(summary.documents_extracted + summary.documents_failed, 1);
    assert_eq!(summary.graph_edges, 1);
    assert_eq!(summary.config_hash, "test-hash");

    assert_eq!(
        recorded_urls(&output),
        vec![format!("{}/", base), format!("{}/a", base)]
    );

    let records = read_records(&output);
    let page_a = records
        .iter()
        .find(|r| r["url"] == format!("{}/a", base))
        .unwrap();
    assert_eq!(page_a["title"], "Page A");
    assert!(page_a["content"].as_str().unwrap().contains("Details of A"));
    assert_eq!(page_a["content_secondary_language"], "");

    let graph = fs::read_to_string(output.path().join("site_structure.csv")).unwrap();
    assert_eq!(
        graph,
        format!("source,target\n{}/,{}/a\n", base, base)
    );
    assert!(!graph.contains("other.test"));
    assert!(!graph.contains("report.pdf"));

    let tables = fs::read_to_string(output.path().join("csv/combined_0.csv")).unwrap();
    assert!(tables.starts_with("Name,Value\nx,1\n"));

    let text = fs::read_to_string(output.path().join("text/combined_0.txt")).unwrap();
    assert!(text.contains(&format!("URL: {}/a\n\nDetails of A", base)));

    assert!(output.path().join("pdfs/report.pdf").exists());
    assert!(output.path().join("summary.md").exists());
}

#[tokio::test]
async fn test_variants_of_same_page_fetched_once() {
    let server = MockServer::start().await;
    let base = server.uri();
    let output = tempfile::tempdir().unwrap();

    mount_page(
        &server,
        "/",
        r#"<html><body><main>Home
           <a href="/a">A</a>
           <a href="/a/?x=1">A again</a>
           <a href="/a#top">A anchored</a>
           <a href="a//">A doubled</a>
           </main></body></html>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html(
            r#"<html><body><main>Page A <a href="/">Home</a> <a href="/a">Self</a></main></body></html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&base, output.path(), 50);
    let summary = Coordinator::new(config, "").unwrap().run().await.unwrap();

    assert_eq!(summary.pages_claimed, 2);
    assert_eq!(summary.graph_edges, 2);

    let graph = fs::read_to_string(output.path().join("site_structure.csv")).unwrap();
    assert!(graph.contains(&format!("{}/a,{}/\n", base, base)));
    assert!(!graph.contains(&format!("{}/a,{}/a\n", base, base)));
}

#[tokio::test]
async fn test_page_without_content_is_followed_not_recorded() {
    let server = MockServer::start().await;
    let base = server.uri();
    let output = tempfile::tempdir().unwrap();

    mount_page(
        &server,
        "/",
        r#"<html><body><nav><a href="/deep">Deep</a></nav></body></html>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/deep"))
        .respond_with(html(r#"<html><body><main>Deep content</main></body></html>"#))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&base, output.path(), 50);
    let summary = Coordinator::new(config, "").unwrap().run().await.unwrap();

    assert_eq!(summary.pages_without_content, 1);
    assert_eq!(summary.pages_recorded, 1);
    assert_eq!(recorded_urls(&output), vec![format!("{}/deep", base)]);

    let graph = fs::read_to_string(output.path().join("site_structure.csv")).unwrap();
    assert!(graph.contains(&format!("{}/,{}/deep", base, base)));
}

#[tokio::test]
async fn test_page_budget_caps_claims() {
    let server = MockServer::start().await;
    let base = server.uri();
    let output = tempfile::tempdir().unwrap();

    let links: String = (1..=9)
        .map(|i| format!(r#"<a href="/p{}">P{}</a>"#, i, i))
        .collect();
    mount_page(
        &server,
        "/",
        &format!("<html><body><main>Index {}</main></body></html>", links),
    )
    .await;
    Mock::given(method("GET"))
        .respond_with(html("<html><body><main>Leaf</main></body></html>"))
        .mount(&server)
        .await;

    let config = create_test_config(&base, output.path(), 3);
    let summary = Coordinator::new(config, "").unwrap().run().await.unwrap();

    assert_eq!(summary.pages_claimed, 3);
    assert_eq!(summary.pages_recorded, 3);
    assert_eq!(read_records(&output).len(), 3);

    // edges of the seed page are complete even though the budget ran out
    assert_eq!(summary.graph_edges, 9);
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn test_non_html_and_failed_pages_skipped() {
    let server = MockServer::start().await;
    let base = server.uri();
    let output = tempfile::tempdir().unwrap();

    mount_page(
        &server,
        "/",
        r#"<html><body><main>Home
           <a href="/data">Data</a>
           <a href="/missing">Missing</a>
           <a href="/bare">Bare</a>
           <a href="/archive.zip">Archive</a>
           <a href="/admin/panel">Admin</a>
           </main></body></html>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"a": 1}"#, "application/json"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bare"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"<html>".to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/archive.zip"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/panel"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(&base, output.path(), 50);
    let summary = Coordinator::new(config, "").unwrap().run().await.unwrap();

    assert_eq!(summary.pages_claimed, 4);
    assert_eq!(summary.pages_skipped, 3);
    assert_eq!(summary.pages_recorded, 1);
    assert_eq!(recorded_urls(&output), vec![format!("{}/", base)]);
}

#[tokio::test]
async fn test_secondary_language_variant() {
    let server = MockServer::start().await;
    let base = server.uri();
    let output = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("lang", "hi"))
        .respond_with(html(
            r#"<html><body><nav>मेनू</nav><div id="content">स्वागत है</div></body></html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/",
        r#"<html><body><nav>Menu</nav><div id="content">Welcome</div></body></html>"#,
    )
    .await;

    let mut config = create_test_config(&base, output.path(), 50);
    config.extract.secondary_language = Some("hi".to_string());
    let summary = Coordinator::new(config, "").unwrap().run().await.unwrap();

    assert_eq!(summary.pages_claimed, 1);
    let records = read_records(&output);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["content"], "Welcome");
    assert_eq!(records[0]["content_secondary_language"], "स्वागत है");

    let raw = fs::read_to_string(output.path().join("output.json")).unwrap();
    assert!(raw.contains("स्वागत है"));
}

#[tokio::test]
async fn test_unreachable_seed_still_writes_outputs() {
    let server = MockServer::start().await;
    let base = server.uri();
    let output = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = create_test_config(&base, output.path(), 50);
    let summary = Coordinator::new(config, "").unwrap().run().await.unwrap();

    assert_eq!(summary.pages_claimed, 1);
    assert_eq!(summary.pages_skipped, 1);
    assert_eq!(summary.pages_recorded, 0);
    assert!(read_records(&output).is_empty());
    assert_eq!(
        fs::read_to_string(output.path().join("site_structure.csv")).unwrap(),
        "source,target\n"
    );
    assert!(!output.path().join("text/combined_0.txt").exists());
    assert!(!output.path().join("csv/combined_0.csv").exists());
}

#[tokio::test]
async fn test_documents_disabled() {
    let server = MockServer::start().await;
    let base = server.uri();
    let output = tempfile::tempdir().unwrap();

    mount_page(
        &server,
        "/",
        r#"<html><body><main>Home <a href="/guide.pdf">Guide</a></main></body></html>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/guide.pdf"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config(&base, output.path(), 50);
    config.extract.documents = false;
    let summary = Coordinator::new(config, "").unwrap().run().await.unwrap();

    assert_eq!(summary.documents_extracted, 0);
    assert_eq!(summary.documents_failed, 0);
    assert_eq!(summary.pages_recorded, 1);
}

#[tokio::test]
async fn test_failed_secondary_language_leaves_page_recorded() {
    let server = MockServer::start().await;
    let base = server.uri();
    let output = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("lang", "hi"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .and(query_param("lang", "hi"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"{"hi": true}"#, "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/",
        r#"<html><body><main>English home <a href="/b">B</a></main></body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/b",
        r#"<html><body><main>English B</main></body></html>"#,
    )
    .await;

    let mut config = create_test_config(&base, output.path(), 50);
    config.extract.secondary_language = Some("hi".to_string());
    let summary = Coordinator::new(config, "").unwrap().run().await.unwrap();

    assert_eq!(summary.pages_recorded, 2);
    assert_eq!(summary.pages_skipped, 0);
    for record in read_records(&output) {
        assert!(record["content"].as_str().unwrap().starts_with("English"));
        assert_eq!(record["content_secondary_language"], "");
    }
}

#[tokio::test]
async fn test_redirected_page_resolves_links_against_target() {
    let server = MockServer::start().await;
    let base = server.uri();
    let output = tempfile::tempdir().unwrap();

    mount_page(
        &server,
        "/",
        r#"<html><body><main>Home <a href="/old">Old</a></main></body></html>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new/"))
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/new/",
        r#"<html><body><main>Moved here <a href="child">Child</a></main></body></html>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/new/child"))
        .respond_with(html("<html><body><main>Child page</main></body></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&base, output.path(), 50);
    let summary = Coordinator::new(config, "").unwrap().run().await.unwrap();

    assert_eq!(summary.pages_claimed, 3);
    assert!(recorded_urls(&output).contains(&format!("{}/new/child", base)));

    let graph = fs::read_to_string(output.path().join("site_structure.csv")).unwrap();
    assert!(graph.contains(&format!("{}/old,{}/new/child\n", base, base)));
}
