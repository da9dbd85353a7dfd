//! The depth-first crawl that fetches, saves and follows resources.

use crate::error::{Result, ScanError};
use crate::extract::{extract_css_references, extract_references, resolve_reference};
use crate::path::{ContentClass, OutputPlan, map_output_path};
use crate::result::{CrawlOutcome, CrawlResult};
use crate::rewrite::OriginRewriter;
use crate::sink::{FsSink, OutputSink};
use futures::future::BoxFuture;
use reqwest::Client;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use url::{Origin, Url};

pub type ProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = concat!("prerender/", env!("CARGO_PKG_VERSION"));

/// A single successful response, held only until it is saved.
struct FetchedResource {
    url: Url,
    status_code: u16,
    content_type: Option<String>,
    content_length: Option<u64>,
    response_time: Duration,
    body: Vec<u8>,
}

/// Depth-first, single-origin mirroring crawler.
///
/// Every distinct URL path is fetched at most once per `Crawler`; the visited
/// set is owned by the instance, so independent crawlers never share state.
pub struct Crawler {
    client: Client,
    origin: Origin,
    output_root: PathBuf,
    rewriter: OriginRewriter,
    visited: HashSet<String>,
    results: Vec<CrawlResult>,
    sink: Box<dyn OutputSink>,
    progress_callback: Option<ProgressCallback>,
}

impl Crawler {
    pub fn new(target: &Url, output_root: impl Into<PathBuf>) -> Result<Self> {
        Self::with_client_config(target, output_root, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT)
    }

    pub fn with_client_config(
        target: &Url,
        output_root: impl Into<PathBuf>,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self> {
        let origin = target.origin();
        if !origin.is_tuple() {
            return Err(ScanError::InvalidUrl(format!(
                "{} has no network origin",
                target
            )));
        }

        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            rewriter: OriginRewriter::from_origin(&origin),
            origin,
            output_root: output_root.into(),
            visited: HashSet::new(),
            results: Vec::new(),
            sink: Box::new(FsSink),
            progress_callback: None,
        })
    }

    pub fn with_sink(mut self, sink: Box<dyn OutputSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Mirror everything reachable from `seed` and return one result per
    /// fetched URL. The seed must share the crawler's origin.
    pub async fn crawl(&mut self, seed: Url) -> Result<Vec<CrawlResult>> {
        if seed.origin() != self.origin {
            return Err(ScanError::InvalidUrl(format!(
                "seed {} is outside of {}",
                seed,
                self.origin.ascii_serialization()
            )));
        }

        info!(
            "Prerendering {} into {}",
            seed,
            self.output_root.display()
        );
        self.prerender(seed).await;
        info!("Prerender complete. Visited {} paths", self.visited.len());

        Ok(std::mem::take(&mut self.results))
    }

    /// Fetch and save `url`, recursing into the same-origin resources it
    /// references. A path that was already visited is a no-op.
    pub fn prerender(&mut self, url: Url) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            if !self.visited.insert(url.path().to_string()) {
                return;
            }

            if let Some(ref callback) = self.progress_callback {
                callback(url.path().to_string());
            }

            match Self::fetch(&self.client, &url).await {
                Ok(resource) => self.save(resource, &url).await,
                Err(e) => {
                    warn!("Failed to fetch {}: {}", url, e);
                    let mut result = CrawlResult::with_error(url.to_string(), e.to_string());
                    if let ScanError::Status { status, .. } = e {
                        result.status_code = status;
                    }
                    self.results.push(result);
                }
            }
        })
    }

    async fn fetch(client: &Client, url: &Url) -> Result<FetchedResource> {
        debug!("Fetching {}", url);

        let start = Instant::now();
        let response = client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let content_length = response.content_length();
        let body = response.bytes().await?.to_vec();

        Ok(FetchedResource {
            url: final_url,
            status_code: status.as_u16(),
            content_type,
            content_length,
            response_time: start.elapsed(),
            body,
        })
    }

    async fn save(&mut self, resource: FetchedResource, requested: &Url) {
        let FetchedResource {
            url,
            status_code,
            content_type,
            content_length,
            response_time,
            body,
        } = resource;

        let mut result = CrawlResult::new(url.to_string());
        result.status_code = status_code;
        result.content_type = content_type.clone();
        result.content_length = content_length;
        result.response_time = response_time;

        if url.origin() != self.origin {
            warn!("{} redirected off-origin to {}, skipping", requested, url);
            result.outcome = CrawlOutcome::Skipped {
                reason: "redirected off-origin".to_string(),
            };
            self.results.push(result);
            return;
        }

        if url.path() != requested.path() && !self.visited.insert(url.path().to_string()) {
            debug!("{} redirected to already visited {}", requested, url.path());
            result.outcome = CrawlOutcome::Skipped {
                reason: format!("redirect target {} already visited", url.path()),
            };
            self.results.push(result);
            return;
        }

        let class = ContentClass::from_content_type(content_type.as_deref());
        let plan = map_output_path(url.path(), class);
        let Some(output_path) = plan.resolve(&self.output_root) else {
            if let OutputPlan::Ambiguous { relative } = &plan {
                warn!("Skipping ambiguous directory resource: {}", relative);
            }
            result.outcome = CrawlOutcome::Skipped {
                reason: "ambiguous directory path".to_string(),
            };
            self.results.push(result);
            return;
        };

        let written = match class {
            ContentClass::Binary => self.sink.write_new(&output_path, &body),
            _ => match String::from_utf8(body) {
                Ok(text) => {
                    if class.is_scannable() {
                        let references = references_in(class, &text);
                        result.references_found = references.len();
                        self.follow(&url, references).await;
                    }

                    let text = self.rewriter.rewrite(&text);
                    self.sink.write(&output_path, text.as_bytes())
                }
                Err(e) => {
                    warn!("{} is not valid UTF-8, saving it unmodified", url);
                    if class.is_scannable() {
                        let references =
                            references_in(class, &String::from_utf8_lossy(e.as_bytes()));
                        result.references_found = references.len();
                        self.follow(&url, references).await;
                    }
                    self.sink.write(&output_path, e.as_bytes())
                }
            },
        };

        match written {
            Ok(()) => {
                info!("Saved {} -> {}", url.path(), output_path.display());
                result.output_path = Some(output_path);
            }
            Err(e) => {
                error!("Failed to write {}: {}", output_path.display(), e);
                result.outcome = CrawlOutcome::WriteFailed {
                    error: e.to_string(),
                };
            }
        }

        self.results.push(result);
    }

    /// Crawl each reference in order, each subtree completing before the
    /// next sibling starts.
    async fn follow(&mut self, page_url: &Url, references: Vec<String>) {
        for reference in references {
            let Some(url) = resolve_reference(page_url, &reference) else {
                debug!("Ignoring non-fetchable reference: {}", reference);
                continue;
            };

            if url.origin() != self.origin {
                debug!("Skipping resource: {}", url);
                continue;
            }

            self.prerender(url).await;
        }
    }

    pub fn has_visited(&self, path: &str) -> bool {
        self.visited.contains(path)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}

fn references_in(class: ContentClass, text: &str) -> Vec<String> {
    match class {
        ContentClass::Css => extract_css_references(text),
        _ => extract_references(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    async fn mount_html(server: &MockServer, at: &str, body: String) {
        Mock::given(method("GET"))
            .and(path(at))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(body, "text/html; charset=utf-8"),
            )
            .expect(1)
            .mount(server)
            .await;
    }

    fn base(server: &MockServer) -> Url {
        Url::parse(&server.uri()).unwrap()
    }

    /// Seed page linking a subpage, an image and an external host.
    #[tokio::test]
    async fn test_mirror_scenario() {
        let server = MockServer::start().await;
        let out = tempdir().unwrap();

        let root_html = format!(
            r#"<html><body>
                <a href="/post/">Post</a>
                <img src="/img.png">
                <a href="https://other.test/x">Elsewhere</a>
                <a href="{}/post/">Absolute</a>
            </body></html>"#,
            server.uri()
        );
        mount_html(&server, "/", root_html).await;
        mount_html(&server, "/post/", "<html><body>Post</body></html>".to_string()).await;

        let png: Vec<u8> = vec![0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0xff];
        Mock::given(method("GET"))
            .and(path("/img.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(png.clone()),
            )
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/x"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut crawler = Crawler::new(&base(&server), out.path()).unwrap();
        let results = crawler.crawl(base(&server)).await.unwrap();

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.is_saved()));
        assert!(!crawler.has_visited("/x"));

        let index = fs::read_to_string(out.path().join("index.html")).unwrap();
        assert!(!index.contains(&server.uri()));
        assert!(index.contains(r#"<a href="/post/">Absolute</a>"#));
        assert!(index.contains("https://other.test/x"));

        assert!(out.path().join("post/index.html").exists());
        assert_eq!(fs::read(out.path().join("img.png")).unwrap(), png);
    }

    #[tokio::test]
    async fn test_cycles_fetch_each_path_once() {
        let server = MockServer::start().await;
        let out = tempdir().unwrap();

        mount_html(
            &server,
            "/",
            r#"<a href="/">Home</a><a href="/a">A</a><a href="/b">B</a>"#.to_string(),
        )
        .await;
        mount_html(
            &server,
            "/a",
            r#"<a href="/b">B</a><a href="/a?again=1">A</a><a href="/">Home</a>"#.to_string(),
        )
        .await;
        mount_html(&server, "/b", r#"<a href="/a">A</a>"#.to_string()).await;

        let mut crawler = Crawler::new(&base(&server), out.path()).unwrap();
        let results = crawler.crawl(base(&server)).await.unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(crawler.visited_count(), 3);
        assert!(out.path().join("a.html").exists());
        assert!(out.path().join("b.html").exists());
    }

    #[tokio::test]
    async fn test_depth_first_document_order() {
        let server = MockServer::start().await;
        let out = tempdir().unwrap();

        mount_html(&server, "/", r#"<a href="/a/"></a><a href="/b/"></a>"#.to_string()).await;
        mount_html(&server, "/a/", r#"<a href="/a/deep/"></a>"#.to_string()).await;
        mount_html(&server, "/a/deep/", String::new()).await;
        mount_html(&server, "/b/", String::new()).await;

        let mut crawler = Crawler::new(&base(&server), out.path()).unwrap();
        crawler.crawl(base(&server)).await.unwrap();

        let order: Vec<String> = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|r| r.url.path().to_string())
            .collect();
        assert_eq!(order, vec!["/", "/a/", "/a/deep/", "/b/"]);
    }

    #[tokio::test]
    async fn test_failed_fetch_does_not_stop_siblings() {
        let server = MockServer::start().await;
        let out = tempdir().unwrap();

        mount_html(
            &server,
            "/",
            r#"<a href="/missing"></a><a href="/present"></a>"#.to_string(),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        mount_html(&server, "/present", "here".to_string()).await;

        let mut crawler = Crawler::new(&base(&server), out.path()).unwrap();
        let results = crawler.crawl(base(&server)).await.unwrap();

        let missing = results
            .iter()
            .find(|r| r.url.ends_with("/missing"))
            .unwrap();
        assert!(missing.is_failed());
        assert!(!missing.is_write_failure());
        assert_eq!(missing.status_code, 404);
        assert!(!out.path().join("missing.html").exists());
        assert!(out.path().join("present.html").exists());
    }

    #[tokio::test]
    async fn test_relative_references_resolve_against_page() {
        let server = MockServer::start().await;
        let out = tempdir().unwrap();

        mount_html(&server, "/", r#"<a href="/blog/post/"></a>"#.to_string()).await;
        mount_html(
            &server,
            "/blog/post/",
            r#"<img srcset="./cover.png 1x, ../thumb.png 2x">"#.to_string(),
        )
        .await;
        for image in ["/blog/post/cover.png", "/blog/thumb.png"] {
            Mock::given(method("GET"))
                .and(path(image))
                .respond_with(
                    ResponseTemplate::new(200)
                        .insert_header("content-type", "image/png")
                        .set_body_bytes(vec![1, 2, 3]),
                )
                .expect(1)
                .mount(&server)
                .await;
        }

        let mut crawler = Crawler::new(&base(&server), out.path()).unwrap();
        crawler.crawl(base(&server)).await.unwrap();

        assert!(out.path().join("blog/post/cover.png").exists());
        assert!(out.path().join("blog/thumb.png").exists());
    }

    #[tokio::test]
    async fn test_stylesheet_references_are_followed() {
        let server = MockServer::start().await;
        let out = tempdir().unwrap();

        mount_html(&server, "/", r#"<link rel="stylesheet" href="/css/site.css">"#.to_string()).await;
        let css = format!("body {{ background: url('{}/img/bg.jpg') }}", server.uri());
        Mock::given(method("GET"))
            .and(path("/css/site.css"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(css, "text/css"),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/img/bg.jpg"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/jpeg")
                    .set_body_bytes(vec![0xff, 0xd8]),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut crawler = Crawler::new(&base(&server), out.path()).unwrap();
        crawler.crawl(base(&server)).await.unwrap();

        let saved = fs::read_to_string(out.path().join("css/site.css")).unwrap();
        assert_eq!(saved, "body { background: url('/img/bg.jpg') }");
        assert!(out.path().join("img/bg.jpg").exists());
    }

    #[tokio::test]
    async fn test_ambiguous_directory_is_skipped() {
        let server = MockServer::start().await;
        let out = tempdir().unwrap();

        mount_html(&server, "/", r#"<a href="/api/"></a>"#.to_string()).await;
        Mock::given(method("GET"))
            .and(path("/api/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("{}", "application/json"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut crawler = Crawler::new(&base(&server), out.path()).unwrap();
        let results = crawler.crawl(base(&server)).await.unwrap();

        let api = results.iter().find(|r| r.url.ends_with("/api/")).unwrap();
        assert!(api.is_skipped());
        assert!(!out.path().join("api").exists());
    }

    #[tokio::test]
    async fn test_binary_collision_is_reported() {
        let server = MockServer::start().await;
        let out = tempdir().unwrap();
        fs::write(out.path().join("logo.png"), b"stale").unwrap();

        mount_html(&server, "/", r#"<img src="/logo.png">"#.to_string()).await;
        Mock::given(method("GET"))
            .and(path("/logo.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(vec![9, 9]),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut crawler = Crawler::new(&base(&server), out.path()).unwrap();
        let results = crawler.crawl(base(&server)).await.unwrap();

        let logo = results.iter().find(|r| r.url.ends_with("/logo.png")).unwrap();
        assert!(logo.is_write_failure());
        assert_eq!(fs::read(out.path().join("logo.png")).unwrap(), b"stale");
        assert!(out.path().join("index.html").exists());
    }

    #[tokio::test]
    async fn test_redirect_saves_under_final_path() {
        let server = MockServer::start().await;
        let out = tempdir().unwrap();

        mount_html(&server, "/", r#"<a href="/old"></a><a href="/new/"></a>"#.to_string()).await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(ResponseTemplate::new(301).insert_header("location", "/new/"))
            .expect(1)
            .mount(&server)
            .await;
        mount_html(&server, "/new/", "moved".to_string()).await;

        let mut crawler = Crawler::new(&base(&server), out.path()).unwrap();
        crawler.crawl(base(&server)).await.unwrap();

        assert!(crawler.has_visited("/new/"));
        assert!(out.path().join("new/index.html").exists());
        assert!(!out.path().join("old.html").exists());
    }

    #[tokio::test]
    async fn test_legacy_encoded_page_is_still_followed() {
        let server = MockServer::start().await;
        let out = tempdir().unwrap();

        let body = b"<p>caf\xE9</p><a href=\"/child\">Child</a>".to_vec();
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(body.clone(), "text/html; charset=windows-1252"),
            )
            .expect(1)
            .mount(&server)
            .await;
        mount_html(&server, "/child", "child".to_string()).await;

        let mut crawler = Crawler::new(&base(&server), out.path()).unwrap();
        let results = crawler.crawl(base(&server)).await.unwrap();

        assert_eq!(results.len(), 2);
        assert!(crawler.has_visited("/child"));
        assert_eq!(fs::read(out.path().join("index.html")).unwrap(), body);
        assert!(out.path().join("child.html").exists());
    }

    #[tokio::test]
    async fn test_redirect_to_visited_path_is_skipped() {
        let server = MockServer::start().await;

        mount_html(&server, "/", r#"<a href="/new/"></a><a href="/old"></a>"#.to_string()).await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(ResponseTemplate::new(301).insert_header("location", "/new/"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new/"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("moved", "text/html"))
            .expect(2)
            .mount(&server)
            .await;

        let sink = RecordingSink::default();
        let mut crawler = Crawler::new(&base(&server), "out")
            .unwrap()
            .with_sink(Box::new(sink.clone()));
        let results = crawler.crawl(base(&server)).await.unwrap();

        let redirected = results.iter().filter(|r| r.is_skipped()).collect::<Vec<_>>();
        assert_eq!(redirected.len(), 1);
        assert!(redirected[0].url.ends_with("/new/"));

        let writes = sink.writes.lock().unwrap().clone();
        assert_eq!(
            writes,
            vec![
                (PathBuf::from("out/new/index.html"), false),
                (PathBuf::from("out/index.html"), false),
            ]
        );
    }

    #[tokio::test]
    async fn test_off_origin_redirect_is_skipped() {
        let server = MockServer::start().await;
        let elsewhere = MockServer::start().await;
        let out = tempdir().unwrap();

        mount_html(&server, "/", r#"<a href="/away"></a>"#.to_string()).await;
        Mock::given(method("GET"))
            .and(path("/away"))
            .respond_with(
                ResponseTemplate::new(301)
                    .insert_header("location", format!("{}/landing", elsewhere.uri()).as_str()),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/landing"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("far away", "text/html"))
            .expect(1)
            .mount(&elsewhere)
            .await;

        let mut crawler = Crawler::new(&base(&server), out.path()).unwrap();
        let results = crawler.crawl(base(&server)).await.unwrap();

        let away = results
            .iter()
            .find(|r| r.url.starts_with(&elsewhere.uri()))
            .unwrap();
        assert!(away.is_skipped());
        assert!(away.output_path.is_none());
        assert!(!out.path().join("away.html").exists());
        assert!(!out.path().join("landing.html").exists());
        assert!(!crawler.has_visited("/landing"));
    }

    #[derive(Clone, Default)]
    struct RecordingSink {
        writes: Arc<std::sync::Mutex<Vec<(PathBuf, bool)>>>,
    }

    impl OutputSink for RecordingSink {
        fn write(&mut self, path: &std::path::Path, _bytes: &[u8]) -> Result<()> {
            self.writes.lock().unwrap().push((path.to_path_buf(), false));
            Ok(())
        }

        fn write_new(&mut self, path: &std::path::Path, _bytes: &[u8]) -> Result<()> {
            self.writes.lock().unwrap().push((path.to_path_buf(), true));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_binary_uses_exclusive_write() {
        let server = MockServer::start().await;
        mount_html(&server, "/", r#"<img src="/a.gif"><a href="/notes.txt"></a>"#.to_string()).await;
        Mock::given(method("GET"))
            .and(path("/a.gif"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/gif")
                    .set_body_bytes(vec![0x47, 0x49, 0x46]),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/notes.txt"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("notes", "text/plain"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let sink = RecordingSink::default();
        let mut crawler = Crawler::new(&base(&server), "out")
            .unwrap()
            .with_sink(Box::new(sink.clone()));
        crawler.crawl(base(&server)).await.unwrap();

        let writes = sink.writes.lock().unwrap().clone();
        assert_eq!(
            writes,
            vec![
                (PathBuf::from("out/a.gif"), true),
                (PathBuf::from("out/notes.txt"), false),
                (PathBuf::from("out/index.html"), false),
            ]
        );
    }

    #[tokio::test]
    async fn test_seed_outside_origin_is_rejected() {
        let out = tempdir().unwrap();
        let target = Url::parse("https://example.test/").unwrap();
        let mut crawler = Crawler::new(&target, out.path()).unwrap();

        let err = crawler
            .crawl(Url::parse("https://other.test/").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::InvalidUrl(_)));
        assert_eq!(crawler.visited_count(), 0);
    }
}
