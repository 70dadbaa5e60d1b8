//! The directory service: fetch, extract, cache, and fall back.

use std::sync::Arc;
use std::time::Instant;

use facdir_core::{DirectoryConfig, Error, FacultyEntry, FetchBackend, Result};
use tokio::sync::Mutex;

use crate::cache::{CacheRecord, FacultyCache};
use crate::pipeline::Extractor;

pub struct FacultyDirectory {
    fetcher: Arc<dyn FetchBackend>,
    cfg: DirectoryConfig,
    extractor: Arc<Extractor>,
    cache: FacultyCache,
    refresh_lock: Mutex<()>,
}

impl FacultyDirectory {
    pub fn new(fetcher: Arc<dyn FetchBackend>, cfg: DirectoryConfig) -> Result<Self> {
        Self::with_cache(fetcher, cfg, FacultyCache::new())
    }

    /// Use an existing cache, e.g. one pre-seeded in tests or shared with another owner.
    pub fn with_cache(
        fetcher: Arc<dyn FetchBackend>,
        cfg: DirectoryConfig,
        cache: FacultyCache,
    ) -> Result<Self> {
        cfg.validate()?;
        let extractor = Arc::new(Extractor::new(&cfg)?);
        Ok(Self {
            fetcher,
            cfg,
            extractor,
            cache,
            refresh_lock: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &DirectoryConfig {
        &self.cfg
    }

    pub fn cache(&self) -> &FacultyCache {
        &self.cache
    }

    pub fn fallback(&self) -> Vec<FacultyEntry> {
        self.cfg.fallback.clone()
    }

    /// Current cache contents, fresh or not. Never touches the network.
    pub async fn cached(&self) -> Option<CacheRecord> {
        self.cache.get().await
    }

    /// Always returns a non-empty list: fresh cache, new scrape, stale cache, or fallback.
    pub async fn get_faculty_list(&self) -> Vec<FacultyEntry> {
        let ttl = self.cfg.freshness();
        if let Some(data) = self.cache.get_fresh(ttl).await {
            tracing::debug!(entries = data.len(), "serving fresh cache");
            return data;
        }

        let _guard = self.refresh_lock.lock().await;
        // Another caller may have refreshed while we waited.
        if let Some(data) = self.cache.get_fresh(ttl).await {
            tracing::debug!(entries = data.len(), "cache refreshed by a concurrent caller");
            return data;
        }

        match self.refresh_locked().await {
            Ok(data) if !data.is_empty() => data,
            Ok(_) => {
                tracing::warn!(url = %self.cfg.source_url, "extraction found no entries");
                self.stale_or_fallback().await
            }
            Err(e) => {
                tracing::warn!(url = %self.cfg.source_url, error = %e, "refresh failed");
                self.stale_or_fallback().await
            }
        }
    }

    /// Run the pipeline now, ignoring freshness. Non-empty results replace the cache.
    pub async fn refresh(&self) -> Result<Vec<FacultyEntry>> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> Result<Vec<FacultyEntry>> {
        let data = self.scrape().await?;
        if self.cache.set(data.clone()).await {
            tracing::info!(entries = data.len(), "faculty cache updated");
        }
        Ok(data)
    }

    /// Fetch and extract without touching the cache.
    pub async fn scrape(&self) -> Result<Vec<FacultyEntry>> {
        let t0 = Instant::now();
        let req = self.cfg.fetch_request();
        let resp = self.fetcher.fetch(&req).await?;
        if !resp.is_success() {
            return Err(Error::HttpStatus {
                status: resp.status,
                url: resp.final_url,
            });
        }
        tracing::debug!(
            url = %resp.final_url,
            bytes = resp.bytes.len(),
            truncated = resp.truncated,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "fetched source page"
        );

        let html = resp.text_lossy();
        let base = resp.final_url;
        let extractor = self.extractor.clone();
        let data =
            tokio::task::spawn_blocking(move || extractor.extract(&html, Some(base.as_str())))
                .await
                .map_err(|e| Error::Extract(format!("extraction task failed: {e}")))??;

        tracing::info!(
            entries = data.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "scraped faculty list"
        );
        Ok(data)
    }

    async fn stale_or_fallback(&self) -> Vec<FacultyEntry> {
        match self.cache.get().await {
            Some(rec) => {
                tracing::info!(
                    entries = rec.data.len(),
                    age_s = rec.age().as_secs(),
                    "serving stale cache"
                );
                rec.data
            }
            None => {
                tracing::info!("serving static fallback list");
                self.fallback()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facdir_core::{FetchRequest, FetchResponse, DEFAULT_SENTINEL_DEPARTMENT};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, SystemTime};

    const PAGE: &str = r#"<html><body>
        <h2>Department of Mathematics</h2>
        <h3>Prof. Jane Doe</h3>
        <p>Associate Professor</p>
    </body></html>"#;

    enum Reply {
        Page(&'static str),
        Status(u16),
        Down,
    }

    struct CountingFetcher {
        calls: AtomicUsize,
        reply: std::sync::Mutex<Reply>,
        delay: Duration,
    }

    impl CountingFetcher {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                reply: std::sync::Mutex::new(reply),
                delay: Duration::ZERO,
            })
        }

        fn slow(reply: Reply, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                reply: std::sync::Mutex::new(reply),
                delay,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn set_reply(&self, reply: Reply) {
            *self.reply.lock().unwrap() = reply;
        }
    }

    #[async_trait::async_trait]
    impl FetchBackend for CountingFetcher {
        async fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let (status, body) = match &*self.reply.lock().unwrap() {
                Reply::Page(html) => (200, html.as_bytes().to_vec()),
                Reply::Status(s) => (*s, b"error".to_vec()),
                Reply::Down => return Err(Error::Fetch("connection refused".to_string())),
            };
            Ok(FetchResponse {
                url: req.url.clone(),
                final_url: req.url.clone(),
                status,
                content_type: Some("text/html".to_string()),
                bytes: body,
                truncated: false,
            })
        }
    }

    fn directory(f: Arc<CountingFetcher>) -> FacultyDirectory {
        let cfg = DirectoryConfig::for_source("https://example.edu/faculty.html");
        FacultyDirectory::new(f, cfg).unwrap()
    }

    #[tokio::test]
    async fn end_to_end_heading_and_person() {
        let f = CountingFetcher::new(Reply::Page(PAGE));
        let d = directory(f.clone());
        let out = d.get_faculty_list().await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "Prof. Jane Doe");
        assert_eq!(out[0].department, "Mathematics");
        assert!(out[0].designation.contains("Associate Professor"));
        assert_eq!(f.calls(), 1);
    }

    #[tokio::test]
    async fn fresh_cache_skips_the_network() {
        let f = CountingFetcher::new(Reply::Page(PAGE));
        let d = directory(f.clone());
        let a = d.get_faculty_list().await;
        let b = d.get_faculty_list().await;
        assert_eq!(a, b);
        assert_eq!(f.calls(), 1);
    }

    #[tokio::test]
    async fn expired_cache_triggers_exactly_one_fetch() {
        let f = CountingFetcher::new(Reply::Page(PAGE));
        let d = directory(f.clone());
        let old = vec![d.fallback()[0].clone()];
        d.cache()
            .set_at(old, SystemTime::now() - Duration::from_secs(7 * 3600))
            .await;

        let out = d.get_faculty_list().await;
        assert_eq!(f.calls(), 1);
        assert_eq!(out[0].name, "Prof. Jane Doe");
        d.get_faculty_list().await;
        assert_eq!(f.calls(), 1);
    }

    #[tokio::test]
    async fn failure_without_cache_serves_fallback() {
        for reply in [Reply::Down, Reply::Status(500)] {
            let f = CountingFetcher::new(reply);
            let d = directory(f.clone());
            let out = d.get_faculty_list().await;
            assert!(!out.is_empty());
            assert_eq!(out, d.fallback());
            assert!(out.iter().all(|e| e.department == DEFAULT_SENTINEL_DEPARTMENT));
            // The fallback is never cached.
            assert!(d.cached().await.is_none());
        }
    }

    #[tokio::test]
    async fn failure_with_stale_cache_serves_prior_result() {
        let f = CountingFetcher::new(Reply::Page(PAGE));
        let cfg = DirectoryConfig {
            freshness_s: 0,
            ..DirectoryConfig::for_source("https://example.edu/faculty.html")
        };
        let d = FacultyDirectory::new(f.clone(), cfg).unwrap();
        let first = d.get_faculty_list().await;

        f.set_reply(Reply::Status(503));
        let second = d.get_faculty_list().await;
        assert_eq!(first, second);
        assert_eq!(f.calls(), 2);
    }

    #[tokio::test]
    async fn zero_entry_scrape_keeps_existing_cache() {
        let f = CountingFetcher::new(Reply::Page(
            "<html><body><p>Under maintenance</p></body></html>",
        ));
        let d = directory(f.clone());

        // No cache: fallback, nothing stored.
        assert_eq!(d.get_faculty_list().await, d.fallback());
        assert!(d.cached().await.is_none());

        let prior = vec![FacultyEntry {
            id: "dr-amit-rao".to_string(),
            name: "Dr. Amit Rao".to_string(),
            designation: String::new(),
            department: "Physics".to_string(),
            profile_url: String::new(),
            photo_url: None,
        }];
        let stamp = SystemTime::now() - Duration::from_secs(7 * 3600);
        d.cache().set_at(prior.clone(), stamp).await;

        assert_eq!(d.get_faculty_list().await, prior);
        assert_eq!(d.cached().await.unwrap().fetched_at, stamp);
    }

    #[tokio::test]
    async fn concurrent_callers_at_expiry_share_one_fetch() {
        let f = CountingFetcher::slow(Reply::Page(PAGE), Duration::from_millis(100));
        let d = Arc::new(directory(f.clone()));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let d = d.clone();
            tasks.push(tokio::spawn(async move { d.get_faculty_list().await }));
        }
        for t in tasks {
            let out = t.await.unwrap();
            assert_eq!(out[0].name, "Prof. Jane Doe");
        }
        assert_eq!(f.calls(), 1);
    }

    #[tokio::test]
    async fn refresh_reports_errors_and_scrape_leaves_cache_alone() {
        let f = CountingFetcher::new(Reply::Status(404));
        let d = directory(f.clone());
        match d.refresh().await {
            Err(Error::HttpStatus { status, .. }) => assert_eq!(status, 404),
            other => panic!("expected HttpStatus, got {other:?}"),
        }

        f.set_reply(Reply::Page(PAGE));
        let out = d.scrape().await.unwrap();
        assert_eq!(out.len(), 1);
        assert!(d.cached().await.is_none());
        d.refresh().await.unwrap();
        assert!(d.cached().await.is_some());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let f = CountingFetcher::new(Reply::Down);
        let cfg = DirectoryConfig::for_source("ftp://example.edu/faculty.html");
        assert!(matches!(
            FacultyDirectory::new(f, cfg),
            Err(Error::InvalidUrl(_))
        ));
    }
}
