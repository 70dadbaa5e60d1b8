use facdir_core::{Error, FetchBackend, FetchRequest, FetchResponse, Result};
use std::collections::BTreeMap;
use std::time::Duration;

pub mod cache;
pub mod directory;
pub mod document;
pub mod heuristics;
pub mod normalize;
pub mod pipeline;
pub mod walker;

pub use cache::{CacheRecord, FacultyCache};
pub use directory::FacultyDirectory;
pub use pipeline::Extractor;

#[derive(Debug, Clone)]
pub struct LocalFetcher {
    client: reqwest::Client,
}

impl LocalFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("facdir/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(10))
            // Avoid hanging on DNS/TLS/body stalls; FetchRequest.timeout_ms overrides the total.
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Fetch(e.to_string()))?;
        Ok(Self { client })
    }

    fn apply_headers(
        &self,
        mut rb: reqwest::RequestBuilder,
        headers: &BTreeMap<String, String>,
    ) -> reqwest::RequestBuilder {
        for (k, v) in headers {
            match (
                reqwest::header::HeaderName::from_bytes(k.as_bytes()),
                reqwest::header::HeaderValue::from_str(v),
            ) {
                (Ok(name), Ok(value)) => rb = rb.header(name, value),
                _ => tracing::debug!(header = %k, "skipping invalid request header"),
            }
        }
        rb
    }
}

#[async_trait::async_trait]
impl FetchBackend for LocalFetcher {
    async fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse> {
        let url = url::Url::parse(&req.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl(format!(
                "unsupported scheme {:?}",
                url.scheme()
            )));
        }

        let t0 = std::time::Instant::now();
        let mut rb = self.client.get(url);
        if let Some(to) = req.timeout() {
            rb = rb.timeout(to);
        }
        rb = self.apply_headers(rb, &req.headers);
        let resp = rb.send().await.map_err(|e| Error::Fetch(e.to_string()))?;
        let final_url = resp.url().to_string();
        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let max_bytes = req.max_bytes.unwrap_or(u64::MAX) as usize;
        let mut truncated = false;
        let mut bytes = Vec::new();
        let mut stream = resp.bytes_stream();
        use futures_util::StreamExt;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::Fetch(e.to_string()))?;
            if bytes.len().saturating_add(chunk.len()) > max_bytes {
                let can_take = max_bytes.saturating_sub(bytes.len());
                bytes.extend_from_slice(&chunk[..can_take]);
                truncated = true;
                break;
            }
            bytes.extend_from_slice(&chunk);
        }

        tracing::debug!(
            url = %req.url,
            final_url = %final_url,
            status,
            bytes = bytes.len(),
            truncated,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "fetch complete"
        );

        Ok(FetchResponse {
            url: req.url.clone(),
            final_url,
            status,
            content_type,
            bytes,
            truncated,
        })
    }
}
