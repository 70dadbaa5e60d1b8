//! Backend-agnostic types and traits for `facdir`.
//!
//! This crate holds no IO: fetch backends, HTML extraction and the directory
//! cache live in `facdir-local`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("http status {status} from {url}")]
    HttpStatus { status: u16, url: String },
    #[error("extract failed: {0}")]
    Extract(String),
    #[error("invalid config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

pub const DEFAULT_SOURCE_URL: &str = "https://www.gbu.ac.in/USICT/faculty.html";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";
pub const DEFAULT_SENTINEL_DEPARTMENT: &str = "USICT, GBU";
/// 6 hours.
pub const DEFAULT_FRESHNESS_S: u64 = 6 * 60 * 60;
pub const DEFAULT_LOOKAHEAD: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchRequest {
    pub url: String,
    /// Timeout for the operation (network + body).
    pub timeout_ms: Option<u64>,
    /// Hard cap on bytes read from the response body.
    pub max_bytes: Option<u64>,
    /// Extra request headers (e.g. `User-Agent`).
    pub headers: BTreeMap<String, String>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_ms: None,
            max_bytes: None,
            headers: BTreeMap::new(),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResponse {
    pub url: String,
    /// URL after redirects; relative links on the page resolve against this.
    pub final_url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
    pub truncated: bool,
}

impl FetchResponse {
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes).to_string()
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait::async_trait]
pub trait FetchBackend: Send + Sync {
    async fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse>;
}

/// One person in the directory.
///
/// Wire names follow the endpoint contract: `profile` and `photo` rather than
/// the longer field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacultyEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub designation: String,
    pub department: String,
    #[serde(rename = "profile", default)]
    pub profile_url: String,
    #[serde(rename = "photo", default)]
    pub photo_url: Option<String>,
}

/// A canonical department label and the keywords that identify it in page text.
///
/// Keywords are matched case-insensitively on word boundaries, so "design"
/// does not fire on "Designation".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentRule {
    pub label: String,
    pub keywords: Vec<String>,
}

impl DepartmentRule {
    pub fn new(label: &str, keywords: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Canonical departments, in match priority order.
pub fn default_departments() -> Vec<DepartmentRule> {
    vec![
        DepartmentRule::new(DEFAULT_SENTINEL_DEPARTMENT, &["usict"]),
        DepartmentRule::new("Computer Science", &["computer science", "cse"]),
        DepartmentRule::new("Information Technology", &["information technology"]),
        DepartmentRule::new(
            "Electronics & Communication",
            &[
                "electronics",
                "electronics and communication",
                "electronics & communication",
                "ece",
            ],
        ),
        DepartmentRule::new("Civil Engineering", &["civil"]),
        DepartmentRule::new("Mechanical Engineering", &["mechanical"]),
        DepartmentRule::new("Biotechnology", &["biotechnology", "bio-technology"]),
        DepartmentRule::new("Mathematics", &["mathematics", "applied mathematics"]),
        DepartmentRule::new("Physics", &["physics", "applied physics"]),
        DepartmentRule::new("Chemistry", &["chemistry", "applied chemistry"]),
        DepartmentRule::new("Management", &["management"]),
        DepartmentRule::new("Law", &["law", "legal studies"]),
        DepartmentRule::new("Architecture", &["architecture"]),
        DepartmentRule::new("Pharmacy", &["pharmacy", "pharmaceutical"]),
        DepartmentRule::new("Design", &["design"]),
    ]
}

/// Served when nothing better is available, so callers never see an empty list.
pub fn default_fallback(source_url: &str) -> Vec<FacultyEntry> {
    vec![
        FacultyEntry {
            id: "gbu-1".to_string(),
            name: "Prof. (Dr.) Vivek Kumar Sehgal".to_string(),
            designation: "Professor & Dean".to_string(),
            department: DEFAULT_SENTINEL_DEPARTMENT.to_string(),
            profile_url: source_url.to_string(),
            photo_url: None,
        },
        FacultyEntry {
            id: "gbu-2".to_string(),
            name: "Prof. (Dr.) Ajay K. Singh".to_string(),
            designation: "Professor".to_string(),
            department: DEFAULT_SENTINEL_DEPARTMENT.to_string(),
            profile_url: source_url.to_string(),
            photo_url: None,
        },
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    pub source_url: String,
    pub user_agent: String,
    /// Max age of a cached result before the next request re-scrapes.
    pub freshness_s: u64,
    /// Blocks inspected after a name for designation/profile/photo.
    pub lookahead: usize,
    pub timeout_ms: u64,
    pub max_bytes: u64,
    pub sentinel_department: String,
    pub departments: Vec<DepartmentRule>,
    pub fallback: Vec<FacultyEntry>,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            freshness_s: DEFAULT_FRESHNESS_S,
            lookahead: DEFAULT_LOOKAHEAD,
            timeout_ms: 15_000,
            max_bytes: 5 * 1024 * 1024,
            sentinel_department: DEFAULT_SENTINEL_DEPARTMENT.to_string(),
            departments: default_departments(),
            fallback: default_fallback(DEFAULT_SOURCE_URL),
        }
    }
}

impl DirectoryConfig {
    /// Default policy pointed at another page; the fallback profile links follow it.
    pub fn for_source(source_url: impl Into<String>) -> Self {
        let source_url = source_url.into();
        Self {
            fallback: default_fallback(&source_url),
            source_url,
            ..Self::default()
        }
    }

    pub fn freshness(&self) -> Duration {
        Duration::from_secs(self.freshness_s)
    }

    pub fn fetch_request(&self) -> FetchRequest {
        let mut req = FetchRequest::get(self.source_url.clone());
        req.timeout_ms = Some(self.timeout_ms);
        req.max_bytes = Some(self.max_bytes);
        req.headers
            .insert("User-Agent".to_string(), self.user_agent.clone());
        req
    }

    pub fn validate(&self) -> Result<()> {
        let u = url::Url::parse(&self.source_url)
            .map_err(|e| Error::InvalidUrl(format!("{}: {e}", self.source_url)))?;
        if !matches!(u.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl(format!(
                "unsupported scheme {:?} in {}",
                u.scheme(),
                self.source_url
            )));
        }
        if self.sentinel_department.trim().is_empty() {
            return Err(Error::Config("sentinel_department is empty".to_string()));
        }
        if self.fallback.is_empty() {
            return Err(Error::Config("fallback list is empty".to_string()));
        }
        if let Some(r) = self
            .departments
            .iter()
            .find(|r| r.label.trim().is_empty() || r.keywords.iter().all(|k| k.trim().is_empty()))
        {
            return Err(Error::Config(format!(
                "department rule {:?} needs a label and at least one keyword",
                r.label
            )));
        }
        Ok(())
    }
}
