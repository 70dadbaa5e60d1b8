//! HTML -> `Vec<FacultyEntry>`: parse, walk, normalize.

use facdir_core::{DirectoryConfig, FacultyEntry, Result};

use crate::document::parse_document;
use crate::heuristics::DepartmentMatcher;
use crate::normalize::normalize;
use crate::walker::Walker;

/// Extraction policy compiled from a [`DirectoryConfig`].
#[derive(Debug, Clone)]
pub struct Extractor {
    departments: DepartmentMatcher,
    sentinel: String,
    lookahead: usize,
}

impl Extractor {
    pub fn new(cfg: &DirectoryConfig) -> Result<Self> {
        Ok(Self {
            departments: DepartmentMatcher::new(&cfg.departments)?,
            sentinel: cfg.sentinel_department.clone(),
            lookahead: cfg.lookahead,
        })
    }

    /// Relative links resolve against `base_url` (normally the post-redirect URL).
    ///
    /// Pure: the same input always yields the same list. An empty list is a
    /// valid result, not an error.
    pub fn extract(&self, html: &str, base_url: Option<&str>) -> Result<Vec<FacultyEntry>> {
        let doc = parse_document(html, base_url)?;
        let walker = Walker::new(&self.departments, &self.sentinel, self.lookahead);
        let candidates = walker.extract(&doc);
        Ok(normalize(candidates, &self.departments, &self.sentinel))
    }
}
