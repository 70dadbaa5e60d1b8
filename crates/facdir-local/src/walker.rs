//! Stateful page walk: department context is positional, not structural.
//!
//! Faculty pages reuse the same heading tags both as section dividers
//! ("Department of Physics") and as person names, so the walker relies on
//! document order plus content classification rather than tag identity.

use std::collections::HashSet;

use crate::document::{Block, Document};
use crate::heuristics::{
    designation_like, looks_like_candidate_name, normalize_whitespace, rank_line, role_text,
    split_name_and_trailer, starts_with_honorific, DepartmentMatcher,
};

/// Department headings are short; long container text is never one.
pub const MAX_DEPARTMENT_HEADING_CHARS: usize = 120;

/// A name found on the page, before dedup and id assignment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Candidate {
    pub name: String,
    pub department: String,
    pub designation: String,
    pub profile_url: String,
    pub photo_url: Option<String>,
}

pub struct Walker<'a> {
    departments: &'a DepartmentMatcher,
    sentinel: &'a str,
    lookahead: usize,
}

impl<'a> Walker<'a> {
    pub fn new(departments: &'a DepartmentMatcher, sentinel: &'a str, lookahead: usize) -> Self {
        Self {
            departments,
            sentinel,
            lookahead,
        }
    }

    /// Walk the blocks; falls back to table rows when nothing name-like turns up.
    pub fn extract(&self, doc: &Document) -> Vec<Candidate> {
        let out = self.walk(&doc.blocks);
        if !out.is_empty() {
            return out;
        }
        self.table_rows(&doc.rows)
    }

    /// Section dividers only: rank lines and "Name, Department of X" lines mention a
    /// department without starting a new section.
    fn department_heading(&self, block: &Block) -> Option<String> {
        if block.text.chars().count() > MAX_DEPARTMENT_HEADING_CHARS
            || starts_with_honorific(&block.text)
            || rank_line(&block.text)
            || self.name_line(&block.text)
        {
            return None;
        }
        self.departments.classify(&block.text)
    }

    /// "Jane Roe, Department of Chemistry": a person followed by a trailer.
    fn name_line(&self, text: &str) -> bool {
        let (head, trailer) = split_name_and_trailer(text);
        trailer.is_some()
            && looks_like_candidate_name(&head)
            && !role_text(&head)
            && self.departments.classify(&head).is_none()
    }

    fn name_bearing(&self, block: &Block) -> bool {
        block.is_heading()
            || block.has_class("vc_custom_heading")
            || (!block.nested && block.emphasis.is_some())
            || (!block.nested
                && matches!(block.tag.as_str(), "p" | "li")
                && self.name_line(&block.text))
    }

    /// Candidate text for a name-bearing block: heading text, else the emphasized child.
    fn name_text(block: &Block) -> Option<&str> {
        if block.is_heading() {
            return Some(block.text.as_str());
        }
        if let Some(e) = block.emphasis.as_deref() {
            if Self::plausible_name(e) {
                return Some(e);
            }
        }
        matches!(block.tag.as_str(), "p" | "li").then_some(block.text.as_str())
    }

    fn plausible_name(text: &str) -> bool {
        let (head, _) = split_name_and_trailer(text);
        looks_like_candidate_name(&head) && !role_text(&head)
    }

    pub fn walk(&self, blocks: &[Block]) -> Vec<Candidate> {
        let mut current = self.sentinel.to_string();
        let mut seen: HashSet<String> = HashSet::new();
        let mut out = Vec::new();

        for (i, block) in blocks.iter().enumerate() {
            if block.text.is_empty() {
                continue;
            }
            if let Some(dept) = self.department_heading(block) {
                current = dept;
                continue;
            }

            if self.name_bearing(block) {
                let Some(text) = Self::name_text(block) else {
                    continue;
                };
                let (name, trailer) = split_name_and_trailer(text);
                if !looks_like_candidate_name(&name) || role_text(&name) {
                    continue;
                }
                if !seen.insert(name.to_lowercase()) {
                    continue;
                }
                let department = trailer
                    .and_then(|t| self.departments.classify(&t))
                    .unwrap_or_else(|| current.clone());
                let mut c = Candidate {
                    name,
                    department,
                    ..Candidate::default()
                };
                self.fill_from_lookahead(&mut c, blocks, i);
                out.push(c);
            } else if let Some(inline) = block.inline.as_deref().filter(|_| !block.nested) {
                // Terse markup: a bare link or bold run inside a plain container.
                let name = normalize_whitespace(inline);
                if !looks_like_candidate_name(&name) || role_text(&name) {
                    continue;
                }
                if !seen.insert(name.to_lowercase()) {
                    continue;
                }
                out.push(Candidate {
                    name,
                    department: current.clone(),
                    ..Candidate::default()
                });
            }
        }

        out
    }

    /// Fill designation/profile/photo from the block itself and the next
    /// `lookahead` blocks. Stops at the next section or person heading.
    fn fill_from_lookahead(&self, c: &mut Candidate, blocks: &[Block], at: usize) {
        let end = at.saturating_add(self.lookahead).min(blocks.len().saturating_sub(1));
        for (j, nx) in blocks.iter().enumerate().take(end + 1).skip(at) {
            if j > at {
                if self.department_heading(nx).is_some() {
                    break;
                }
                if nx.is_heading() && Self::plausible_name(&nx.text) {
                    break;
                }
                if c.designation.is_empty()
                    && designation_like(&nx.text)
                    && !nx.text.eq_ignore_ascii_case(&c.name)
                {
                    c.designation = nx.text.clone();
                }
            }
            if c.profile_url.is_empty() {
                if let Some(href) = &nx.link {
                    c.profile_url = href.clone();
                }
            }
            if c.photo_url.is_none() {
                c.photo_url = nx.image.clone();
            }
            if !c.designation.is_empty() && !c.profile_url.is_empty() && c.photo_url.is_some() {
                break;
            }
        }
    }

    /// Cruder mode: two-column rows read as (name, department).
    pub fn table_rows(&self, rows: &[Vec<String>]) -> Vec<Candidate> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut out = Vec::new();
        for cells in rows.iter().filter(|r| r.len() >= 2) {
            let name = normalize_whitespace(&cells[0]);
            if !looks_like_candidate_name(&name) || !seen.insert(name.to_lowercase()) {
                continue;
            }
            let raw_dept = normalize_whitespace(&cells[1]);
            let department = self
                .departments
                .canonical(&raw_dept)
                .map(str::to_string)
                .unwrap_or_else(|| {
                    if raw_dept.is_empty() {
                        self.sentinel.to_string()
                    } else {
                        raw_dept
                    }
                });
            out.push(Candidate {
                name,
                department,
                ..Candidate::default()
            });
        }
        out
    }
}
