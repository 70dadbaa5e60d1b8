//! Candidate list -> served entries: dedupe, canonical departments, stable ids.

use std::collections::HashSet;

use facdir_core::FacultyEntry;

use crate::heuristics::{normalize_whitespace, slugify, DepartmentMatcher};
use crate::walker::Candidate;

/// Turn raw candidates into entries.
///
/// - drops candidates whose normalized name is empty
/// - keeps the first occurrence of each case-insensitive name
/// - maps departments onto canonical labels; unmatched text is kept, empty text
///   becomes `sentinel`
/// - ids are name slugs, suffixed `-2`, `-3`, ... on collision
pub fn normalize(
    candidates: Vec<Candidate>,
    departments: &DepartmentMatcher,
    sentinel: &str,
) -> Vec<FacultyEntry> {
    let mut names: HashSet<String> = HashSet::new();
    let mut ids: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(candidates.len());

    for c in candidates {
        let name = normalize_whitespace(&c.name);
        if name.is_empty() || !names.insert(name.to_lowercase()) {
            continue;
        }

        let raw_dept = normalize_whitespace(&c.department);
        let department = match departments.canonical(&raw_dept) {
            Some(label) => label.to_string(),
            None if raw_dept.is_empty() => sentinel.to_string(),
            None => raw_dept,
        };

        let base = slugify(&name, out.len() + 1);
        let mut id = base.clone();
        let mut n = 2;
        while !ids.insert(id.clone()) {
            id = format!("{base}-{n}");
            n += 1;
        }

        out.push(FacultyEntry {
            id,
            name,
            designation: normalize_whitespace(&c.designation),
            department,
            profile_url: c.profile_url.trim().to_string(),
            photo_url: c
                .photo_url
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
        });
    }

    out
}
