//! Text classifiers used by the page walker.
//!
//! Each rule is a named pure function so it can be tested and tuned on its
//! own. They are tuned for one family of static faculty pages and will
//! misclassify on structurally different markup.

use std::sync::LazyLock;

use facdir_core::{default_departments, DepartmentRule, Error, Result};
use regex::Regex;

pub const NAME_MIN_CHARS: usize = 3;
pub const NAME_MAX_CHARS: usize = 80;
pub const DESIGNATION_MAX_CHARS: usize = 160;

static CAPITALIZED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Z][a-z]").unwrap());
static HONORIFIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:prof|dr|mr|mrs|ms)\b").unwrap());
static LEADING_HONORIFIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\(?(?:prof|professor|dr|mr|mrs|ms)\b").unwrap());
static NAME_DENYLIST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)@|http|mailto:|gmail\.com|copyright|contact|phone|address|admissions|students|useful links|\bopp\.|university",
    )
    .unwrap()
});
static DESIGNATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)professor|associate|assistant|lecturer|dean|coordinator|head|ph\.?d|m\.tech|b\.tech|faculty")
        .unwrap()
});
static GENERIC_DEPARTMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:department of|dept\.? of|school of) [a-z &\-]+").unwrap()
});
static RANK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:professor|associate|assistant|lecturer|dean|coordinator|head|ph\.?d|m\.tech|b\.tech)\b")
        .unwrap()
});
// `kw` keeps "Dept"/"Department" in the trailer so the generic phrase still matches.
static TRAILER_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*(?:—|–)\s*|\s+\|\s+|,\s*(?P<kw>Dept\b|Department\b)").unwrap()
});
static DEFAULT_MATCHER: LazyLock<DepartmentMatcher> = LazyLock::new(|| {
    DepartmentMatcher::new(&default_departments()).unwrap_or_else(|_| DepartmentMatcher::empty())
});

/// Collapse whitespace runs to single spaces and trim.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Does this fragment plausibly hold a person's display name?
pub fn looks_like_candidate_name(text: &str) -> bool {
    let s = normalize_whitespace(text);
    let chars = s.chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&chars) {
        return false;
    }
    if NAME_DENYLIST_RE.is_match(&s) {
        return false;
    }
    if s.split_whitespace().count() < 2 {
        return false;
    }
    if !CAPITALIZED_RE.is_match(&s) && !HONORIFIC_RE.is_match(&s) {
        return false;
    }
    !s.starts_with(|c: char| c.is_ascii_digit())
}

/// Starts with a title such as "Prof.", "(Dr.)" or "Professor".
pub fn starts_with_honorific(text: &str) -> bool {
    LEADING_HONORIFIC_RE.is_match(text.trim_start())
}

/// Short text naming a role or qualification ("Associate Professor", "Ph.D").
pub fn designation_like(text: &str) -> bool {
    !text.is_empty()
        && text.chars().count() < DESIGNATION_MAX_CHARS
        && DESIGNATION_RE.is_match(text)
}

/// A role line rather than a person: designation vocabulary without a leading title.
pub fn role_text(text: &str) -> bool {
    designation_like(text) && !starts_with_honorific(text)
}

/// A rank or qualification line ("Assistant Professor (CSE)") without a leading title.
///
/// Narrower than [`role_text`]: "Faculty of Law" is a section heading, not a rank.
pub fn rank_line(text: &str) -> bool {
    !text.is_empty()
        && text.chars().count() < DESIGNATION_MAX_CHARS
        && RANK_RE.is_match(text)
        && !starts_with_honorific(text)
}

/// Split "Dr. Jane Roe — Mathematics" into the leading name part and the rest.
///
/// A ", Dept. of X" / ", Department of X" trailer keeps its keyword.
pub fn split_name_and_trailer(text: &str) -> (String, Option<String>) {
    let s = normalize_whitespace(text);
    let Some(caps) = TRAILER_SPLIT_RE.captures(&s) else {
        return (s, None);
    };
    let Some(m) = caps.get(0) else {
        return (s, None);
    };
    let head = normalize_whitespace(&s[..m.start()]);
    let rest_start = caps.name("kw").map_or(m.end(), |kw| kw.start());
    let rest = normalize_whitespace(&s[rest_start..]);
    if head.is_empty() {
        return (rest, None);
    }
    (head, Some(rest).filter(|r| !r.is_empty()))
}

/// `slugify("Prof. (Dr.) Ajay K. Singh", 2)` is `"prof-dr-ajay-k-singh"`.
///
/// Falls back to `entity-<ordinal>` when nothing alphanumeric survives.
pub fn slugify(name: &str, ordinal: usize) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch);
        } else {
            pending_dash = true;
        }
    }
    if out.is_empty() {
        format!("entity-{ordinal}")
    } else {
        out
    }
}

/// Compiled department rules.
#[derive(Debug, Clone)]
pub struct DepartmentMatcher {
    rules: Vec<(String, Regex)>,
}

impl DepartmentMatcher {
    pub fn new(rules: &[DepartmentRule]) -> Result<Self> {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            let alts = rule
                .keywords
                .iter()
                .map(|k| k.trim())
                .filter(|k| !k.is_empty())
                .map(regex::escape)
                .collect::<Vec<_>>();
            if alts.is_empty() {
                continue;
            }
            // Explicit boundaries: keywords may begin or end with punctuation.
            let pattern = format!(r"(?i)(?:^|[^\w])(?:{})(?:[^\w]|$)", alts.join("|"));
            let re = Regex::new(&pattern)
                .map_err(|e| Error::Config(format!("department rule {:?}: {e}", rule.label)))?;
            compiled.push((rule.label.clone(), re));
        }
        Ok(Self { rules: compiled })
    }

    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Canonical label whose keywords appear in `text`, in rule order.
    pub fn canonical(&self, text: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|(_, re)| re.is_match(text))
            .map(|(label, _)| label.as_str())
    }

    /// Canonical label, else a generic "Department of X" phrase, else `None`.
    pub fn classify(&self, text: &str) -> Option<String> {
        if text.trim().is_empty() {
            return None;
        }
        if let Some(label) = self.canonical(text) {
            return Some(label.to_string());
        }
        GENERIC_DEPARTMENT_RE
            .find(text)
            .map(|m| normalize_whitespace(m.as_str()))
            .filter(|s| !s.is_empty())
    }
}

/// [`DepartmentMatcher::classify`] over the default rule set.
pub fn classify_department(text: &str) -> Option<String> {
    DEFAULT_MATCHER.classify(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn accepts_honorific_names() {
        assert!(looks_like_candidate_name("Prof. (Dr.) Vivek Kumar Sehgal"));
        assert!(looks_like_candidate_name("Dr.   Jane\n Doe"));
        assert!(looks_like_candidate_name("dr. a. kumar"));
    }

    #[test]
    fn rejects_address_and_navigation_text() {
        assert!(!looks_like_candidate_name(
            "Gautam Buddh University, Opp. Pocket 2"
        ));
        for s in [
            "Write to jane@example.edu",
            "Visit http://example.edu now",
            "Copyright Notice Here",
            "Contact Us",
            "Phone Directory List",
            "Postal Address Line",
            "Admissions Open Now",
            "Current Students Corner",
            "Useful Links Menu",
        ] {
            assert!(!looks_like_candidate_name(s), "{s}");
        }
    }

    #[test]
    fn rejects_short_single_token_and_numeric_text() {
        assert!(!looks_like_candidate_name("Faculty"));
        assert!(!looks_like_candidate_name("Dr"));
        assert!(!looks_like_candidate_name(""));
        assert!(!looks_like_candidate_name("2 Jane Doe"));
        assert!(!looks_like_candidate_name("all lower case words"));
        assert!(!looks_like_candidate_name(&"Abc ".repeat(30)));
    }

    #[test]
    fn classifies_canonical_and_generic_departments() {
        let d = classify_department("Department of Computer Science and Engineering").unwrap();
        assert!(d.contains("Computer Science"), "{d}");
        assert_eq!(
            classify_department("Department of Mathematics").as_deref(),
            Some("Mathematics")
        );
        assert_eq!(
            classify_department("Dept. of Electronics and Communication Engg").as_deref(),
            Some("Electronics & Communication")
        );
        assert_eq!(
            classify_department("School of Humanities & Social Sciences").as_deref(),
            Some("School of Humanities & Social Sciences")
        );
        assert_eq!(classify_department("Contact Us"), None);
        assert_eq!(classify_department(""), None);
    }

    #[test]
    fn department_keywords_respect_word_boundaries() {
        assert_eq!(classify_department("Designation: Professor"), None);
        assert_eq!(classify_department("For more information"), None);
        assert_eq!(classify_department("Lawrence Road"), None);
        assert_eq!(classify_department("Faculty of Law").as_deref(), Some("Law"));
    }

    #[test]
    fn custom_rules_take_priority_in_order() {
        let m = DepartmentMatcher::new(&[
            DepartmentRule::new("Robotics", &["robotics"]),
            DepartmentRule::new("Mechanical Engineering", &["mechanical"]),
        ])
        .unwrap();
        assert_eq!(
            m.classify("Mechanical and Robotics Lab").as_deref(),
            Some("Robotics")
        );
        assert_eq!(m.canonical("Mathematics"), None);
    }

    #[test]
    fn designation_and_role_rules() {
        assert!(designation_like("Associate Professor"));
        assert!(designation_like("Ph.D (IIT Delhi)"));
        assert!(!designation_like("Jane Doe"));
        assert!(!designation_like(&"Professor ".repeat(20)));
        assert!(role_text("Faculty Members"));
        assert!(!role_text("Professor Jane Doe"));
        assert!(rank_line("Assistant Professor (CSE)"));
        assert!(rank_line("Associate Professor, Department of Mathematics"));
        assert!(!rank_line("Faculty of Law"));
        assert!(!rank_line("Department of Computer Science & Engineering"));
        assert!(!rank_line("Prof. Jane Doe"));
        assert!(starts_with_honorific("(Dr.) Jane Doe"));
        assert!(!starts_with_honorific("Drew Barry"));
    }

    #[test]
    fn splits_name_from_trailing_department() {
        let (name, rest) = split_name_and_trailer("Dr. Jane Roe — Mathematics");
        assert_eq!(name, "Dr. Jane Roe");
        assert_eq!(rest.as_deref(), Some("Mathematics"));

        let (name, rest) = split_name_and_trailer("Dr. Jane Roe, Department of Physics");
        assert_eq!(name, "Dr. Jane Roe");
        assert_eq!(rest.as_deref(), Some("Department of Physics"));

        let (name, rest) = split_name_and_trailer("Dr. Jane Roe, Dept. of Humanities");
        assert_eq!(name, "Dr. Jane Roe");
        assert_eq!(rest.as_deref(), Some("Dept. of Humanities"));
        assert_eq!(
            classify_department(rest.as_deref().unwrap()).as_deref(),
            Some("Dept. of Humanities")
        );

        let (name, rest) = split_name_and_trailer("Dr. Ravi Kumar | Physics");
        assert_eq!(name, "Dr. Ravi Kumar");
        assert_eq!(rest.as_deref(), Some("Physics"));

        let (name, rest) = split_name_and_trailer("  Prof.  Jane Doe ");
        assert_eq!(name, "Prof. Jane Doe");
        assert_eq!(rest, None);
    }

    #[test]
    fn slugify_examples() {
        assert_eq!(slugify("Prof. (Dr.) Ajay K. Singh", 2), "prof-dr-ajay-k-singh");
        assert_eq!(slugify("  --Jane   Doe--  ", 1), "jane-doe");
        assert_eq!(slugify("!!!", 7), "entity-7");
        assert_eq!(slugify("", 3), "entity-3");
    }

    proptest! {
        #[test]
        fn slugify_is_url_safe(name in any::<String>(), ordinal in 0usize..10_000) {
            let s = slugify(&name, ordinal);
            prop_assert!(!s.is_empty());
            prop_assert!(s.chars().all(|c| matches!(c, 'a'..='z' | '0'..='9' | '-')));
            prop_assert!(!s.starts_with('-') && !s.ends_with('-'));
            prop_assert!(!s.contains("--"));
        }

        #[test]
        fn normalize_whitespace_is_idempotent(text in any::<String>()) {
            let once = normalize_whitespace(&text);
            prop_assert_eq!(normalize_whitespace(&once), once.clone());
            prop_assert!(!once.starts_with(' ') && !once.ends_with(' '));
        }

        #[test]
        fn single_token_is_never_a_name(token in "[A-Za-z.]{0,40}") {
            prop_assert!(!looks_like_candidate_name(&token));
        }
    }
}
