//! Flattened view of a parsed HTML page.
//!
//! `scraper` (html5ever) does the tree construction and tolerates malformed
//! markup. The walker only needs an ordered list of block elements with a few
//! precomputed lookups, so we materialize that once per page.

use facdir_core::{Error, Result};
use html_scraper::{ElementRef, Html, Selector};

use crate::heuristics::normalize_whitespace;

const BLOCK_SELECTOR: &str = "section, div, article, header, p, h1, h2, h3, h4, h5, li";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub tag: String,
    /// Whitespace-normalized text of the element and its descendants.
    pub text: String,
    pub classes: Vec<String>,
    /// First non-empty `strong`/`b` descendant text.
    pub emphasis: Option<String>,
    /// First non-empty `strong`/`b`/`a` descendant text.
    pub inline: Option<String>,
    /// First resolvable `a[href]`, absolute.
    pub link: Option<String>,
    /// First resolvable `img[src]`, absolute.
    pub image: Option<String>,
    /// Contains other blocks, i.e. a layout wrapper rather than a leaf.
    pub nested: bool,
}

impl Block {
    pub fn is_heading(&self) -> bool {
        matches!(self.tag.as_str(), "h1" | "h2" | "h3" | "h4" | "h5")
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Document {
    pub blocks: Vec<Block>,
    /// `td` texts per `tr`, for pages that lay the directory out as a table.
    pub rows: Vec<Vec<String>>,
}

struct Selectors {
    blocks: Selector,
    emphasis: Selector,
    inline: Selector,
    link: Selector,
    image: Selector,
    row: Selector,
    cell: Selector,
}

impl Selectors {
    fn new() -> Result<Self> {
        let parse = |css: &str| {
            Selector::parse(css).map_err(|e| Error::Extract(format!("selector {css:?}: {e}")))
        };
        Ok(Self {
            blocks: parse(BLOCK_SELECTOR)?,
            emphasis: parse("strong, b")?,
            inline: parse("strong, b, a")?,
            link: parse("a[href]")?,
            image: parse("img[src]")?,
            row: parse("tr")?,
            cell: parse("td")?,
        })
    }
}

fn element_text(el: &ElementRef) -> String {
    normalize_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

fn first_text(el: &ElementRef, sel: &Selector) -> Option<String> {
    el.select(sel)
        .map(|e| element_text(&e))
        .find(|t| !t.is_empty())
}

/// Resolve `raw` against `base`; non-navigational schemes are dropped.
pub fn resolve_url(raw: &str, base: Option<&url::Url>) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with('#') {
        return None;
    }
    let lc = raw.to_ascii_lowercase();
    if lc.starts_with("javascript:") || lc.starts_with("mailto:") || lc.starts_with("tel:") {
        return None;
    }
    if let Ok(u) = url::Url::parse(raw) {
        return matches!(u.scheme(), "http" | "https").then(|| u.to_string());
    }
    base.and_then(|b| b.join(raw).ok()).map(|u| u.to_string())
}

fn first_url(
    el: &ElementRef,
    sel: &Selector,
    attr: &str,
    base: Option<&url::Url>,
) -> Option<String> {
    // `select` only visits descendants; the block itself may be the `a`/`img`.
    std::iter::once(*el)
        .chain(el.select(sel))
        .filter_map(|e| e.value().attr(attr))
        .find_map(|v| resolve_url(v, base))
}

/// Parse `html` into blocks (document order) and table rows.
pub fn parse_document(html: &str, base_url: Option<&str>) -> Result<Document> {
    let sels = Selectors::new()?;
    let base = base_url.and_then(|u| url::Url::parse(u).ok());
    let doc = Html::parse_document(html);

    let blocks = doc
        .select(&sels.blocks)
        .map(|el| Block {
            tag: el.value().name().to_ascii_lowercase(),
            text: element_text(&el),
            classes: el.value().classes().map(str::to_string).collect(),
            emphasis: first_text(&el, &sels.emphasis),
            inline: first_text(&el, &sels.inline),
            link: first_url(&el, &sels.link, "href", base.as_ref()),
            image: first_url(&el, &sels.image, "src", base.as_ref()),
            nested: el.select(&sels.blocks).next().is_some(),
        })
        .collect();

    let rows = doc
        .select(&sels.row)
        .map(|tr| tr.select(&sels.cell).map(|td| element_text(&td)).collect::<Vec<_>>())
        .filter(|cells: &Vec<String>| !cells.is_empty())
        .collect();

    Ok(Document { blocks, rows })
}
