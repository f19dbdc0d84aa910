//! Pure HTML parsing for portal listing pages.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use spinout_common::Publication;

static LIST: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.publications-list").unwrap());
static ITEM: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.publication-item").unwrap());
static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h3.title").unwrap());
static AUTHORS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.authors").unwrap());
static ABSTRACT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.abstract").unwrap());
static DATE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span.date").unwrap());
static DEPARTMENT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.department").unwrap());
static LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a.publication-link").unwrap());
static DOI: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span.doi").unwrap());
static TYPE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span.type").unwrap());

static DOI_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^\s*doi\s*:\s*").unwrap());

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d.%m.%Y", "%B %d, %Y"];

/// Result of parsing one listing page.
#[derive(Debug, Default)]
pub struct ParsedPage {
    pub publications: Vec<Publication>,
    /// Entries dropped for lacking a title or authors.
    pub dropped: usize,
}

/// Parse every publication entry on a listing page. A page without the list
/// container yields nothing.
pub fn parse_listing(html: &str, base: &Url) -> ParsedPage {
    let document = Html::parse_document(html);
    let mut page = ParsedPage::default();

    let Some(list) = document.select(&LIST).next() else {
        return page;
    };

    for item in list.select(&ITEM) {
        let publication = parse_item(&item, base);
        if publication.is_valid() {
            page.publications.push(publication);
        } else {
            page.dropped += 1;
        }
    }
    page
}

fn parse_item(item: &ElementRef, base: &Url) -> Publication {
    Publication {
        title: first_text(item, &TITLE),
        authors: split_authors(&first_text(item, &AUTHORS)),
        abstract_text: first_text(item, &ABSTRACT),
        publication_date: normalize_date(&first_text(item, &DATE)),
        department: first_text(item, &DEPARTMENT),
        url: item
            .select(&LINK)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(|href| resolve_url(href, base))
            .unwrap_or_default(),
        doi: clean_doi(&first_text(item, &DOI)),
        publication_type: first_text(item, &TYPE),
    }
}

/// Whitespace-normalized text of the first match, or empty.
fn first_text(item: &ElementRef, selector: &Selector) -> String {
    item.select(selector)
        .next()
        .map(|el| {
            el.text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

/// Split an author line on `;` if present, else on `,`.
pub fn split_authors(text: &str) -> Vec<String> {
    let separator = if text.contains(';') { ';' } else { ',' };
    text.split(separator)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// ISO `YYYY-MM-DD` when the text matches a known format, else the text as-is.
pub fn normalize_date(text: &str) -> String {
    let trimmed = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

pub fn clean_doi(text: &str) -> String {
    DOI_PREFIX.replace(text, "").trim().to_string()
}

/// Absolute links pass through; relative ones resolve against the page URL.
pub fn resolve_url(href: &str, base: &Url) -> String {
    let href = href.trim();
    if href.is_empty() {
        return String::new();
    }
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}
