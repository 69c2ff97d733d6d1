//! HTML parser for Amazon search results.
//!
//! Marketplace markup differs between experiment cohorts, so every field is
//! read through an ordered list of strategies. The first strategy that yields
//! a value wins; when all of them miss the field gets its sentinel. Only a
//! missing title disqualifies a listing.

use crate::amazon::models::{ProductRecord, SearchOutcome, UNKNOWN};
use crate::amazon::selectors::{errors, search};
use regex_lite::Regex;
use scraper::{ElementRef, Html};
use std::sync::LazyLock;
use tracing::{debug, trace, warn};

/// Maximum title length in characters, including the ellipsis.
const MAX_TITLE_CHARS: usize = 200;

/// Anchor text must be longer than this to stand in for a title.
const MIN_ANCHOR_TITLE_CHARS: usize = 10;

const ZERO_WIDTH: [char; 4] = ['\u{200B}', '\u{200C}', '\u{200D}', '\u{FEFF}'];

static PRICE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:₹|Rs\.)?\s*(\d[,\d]*(?:\.\d+)?)").unwrap());

static LEADING_DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)").unwrap());

static LEADING_GROUPED_INT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+[,\d]*)").unwrap());

/// Reads one raw field value from a listing container.
type FieldStrategy = fn(ElementRef) -> Option<String>;

const TITLE_STRATEGIES: [FieldStrategy; 3] = [title_by_pattern, title_by_heading, title_by_anchor];

const PRICE_STRATEGIES: [FieldStrategy; 2] = [price_by_element, price_by_text_node];

/// Parser for Amazon search-results pages.
pub struct Parser {
    origin: String,
    currency: String,
}

impl Parser {
    /// Creates a parser resolving relative links against `origin`.
    pub fn new(origin: impl Into<String>, currency: impl Into<String>) -> Self {
        let origin = origin.into().trim_end_matches('/').to_string();
        Self { origin, currency: currency.into() }
    }

    /// Parses up to `limit` listings, in document order.
    pub fn extract(&self, html: &str, limit: usize) -> Vec<ProductRecord> {
        self.parse_search(html, limit).into_records()
    }

    /// Parses search results HTML, keeping bot challenges distinguishable.
    pub fn parse_search(&self, html: &str, limit: usize) -> SearchOutcome {
        let document = Html::parse_document(html);

        if is_bot_challenge(&document) {
            warn!("Marketplace served a robot check instead of results");
            return SearchOutcome::Blocked;
        }

        let containers = find_containers(&document);
        debug!("Found {} product containers", containers.len());

        let mut records = Vec::new();
        for (index, element) in containers.into_iter().enumerate() {
            if records.len() >= limit {
                break;
            }

            match self.parse_card(element) {
                Some(record) => {
                    trace!("Parsed product: {} - {}", record.asin, record.title);
                    records.push(record);
                }
                None => warn!("Skipping container {} without a title", index),
            }
        }

        debug!("Parsed {} products", records.len());
        SearchOutcome::Listings(records)
    }

    /// Parses a single product card; `None` when no title can be found.
    fn parse_card(&self, element: ElementRef) -> Option<ProductRecord> {
        let title = TITLE_STRATEGIES.iter().find_map(|strategy| strategy(element))?;

        let asin = match element.value().attr(search::ASIN_ATTR) {
            Some(asin) if !asin.trim().is_empty() => asin.trim().to_string(),
            _ => UNKNOWN.to_string(),
        };

        let link = self.extract_link(element, &asin);

        let price = match PRICE_STRATEGIES.iter().find_map(|strategy| strategy(element)) {
            Some(text) => parse_price_text(&text),
            None => {
                debug!("No price element for {}", asin);
                0
            }
        };

        let rating = element
            .select(&search::RATING_STARS)
            .next()
            .map(|e| parse_rating_text(&e.text().collect::<String>()))
            .unwrap_or(0.0);

        let review_count = search::RATING_COUNT
            .iter()
            .find_map(|sel| element.select(sel).next())
            .map(|e| parse_review_text(&e.text().collect::<String>()))
            .unwrap_or(0);

        let image_url = search::IMAGE
            .iter()
            .filter_map(|sel| element.select(sel).next())
            .find_map(|img| img.value().attr("src"))
            .map(String::from)
            .unwrap_or_else(|| UNKNOWN.to_string());

        Some(ProductRecord {
            title,
            asin,
            link,
            currency: self.currency.clone(),
            price,
            rating,
            review_count,
            image_url,
            is_prime: element.select(&search::PRIME_BADGE).next().is_some(),
            is_best_seller: has_badge(element, search::BEST_SELLER_TEXT),
            is_amazon_choice: has_badge(element, search::AMAZON_CHOICE_TEXT),
        })
    }

    /// Resolves the product link, synthesizing one from the ASIN as a last resort.
    fn extract_link(&self, element: ElementRef, asin: &str) -> String {
        let preferred = search::LINK
            .iter()
            .find_map(|sel| element.select(sel).next())
            .and_then(|a| a.value().attr("href"));

        let href = preferred.or_else(|| {
            element
                .select(&search::ANCHOR)
                .filter_map(|a| a.value().attr("href"))
                .find(|href| href.contains(search::DETAIL_PATH))
        });

        match href {
            Some(href) => self.absolutize(href),
            None if asin != UNKNOWN => format!("{}/dp/{}", self.origin, asin),
            None => UNKNOWN.to_string(),
        }
    }

    fn absolutize(&self, href: &str) -> String {
        if href.starts_with("//") {
            format!("https:{}", href)
        } else if href.starts_with('/') {
            format!("{}{}", self.origin, href)
        } else {
            href.to_string()
        }
    }
}

fn is_bot_challenge(document: &Html) -> bool {
    document.root_element().text().collect::<String>().contains(errors::CAPTCHA_TEXT)
}

fn find_containers(document: &Html) -> Vec<ElementRef<'_>> {
    let primary: Vec<_> = document.select(&search::RESULT).collect();
    if !primary.is_empty() {
        return primary;
    }

    debug!("No search-result cards, falling back to ASIN carriers");
    document
        .select(&search::ASIN_CARRIER)
        .filter(|e| carries_asin(*e))
        .filter(|e| !e.ancestors().filter_map(ElementRef::wrap).any(carries_asin))
        .collect()
}

/// True for elements with a non-empty ASIN attribute.
fn carries_asin(element: ElementRef) -> bool {
    element.value().attr(search::ASIN_ATTR).is_some_and(|a| !a.trim().is_empty())
}

fn has_badge(element: ElementRef, label: &str) -> bool {
    element.select(&search::BADGE_LABEL).any(|b| b.text().collect::<String>().contains(label))
}

fn title_by_pattern(element: ElementRef) -> Option<String> {
    search::TITLE
        .iter()
        .filter_map(|sel| element.select(sel).next())
        .find_map(|e| normalize_title(&e.text().collect::<String>()))
}

fn title_by_heading(element: ElementRef) -> Option<String> {
    let heading = element.select(&search::HEADING).next()?;
    normalize_title(&heading.text().collect::<String>())
}

fn title_by_anchor(element: ElementRef) -> Option<String> {
    let mut best: Option<String> = None;
    for anchor in element.select(&search::ANCHOR) {
        let text = anchor.text().collect::<String>();
        let len = text.trim().chars().count();
        let longer = best.as_ref().map_or(true, |b| len > b.trim().chars().count());
        if len > MIN_ANCHOR_TITLE_CHARS && longer {
            best = Some(text);
        }
    }
    best.and_then(|text| normalize_title(&text))
}

fn price_by_element(element: ElementRef) -> Option<String> {
    search::PRICE
        .iter()
        .find_map(|sel| element.select(sel).next())
        .map(|e| e.text().collect::<String>().trim().to_string())
}

fn price_by_text_node(element: ElementRef) -> Option<String> {
    element
        .text()
        .find(|t| t.contains('₹') || t.contains("Rs."))
        .map(|t| t.trim().to_string())
}

/// Cleans a raw title: drops zero-width characters, collapses whitespace and
/// caps the length. Returns `None` when nothing is left.
pub fn normalize_title(raw: &str) -> Option<String> {
    let stripped: String = raw.chars().filter(|c| !ZERO_WIDTH.contains(c)).collect();
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.is_empty() {
        return None;
    }

    if collapsed.chars().count() > MAX_TITLE_CHARS {
        let head: String = collapsed.chars().take(MAX_TITLE_CHARS - 3).collect();
        return Some(format!("{}...", head));
    }

    Some(collapsed)
}

/// Extracts a whole-rupee price from text like "₹1,234.56" or "Rs.999".
///
/// Fractions are truncated. Returns `0` when no number can be read.
pub fn parse_price_text(text: &str) -> u64 {
    let candidate = PRICE_NUMBER
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(text);

    let cleaned: String =
        candidate.chars().filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.').collect();

    if cleaned.is_empty() {
        return 0;
    }

    let digits = cleaned.replace(',', "");
    if digits.contains('.') {
        digits.parse::<f64>().map(|v| v.trunc() as u64).unwrap_or(0)
    } else {
        digits.parse().unwrap_or(0)
    }
}

/// Extracts the star rating from text like "4.3 out of 5 stars".
pub fn parse_rating_text(text: &str) -> f32 {
    LEADING_DECIMAL
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f32>().ok())
        .map(|stars| stars.clamp(0.0, 5.0))
        .unwrap_or(0.0)
}

/// Extracts a review count from text like "2,345 ratings".
pub fn parse_review_text(text: &str) -> u32 {
    LEADING_GROUPED_INT
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().replace(',', "").parse().ok())
        .unwrap_or(0)
}
