//! CSS selectors for Amazon search-results parsing.
//!
//! Every field is matched by an ordered list of selectors, most specific
//! first. Update this file when Amazon changes its markup.
//!
//! **Update process**: When parsing fails, capture HTML sample,
//! update selectors, and add test fixture.

use scraper::Selector;
use std::sync::LazyLock;

fn parse_all(patterns: &[&str]) -> Vec<Selector> {
    patterns.iter().map(|p| Selector::parse(p).unwrap()).collect()
}

/// Selectors for search results pages.
pub mod search {
    use super::*;

    /// Product card container - main search result item.
    pub static RESULT: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("div[data-component-type='s-search-result']").unwrap());

    /// Fallback container: anything carrying an ASIN.
    pub static ASIN_CARRIER: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("[data-asin]").unwrap());

    /// ASIN attribute on result card.
    pub static ASIN_ATTR: &str = "data-asin";

    /// Title patterns, tried in order.
    pub static TITLE: LazyLock<Vec<Selector>> = LazyLock::new(|| {
        parse_all(&[
            "span.a-text-normal",
            "h2.a-size-mini",
            "a.a-link-normal.s-underline-text.s-underline-link-text.s-link-style.a-text-normal",
            "span.a-size-medium.a-color-base.a-text-normal",
            "span.a-size-base-plus.a-color-base.a-text-normal",
        ])
    });

    /// Any heading, used when no title pattern matches.
    pub static HEADING: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h2").unwrap());

    /// Every anchor in a card.
    pub static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());

    /// Product link patterns, tried in order.
    pub static LINK: LazyLock<Vec<Selector>> =
        LazyLock::new(|| parse_all(&["a.a-link-normal.s-no-outline", "a.a-link-normal"]));

    /// Substring identifying a product detail page URL.
    pub static DETAIL_PATH: &str = "/dp/";

    /// Price element patterns, tried in order.
    pub static PRICE: LazyLock<Vec<Selector>> =
        LazyLock::new(|| parse_all(&["span.a-price-whole", "span.a-offscreen"]));

    /// Star rating label ("4.3 out of 5 stars").
    pub static RATING_STARS: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span.a-icon-alt").unwrap());

    /// Review count patterns, tried in order.
    pub static RATING_COUNT: LazyLock<Vec<Selector>> =
        LazyLock::new(|| parse_all(&["span.a-size-base.s-underline-text", "span.a-size-base"]));

    /// Product image patterns, tried in order.
    pub static IMAGE: LazyLock<Vec<Selector>> = LazyLock::new(|| parse_all(&["img.s-image", "img"]));

    /// Prime badge.
    pub static PRIME_BADGE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("i.a-icon-prime").unwrap());

    /// Merchandising badge label (Bestseller, Amazon's Choice).
    pub static BADGE_LABEL: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span.a-badge-label").unwrap());

    pub static BEST_SELLER_TEXT: &str = "Bestseller";
    pub static AMAZON_CHOICE_TEXT: &str = "Amazon's Choice";
}

/// Markers for pages that are not real search results.
pub mod errors {
    /// Text shown on the robot-check interstitial.
    pub static CAPTCHA_TEXT: &str = "Sorry, we just need to make sure you're not a robot";
}
