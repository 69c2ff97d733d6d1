//! Output formatting for product records (table, JSON, markdown, CSV).

use crate::amazon::{ProductRecord, UNKNOWN};
use crate::config::OutputFormat;

/// Formats product records for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a list of records, in the order given.
    pub fn format_products(&self, products: &[ProductRecord]) -> String {
        if products.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                OutputFormat::Csv => Self::csv_header(),
                _ => "No products found.".to_string(),
            };
        }

        match self.format {
            OutputFormat::Json => self.json_products(products),
            OutputFormat::Table => self.table_products(products),
            OutputFormat::Markdown => self.markdown_products(products),
            OutputFormat::Csv => self.csv_products(products),
        }
    }

    fn json_products(&self, products: &[ProductRecord]) -> String {
        serde_json::to_string_pretty(products).unwrap_or_else(|_| "[]".to_string())
    }

    fn price_text(product: &ProductRecord) -> String {
        match product.known_price() {
            Some(price) => format!("{}{}", product.currency, price),
            None => "N/A".to_string(),
        }
    }

    fn rating_text(product: &ProductRecord) -> String {
        if product.rating > 0.0 {
            format!("{:.1}", product.rating)
        } else {
            "N/A".to_string()
        }
    }

    fn badges(product: &ProductRecord) -> Vec<&'static str> {
        let mut badges = Vec::new();
        if product.is_prime {
            badges.push("Prime");
        }
        if product.is_best_seller {
            badges.push("Bestseller");
        }
        if product.is_amazon_choice {
            badges.push("Amazon's Choice");
        }
        badges
    }

    /// Shortens to `width` characters, ending in "..." when cut.
    fn truncate(text: &str, width: usize) -> String {
        if text.chars().count() > width {
            let kept: String = text.chars().take(width.saturating_sub(3)).collect();
            format!("{}...", kept)
        } else {
            text.to_string()
        }
    }

    fn table_products(&self, products: &[ProductRecord]) -> String {
        let rank_width = 3;
        let asin_width = 10;
        let price_width = 12;
        let rating_width = 6;
        let reviews_width = 8;
        let title_width = 50;

        let mut lines = Vec::new();

        lines.push(format!(
            "{:<rank_width$}  {:<asin_width$}  {:<price_width$}  {:<rating_width$}  {:<reviews_width$}  {}",
            "#", "ASIN", "Price", "Rating", "Reviews", "Title"
        ));
        lines.push(format!(
            "{:-<rank_width$}  {:-<asin_width$}  {:-<price_width$}  {:-<rating_width$}  {:-<reviews_width$}  {:-<title_width$}",
            "", "", "", "", "", ""
        ));

        for (index, product) in products.iter().enumerate() {
            lines.push(format!(
                "{:<rank_width$}  {:<asin_width$}  {:>price_width$}  {:>rating_width$}  {:>reviews_width$}  {}",
                index + 1,
                product.asin,
                Self::price_text(product),
                Self::rating_text(product),
                product.review_count,
                Self::truncate(&product.title, title_width)
            ));
        }

        lines.push(String::new());
        lines.push(format!("Total: {} products", products.len()));

        lines.join("\n")
    }

    /// One report section per product, ready to paste into a chat.
    fn markdown_products(&self, products: &[ProductRecord]) -> String {
        let mut sections = Vec::new();

        for (index, product) in products.iter().enumerate() {
            let mut lines = Vec::new();
            lines.push(format!("### {}. {}", index + 1, product.title));
            lines.push(String::new());

            if product.link != UNKNOWN {
                lines.push(format!("- **Link:** [View on Amazon]({})", product.link));
            }
            lines.push(format!("- **Price:** {}", Self::price_text(product)));

            if product.rating > 0.0 {
                lines.push(format!(
                    "- **Rating:** {:.1}/5 ({} reviews)",
                    product.rating, product.review_count
                ));
            } else {
                lines.push("- **Rating:** N/A".to_string());
            }

            let badges = Self::badges(product);
            if !badges.is_empty() {
                lines.push(format!("- **Badges:** {}", badges.join(", ")));
            }

            sections.push(lines.join("\n"));
        }

        sections.push(format!("*{} products found*", products.len()));
        sections.join("\n\n")
    }

    fn csv_header() -> String {
        "asin,title,price,currency,rating,reviews,prime,best_seller,amazon_choice,link,image"
            .to_string()
    }

    fn csv_products(&self, products: &[ProductRecord]) -> String {
        let mut lines = Vec::new();
        lines.push(Self::csv_header());

        for product in products {
            let price = product.known_price().map(|p| p.to_string()).unwrap_or_default();
            let rating = if product.rating > 0.0 { product.rating.to_string() } else { String::new() };

            lines.push(format!(
                "{},{},{},{},{},{},{},{},{},{},{}",
                product.asin,
                Self::csv_escape(&product.title),
                price,
                product.currency,
                rating,
                product.review_count,
                product.is_prime,
                product.is_best_seller,
                product.is_amazon_choice,
                Self::csv_escape(&product.link),
                Self::csv_escape(&product.image_url)
            ));
        }

        lines.join("\n")
    }

    fn csv_escape(s: &str) -> String {
        if s.contains(',') || s.contains('"') || s.contains('\n') {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }
}
