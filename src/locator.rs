//! XPath expressions for the fields read off a product page.
//!
//! Nutrients live in a two-column table: the label cell contains the nutrient
//! name and the value sits in the second cell of the same row. Free-text
//! sections (ingredients, allergens) are collapsible blocks marked with
//! `data-testid="more-than"`; the heading text lives somewhere inside the
//! block and the body is its direct `div` child.

/// Value cell of the nutrition table row whose label contains `nutrient`.
pub fn nutrient_value(nutrient: &str) -> String {
    format!(
        "//td[contains(text(),{})]/../td[2]",
        xpath_literal(nutrient)
    )
}

/// Body of the collapsible info block whose heading contains `title`.
pub fn info_block(title: &str) -> String {
    format!(
        "//*[contains(text(), {})]/ancestor::*[@data-testid=\"more-than\"]/div",
        xpath_literal(title)
    )
}

/// Quote `value` as an XPath 1.0 string literal.
///
/// XPath has no escape sequences, so text holding both quote kinds is split
/// into pieces and joined with `concat()`.
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('"') {
        return format!("\"{}\"", value);
    }
    if !value.contains('\'') {
        return format!("'{}'", value);
    }

    let parts: Vec<String> = value
        .split('"')
        .map(|part| format!("\"{}\"", part))
        .collect();
    format!("concat({})", parts.join(", '\"', "))
}
