//! Catalog filter parsing.

use rust_decimal::Decimal;
use std::str::FromStr;

/// Inclusive price band parsed from the storefront's `"min-max"` filter
/// string. The UI sends the literal placeholder `Min-Max` when the filter is
/// untouched; that and any malformed input count as "no filter".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    pub min: Decimal,
    pub max: Decimal,
}

impl PriceRange {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("min-max") {
            return None;
        }
        let (min, max) = raw.split_once('-')?;
        let min = Decimal::from_str(min.trim()).ok()?;
        let max = Decimal::from_str(max.trim()).ok()?;
        if min > max {
            return None;
        }
        Some(Self { min, max })
    }

    pub fn contains(&self, price: Decimal) -> bool {
        self.min <= price && price <= self.max
    }
}

/// Wraps a search query in `%…%` for ILIKE, escaping the pattern
/// metacharacters (`%`, `_`, `\`) so the query matches as a literal
/// substring: searching for `100%` must not match every "100".
pub fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// Normalized attribute filter for the catalog listing. Every supplied field
/// must match (AND); unset fields pass all rows.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub price: Option<PriceRange>,
}

impl ProductFilter {
    /// Builds a filter from raw query params, applying the storefront's
    /// normalization: colors are matched lowercase, sizes uppercase. A price
    /// string that fails to parse degrades to unfiltered rather than erroring.
    pub fn from_query(
        category: Option<String>,
        color: Option<String>,
        size: Option<String>,
        price: Option<String>,
    ) -> Self {
        let nonempty = |s: Option<String>| s.filter(|v| !v.trim().is_empty());
        let price = nonempty(price).and_then(|raw| {
            let parsed = PriceRange::parse(&raw);
            if parsed.is_none() {
                tracing::warn!(raw = %raw, "ignoring malformed price filter");
            }
            parsed
        });
        Self {
            category: nonempty(category),
            color: nonempty(color).map(|c| c.to_lowercase()),
            size: nonempty(size).map(|s| s.to_uppercase()),
            price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_inclusive_range() {
        let r = PriceRange::parse("10-50").unwrap();
        assert_eq!(r, PriceRange { min: dec!(10), max: dec!(50) });
        assert!(r.contains(dec!(10)));
        assert!(r.contains(dec!(50)));
        assert!(r.contains(dec!(25.99)));
        assert!(!r.contains(dec!(9.99)));
        assert!(!r.contains(dec!(50.01)));
    }

    #[test]
    fn malformed_input_is_no_filter() {
        assert_eq!(PriceRange::parse(""), None);
        assert_eq!(PriceRange::parse("Min-Max"), None);
        assert_eq!(PriceRange::parse("cheap"), None);
        assert_eq!(PriceRange::parse("10-"), None);
        assert_eq!(PriceRange::parse("ten-twenty"), None);
        assert_eq!(PriceRange::parse("50-10"), None);
    }

    #[test]
    fn like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("shirt"), "%shirt%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_c"), "%a\\_c%");
        assert_eq!(like_pattern("back\\slash"), "%back\\\\slash%");
    }

    #[test]
    fn query_normalization() {
        let f = ProductFilter::from_query(
            Some("Shirts".into()),
            Some("NAVY".into()),
            Some("m".into()),
            Some("not-a-range".into()),
        );
        assert_eq!(f.category.as_deref(), Some("Shirts"));
        assert_eq!(f.color.as_deref(), Some("navy"));
        assert_eq!(f.size.as_deref(), Some("M"));
        assert!(f.price.is_none());

        let empty = ProductFilter::from_query(Some("".into()), None, None, None);
        assert!(empty.category.is_none());
    }
}
