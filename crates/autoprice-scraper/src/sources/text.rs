//! Text coercion shared by the page parsers.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

/// Prices above this are treated as garbage rather than listings.
const MAX_LISTING_PRICE: i64 = 10_000_000;

/// Parses the digits of `text`, ignoring every other character.
///
/// `"18.500 €"` → `Some(18500)`, `"Consultar"` → `None`.
pub(crate) fn digits_only(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    digits.parse::<u64>().ok()
}

/// Parses a money amount written with either `.` or `,` as the decimal
/// separator and the other (or the same, in groups of three) as grouping.
///
/// `"17500.00"` → `17500.00`, `"18.500 €"` → `18500`, `"17.500,50"` →
/// `17500.50`. Returns `None` when no unambiguous number can be read.
pub(crate) fn parse_amount(text: &str) -> Option<Decimal> {
    let kept: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    let kept = kept.trim_matches(|c| c == '.' || c == ',');
    if !kept.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let decimal_at = match (kept.rfind('.'), kept.rfind(',')) {
        (Some(dot), Some(comma)) => Some(dot.max(comma)),
        (Some(at), None) | (None, Some(at)) => {
            let separator = if kept[at..].starts_with('.') { '.' } else { ',' };
            let groups: Vec<&str> = kept.split(separator).collect();
            let is_grouping = groups[0].len() <= 3 && groups[1..].iter().all(|g| g.len() == 3);
            match (is_grouping, groups.len()) {
                (true, _) => None,
                (false, 2) => Some(at),
                (false, _) => return None,
            }
        }
        (None, None) => None,
    };

    let only_digits = |s: &str| s.chars().filter(char::is_ascii_digit).collect::<String>();
    let normalized = match decimal_at {
        Some(at) => format!("{}.{}", only_digits(&kept[..at]), only_digits(&kept[at + 1..])),
        None => only_digits(kept),
    };
    Decimal::from_str(&normalized).ok()
}

/// Rounds `amount` to whole euros and keeps it only when it is a plausible
/// listing price: positive and no larger than [`MAX_LISTING_PRICE`].
pub(crate) fn listing_price(amount: Decimal) -> Option<Decimal> {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    (rounded > Decimal::ZERO && rounded <= Decimal::from(MAX_LISTING_PRICE)).then_some(rounded)
}

/// Trims and collapses internal whitespace runs to a single space.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_only_strips_separators_and_units() {
        assert_eq!(digits_only("18.500 €"), Some(18_500));
        assert_eq!(digits_only("110 CV"), Some(110));
        assert_eq!(digits_only("4.059 mm"), Some(4_059));
    }

    #[test]
    fn digits_only_rejects_text_without_digits() {
        assert_eq!(digits_only("Consultar"), None);
        assert_eq!(digits_only(""), None);
    }

    #[test]
    fn parse_amount_reads_decimal_point_strings() {
        assert_eq!(parse_amount("17500.00"), Some(Decimal::new(1_750_000, 2)));
        assert_eq!(parse_amount("17500,5"), Some(Decimal::new(175_005, 1)));
        assert_eq!(parse_amount("1.5"), Some(Decimal::new(15, 1)));
    }

    #[test]
    fn parse_amount_reads_grouped_thousands() {
        assert_eq!(parse_amount("18.500 €"), Some(Decimal::from(18_500)));
        assert_eq!(parse_amount("1.234.567"), Some(Decimal::from(1_234_567)));
        assert_eq!(parse_amount("17,500"), Some(Decimal::from(17_500)));
        assert_eq!(parse_amount("17.500,50 €"), Some(Decimal::new(1_750_050, 2)));
        assert_eq!(parse_amount("17,500.50"), Some(Decimal::new(1_750_050, 2)));
    }

    #[test]
    fn parse_amount_rejects_ambiguous_or_empty_text() {
        assert_eq!(parse_amount("Consultar"), None);
        assert_eq!(parse_amount("€"), None);
        assert_eq!(parse_amount("12.34.56"), None);
    }

    #[test]
    fn parse_amount_does_not_panic_on_absurd_digit_runs() {
        assert_eq!(parse_amount(&"9".repeat(60)), None);
    }

    #[test]
    fn listing_price_rounds_and_bounds() {
        assert_eq!(listing_price(Decimal::new(1_750_050, 2)), Some(Decimal::from(17_501)));
        assert_eq!(listing_price(Decimal::ZERO), None);
        assert_eq!(listing_price(Decimal::from(-5)), None);
        assert_eq!(listing_price(Decimal::from(10_000_000)), Some(Decimal::from(10_000_000)));
        assert_eq!(listing_price(Decimal::from(10_000_001)), None);
    }

    #[test]
    fn collapse_whitespace_normalizes_runs() {
        assert_eq!(collapse_whitespace("  1.0 TSI\n   110 CV "), "1.0 TSI 110 CV");
    }
}
