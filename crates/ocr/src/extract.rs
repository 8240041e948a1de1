use std::sync::OnceLock;

use regex::Regex;

use crate::types::{ScannedReceipt, MAX_ITEMS};

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

/// Glyphs that may prefix an amount, and that disqualify a line as an item.
const CURRENCY_GLYPHS: [char; 4] = ['$', '€', '£', '¥'];

re!(re_amount,
    r"[$€£¥]?\s*([0-9]+(?:\.[0-9]+)?)");
re!(re_date,
    r"[0-9]{1,2}[/-][0-9]{1,2}[/-][0-9]{2,4}");

// ── Public extraction API ─────────────────────────────────────────────────────

/// Turns raw OCR text into a [`ScannedReceipt`].
///
/// Extraction is total: missing signals fall back to empty fields, so the
/// result can always be used to prefill a form.
pub struct ReceiptTextExtractor;

impl ReceiptTextExtractor {
    pub fn extract(text: &str) -> ScannedReceipt {
        let lines = segment_lines(text);

        let amount = Self::extract_amount(text);
        let date = Self::extract_date(text);
        let merchant_line = Self::extract_merchant(&lines);
        let items = Self::extract_items(&lines, merchant_line);

        let receipt = ScannedReceipt {
            amount,
            merchant: merchant_line.trim().to_string(),
            date,
            items,
        };
        tracing::debug!(
            lines = lines.len(),
            amount = ?receipt.amount,
            date = ?receipt.date,
            merchant = %receipt.merchant,
            items = receipt.items.len(),
            "extracted receipt fields"
        );
        receipt
    }

    // ── Amount ────────────────────────────────────────────────────────────────

    /// The largest number on the page; totals usually outrank subtotal, tax and tip.
    fn extract_amount(text: &str) -> Option<String> {
        re_amount()
            .captures_iter(text)
            .filter_map(|c| c.get(1)?.as_str().parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .max_by(f64::total_cmp)
            .map(|v| v.to_string())
    }

    // ── Date ─────────────────────────────────────────────────────────────────

    fn extract_date(text: &str) -> Option<String> {
        re_date().find(text).map(|m| m.as_str().to_string())
    }

    // ── Merchant ──────────────────────────────────────────────────────────────

    /// Headers are usually printed in capitals, so the first shouty line wins.
    fn extract_merchant<'a>(lines: &[&'a str]) -> &'a str {
        lines
            .iter()
            .copied()
            .find(|l| char_len(l) > 3 && l.to_uppercase() == *l && !is_all_digits(l))
            .or_else(|| lines.first().copied())
            .unwrap_or("")
    }

    // ── Items ─────────────────────────────────────────────────────────────────

    fn extract_items(lines: &[&str], merchant_line: &str) -> Vec<String> {
        lines
            .iter()
            .copied()
            .filter(|l| char_len(l) > 2)
            .filter(|l| !is_all_digits(l))
            .filter(|l| !l.starts_with(CURRENCY_GLYPHS))
            .filter(|l| *l != merchant_line)
            .take(MAX_ITEMS)
            .map(str::to_string)
            .collect()
    }
}

// ── Line helpers ──────────────────────────────────────────────────────────────

/// Split on any of `\r\n`, `\r`, `\n` and drop blank lines. Kept lines are not trimmed.
fn segment_lines(text: &str) -> Vec<&str> {
    text.split(['\r', '\n'])
        .filter(|l| !l.trim().is_empty())
        .collect()
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── Defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn empty_input_yields_all_defaults() {
        let r = ReceiptTextExtractor::extract("");
        assert_eq!(r, ScannedReceipt::default());
        assert_eq!(r.merchant, "");
        assert!(r.items.is_empty());
    }

    #[test]
    fn whitespace_only_input_yields_all_defaults() {
        assert_eq!(
            ReceiptTextExtractor::extract("  \n\t\r\n   \r"),
            ScannedReceipt::default()
        );
    }

    #[test]
    fn extraction_is_deterministic() {
        let text = "CORNER DELI\n2 bagels\n01-02-24\nSubtotal $6.00\nTax $0.48\nTotal $6.48";
        assert_eq!(ReceiptTextExtractor::extract(text), ReceiptTextExtractor::extract(text));
    }

    #[test]
    fn no_panic_on_garbage_input() {
        let _ = ReceiptTextExtractor::extract("!@#$%^&*()\n\0\x01\x02\n€€€\n💳💳💳");
    }

    // ── Amount ────────────────────────────────────────────────────────────────

    #[test]
    fn amount_is_largest_value() {
        let r = ReceiptTextExtractor::extract("Subtotal $10.00\nTax $1.50\nTotal $11.50");
        assert_eq!(r.amount.as_deref(), Some("11.5"));
    }

    #[test]
    fn amount_ignores_which_glyph_preceded_it() {
        let r = ReceiptTextExtractor::extract("€ 4.20\n£9.99\n¥120\n$3");
        assert_eq!(r.amount.as_deref(), Some("120"));
    }

    #[test]
    fn amount_counts_bare_numbers_too() {
        // Dates and street numbers compete with the printed total.
        let r = ReceiptTextExtractor::extract("Store\n03/14/2024\nTotal $5.00");
        assert_eq!(r.amount.as_deref(), Some("2024"));
    }

    #[test]
    fn amount_absent_without_digits() {
        let r = ReceiptTextExtractor::extract("THANK YOU\nplease come again");
        assert_eq!(r.amount, None);
    }

    #[test]
    fn amount_thousands_separator_splits_the_number() {
        let r = ReceiptTextExtractor::extract("Total $1,234.56");
        assert_eq!(r.amount.as_deref(), Some("234.56"));
    }

    #[test]
    fn amount_skips_overflowing_tokens() {
        let text = format!("SHOP\nRef {}\nTotal $5", "9".repeat(400));
        let r = ReceiptTextExtractor::extract(&text);
        assert_eq!(r.amount.as_deref(), Some("5"));
    }

    #[test]
    fn amount_ignores_unicode_digits() {
        let r = ReceiptTextExtractor::extract("Total ٣٤٥");
        assert_eq!(r.amount, None);
    }

    // ── Date ─────────────────────────────────────────────────────────────────

    #[test]
    fn date_is_passed_through_verbatim() {
        let r = ReceiptTextExtractor::extract("Store\n03/14/2024\nTotal $5.00");
        assert_eq!(r.date.as_deref(), Some("03/14/2024"));
    }

    #[test]
    fn date_accepts_hyphens_and_short_years() {
        let r = ReceiptTextExtractor::extract("SHOP\nDate: 5-7-24 12:01");
        assert_eq!(r.date.as_deref(), Some("5-7-24"));
    }

    #[test]
    fn date_takes_first_match_only() {
        let r = ReceiptTextExtractor::extract("1/2/2023\nreturn by 2/3/2023");
        assert_eq!(r.date.as_deref(), Some("1/2/2023"));
    }

    #[test]
    fn date_absent_when_nothing_date_shaped() {
        let r = ReceiptTextExtractor::extract("SHOP\nTable 4 / Seat 2\nTotal $5.00");
        assert_eq!(r.date, None);
    }

    #[test]
    fn date_can_match_inside_iso_date() {
        // Unanchored: the tail of a YYYY-MM-DD token is date-shaped on its own.
        let r = ReceiptTextExtractor::extract("SHOP\n2024-03-14");
        assert_eq!(r.date.as_deref(), Some("24-03-14"));
    }

    // ── Merchant ──────────────────────────────────────────────────────────────

    #[test]
    fn merchant_prefers_uppercase_line() {
        let r = ReceiptTextExtractor::extract("ACME MART\n123 Main St\nTotal $3.00");
        assert_eq!(r.merchant, "ACME MART");
    }

    #[test]
    fn merchant_uppercase_line_need_not_be_first() {
        let r = ReceiptTextExtractor::extract("welcome to\nBIG BOX STORE\nmilk 2.99");
        assert_eq!(r.merchant, "BIG BOX STORE");
    }

    #[test]
    fn merchant_falls_back_to_first_line() {
        let r = ReceiptTextExtractor::extract("acme mart\ntotal $3.00");
        assert_eq!(r.merchant, "acme mart");
    }

    #[test]
    fn merchant_skips_short_and_all_digit_lines() {
        let r = ReceiptTextExtractor::extract("ABC\n12345\nlower\nCORNER SHOP");
        assert_eq!(r.merchant, "CORNER SHOP");
    }

    #[test]
    fn merchant_is_trimmed() {
        let r = ReceiptTextExtractor::extract("   ACME MART   \nbread");
        assert_eq!(r.merchant, "ACME MART");
    }

    #[test]
    fn merchant_accepts_caseless_lines() {
        // A printed date has no lowercase letters, so it qualifies as a header.
        let r = ReceiptTextExtractor::extract("Store\n03/14/2024\nTotal $5.00");
        assert_eq!(r.merchant, "03/14/2024");
    }

    // ── Items ─────────────────────────────────────────────────────────────────

    #[test]
    fn items_are_capped_at_five_in_order() {
        let text = "ACME MART\nitem one\nitem two\nitem three\nitem four\nitem five\nitem six\nitem seven\nitem eight";
        let r = ReceiptTextExtractor::extract(text);
        assert_eq!(
            r.items,
            vec!["item one", "item two", "item three", "item four", "item five"]
        );
    }

    #[test]
    fn items_exclude_merchant_numeric_and_currency_lines() {
        let text = "SHOP\n12345\n$4.00\nbread\nSHOP\n€2 off\n£3 coins\n¥100 yen\nmilk";
        let r = ReceiptTextExtractor::extract(text);
        assert_eq!(r.merchant, "SHOP");
        assert_eq!(r.items, vec!["bread", "milk"]);
    }

    #[test]
    fn items_exclude_untrimmed_merchant_line() {
        let r = ReceiptTextExtractor::extract("  ACME  \nbread\n  ACME  ");
        assert_eq!(r.merchant, "ACME");
        assert_eq!(r.items, vec!["bread"]);
    }

    #[test]
    fn items_skip_short_lines() {
        let r = ReceiptTextExtractor::extract("CAFE\nab\ntea\nx");
        assert_eq!(r.items, vec!["tea"]);
    }

    #[test]
    fn items_keep_indented_currency_lines() {
        // Only a leading glyph disqualifies a line; indentation is preserved.
        let r = ReceiptTextExtractor::extract("CAFE\n  $2.50 tea");
        assert_eq!(r.items, vec!["  $2.50 tea"]);
    }

    // ── Line segmentation ─────────────────────────────────────────────────────

    #[test]
    fn line_endings_are_equivalent() {
        let unix = ReceiptTextExtractor::extract("ACME MART\nmilk 2.00\n\nTotal $2.00\n");
        let windows = ReceiptTextExtractor::extract("ACME MART\r\nmilk 2.00\r\n\r\nTotal $2.00\r\n");
        let classic_mac = ReceiptTextExtractor::extract("ACME MART\rmilk 2.00\r\rTotal $2.00\r");
        assert_eq!(unix, windows);
        assert_eq!(unix, classic_mac);
        assert_eq!(unix.items, vec!["milk 2.00", "Total $2.00"]);
    }

    #[test]
    fn segment_drops_blank_lines_but_keeps_order() {
        assert_eq!(segment_lines("a\n \nb\r\n\tc"), vec!["a", "b", "\tc"]);
    }

    #[test]
    fn is_all_digits_is_ascii_only() {
        assert!(is_all_digits("0123"));
        assert!(!is_all_digits(""));
        assert!(!is_all_digits("12 3"));
        assert!(!is_all_digits("١٢٣"));
    }
}
