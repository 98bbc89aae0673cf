//! Sales-order number detection.
//!
//! An order number is any run of 6 to 10 ASCII digits. The pattern is not
//! anchored, so longer digit runs still match on their first 10 digits.

use regex_lite::Regex;
use std::sync::LazyLock;

static ORDER_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{6,10}").expect("order number pattern is valid"));

/// Whether `text` mentions anything that looks like an order number.
pub fn contains_order_number(text: &str) -> bool {
    ORDER_NUMBER.is_match(text)
}

/// Every order number in `text`, left to right, first occurrence only.
pub fn extract_order_numbers(text: &str) -> Vec<String> {
    let mut numbers: Vec<String> = Vec::new();
    for m in ORDER_NUMBER.find_iter(text) {
        let number = m.as_str();
        if !numbers.iter().any(|n| n == number) {
            numbers.push(number.to_string());
        }
    }
    numbers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_six_to_ten_digits() {
        assert!(contains_order_number("order 123456"));
        assert!(contains_order_number("order 1234567890"));
        assert!(!contains_order_number("order 12345"));
        assert!(!contains_order_number("no digits here"));
    }

    #[test]
    fn detects_runs_inside_words() {
        assert!(contains_order_number("SO-1234567-A"));
    }

    #[test]
    fn extracts_all_in_order_without_duplicates() {
        assert_eq!(
            extract_order_numbers("Compare 7654321 with 1234567 and 7654321 again"),
            vec!["7654321", "1234567"]
        );
    }

    #[test]
    fn long_runs_split_greedily() {
        // 16 digits: first 10 match, the remaining 6 form a second match
        assert_eq!(
            extract_order_numbers("1234567890123456"),
            vec!["1234567890", "123456"]
        );
        // 12 digits: first 10 match, remaining 2 are too short
        assert_eq!(extract_order_numbers("123456789012"), vec!["1234567890"]);
    }

    #[test]
    fn nothing_to_extract() {
        assert!(extract_order_numbers("What is our returns policy?").is_empty());
    }
}
