use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::utils::error::MalformedPriceError;

// First run of digits, with an optional leading decimal separator, allowing grouping spaces (NBSP and thin spaces included) and separators
static AMOUNT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.,]?\d[\d\s.,]*").expect("amount pattern compiles"));

/// Turns locale-formatted price text ("1 234,56 ₽", "$1,299.99") into a number.
#[derive(Debug, Clone, Default)]
pub struct PriceNormalizer;

impl PriceNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Separator rule: a `,` or `.` is the decimal point only when it occurs
    /// exactly once and is the last separator in the amount. Every other
    /// separator is grouping and is discarded.
    pub fn normalize(&self, raw: &str) -> Result<f64, MalformedPriceError> {
        let malformed = || MalformedPriceError {
            raw: raw.to_string(),
        };

        let amount = AMOUNT_REGEX.find(raw).ok_or_else(malformed)?;
        let compact: String = amount
            .as_str()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let compact = compact.trim_end_matches([',', '.']);

        let decimal_at = compact.rfind([',', '.']).filter(|&index| {
            let separator = &compact[index..=index];
            compact.matches(separator).count() == 1
        });

        let digits = |s: &str| s.chars().filter(char::is_ascii_digit).collect::<String>();
        let canonical = match decimal_at {
            Some(index) => format!("0{}.{}", digits(&compact[..index]), digits(&compact[index + 1..])),
            None => digits(compact),
        };

        if canonical.is_empty() {
            return Err(malformed());
        }

        Decimal::from_str(&canonical)
            .ok()
            .and_then(|value| value.to_f64())
            .filter(|value| *value >= 0.0)
            .ok_or_else(malformed)
    }
}
