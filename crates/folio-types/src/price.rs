use serde::{Deserialize, Serialize};

/// A price as it arrives from an admin form or API client.
///
/// The admin form submits whatever was typed (`"₦45,000"`, `"1200"`), while
/// API clients may send a plain number. [`parse_price`] reduces both to the
/// one stored representation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Number(f64),
    Text(String),
}

impl From<f64> for PriceInput {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for PriceInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PriceInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Reduce a raw price to a stored amount, or `None` for "no price".
///
/// Numbers pass through unless they are not finite. Text keeps only ASCII
/// digits, `.` and `-`; an empty remainder or a failed parse means no price.
pub fn parse_price(raw: Option<&PriceInput>) -> Option<f64> {
    match raw? {
        PriceInput::Number(value) => value.is_finite().then_some(*value),
        PriceInput::Text(text) => {
            let cleaned: String = text
                .trim()
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            if cleaned.is_empty() {
                return None;
            }
            cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
        }
    }
}
