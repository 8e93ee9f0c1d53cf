//! Whole-dollar money values and the lenient numeric coercion used for
//! display strings such as `"$1,250,000"`.

use serde::{Deserialize, Deserializer};

/// Whole USD. Fractional currency never appears in the dataset or output.
pub type Money = u64;

/// Parse a value for numeric comparison.
///
/// `$` and `,` are stripped before parsing as a float; anything that still
/// fails to parse coerces to `0.0`.
pub fn coerce_numeric(raw: &str) -> f64 {
    let cleaned: String = raw.chars().filter(|c| *c != '$' && *c != ',').collect();
    match cleaned.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// Convert a coerced float to whole dollars, flooring and clamping at zero.
pub fn to_money(value: f64) -> Money {
    if value.is_finite() && value > 0.0 {
        value.floor() as Money
    } else {
        0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMoney {
    Whole(u64),
    Signed(i64),
    Float(f64),
    Text(String),
}

/// Serde helper accepting numbers or display strings for money fields
pub fn deserialize<'de, D>(deserializer: D) -> Result<Money, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawMoney::deserialize(deserializer)? {
        RawMoney::Whole(value) => value,
        RawMoney::Signed(value) => value.max(0) as Money,
        RawMoney::Float(value) => to_money(value),
        RawMoney::Text(text) => to_money(coerce_numeric(&text)),
    })
}
