// Convert wire values (JSON numbers, numeric strings) into prices.
// Anything that is not a finite, non-negative number comes back as None.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;

// Upstreams use this when no trade has happened yet
pub const PLACEHOLDER: &str = "-";

pub struct Normaliser {
    pub price_scale: u32, // decimal places kept, e.g. 4
}

impl Default for Normaliser {
    fn default() -> Self {
        Self::new(4)
    }
}

impl Normaliser {
    pub fn new(price_scale: u32) -> Self {
        Self { price_scale }
    }

    pub fn price_from_str(&self, s: &str) -> Option<Decimal> {
        let s = s.trim();
        if s.is_empty() || s == PLACEHOLDER {
            return None;
        }
        let s = s.replace(',', "");
        let parsed = Decimal::from_str(&s)
            .or_else(|_| Decimal::from_scientific(&s))
            .ok()?;
        self.accept(parsed)
    }

    pub fn price_from_value(&self, v: &Value) -> Option<Decimal> {
        match v {
            // serde_json prints floats in shortest round-trip form, so no binary noise leaks in
            Value::Number(n) => self.price_from_str(&n.to_string()),
            Value::String(s) => self.price_from_str(s),
            // Yahoo sometimes wraps values as {"raw": 1.0, "fmt": "1.00"}
            Value::Object(map) => map.get("raw").and_then(|raw| self.price_from_value(raw)),
            _ => None,
        }
    }

    // First key of `keys` that yields a usable price
    pub fn first_price(&self, obj: &Value, keys: &[&str]) -> Option<Decimal> {
        let map = obj.as_object()?;
        keys.iter()
            .filter_map(|k| map.get(*k))
            .find_map(|v| self.price_from_value(v))
    }

    fn accept(&self, d: Decimal) -> Option<Decimal> {
        if d.is_sign_negative() && !d.is_zero() {
            return None;
        }
        Some(d.round_dp(self.price_scale).normalize())
    }
}
