use serde::Deserialize;
use time::{Date, OffsetDateTime};

use crate::aggregate::{iso_date, month_abbrev};

/// How monetary amounts are rendered.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CurrencyFormat {
    pub symbol: String,
    pub decimals: u8,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self {
            symbol: "$".to_string(),
            decimals: 2,
        }
    }
}

impl CurrencyFormat {
    /// `1234.5` → `$1,234.50`; negatives as `-$12.00`.
    pub fn format(&self, amount: f64) -> String {
        if !amount.is_finite() {
            return format!("{}-", self.symbol);
        }

        let fixed = format!("{:.*}", usize::from(self.decimals), amount.abs());
        let (int_part, frac_part) = match fixed.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (fixed.as_str(), None),
        };

        let mut out = String::new();
        let negative = amount < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0');
        if negative {
            out.push('-');
        }
        out.push_str(&self.symbol);
        out.push_str(&group_thousands(int_part));
        if let Some(frac) = frac_part {
            out.push('.');
            out.push_str(frac);
        }
        out
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `Jan 1, 2024`
pub fn format_date(date: Date) -> String {
    format!("{} {}, {}", month_abbrev(date.month()), date.day(), date.year())
}

/// `2024-01-01 09:15 UTC`, or with the numeric offset when not UTC.
pub fn format_timestamp(ts: OffsetDateTime) -> String {
    let offset = ts.offset();
    let zone = if offset.is_utc() {
        "UTC".to_string()
    } else {
        let sign = if offset.is_negative() { '-' } else { '+' };
        format!(
            "{sign}{:02}:{:02}",
            offset.whole_hours().unsigned_abs(),
            offset.minutes_past_hour().unsigned_abs()
        )
    };
    format!(
        "{} {:02}:{:02} {}",
        iso_date(ts.date()),
        ts.hour(),
        ts.minute(),
        zone
    )
}

/// Fixed-precision number for tables (`1234.5678` → `1234.57`).
pub fn format_number(value: f64, decimals: usize) -> String {
    format!("{value:.decimals$}")
}
