//! Display currencies and amount formatting.
//!
//! Amounts are stored in the USD baseline and converted with a static rate
//! table at display time. Formatting follows the number conventions of each
//! currency's locale (separators, digit grouping, symbol placement).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurrencyCode {
    #[default]
    Usd,
    Eur,
    Inr,
    Rub,
}

impl CurrencyCode {
    pub const ALL: [CurrencyCode; 4] = [
        CurrencyCode::Usd,
        CurrencyCode::Eur,
        CurrencyCode::Inr,
        CurrencyCode::Rub,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CurrencyCode::Usd => "USD",
            CurrencyCode::Eur => "EUR",
            CurrencyCode::Inr => "INR",
            CurrencyCode::Rub => "RUB",
        }
    }

    pub fn config(&self) -> &'static CurrencyConfig {
        match self {
            CurrencyCode::Usd => &CURRENCIES[0],
            CurrencyCode::Eur => &CURRENCIES[1],
            CurrencyCode::Inr => &CURRENCIES[2],
            CurrencyCode::Rub => &CURRENCIES[3],
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(CurrencyCode::Usd),
            "EUR" => Ok(CurrencyCode::Eur),
            "INR" => Ok(CurrencyCode::Inr),
            "RUB" => Ok(CurrencyCode::Rub),
            other => Err(format!("Unknown currency code: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyConfig {
    pub code: CurrencyCode,
    pub symbol: &'static str,
    /// Units of this currency per 1 USD.
    pub rate: f64,
    pub locale: &'static str,
}

pub const CURRENCIES: [CurrencyConfig; 4] = [
    CurrencyConfig {
        code: CurrencyCode::Usd,
        symbol: "$",
        rate: 1.0,
        locale: "en-US",
    },
    CurrencyConfig {
        code: CurrencyCode::Eur,
        symbol: "€",
        rate: 0.92,
        locale: "de-DE",
    },
    CurrencyConfig {
        code: CurrencyCode::Inr,
        symbol: "₹",
        rate: 83.5,
        locale: "en-IN",
    },
    CurrencyConfig {
        code: CurrencyCode::Rub,
        symbol: "₽",
        rate: 92.0,
        locale: "ru-RU",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grouping {
    Thousands,
    /// Last three digits, then pairs (12,34,567).
    Indian,
}

#[derive(Debug, Clone, Copy)]
struct NumberStyle {
    group_separator: &'static str,
    decimal_separator: &'static str,
    grouping: Grouping,
    symbol_first: bool,
}

const NBSP: &str = "\u{a0}";

fn number_style(locale: &str) -> NumberStyle {
    match locale {
        "de-DE" => NumberStyle {
            group_separator: ".",
            decimal_separator: ",",
            grouping: Grouping::Thousands,
            symbol_first: false,
        },
        "ru-RU" => NumberStyle {
            group_separator: NBSP,
            decimal_separator: ",",
            grouping: Grouping::Thousands,
            symbol_first: false,
        },
        "en-IN" => NumberStyle {
            group_separator: ",",
            decimal_separator: ".",
            grouping: Grouping::Indian,
            symbol_first: true,
        },
        _ => NumberStyle {
            group_separator: ",",
            decimal_separator: ".",
            grouping: Grouping::Thousands,
            symbol_first: true,
        },
    }
}

fn group_digits(digits: &str, style: &NumberStyle) -> String {
    let mut groups: Vec<&str> = Vec::new();
    let mut end = digits.len();

    let mut size = 3;
    while end > size {
        groups.push(&digits[end - size..end]);
        end -= size;
        if style.grouping == Grouping::Indian {
            size = 2;
        }
    }
    groups.push(&digits[..end]);
    groups.reverse();
    groups.join(style.group_separator)
}

/// Converts a USD-baseline amount and formats it in the currency's locale,
/// always with two fraction digits.
pub fn format_amount(amount: f64, currency: CurrencyCode) -> String {
    let config = currency.config();
    let converted = amount * config.rate;
    let style = number_style(config.locale);

    let fixed = format!("{:.2}", converted.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let is_negative = converted < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0');

    let number = format!(
        "{}{}{}",
        group_digits(int_part, &style),
        style.decimal_separator,
        frac_part
    );
    let sign = if is_negative { "-" } else { "" };

    if style.symbol_first {
        format!("{}{}{}", sign, config.symbol, number)
    } else {
        format!("{}{}{}{}", sign, number, NBSP, config.symbol)
    }
}

/// Same as [`format_amount`] for a raw currency code. Unknown codes never fail;
/// they fall back to the plain number.
pub fn format_amount_for_code(amount: f64, code: &str) -> String {
    match code.parse::<CurrencyCode>() {
        Ok(currency) => format_amount(amount, currency),
        Err(_) => format!("{}", amount),
    }
}
