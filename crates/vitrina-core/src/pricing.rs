//! # Pricing Module
//!
//! Derives a product's suggested retail price from its USDT cost, the two
//! exchange rates and a profit percentage.
//!
//! ## Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Price Derivation                                │
//! │                                                                         │
//! │   cost_usdt ──┐                                                         │
//! │               ├──► cost × informal ──► ÷ official ──► real_bcv_usd      │
//! │   informal ───┘                            ▲               │            │
//! │                                            │               │            │
//! │   official ────────────────────────────────┘               ▼            │
//! │                                              × (1 + profit / 100)       │
//! │   profit_percent (clamped 0..=200) ────────────────────────┘            │
//! │                                                            │            │
//! │                                                            ▼            │
//! │                                                        sale_usd         │
//! │                                                                         │
//! │   Fixed mode: sale_usd = fixed_price_usd (rates and profit bypassed)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Numeric Semantics
//! The editor is spreadsheet-like, so nothing in here ever fails:
//! - negative, NaN or infinite inputs are treated as 0
//! - percentages are clamped to `[0, 200]`
//! - an official rate of 0 yields a price of 0 instead of dividing
//!
//! Results are never rounded here. Rounding happens only when formatting.
//!
//! ## Usage
//! ```rust
//! use vitrina_core::pricing::{format_usd, sale_price, NumberLocale};
//!
//! let sale = sale_price(10.0, 80.0, 36.5, 30.0);
//! assert_eq!(format_usd(sale, 2, NumberLocale::EnUs), "$28.49");
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{PriceMode, Product, RatePair};
use crate::MAX_PROFIT_PERCENT;

// =============================================================================
// Input Coercion
// =============================================================================

/// Coerces an amount to a usable non-negative number.
///
/// NaN, infinities and negatives all become 0.
///
/// ## Example
/// ```rust
/// use vitrina_core::pricing::coerce_amount;
///
/// assert_eq!(coerce_amount(12.5), 12.5);
/// assert_eq!(coerce_amount(-3.0), 0.0);
/// assert_eq!(coerce_amount(f64::NAN), 0.0);
/// ```
#[inline]
pub fn coerce_amount(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Clamps a percentage to `[0, MAX_PROFIT_PERCENT]`.
///
/// ## Example
/// ```rust
/// use vitrina_core::pricing::clamp_percent;
///
/// assert_eq!(clamp_percent(30.0), 30.0);
/// assert_eq!(clamp_percent(250.0), 200.0);
/// assert_eq!(clamp_percent(-10.0), 0.0);
/// ```
#[inline]
pub fn clamp_percent(percent: f64) -> f64 {
    coerce_amount(percent).min(MAX_PROFIT_PERCENT)
}

// =============================================================================
// Formulas
// =============================================================================

/// Cost expressed in USD at the official (BCV) rate.
///
/// `cost_usdt * informal / official`, or 0 when `official <= 0` so a row can
/// still render while rates are loading.
///
/// ## Arguments
/// * `cost_usdt` - Supplier cost in USDT
/// * `informal` - USDT/VES market rate
/// * `official` - BCV VES/USD rate
pub fn real_bcv_price(cost_usdt: f64, informal: f64, official: f64) -> f64 {
    let official = coerce_amount(official);
    if official <= 0.0 {
        return 0.0;
    }
    coerce_amount(cost_usdt) * coerce_amount(informal) / official
}

/// Suggested sale price: `real_bcv_price * (1 + profit/100)`.
///
/// `profit_percent` is clamped to `[0, 200]` before use.
pub fn sale_price(cost_usdt: f64, informal: f64, official: f64, profit_percent: f64) -> f64 {
    real_bcv_price(cost_usdt, informal, official) * (1.0 + clamp_percent(profit_percent) / 100.0)
}

/// Sale price of a Fixed-mode product. The typed price is used as is.
#[inline]
pub fn sale_price_fixed(fixed_usd: f64) -> f64 {
    coerce_amount(fixed_usd)
}

// =============================================================================
// Per-Product Quote
// =============================================================================

/// Derived prices for one product. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricingResult {
    pub real_bcv_usd: f64,
    pub sale_usd: f64,
}

/// What a product row can show given the current rates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Quote {
    /// Prices could be derived.
    Priced(PricingResult),
    /// A rate is unknown; only the cost can be displayed.
    CostOnly { cost_usdt: f64 },
}

impl Quote {
    /// Sale price, if one could be derived.
    pub fn sale_usd(&self) -> Option<f64> {
        match self {
            Quote::Priced(result) => Some(result.sale_usd),
            Quote::CostOnly { .. } => None,
        }
    }

    /// True when the row falls back to showing cost only.
    pub fn is_cost_only(&self) -> bool {
        matches!(self, Quote::CostOnly { .. })
    }
}

/// Prices a product against the current rates.
///
/// Fixed-mode products are always priced. Variable-mode products need both
/// rates (and a non-zero official rate); otherwise the row degrades to
/// [`Quote::CostOnly`].
///
/// ## Example
/// ```rust
/// use vitrina_core::pricing::quote;
/// use vitrina_core::{Product, RatePair};
///
/// let mut product = Product::new_draft(-1);
/// product.cost_usdt = 10.0;
/// product.profit_percent = 30.0;
///
/// let priced = quote(&product, &RatePair::known(36.5, 80.0));
/// assert!(priced.sale_usd().is_some());
///
/// let unpriced = quote(&product, &RatePair::unknown());
/// assert!(unpriced.is_cost_only());
/// ```
pub fn quote(product: &Product, rates: &RatePair) -> Quote {
    let real_bcv_usd = match (rates.official, rates.informal) {
        (Some(official), Some(informal)) if rates.is_complete() => {
            Some(real_bcv_price(product.cost_usdt, informal, official))
        }
        _ => None,
    };

    match (product.price_mode, real_bcv_usd) {
        (PriceMode::Fixed, real) => Quote::Priced(PricingResult {
            real_bcv_usd: real.unwrap_or(0.0),
            sale_usd: sale_price_fixed(product.fixed_price_usd),
        }),
        (PriceMode::Variable, Some(real)) => Quote::Priced(PricingResult {
            real_bcv_usd: real,
            sale_usd: real * (1.0 + clamp_percent(product.profit_percent) / 100.0),
        }),
        (PriceMode::Variable, None) => Quote::CostOnly {
            cost_usdt: coerce_amount(product.cost_usdt),
        },
    }
}

// =============================================================================
// Display Formatting
// =============================================================================

/// Digit grouping convention used when displaying amounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum NumberLocale {
    /// `1,234.56`
    #[default]
    EnUs,
    /// `1.234,56`
    EsVe,
}

impl NumberLocale {
    fn separators(self) -> (char, char) {
        match self {
            NumberLocale::EnUs => (',', '.'),
            NumberLocale::EsVe => ('.', ','),
        }
    }
}

/// Formats an amount with exactly `decimals` places and locale grouping.
///
/// ## Example
/// ```rust
/// use vitrina_core::pricing::{format_amount, NumberLocale};
///
/// assert_eq!(format_amount(1234.5, 2, NumberLocale::EnUs), "1,234.50");
/// assert_eq!(format_amount(1234.5, 2, NumberLocale::EsVe), "1.234,50");
/// assert_eq!(format_amount(21.917808, 4, NumberLocale::EnUs), "21.9178");
/// ```
pub fn format_amount(value: f64, decimals: u8, locale: NumberLocale) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let (group_sep, decimal_sep) = locale.separators();

    let fixed = format!("{:.*}", decimals as usize, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::with_capacity(fixed.len() + fixed.len() / 3 + 1);
    // "-0.00" is never shown
    if value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }

    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(group_sep);
        }
        out.push(digit);
    }

    if let Some(frac) = frac_part {
        out.push(decimal_sep);
        out.push_str(frac);
    }

    out
}

/// Formats a USD amount with a leading `$`.
pub fn format_usd(value: f64, decimals: u8, locale: NumberLocale) -> String {
    format!("${}", format_amount(value, decimals, locale))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn test_end_to_end_price() {
        let real = real_bcv_price(10.0, 80.0, 36.5);
        assert!(approx(real, 800.0 / 36.5));
        assert!((real - 21.9178).abs() < 0.0001);

        let sale = sale_price(10.0, 80.0, 36.5, 30.0);
        assert!((sale - 28.4932).abs() < 0.0001);
        assert_eq!(format_usd(sale, 2, NumberLocale::EnUs), "$28.49");
    }

    #[test]
    fn test_real_bcv_is_linear_in_cost_and_informal() {
        let base = real_bcv_price(7.0, 55.0, 40.0);
        assert!(approx(real_bcv_price(14.0, 55.0, 40.0), base * 2.0));
        assert!(approx(real_bcv_price(7.0, 165.0, 40.0), base * 3.0));
        assert!(approx(real_bcv_price(3.0, 55.0, 40.0) + real_bcv_price(4.0, 55.0, 40.0), base));
    }

    #[test]
    fn test_real_bcv_is_inverse_in_official() {
        let base = real_bcv_price(7.0, 55.0, 40.0);
        assert!(approx(real_bcv_price(7.0, 55.0, 80.0), base / 2.0));
        assert!(approx(real_bcv_price(7.0, 55.0, 10.0), base * 4.0));
    }

    #[test]
    fn test_zero_official_rate_yields_zero() {
        for cost in [0.0, 1.0, 999.99] {
            for informal in [0.0, 36.0, 120.5] {
                assert_eq!(real_bcv_price(cost, informal, 0.0), 0.0);
                assert_eq!(sale_price(cost, informal, 0.0, 50.0), 0.0);
            }
        }
        assert_eq!(real_bcv_price(10.0, 80.0, -5.0), 0.0);
    }

    #[test]
    fn test_sale_price_applies_profit() {
        for profit in [0.0, 15.0, 100.0, 200.0] {
            let real = real_bcv_price(12.0, 90.0, 45.0);
            let sale = sale_price(12.0, 90.0, 45.0, profit);
            assert!(approx(sale, real * (1.0 + profit / 100.0)));
        }
        assert_eq!(
            sale_price(12.0, 90.0, 45.0, 0.0),
            real_bcv_price(12.0, 90.0, 45.0)
        );
    }

    #[test]
    fn test_inputs_are_coerced_and_clamped() {
        let real = real_bcv_price(10.0, 80.0, 36.5);
        assert!(approx(sale_price(10.0, 80.0, 36.5, 500.0), real * 3.0));
        assert!(approx(sale_price(10.0, 80.0, 36.5, -20.0), real));
        assert!(approx(sale_price(10.0, 80.0, 36.5, f64::NAN), real));
        assert_eq!(real_bcv_price(-10.0, 80.0, 36.5), 0.0);
        assert_eq!(real_bcv_price(f64::NAN, 80.0, 36.5), 0.0);
        assert_eq!(real_bcv_price(10.0, f64::INFINITY, 36.5), 0.0);
    }

    #[test]
    fn test_fixed_price_is_identity() {
        assert_eq!(sale_price_fixed(19.99), 19.99);
        assert_eq!(sale_price_fixed(-1.0), 0.0);
    }

    #[test]
    fn test_quote_fixed_mode_ignores_rates_and_profit() {
        let mut product = Product::new_draft(-1);
        product.cost_usdt = 10.0;
        product.profit_percent = 150.0;
        product.price_mode = PriceMode::Fixed;
        product.fixed_price_usd = 25.0;

        assert_eq!(quote(&product, &RatePair::known(36.5, 80.0)).sale_usd(), Some(25.0));
        // Unknown rates do not stop a fixed price from showing
        assert_eq!(quote(&product, &RatePair::unknown()).sale_usd(), Some(25.0));
    }

    #[test]
    fn test_quote_variable_mode_degrades_to_cost_only() {
        let mut product = Product::new_draft(-1);
        product.cost_usdt = 4.5;

        let half_known = RatePair {
            official: None,
            informal: Some(80.0),
        };
        assert_eq!(quote(&product, &half_known), Quote::CostOnly { cost_usdt: 4.5 });
        assert!(quote(&product, &RatePair::known(0.0, 80.0)).is_cost_only());
    }

    #[test]
    fn test_format_amount_locales() {
        assert_eq!(format_amount(1234567.891, 2, NumberLocale::EnUs), "1,234,567.89");
        assert_eq!(format_amount(1234567.891, 2, NumberLocale::EsVe), "1.234.567,89");
        assert_eq!(format_amount(999.0, 4, NumberLocale::EnUs), "999.0000");
        assert_eq!(format_amount(1000.0, 0, NumberLocale::EnUs), "1,000");
        assert_eq!(format_amount(-1500.25, 2, NumberLocale::EnUs), "-1,500.25");
        assert_eq!(format_amount(-0.001, 2, NumberLocale::EnUs), "0.00");
        assert_eq!(format_amount(f64::NAN, 2, NumberLocale::EsVe), "0,00");
    }
}
