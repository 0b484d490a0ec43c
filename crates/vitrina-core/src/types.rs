//! # Domain Types
//!
//! Core domain types used throughout Vitrina.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │  ExchangeRate   │   │    RatePair     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (i64)       │   │  kind           │   │  official?      │       │
//! │  │  cost_usdt      │   │  value          │   │  informal?      │       │
//! │  │  profit_percent │   │  fetched_at     │   │  (what pricing  │       │
//! │  │  price_mode     │   │                 │   │   sees)         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  ProductPatch   │   │  ProductField   │   │   PriceMode     │       │
//! │  │  partial update │   │  editable cell  │   │  Variable       │       │
//! │  │  for backend    │   │  identifiers    │   │  Fixed          │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Draft Identity
//! A product id is negative while the product only exists locally (a draft)
//! and positive once the backend has confirmed it. Negative ids never reach
//! the backend as lookup keys.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

/// Product identifier. Negative = local draft, positive = persisted.
pub type ProductId = i64;

// =============================================================================
// Rate Kind
// =============================================================================

/// Which of the two exchange rates a value refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RateKind {
    /// Official central bank (BCV) VES/USD rate.
    Official,
    /// Informal USDT/VES market rate.
    Informal,
}

impl RateKind {
    /// Both kinds, in display order.
    pub const ALL: [RateKind; 2] = [RateKind::Official, RateKind::Informal];
}

impl fmt::Display for RateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateKind::Official => write!(f, "official"),
            RateKind::Informal => write!(f, "informal"),
        }
    }
}

// =============================================================================
// Exchange Rate
// =============================================================================

/// A successfully fetched exchange rate.
///
/// Transient: overwritten by the next successful fetch and never reset by a
/// failed one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExchangeRate {
    pub kind: RateKind,
    pub value: f64,
    #[ts(as = "String")]
    pub fetched_at: DateTime<Utc>,
}

impl ExchangeRate {
    /// Creates a rate stamped with the current time.
    pub fn now(kind: RateKind, value: f64) -> Self {
        ExchangeRate {
            kind,
            value,
            fetched_at: Utc::now(),
        }
    }

    /// Age of this rate relative to `now`. Never negative.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.fetched_at).max(Duration::zero())
    }

    /// Whether the rate is older than `max_age`.
    pub fn is_stale(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        self.age(now) > max_age
    }
}

// =============================================================================
// Rate Pair
// =============================================================================

/// The two rates as the pricing calculator sees them.
///
/// `None` means "unknown": never fetched, or too old to trust.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RatePair {
    pub official: Option<f64>,
    pub informal: Option<f64>,
}

impl RatePair {
    /// Both rates known.
    pub fn known(official: f64, informal: f64) -> Self {
        RatePair {
            official: Some(official),
            informal: Some(informal),
        }
    }

    /// Neither rate known.
    pub fn unknown() -> Self {
        RatePair::default()
    }

    /// Returns the value for a given kind.
    pub fn get(&self, kind: RateKind) -> Option<f64> {
        match kind {
            RateKind::Official => self.official,
            RateKind::Informal => self.informal,
        }
    }

    /// True when a calculated price can be produced.
    ///
    /// A zero official rate counts as unknown.
    pub fn is_complete(&self) -> bool {
        matches!(self.official, Some(o) if o > 0.0) && self.informal.is_some()
    }
}

// =============================================================================
// Price Mode
// =============================================================================

/// How a product's sale price is obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PriceMode {
    /// Sale price derived from cost, rates and profit.
    #[default]
    Variable,
    /// Sale price typed in by the admin; rates and profit are ignored.
    Fixed,
}

impl FromStr for PriceMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "variable" | "calculado" => Ok(PriceMode::Variable),
            "fixed" | "fijo" => Ok(PriceMode::Fixed),
            _ => Err(ValidationError::NotAllowed {
                field: "modo_precio".to_string(),
                allowed: vec!["variable".to_string(), "fixed".to_string()],
            }),
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product.
///
/// Serialized with the backend's column names so rows and change-feed
/// payloads round-trip without a mapping layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Negative while a local draft, positive once persisted.
    pub id: ProductId,

    /// Display name.
    #[serde(rename = "nombre")]
    pub name: String,

    /// Supplier cost in USDT.
    #[serde(rename = "costo_usdt")]
    pub cost_usdt: f64,

    /// Profit margin in percent, 0 to 200.
    #[serde(rename = "ganancia")]
    pub profit_percent: f64,

    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,

    #[serde(rename = "categoria", default)]
    pub category: Option<String>,

    /// Ordered image URLs, at most three.
    #[serde(rename = "imagenes", default)]
    pub images: Vec<String>,

    /// Shown in the public catalog.
    #[serde(rename = "activo")]
    pub active: bool,

    #[serde(rename = "modo_precio", default)]
    pub price_mode: PriceMode,

    /// Sale price used in Fixed mode.
    #[serde(rename = "precio_fijo_usd", default)]
    pub fixed_price_usd: f64,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates an empty draft with the given (negative) id.
    pub fn new_draft(id: ProductId) -> Self {
        Product {
            id,
            name: String::new(),
            cost_usdt: 0.0,
            profit_percent: 0.0,
            description: None,
            category: None,
            images: Vec::new(),
            active: true,
            price_mode: PriceMode::Variable,
            fixed_price_usd: 0.0,
            updated_at: Utc::now(),
        }
    }

    /// True while the product has never been confirmed by the backend.
    #[inline]
    pub fn is_draft(&self) -> bool {
        self.id < 0
    }

    /// Full patch carrying every persisted field.
    pub fn to_patch(&self) -> ProductPatch {
        ProductPatch {
            name: Some(self.name.clone()),
            cost_usdt: Some(self.cost_usdt),
            profit_percent: Some(self.profit_percent),
            description: Some(self.description.clone()),
            category: Some(self.category.clone()),
            images: Some(self.images.clone()),
            active: Some(self.active),
            price_mode: Some(self.price_mode),
            fixed_price_usd: Some(self.fixed_price_usd),
        }
    }

    /// Applies every present field of a patch.
    pub fn apply_patch(&mut self, patch: &ProductPatch) {
        if let Some(ref name) = patch.name {
            self.name = name.clone();
        }
        if let Some(cost) = patch.cost_usdt {
            self.cost_usdt = cost;
        }
        if let Some(profit) = patch.profit_percent {
            self.profit_percent = profit;
        }
        if let Some(ref description) = patch.description {
            self.description = description.clone();
        }
        if let Some(ref category) = patch.category {
            self.category = category.clone();
        }
        if let Some(ref images) = patch.images {
            self.images = images.clone();
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
        if let Some(mode) = patch.price_mode {
            self.price_mode = mode;
        }
        if let Some(fixed) = patch.fixed_price_usd {
            self.fixed_price_usd = fixed;
        }
    }
}

// =============================================================================
// Product Patch
// =============================================================================

/// Partial update sent to the backend.
///
/// `description`/`category` use `Option<Option<_>>`: outer `None` leaves the
/// field alone, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPatch {
    #[serde(rename = "nombre", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "costo_usdt", skip_serializing_if = "Option::is_none")]
    pub cost_usdt: Option<f64>,
    #[serde(rename = "ganancia", skip_serializing_if = "Option::is_none")]
    pub profit_percent: Option<f64>,
    #[serde(rename = "descripcion", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(rename = "categoria", skip_serializing_if = "Option::is_none")]
    pub category: Option<Option<String>>,
    #[serde(rename = "imagenes", skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(rename = "activo", skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(rename = "modo_precio", skip_serializing_if = "Option::is_none")]
    pub price_mode: Option<PriceMode>,
    #[serde(rename = "precio_fijo_usd", skip_serializing_if = "Option::is_none")]
    pub fixed_price_usd: Option<f64>,
}

impl ProductPatch {
    /// True when the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == ProductPatch::default()
    }
}

// =============================================================================
// Product Field
// =============================================================================

/// Identifies one editable cell of the product grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ProductField {
    Name,
    CostUsdt,
    ProfitPercent,
    Description,
    Category,
    Active,
    PriceMode,
    FixedPriceUsd,
}

impl ProductField {
    /// Backend column name.
    pub fn column(&self) -> &'static str {
        match self {
            ProductField::Name => "nombre",
            ProductField::CostUsdt => "costo_usdt",
            ProductField::ProfitPercent => "ganancia",
            ProductField::Description => "descripcion",
            ProductField::Category => "categoria",
            ProductField::Active => "activo",
            ProductField::PriceMode => "modo_precio",
            ProductField::FixedPriceUsd => "precio_fijo_usd",
        }
    }
}

impl FromStr for ProductField {
    type Err = ValidationError;

    /// Accepts either the Rust-side name or the backend column name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "name" | "nombre" => Ok(ProductField::Name),
            "cost_usdt" | "costo_usdt" => Ok(ProductField::CostUsdt),
            "profit_percent" | "ganancia" => Ok(ProductField::ProfitPercent),
            "description" | "descripcion" => Ok(ProductField::Description),
            "category" | "categoria" => Ok(ProductField::Category),
            "active" | "activo" => Ok(ProductField::Active),
            "price_mode" | "modo_precio" => Ok(ProductField::PriceMode),
            "fixed_price_usd" | "precio_fijo_usd" => Ok(ProductField::FixedPriceUsd),
            other => Err(ValidationError::InvalidFormat {
                field: "field".to_string(),
                reason: format!("unknown product field '{}'", other),
            }),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_identity() {
        let draft = Product::new_draft(-1_700_000_000_000);
        assert!(draft.is_draft());
        assert!(draft.active);

        let mut persisted = draft.clone();
        persisted.id = 7;
        assert!(!persisted.is_draft());
    }

    #[test]
    fn test_rate_pair_completeness() {
        assert!(RatePair::known(36.5, 80.0).is_complete());
        assert!(!RatePair::unknown().is_complete());
        assert!(!RatePair::known(0.0, 80.0).is_complete());
        assert!(!RatePair {
            official: Some(36.5),
            informal: None
        }
        .is_complete());
    }

    #[test]
    fn test_exchange_rate_staleness() {
        let rate = ExchangeRate::now(RateKind::Official, 36.5);
        let later = rate.fetched_at + Duration::hours(25);
        assert!(rate.is_stale(later, Duration::hours(24)));
        assert!(!rate.is_stale(rate.fetched_at, Duration::hours(24)));
        // Clock skew never yields a negative age
        assert_eq!(
            rate.age(rate.fetched_at - Duration::seconds(5)),
            Duration::zero()
        );
    }

    #[test]
    fn test_patch_round_trip_through_product() {
        let mut original = Product::new_draft(-5);
        original.name = "Harina PAN".to_string();
        original.cost_usdt = 1.25;
        original.category = Some("Víveres".to_string());

        let mut copy = Product::new_draft(-6);
        copy.apply_patch(&original.to_patch());

        assert_eq!(copy.name, "Harina PAN");
        assert_eq!(copy.cost_usdt, 1.25);
        assert_eq!(copy.category.as_deref(), Some("Víveres"));
        assert!(ProductPatch::default().is_empty());
    }

    #[test]
    fn test_patch_serializes_only_present_fields() {
        let patch = ProductPatch {
            cost_usdt: Some(3.5),
            description: Some(None),
            ..Default::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json["costo_usdt"], 3.5);
        assert!(json["descripcion"].is_null());
        assert!(json.get("nombre").is_none());
    }

    #[test]
    fn test_field_parsing() {
        assert_eq!("costo_usdt".parse::<ProductField>().unwrap(), ProductField::CostUsdt);
        assert_eq!("name".parse::<ProductField>().unwrap(), ProductField::Name);
        assert!("precio".parse::<ProductField>().is_err());
        assert_eq!(ProductField::ProfitPercent.column(), "ganancia");
    }

    #[test]
    fn test_price_mode_parsing() {
        assert_eq!("fijo".parse::<PriceMode>().unwrap(), PriceMode::Fixed);
        assert_eq!("Variable".parse::<PriceMode>().unwrap(), PriceMode::Variable);
        assert!("otro".parse::<PriceMode>().is_err());
        assert_eq!(PriceMode::default(), PriceMode::Variable);
    }
}
