//! # vitrina-core: Pure Pricing Logic for Vitrina
//!
//! This crate holds the catalog's pricing rules as pure functions with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Vitrina Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Admin Dashboard (web UI)                     │   │
//! │  │    Product grid ──► Editable cells ──► "Guardar cambios"       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 vitrina-sync (rates, drafts)                    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ vitrina-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐                  │   │
//! │  │   │   types   │  │  pricing  │  │ validation│                  │   │
//! │  │   │  Product  │  │ realBcv   │  │  decimal  │                  │   │
//! │  │   │  RatePair │  │ sale      │  │  input    │                  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘                  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, ExchangeRate, RatePair, etc.)
//! - [`pricing`] - realBcv / sale price formulas and display formatting
//! - [`error`] - Domain error types
//! - [`validation`] - Input boundary parsing and validation
//!
//! ## Example Usage
//!
//! ```rust
//! use vitrina_core::pricing::{real_bcv_price, sale_price};
//!
//! // 10 USDT of cost, informal rate 80, official rate 36.5
//! let real = real_bcv_price(10.0, 80.0, 36.5);
//! assert!((real - 21.9178).abs() < 0.0001);
//!
//! // 30% profit on top
//! let sale = sale_price(10.0, 80.0, 36.5, 30.0);
//! assert!((sale - 28.4932).abs() < 0.0001);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::ValidationError;
pub use pricing::{PricingResult, Quote};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Upper bound for a product's profit percentage.
///
/// Anything above is clamped, never rejected.
pub const MAX_PROFIT_PERCENT: f64 = 200.0;

/// Maximum number of images attached to a product.
pub const MAX_PRODUCT_IMAGES: usize = 3;

/// Decimal places used by the product list view.
pub const LIST_DECIMALS: u8 = 2;

/// Decimal places used by the editable price cell.
pub const CELL_DECIMALS: u8 = 4;
