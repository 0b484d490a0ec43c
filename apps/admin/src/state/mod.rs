//! # State Module
//!
//! Application state for the admin service.
//!
//! Separate state types instead of one `AppState`: each command takes only
//! what it needs.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────┐      │
//! │  │  CatalogState    │  │   RatesState     │  │   ConfigState    │      │
//! │  │                  │  │                  │  │                  │      │
//! │  │  Arc<DraftStore> │  │  Arc<RateBoard>  │  │  locale          │      │
//! │  │  (products,      │  │  RateAgentHandle │  │  list / cell     │      │
//! │  │   dirty set)     │  │                  │  │  decimals        │      │
//! │  └──────────────────┘  └──────────────────┘  └──────────────────┘      │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • CatalogState / RatesState: internally synchronized, cheap to clone  │
//! │  • ConfigState: read-only after startup                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod catalog;
mod config;
mod rates;

pub use catalog::CatalogState;
pub use config::ConfigState;
pub use rates::RatesState;
