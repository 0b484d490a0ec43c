//! # Commands Module
//!
//! The admin's command surface. Each command is an async function taking
//! the state it needs and returning `Result<T, ApiError>`.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Command Pattern                                     │
//! │                                                                         │
//! │  pub async fn edit_product(                                            │
//! │      catalog: &CatalogState,   ◄── Injected state                      │
//! │      id: ProductId,            ◄── Params from the dashboard           │
//! │      field: String,                                                    │
//! │      value: String,                                                    │
//! │  ) -> Result<ProductRowDto, ApiError>                                  │
//! │         │                                                               │
//! │         │ (JSON serialization)                                          │
//! │         ▼                                                               │
//! │  Dashboard receives: ProductRowDto                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod product;
pub mod rates;
