//! # Repository Module
//!
//! Database repository implementations for Vitrina.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SqliteBackend (vitrina-sync)                                          │
//! │       │                                                                 │
//! │       │  db.products().update(7, &patch)                               │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── insert(&self, product)      → assigns positive id                 │
//! │  ├── update(&self, id, patch)                                          │
//! │  ├── delete(&self, id)                                                 │
//! │  ├── list_all / list_active                                            │
//! │  └── get_by_id / count                                                 │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod product;
