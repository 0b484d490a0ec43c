//! # Vitrina Admin Entry Point
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Vitrina Admin                                    │
//! │                                                                         │
//! │  main.rs ────► Starts the runtime, reports fatal errors                │
//! │  lib.rs ─────► Config, database, draft store, rate agent               │
//! │  commands/ ──► list_products, edit_product, save_all, refresh_rates    │
//! │  state/ ─────► CatalogState, RatesState, ConfigState                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Configuration comes from `catalog.toml` in the platform config directory,
//! overridden by `VITRINA_*` environment variables.

#[tokio::main]
async fn main() {
    // The actual setup is in lib.rs so it can be tested
    if let Err(e) = vitrina_admin::run().await {
        eprintln!("vitrina-admin: {}", e);
        std::process::exit(1);
    }
}
