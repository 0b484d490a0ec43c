//! # Product Commands
//!
//! Commands behind the product grid.
//!
//! ## Editing Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Product Grid Flow                                    │
//! │                                                                         │
//! │  Admin types "12.5" in the cost cell                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  edit_product(id, "costo_usdt", "12.5")                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DraftStore::local_edit ── gate rejects? ──► VALIDATION_ERROR          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Row re-priced against current rates, returned as ProductRowDto        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  "Guardar cambios" ──► save_all() ──► SaveSummaryDto / PARTIAL_SAVE    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::{debug, info};
use vitrina_core::pricing::quote;
use vitrina_core::{PriceMode, Product, ProductField, ProductId, Quote, RatePair};
use vitrina_sync::{RecordState, SaveReport};

use crate::error::ApiError;
use crate::state::{CatalogState, ConfigState, RatesState};

// =============================================================================
// DTOs
// =============================================================================

/// One row of the product grid, priced against the current rates.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRowDto {
    pub id: ProductId,
    pub name: String,
    pub cost_usdt: f64,
    pub profit_percent: f64,
    pub description: Option<String>,
    pub category: Option<String>,
    pub images: Vec<String>,
    pub active: bool,
    pub price_mode: PriceMode,
    pub fixed_price_usd: f64,
    pub state: RecordState,
    pub quote: Quote,
    /// List-view sale price; `None` when only the cost can be shown.
    pub sale_display: Option<String>,
    pub real_bcv_display: Option<String>,
    /// Cost as shown in its editable cell.
    pub cost_display: String,
}

impl ProductRowDto {
    fn build(product: Product, state: RecordState, rates: &RatePair, config: &ConfigState) -> Self {
        let quote = quote(&product, rates);
        let (sale_display, real_bcv_display) = match quote {
            Quote::Priced(result) => (
                Some(config.format_list_usd(result.sale_usd)),
                Some(config.format_list_usd(result.real_bcv_usd)),
            ),
            Quote::CostOnly { .. } => (None, None),
        };

        ProductRowDto {
            cost_display: config.format_cell(product.cost_usdt),
            id: product.id,
            name: product.name,
            cost_usdt: product.cost_usdt,
            profit_percent: product.profit_percent,
            description: product.description,
            category: product.category,
            images: product.images,
            active: product.active,
            price_mode: product.price_mode,
            fixed_price_usd: product.fixed_price_usd,
            state,
            quote,
            sale_display,
            real_bcv_display,
        }
    }
}

/// A draft that received its permanent id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionDto {
    pub draft_id: ProductId,
    pub id: ProductId,
}

/// Result of a successful save pass.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSummaryDto {
    pub saved: Vec<ProductId>,
    pub promoted: Vec<PromotionDto>,
    /// Another save was already running.
    pub skipped: bool,
}

impl From<SaveReport> for SaveSummaryDto {
    fn from(report: SaveReport) -> Self {
        SaveSummaryDto {
            saved: report.saved,
            promoted: report
                .promoted
                .into_iter()
                .map(|p| PromotionDto {
                    draft_id: p.draft_id,
                    id: p.id,
                })
                .collect(),
            skipped: report.skipped,
        }
    }
}

/// Unsaved-changes indicator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsavedDto {
    pub count: usize,
    pub ids: Vec<ProductId>,
}

fn row(
    catalog: &CatalogState,
    rates: &RatesState,
    config: &ConfigState,
    id: ProductId,
) -> Result<ProductRowDto, ApiError> {
    let store = catalog.store();
    let product = store
        .get(id)
        .ok_or_else(|| ApiError::not_found("Product", id))?;
    Ok(ProductRowDto::build(
        product,
        store.state_of(id),
        &rates.board().rates(),
        config,
    ))
}

// =============================================================================
// Commands
// =============================================================================

/// Every product in the admin grid, in display order.
pub async fn list_products(
    catalog: &CatalogState,
    rates: &RatesState,
    config: &ConfigState,
) -> Result<Vec<ProductRowDto>, ApiError> {
    let store = catalog.store();
    let pair = rates.board().rates();

    let rows: Vec<ProductRowDto> = store
        .products()
        .into_iter()
        .map(|product| {
            let state = store.state_of(product.id);
            ProductRowDto::build(product, state, &pair, config)
        })
        .collect();

    debug!(count = rows.len(), complete_rates = pair.is_complete(), "list_products");
    Ok(rows)
}

/// Active products as the public catalog shows them (persisted state).
pub async fn list_public_catalog(
    catalog: &CatalogState,
    rates: &RatesState,
    config: &ConfigState,
) -> Result<Vec<ProductRowDto>, ApiError> {
    let pair = rates.board().rates();
    let products = catalog.store().backend().list_active().await?;

    Ok(products
        .into_iter()
        .map(|product| ProductRowDto::build(product, RecordState::Clean, &pair, config))
        .collect())
}

/// Re-reads the product list, keeping unsaved local work.
pub async fn reload_products(catalog: &CatalogState) -> Result<usize, ApiError> {
    Ok(catalog.store().load().await?)
}

/// Adds an empty draft row at the top of the grid.
pub async fn add_draft(
    catalog: &CatalogState,
    rates: &RatesState,
    config: &ConfigState,
) -> Result<ProductRowDto, ApiError> {
    let draft = catalog.store().add_draft();
    row(catalog, rates, config, draft.id)
}

/// Applies one cell edit and returns the re-priced row.
///
/// ## Arguments
/// * `field` - Column or field name (`"costo_usdt"` or `"cost_usdt"`)
/// * `value` - Cell text exactly as typed
pub async fn edit_product(
    catalog: &CatalogState,
    rates: &RatesState,
    config: &ConfigState,
    id: ProductId,
    field: String,
    value: String,
) -> Result<ProductRowDto, ApiError> {
    let field: ProductField = field.parse()?;
    catalog.store().local_edit(id, field, &value)?;
    row(catalog, rates, config, id)
}

/// Replaces a product's image URLs (at most three, in display order).
pub async fn set_product_images(
    catalog: &CatalogState,
    id: ProductId,
    images: Vec<String>,
) -> Result<(), ApiError> {
    catalog.store().set_images(id, images)?;
    Ok(())
}

/// Persists every product with unsaved changes.
///
/// A partial failure comes back as `PARTIAL_SAVE`; the failed products stay
/// marked as unsaved.
pub async fn save_all(catalog: &CatalogState) -> Result<SaveSummaryDto, ApiError> {
    let report = catalog.store().save_all().await?;

    info!(
        saved = report.saved.len(),
        promoted = report.promoted.len(),
        skipped = report.skipped,
        "save_all complete"
    );
    Ok(report.into())
}

/// Deletes a product. On failure the product is back in the grid.
pub async fn delete_product(catalog: &CatalogState, id: ProductId) -> Result<(), ApiError> {
    catalog.store().remove_local_and_remote(id).await?;
    Ok(())
}

pub async fn unsaved_changes(catalog: &CatalogState) -> Result<UnsavedDto, ApiError> {
    let ids = catalog.store().dirty_ids();
    Ok(UnsavedDto {
        count: ids.len(),
        ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::test_support::{offline_rates, sqlite_catalog};
    use vitrina_core::{ExchangeRate, RateKind};

    #[tokio::test]
    async fn test_grid_prices_with_known_rates() {
        let catalog = sqlite_catalog().await;
        let rates = offline_rates();
        rates.board().record(ExchangeRate::now(RateKind::Official, 36.5));
        rates.board().record(ExchangeRate::now(RateKind::Informal, 80.0));
        let config = ConfigState::default();

        let draft = add_draft(&catalog, &rates, &config).await.unwrap();
        edit_product(&catalog, &rates, &config, draft.id, "costo_usdt".into(), "10".into())
            .await
            .unwrap();
        let priced = edit_product(&catalog, &rates, &config, draft.id, "ganancia".into(), "30".into())
            .await
            .unwrap();

        assert_eq!(priced.sale_display.as_deref(), Some("$28.49"));
        assert_eq!(priced.real_bcv_display.as_deref(), Some("$21.92"));
        assert_eq!(priced.cost_display, "10.0000");
        assert_eq!(priced.state, RecordState::Dirty);
    }

    #[tokio::test]
    async fn test_unknown_rates_show_cost_only() {
        let catalog = sqlite_catalog().await;
        let rates = offline_rates();
        let config = ConfigState::default();

        let draft = add_draft(&catalog, &rates, &config).await.unwrap();
        assert!(draft.quote.is_cost_only());
        assert!(draft.sale_display.is_none());
    }

    #[tokio::test]
    async fn test_rejected_cell_text() {
        let catalog = sqlite_catalog().await;
        let rates = offline_rates();
        let config = ConfigState::default();
        let draft = add_draft(&catalog, &rates, &config).await.unwrap();

        let err = edit_product(&catalog, &rates, &config, draft.id, "costo_usdt".into(), "1e3".into())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = edit_product(&catalog, &rates, &config, draft.id, "precio".into(), "1".into())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = edit_product(&catalog, &rates, &config, 999, "nombre".into(), "x".into())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_save_then_public_catalog() {
        let catalog = sqlite_catalog().await;
        let rates = offline_rates();
        let config = ConfigState::default();

        let visible = add_draft(&catalog, &rates, &config).await.unwrap();
        edit_product(&catalog, &rates, &config, visible.id, "nombre".into(), "Café 500 g".into())
            .await
            .unwrap();
        let hidden = add_draft(&catalog, &rates, &config).await.unwrap();
        edit_product(&catalog, &rates, &config, hidden.id, "activo".into(), "no".into())
            .await
            .unwrap();

        assert_eq!(unsaved_changes(&catalog).await.unwrap().count, 2);

        let summary = save_all(&catalog).await.unwrap();
        assert_eq!(summary.promoted.len(), 2);
        assert_eq!(unsaved_changes(&catalog).await.unwrap().count, 0);

        let public = list_public_catalog(&catalog, &rates, &config).await.unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].name, "Café 500 g");

        let id = public[0].id;
        delete_product(&catalog, id).await.unwrap();
        assert!(list_public_catalog(&catalog, &rates, &config)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(list_products(&catalog, &rates, &config).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_too_many_images() {
        let catalog = sqlite_catalog().await;
        let rates = offline_rates();
        let draft = add_draft(&catalog, &rates, &ConfigState::default()).await.unwrap();

        let images = (1..=4).map(|i| format!("https://img.test/{}.webp", i)).collect();
        let err = set_product_images(&catalog, draft.id, images).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
