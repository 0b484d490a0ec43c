//! # Product Repository
//!
//! Database operations for catalog products.
//!
//! ## Key Operations
//! - `insert` assigns the permanent positive id
//! - `update` applies a partial patch inside a transaction
//! - `delete` removes the row for good
//! - `list_all` / `list_active` feed the admin grid and the public catalog
//!
//! ## Write Normalization
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Product (from the draft store)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  normalize()                                                            │
//! │  ├── nombre           trimmed, ≤ 200 chars                              │
//! │  ├── costo_usdt       negative / NaN → 0                                │
//! │  ├── ganancia         clamped to 0..=200                                │
//! │  ├── precio_fijo_usd  negative / NaN → 0                                │
//! │  └── imagenes         ≤ 3 entries, stored as a JSON array               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  products table (CHECK constraints never fire for normalized rows)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use vitrina_core::pricing::{clamp_percent, coerce_amount};
use vitrina_core::validation::{validate_images, validate_product_name};
use vitrina_core::{PriceMode, Product, ProductId, ProductPatch};

const SELECT_PRODUCT: &str = r#"
    SELECT
        id, nombre, costo_usdt, ganancia, descripcion, categoria,
        imagenes, activo, modo_precio, precio_fijo_usd, updated_at
    FROM products
"#;

/// Raw `products` row.
#[derive(Debug, FromRow)]
struct ProductRow {
    id: i64,
    nombre: String,
    costo_usdt: f64,
    ganancia: f64,
    descripcion: Option<String>,
    categoria: Option<String>,
    imagenes: String,
    activo: bool,
    modo_precio: PriceMode,
    precio_fijo_usd: f64,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = DbError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let images: Vec<String> =
            serde_json::from_str(&row.imagenes).map_err(|e| DbError::CorruptRow {
                id: row.id,
                reason: format!("imagenes: {}", e),
            })?;

        Ok(Product {
            id: row.id,
            name: row.nombre,
            cost_usdt: row.costo_usdt,
            profit_percent: row.ganancia,
            description: row.descripcion,
            category: row.categoria,
            images,
            active: row.activo,
            price_mode: row.modo_precio,
            fixed_price_usd: row.precio_fijo_usd,
            updated_at: row.updated_at,
        })
    }
}

/// Returns the product as it will be stored, plus its encoded image list.
fn normalize(product: &Product) -> DbResult<(Product, String)> {
    validate_images(&product.images)?;

    let mut normalized = product.clone();
    normalized.name = validate_product_name(&product.name)?;
    normalized.cost_usdt = coerce_amount(product.cost_usdt);
    normalized.profit_percent = clamp_percent(product.profit_percent);
    normalized.fixed_price_usd = coerce_amount(product.fixed_price_usd);

    let images = serde_json::to_string(&normalized.images)
        .map_err(|e| DbError::Internal(format!("encoding imagenes: {}", e)))?;

    Ok((normalized, images))
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let stored = repo.insert(&draft).await?;   // stored.id > 0
/// repo.update(stored.id, &patch).await?;
/// let visible = repo.list_active().await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a product and returns it with its assigned id.
    ///
    /// The incoming `id` is ignored: drafts carry a negative placeholder and
    /// the table hands out the permanent one.
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        let (mut product, images) = normalize(product)?;
        let now = Utc::now();

        debug!(draft_id = product.id, nombre = %product.name, "Inserting product");

        let result = sqlx::query(
            r#"
            INSERT INTO products (
                nombre, costo_usdt, ganancia, descripcion, categoria,
                imagenes, activo, modo_precio, precio_fijo_usd,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
            "#,
        )
        .bind(&product.name)
        .bind(product.cost_usdt)
        .bind(product.profit_percent)
        .bind(&product.description)
        .bind(&product.category)
        .bind(images)
        .bind(product.active)
        .bind(product.price_mode)
        .bind(product.fixed_price_usd)
        .bind(now)
        .execute(&self.pool)
        .await?;

        product.id = result.last_insert_rowid();
        product.updated_at = now;

        debug!(id = product.id, "Product inserted");
        Ok(product)
    }

    /// Applies a partial update and returns the stored product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Product after the patch
    /// * `Err(DbError::NotFound)` - No product with that id
    pub async fn update(&self, id: ProductId, patch: &ProductPatch) -> DbResult<Product> {
        debug!(id, "Updating product");

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ProductRow>(&format!("{} WHERE id = ?1", SELECT_PRODUCT))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        let mut current = Product::try_from(row)?;
        current.apply_patch(patch);

        let (mut product, images) = normalize(&current)?;
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE products SET
                nombre = ?2,
                costo_usdt = ?3,
                ganancia = ?4,
                descripcion = ?5,
                categoria = ?6,
                imagenes = ?7,
                activo = ?8,
                modo_precio = ?9,
                precio_fijo_usd = ?10,
                updated_at = ?11
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&product.name)
        .bind(product.cost_usdt)
        .bind(product.profit_percent)
        .bind(&product.description)
        .bind(&product.category)
        .bind(images)
        .bind(product.active)
        .bind(product.price_mode)
        .bind(product.fixed_price_usd)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        product.updated_at = now;
        Ok(product)
    }

    /// Deletes a product permanently.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Nothing was deleted
    pub async fn delete(&self, id: ProductId) -> DbResult<()> {
        debug!(id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Gets a product by its id.
    pub async fn get_by_id(&self, id: ProductId) -> DbResult<Option<Product>> {
        sqlx::query_as::<_, ProductRow>(&format!("{} WHERE id = ?1", SELECT_PRODUCT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Product::try_from)
            .transpose()
    }

    /// Every product, in creation order (admin grid).
    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        self.fetch_many(&format!("{} ORDER BY id", SELECT_PRODUCT))
            .await
    }

    /// Active products sorted by name (public catalog).
    pub async fn list_active(&self) -> DbResult<Vec<Product>> {
        self.fetch_many(&format!(
            "{} WHERE activo = 1 ORDER BY nombre COLLATE NOCASE, id",
            SELECT_PRODUCT
        ))
        .await
    }

    /// Counts all products (for diagnostics and the seed tool).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn fetch_many(&self, sql: &str) -> DbResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(sql)
            .fetch_all(&self.pool)
            .await?;

        let products = rows
            .into_iter()
            .map(Product::try_from)
            .collect::<DbResult<Vec<_>>>()?;

        debug!(count = products.len(), "Fetched products");
        Ok(products)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
