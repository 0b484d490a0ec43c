//! # Product Backend
//!
//! The persistence seam used by the draft store, plus the SQLite adapter.
//!
//! ## Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ProductBackend                                                        │
//! │                                                                         │
//! │   create(&Product)        -> Product      (positive id assigned)       │
//! │   update(id, &ProductPatch) -> ()                                      │
//! │   delete(id)              -> ()                                        │
//! │   list_all() / list_active() -> Vec<Product>                           │
//! │   subscribe()             -> Subscription (Insert | Update | Delete)   │
//! │                                                                         │
//! │  Negative ids never reach the backend as lookup keys.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use tracing::{debug, info};
use vitrina_core::{Product, ProductId, ProductPatch};
use vitrina_db::Database;

use crate::error::PersistenceError;
use crate::feed::{ChangeEvent, ChangeFeed, ChangeKind, Subscription};

/// Result type for backend calls.
pub type PersistenceResult<T> = Result<T, PersistenceError>;

// =============================================================================
// Backend Trait
// =============================================================================

/// CRUD plus change feed over the product table.
#[async_trait]
pub trait ProductBackend: Send + Sync {
    /// Persists a new product. The incoming id is ignored.
    async fn create(&self, product: &Product) -> PersistenceResult<Product>;

    async fn update(&self, id: ProductId, patch: &ProductPatch) -> PersistenceResult<()>;

    async fn delete(&self, id: ProductId) -> PersistenceResult<()>;

    async fn list_all(&self) -> PersistenceResult<Vec<Product>>;

    /// Products visible in the public catalog.
    async fn list_active(&self) -> PersistenceResult<Vec<Product>>;

    /// Subscribes to writes made through this backend.
    fn subscribe(&self) -> Subscription;
}

// =============================================================================
// SQLite Backend
// =============================================================================

/// [`ProductBackend`] over `vitrina-db`, publishing each write to a
/// [`ChangeFeed`].
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    db: Database,
    feed: ChangeFeed,
}

impl SqliteBackend {
    pub fn new(db: Database) -> Self {
        Self::with_feed(db, ChangeFeed::default())
    }

    /// Shares an existing feed, e.g. with another writer.
    pub fn with_feed(db: Database, feed: ChangeFeed) -> Self {
        SqliteBackend { db, feed }
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Closes the underlying pool.
    pub async fn close(&self) {
        info!("Closing product backend");
        self.db.close().await;
    }
}

fn reject_draft_id(id: ProductId) -> PersistenceResult<()> {
    if id < 0 {
        return Err(PersistenceError::Rejected(format!(
            "draft id {} has no stored record",
            id
        )));
    }
    Ok(())
}

#[async_trait]
impl ProductBackend for SqliteBackend {
    async fn create(&self, product: &Product) -> PersistenceResult<Product> {
        let stored = self.db.products().insert(product).await?;
        debug!(draft_id = product.id, id = stored.id, "Product created");

        self.feed
            .publish(ChangeEvent::new(ChangeKind::Insert(stored.clone())));
        Ok(stored)
    }

    async fn update(&self, id: ProductId, patch: &ProductPatch) -> PersistenceResult<()> {
        reject_draft_id(id)?;

        let stored = self.db.products().update(id, patch).await?;
        self.feed.publish(ChangeEvent::new(ChangeKind::Update(stored)));
        Ok(())
    }

    async fn delete(&self, id: ProductId) -> PersistenceResult<()> {
        reject_draft_id(id)?;

        self.db.products().delete(id).await?;
        self.feed.publish(ChangeEvent::new(ChangeKind::Delete(id)));
        Ok(())
    }

    async fn list_all(&self) -> PersistenceResult<Vec<Product>> {
        Ok(self.db.products().list_all().await?)
    }

    async fn list_active(&self) -> PersistenceResult<Vec<Product>> {
        Ok(self.db.products().list_active().await?)
    }

    fn subscribe(&self) -> Subscription {
        self.feed.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrina_db::DbConfig;

    async fn backend() -> SqliteBackend {
        SqliteBackend::new(Database::new(DbConfig::in_memory()).await.unwrap())
    }

    fn draft(id: ProductId, name: &str) -> Product {
        let mut product = Product::new_draft(id);
        product.name = name.to_string();
        product.cost_usdt = 10.0;
        product.profit_percent = 30.0;
        product
    }

    #[tokio::test]
    async fn test_writes_publish_events() {
        let backend = backend().await;
        let mut sub = backend.subscribe();

        let created = backend.create(&draft(-1, "Harina 1 kg")).await.unwrap();
        assert!(created.id > 0);

        let event = sub.recv().await.unwrap();
        assert!(matches!(event.kind, ChangeKind::Insert(ref p) if p.id == created.id));

        let patch = ProductPatch {
            cost_usdt: Some(12.5),
            ..Default::default()
        };
        backend.update(created.id, &patch).await.unwrap();
        match sub.recv().await.unwrap().kind {
            ChangeKind::Update(p) => assert_eq!(p.cost_usdt, 12.5),
            other => panic!("expected update, got {:?}", other),
        }

        backend.delete(created.id).await.unwrap();
        assert_eq!(
            sub.recv().await.unwrap().kind,
            ChangeKind::Delete(created.id)
        );
        assert!(backend.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_and_draft_ids() {
        let backend = backend().await;

        assert!(matches!(
            backend.delete(42).await,
            Err(PersistenceError::NotFound(_))
        ));
        assert!(matches!(
            backend.update(-5, &ProductPatch::default()).await,
            Err(PersistenceError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_write_publishes_nothing() {
        let backend = backend().await;
        let mut sub = backend.subscribe();

        let mut bad = draft(-1, "Cuatro fotos");
        bad.images = (0..4).map(|i| format!("https://img.test/{}.jpg", i)).collect();
        assert!(matches!(
            backend.create(&bad).await,
            Err(PersistenceError::Rejected(_))
        ));

        backend.feed().publish(ChangeEvent::new(ChangeKind::Delete(0)));
        assert_eq!(sub.recv().await.unwrap().product_id(), 0);
    }

    #[tokio::test]
    async fn test_list_active_filters_inactive() {
        let backend = backend().await;

        let mut hidden = draft(-1, "Oculto");
        hidden.active = false;
        backend.create(&hidden).await.unwrap();
        backend.create(&draft(-2, "Visible")).await.unwrap();

        let active = backend.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Visible");
        assert_eq!(backend.list_all().await.unwrap().len(), 2);
    }
}
