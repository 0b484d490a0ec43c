//! # Draft Store
//!
//! In-memory product list with dirty tracking, batched saves and draft ids.
//!
//! ## Record Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       RecordState per product id                        │
//! │                                                                         │
//! │            local_edit / mark_dirty / add_draft                          │
//! │   ┌───────┐ ──────────────────────────► ┌───────┐                       │
//! │   │ Clean │                             │ Dirty │ ◄────────┐            │
//! │   └───────┘ ◄──────────┐                └───┬───┘          │            │
//! │       ▲                │ persisted          │ save_all     │ failed     │
//! │       │                │                    ▼              │ (kept)     │
//! │       │                │               ┌────────┐          │            │
//! │       │                └────────────── │ Saving │ ─────────┘            │
//! │       │                                └────────┘                       │
//! │                                                                         │
//! │   any state ──remove_local_and_remote──► Removed                       │
//! │                  (remote failure puts the product back)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Draft Promotion
//! A product created locally gets a negative id. When `save_all` creates it
//! remotely, every local reference to the negative id (list entry, dirty
//! set, saving set) is rewritten to the positive id under one lock.
//!
//! ## Locking
//! State sits behind a `std::sync::Mutex` that is never held across an
//! `.await`. A separate `tokio::sync::Mutex` keeps save passes single-flight.

use chrono::Utc;
use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use vitrina_core::pricing::clamp_percent;
use vitrina_core::validation::{
    check_name_length, parse_flag, validate_decimal_input, validate_images,
    validate_optional_text,
};
use vitrina_core::{PriceMode, Product, ProductField, ProductId};

use crate::backend::ProductBackend;
use crate::error::{DraftError, PersistenceError, SyncError, SyncResult};
use crate::feed::{ChangeEvent, ChangeKind, Subscription};

// =============================================================================
// Record State
// =============================================================================

/// Where a product id stands relative to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    /// Matches the last persisted state, or unknown to the store.
    Clean,
    /// Has local changes not yet persisted.
    Dirty,
    /// A create or update for this id is in flight.
    Saving,
    /// Removed locally.
    Removed,
}

// =============================================================================
// Dirty Set
// =============================================================================

/// Insertion-ordered set of ids with unsaved changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirtySet {
    ids: Vec<ProductId>,
}

impl DirtySet {
    /// Adds an id. Returns false if it was already present.
    pub fn insert(&mut self, id: ProductId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    pub fn remove(&mut self, id: ProductId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|&existing| existing != id);
        self.ids.len() != before
    }

    pub fn contains(&self, id: ProductId) -> bool {
        self.ids.contains(&id)
    }

    /// Copy of the ids in insertion order.
    pub fn snapshot(&self) -> Vec<ProductId> {
        self.ids.clone()
    }

    /// Rewrites `old` to `new` in place, keeping its position.
    pub fn replace(&mut self, old: ProductId, new: ProductId) {
        self.ids.retain(|&existing| existing != new);
        if let Some(slot) = self.ids.iter_mut().find(|existing| **existing == old) {
            *slot = new;
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

// =============================================================================
// Save Report
// =============================================================================

/// A draft that received its permanent id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Promotion {
    pub draft_id: ProductId,
    pub id: ProductId,
}

/// One product that could not be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveFailure {
    pub id: ProductId,
    pub error: PersistenceError,
}

/// Outcome of one `save_all` pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveReport {
    /// Ids persisted in this pass (promoted drafts under their new id).
    pub saved: Vec<ProductId>,
    pub promoted: Vec<Promotion>,
    pub failures: Vec<SaveFailure>,
    /// Another pass was already running; nothing was done.
    pub skipped: bool,
}

impl SaveReport {
    /// Products that reached a final outcome in this pass.
    pub fn attempted(&self) -> usize {
        self.saved.len() + self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// What `apply_remote` did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOutcome {
    Applied,
    /// The id has unsaved or in-flight local changes.
    Suppressed,
    /// Older than the local copy, about a removed id, or a no-op.
    Ignored,
}

// =============================================================================
// Store State
// =============================================================================

#[derive(Debug, Clone)]
struct Entry {
    product: Product,
    version: u64,
}

#[derive(Debug, Default)]
struct StoreState {
    products: Vec<Entry>,
    dirty: DirtySet,
    saving: HashSet<ProductId>,
    removed_while_saving: HashSet<ProductId>,
    removed: HashSet<ProductId>,
    next_version: u64,
}

impl StoreState {
    fn position(&self, id: ProductId) -> Option<usize> {
        self.products.iter().position(|entry| entry.product.id == id)
    }

    fn entry_mut(&mut self, id: ProductId) -> Option<&mut Entry> {
        self.products.iter_mut().find(|entry| entry.product.id == id)
    }

    /// Stamps a local mutation and marks the id dirty.
    fn touch(&mut self, id: ProductId) {
        self.next_version += 1;
        let version = self.next_version;
        if let Some(entry) = self.entry_mut(id) {
            entry.version = version;
            entry.product.updated_at = Utc::now();
        }
        self.dirty.insert(id);
    }
}

// =============================================================================
// Draft Store
// =============================================================================

/// Local working copy of the catalog.
///
/// ## Example
/// ```rust,ignore
/// let store = Arc::new(DraftStore::new(backend));
/// store.load().await?;
///
/// let draft = store.add_draft();
/// store.local_edit(draft.id, ProductField::CostUsdt, "10")?;
///
/// let report = store.save_all().await?;   // draft promoted to a positive id
/// ```
pub struct DraftStore {
    backend: Arc<dyn ProductBackend>,
    state: Mutex<StoreState>,
    save_guard: tokio::sync::Mutex<()>,
    last_draft_id: AtomicI64,
}

impl DraftStore {
    /// Creates an empty store over a backend.
    pub fn new(backend: Arc<dyn ProductBackend>) -> Self {
        DraftStore {
            backend,
            state: Mutex::new(StoreState::default()),
            save_guard: tokio::sync::Mutex::new(()),
            last_draft_id: AtomicI64::new(0),
        }
    }

    pub fn backend(&self) -> &Arc<dyn ProductBackend> {
        &self.backend
    }

    /// Fills the store from `list_all()`.
    ///
    /// Products with unsaved local changes keep their local copy; drafts
    /// stay at the top of the list.
    pub async fn load(&self) -> Result<usize, DraftError> {
        let remote = self
            .backend
            .list_all()
            .await
            .map_err(DraftError::LoadFailed)?;

        let mut state = self.lock();
        let previous = std::mem::take(&mut state.products);

        let mut products: Vec<Entry> = previous
            .iter()
            .filter(|entry| entry.product.is_draft() && state.dirty.contains(entry.product.id))
            .cloned()
            .collect();

        for product in remote {
            if state.removed.contains(&product.id) {
                continue;
            }
            let local = previous
                .iter()
                .find(|entry| entry.product.id == product.id && state.dirty.contains(product.id));
            match local {
                Some(entry) => products.push(entry.clone()),
                None => products.push(Entry {
                    product,
                    version: 0,
                }),
            }
        }

        let loaded = products.len();
        state.products = products;

        info!(loaded, dirty = state.dirty.len(), "Product list loaded");
        Ok(loaded)
    }

    // -------------------------------------------------------------------------
    // Read accessors
    // -------------------------------------------------------------------------

    /// Current products in display order.
    pub fn products(&self) -> Vec<Product> {
        self.lock()
            .products
            .iter()
            .map(|entry| entry.product.clone())
            .collect()
    }

    pub fn get(&self, id: ProductId) -> Option<Product> {
        let state = self.lock();
        state
            .position(id)
            .map(|index| state.products[index].product.clone())
    }

    /// Ids with unsaved changes, in the order they became dirty.
    pub fn dirty_ids(&self) -> Vec<ProductId> {
        self.lock().dirty.snapshot()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        !self.lock().dirty.is_empty()
    }

    pub fn state_of(&self, id: ProductId) -> RecordState {
        let state = self.lock();
        if state.removed.contains(&id) {
            RecordState::Removed
        } else if state.saving.contains(&id) {
            RecordState::Saving
        } else if state.dirty.contains(id) {
            RecordState::Dirty
        } else {
            RecordState::Clean
        }
    }

    // -------------------------------------------------------------------------
    // Local mutations
    // -------------------------------------------------------------------------

    /// Marks a product as having unsaved changes. Idempotent.
    pub fn mark_dirty(&self, id: ProductId) -> Result<(), DraftError> {
        let mut state = self.lock();
        if state.position(id).is_none() {
            return Err(DraftError::UnknownProduct(id));
        }
        state.touch(id);
        Ok(())
    }

    /// Applies one cell edit to the local copy and marks it dirty.
    ///
    /// Numeric cells go through the decimal gate (blank means 0); rejected
    /// text leaves the product untouched.
    ///
    /// ## Arguments
    /// * `id` - Product to edit
    /// * `field` - Which cell
    /// * `raw` - Text exactly as typed
    pub fn local_edit(&self, id: ProductId, field: ProductField, raw: &str) -> Result<(), DraftError> {
        let mut state = self.lock();
        let entry = state.entry_mut(id).ok_or(DraftError::UnknownProduct(id))?;
        let column = field.column();
        let product = &mut entry.product;

        match field {
            ProductField::Name => {
                check_name_length(raw)?;
                product.name = raw.to_string();
            }
            ProductField::CostUsdt => {
                product.cost_usdt = validate_decimal_input(column, raw)?;
            }
            ProductField::ProfitPercent => {
                product.profit_percent = clamp_percent(validate_decimal_input(column, raw)?);
            }
            ProductField::FixedPriceUsd => {
                product.fixed_price_usd = validate_decimal_input(column, raw)?;
            }
            ProductField::Description => {
                product.description = validate_optional_text(column, raw)?;
            }
            ProductField::Category => {
                product.category = validate_optional_text(column, raw)?;
            }
            ProductField::Active => {
                product.active = parse_flag(column, raw)?;
            }
            ProductField::PriceMode => {
                product.price_mode = raw.parse::<PriceMode>()?;
            }
        }

        state.touch(id);
        debug!(id, field = column, "Local edit");
        Ok(())
    }

    /// Replaces a product's image list.
    pub fn set_images(&self, id: ProductId, images: Vec<String>) -> Result<(), DraftError> {
        validate_images(&images)?;

        let mut state = self.lock();
        let entry = state.entry_mut(id).ok_or(DraftError::UnknownProduct(id))?;
        entry.product.images = images;
        state.touch(id);
        Ok(())
    }

    /// Adds an empty draft at the top of the list, already dirty.
    pub fn add_draft(&self) -> Product {
        let product = Product::new_draft(self.next_draft_id());

        let mut state = self.lock();
        state.products.insert(
            0,
            Entry {
                product: product.clone(),
                version: 0,
            },
        );
        state.touch(product.id);

        debug!(draft_id = product.id, "Draft added");
        product
    }

    /// Negated epoch milliseconds, forced strictly decreasing.
    fn next_draft_id(&self) -> ProductId {
        let candidate = -Utc::now().timestamp_millis();
        let step = |last: i64| last.saturating_sub(1).min(candidate);

        let previous = match self
            .last_draft_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(step(last)))
        {
            Ok(previous) | Err(previous) => previous,
        };
        step(previous)
    }

    // -------------------------------------------------------------------------
    // Save pass
    // -------------------------------------------------------------------------

    /// Persists every dirty product.
    ///
    /// Works on a snapshot of the dirty set taken at the start; ids that
    /// become dirty during the pass wait for the next one. Drafts are
    /// created, everything else updated, one at a time in dirty-set order.
    /// A failure does not stop the pass.
    ///
    /// ## Returns
    /// * `Ok(report)` - Everything in the snapshot was persisted, or another
    ///   pass was already running (`report.skipped`)
    /// * `Err(DraftError::BatchFailed)` - Some products failed; they stay
    ///   dirty and the report lists them
    pub async fn save_all(&self) -> Result<SaveReport, DraftError> {
        let Ok(_guard) = self.save_guard.try_lock() else {
            debug!("Save pass already running, skipping");
            return Ok(SaveReport {
                skipped: true,
                ..Default::default()
            });
        };

        let snapshot = self.lock().dirty.snapshot();
        let mut report = SaveReport::default();

        if snapshot.is_empty() {
            debug!("Nothing to save");
            return Ok(report);
        }

        info!(count = snapshot.len(), "Saving dirty products");

        for id in snapshot {
            let Some((product, version)) = self.begin_save(id) else {
                continue;
            };

            if id < 0 {
                self.save_draft(id, product, version, &mut report).await;
            } else {
                self.save_existing(id, product, version, &mut report).await;
            }
        }

        if report.failures.is_empty() {
            info!(saved = report.saved.len(), promoted = report.promoted.len(), "Save pass complete");
            Ok(report)
        } else {
            error!(
                saved = report.saved.len(),
                failed = report.failures.len(),
                "Save pass finished with failures"
            );
            Err(DraftError::BatchFailed(report))
        }
    }

    /// Marks `id` as saving and returns what to send, if still relevant.
    fn begin_save(&self, id: ProductId) -> Option<(Product, u64)> {
        let mut state = self.lock();

        if !state.dirty.contains(id) {
            return None;
        }
        let Some(index) = state.position(id) else {
            // Dirty id without a product cannot be saved
            state.dirty.remove(id);
            return None;
        };

        let entry = &state.products[index];
        let found = (entry.product.clone(), entry.version);
        state.saving.insert(id);
        Some(found)
    }

    async fn save_draft(&self, draft_id: ProductId, product: Product, version: u64, report: &mut SaveReport) {
        let result = self.backend.create(&product).await;

        let orphan = {
            let mut state = self.lock();
            state.saving.remove(&draft_id);
            let removed = state.removed_while_saving.remove(&draft_id);

            match result {
                Ok(stored) if removed => {
                    // Echo of the create may already be in the list
                    if let Some(index) = state.position(stored.id) {
                        state.products.remove(index);
                    }
                    Some(stored.id)
                }
                Ok(stored) => {
                    promote(&mut state, draft_id, stored.clone(), version);
                    report.saved.push(stored.id);
                    report.promoted.push(Promotion {
                        draft_id,
                        id: stored.id,
                    });
                    debug!(draft_id, id = stored.id, "Draft promoted");
                    None
                }
                Err(_) if removed => None,
                Err(error) => {
                    error!(draft_id, %error, "Failed to create product");
                    report.failures.push(SaveFailure {
                        id: draft_id,
                        error,
                    });
                    None
                }
            }
        };

        if let Some(id) = orphan {
            warn!(draft_id, id, "Draft was removed while saving, deleting created record");
            if let Err(e) = self.backend.delete(id).await {
                warn!(id, error = %e, "Could not delete orphaned record");
            }
        }
    }

    async fn save_existing(&self, id: ProductId, product: Product, version: u64, report: &mut SaveReport) {
        let result = self.backend.update(id, &product.to_patch()).await;

        let mut state = self.lock();
        state.saving.remove(&id);
        let removed = state.removed_while_saving.remove(&id);

        match result {
            Ok(()) => {
                let unchanged = state
                    .position(id)
                    .map(|index| state.products[index].version == version)
                    .unwrap_or(false);
                if unchanged {
                    state.dirty.remove(id);
                }
                if !removed {
                    report.saved.push(id);
                }
                debug!(id, still_dirty = !unchanged && !removed, "Product updated");
            }
            Err(_) if removed => {}
            Err(error) => {
                error!(id, %error, "Failed to update product");
                report.failures.push(SaveFailure { id, error });
            }
        }
    }

    // -------------------------------------------------------------------------
    // Removal
    // -------------------------------------------------------------------------

    /// Removes a product locally, then remotely for persisted ids.
    ///
    /// If the remote delete fails the product goes back to its original
    /// position (not dirty) and the error is returned. A record that is
    /// already gone remotely counts as deleted.
    pub async fn remove_local_and_remote(&self, id: ProductId) -> Result<(), DraftError> {
        let (index, entry) = {
            let mut state = self.lock();
            let index = state.position(id).ok_or(DraftError::UnknownProduct(id))?;
            let entry = state.products.remove(index);
            state.dirty.remove(id);
            if state.saving.contains(&id) {
                state.removed_while_saving.insert(id);
            }
            state.removed.insert(id);
            (index, entry)
        };

        if id < 0 {
            debug!(draft_id = id, "Draft discarded");
            return Ok(());
        }

        match self.backend.delete(id).await {
            Ok(()) => {
                info!(id, "Product deleted");
                Ok(())
            }
            Err(PersistenceError::NotFound(_)) => {
                debug!(id, "Product already gone remotely");
                Ok(())
            }
            Err(source) => {
                error!(id, error = %source, "Remote delete failed, restoring product");

                let mut state = self.lock();
                state.removed.remove(&id);
                state.removed_while_saving.remove(&id);
                if state.position(id).is_none() {
                    let at = index.min(state.products.len());
                    state.products.insert(at, entry);
                }

                Err(DraftError::DeleteFailed { id, source })
            }
        }
    }

    // -------------------------------------------------------------------------
    // Remote changes
    // -------------------------------------------------------------------------

    /// Merges one change-feed event, last write wins by id.
    ///
    /// Events for ids with unsaved or in-flight local changes are dropped so
    /// they cannot clobber the local copy.
    pub fn apply_remote(&self, event: &ChangeEvent) -> RemoteOutcome {
        let id = event.product_id();
        let mut state = self.lock();

        if state.dirty.contains(id) || state.saving.contains(&id) {
            debug!(id, "Remote change suppressed, local changes pending");
            return RemoteOutcome::Suppressed;
        }

        match &event.kind {
            ChangeKind::Insert(product) | ChangeKind::Update(product) => {
                if product.is_draft() || state.removed.contains(&id) {
                    return RemoteOutcome::Ignored;
                }

                match state.entry_mut(id) {
                    Some(entry) if product.updated_at < entry.product.updated_at => {
                        debug!(id, "Remote change older than local copy");
                        RemoteOutcome::Ignored
                    }
                    Some(entry) => {
                        entry.product = product.clone();
                        RemoteOutcome::Applied
                    }
                    None => {
                        state.products.push(Entry {
                            product: product.clone(),
                            version: 0,
                        });
                        RemoteOutcome::Applied
                    }
                }
            }
            ChangeKind::Delete(_) => match state.position(id) {
                Some(index) => {
                    state.products.remove(index);
                    RemoteOutcome::Applied
                }
                None => RemoteOutcome::Ignored,
            },
        }
    }

    /// Applies feed events in the background until the handle is shut down
    /// or the feed closes.
    pub fn attach_feed(self: &Arc<Self>, mut subscription: Subscription) -> FeedListenerHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let store = Arc::clone(self);

        let task = tokio::spawn(async move {
            info!("Change feed listener started");
            loop {
                tokio::select! {
                    event = subscription.recv() => match event {
                        Some(event) => {
                            let outcome = store.apply_remote(&event);
                            debug!(id = event.product_id(), ?outcome, "Change event handled");
                        }
                        None => {
                            info!("Change feed closed");
                            break;
                        }
                    },
                    _ = shutdown_rx.recv() => break,
                }
            }
            subscription.dispose();
            info!("Change feed listener stopped");
        });

        FeedListenerHandle { shutdown_tx, task }
    }

    /// [`DraftStore::attach_feed`] on the backend's own feed.
    pub fn listen(self: &Arc<Self>) -> FeedListenerHandle {
        self.attach_feed(self.backend.subscribe())
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Rewrites every local reference from the draft id to its permanent id.
fn promote(state: &mut StoreState, draft_id: ProductId, stored: Product, version: u64) {
    // Drop a copy of the new record that arrived through the feed first
    if let Some(echo) = state.position(stored.id) {
        state.products.remove(echo);
    }

    let id = stored.id;
    let edited = match state.entry_mut(draft_id) {
        Some(entry) if entry.version == version => {
            entry.product = stored;
            false
        }
        Some(entry) => {
            entry.product.id = id;
            true
        }
        None => false,
    };

    if edited {
        state.dirty.replace(draft_id, id);
    } else {
        state.dirty.remove(draft_id);
    }
}

// =============================================================================
// Feed Listener Handle
// =============================================================================

/// Controls a listener started by [`DraftStore::attach_feed`].
pub struct FeedListenerHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl FeedListenerHandle {
    /// Stops the listener and waits for it to exit.
    pub async fn shutdown(self) -> SyncResult<()> {
        // Already stopped if the feed closed
        let _ = self.shutdown_tx.send(()).await;
        self.task
            .await
            .map_err(|e| SyncError::Internal(format!("Feed listener panicked: {}", e)))
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
