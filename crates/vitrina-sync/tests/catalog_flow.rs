//! End-to-end catalog flow: rates from mock endpoints, products in
//! in-memory SQLite, edits through the draft store.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use vitrina_core::pricing::{format_usd, quote, NumberLocale};
use vitrina_core::{ProductField, RateKind};
use vitrina_db::{Database, DbConfig};
use vitrina_sync::{
    DraftError, DraftStore, ProductBackend, RateBoard, RateProvider, RateSettings, RecordState,
    SqliteBackend,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn rate_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/oficial"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "promedio": 36.5 })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/usdt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ask": 80.4, "bid": 79.6 })))
        .mount(&server)
        .await;
    server
}

fn settings(server: &MockServer) -> RateSettings {
    RateSettings {
        official_url: format!("{}/oficial", server.uri()),
        informal_url: format!("{}/usdt", server.uri()),
        timeout_secs: 5,
        ..RateSettings::default()
    }
}

async fn sqlite_backend() -> Arc<SqliteBackend> {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    Arc::new(SqliteBackend::new(db))
}

#[tokio::test]
async fn test_draft_priced_saved_and_reloaded() {
    let server = rate_server().await;
    let provider = Arc::new(RateProvider::new(&settings(&server)).unwrap());
    let board = RateBoard::new(provider, chrono::Duration::hours(24));
    board.refresh_all().await;

    let backend = sqlite_backend().await;
    let store = Arc::new(DraftStore::new(backend.clone()));
    store.load().await.unwrap();
    let listener = store.listen();

    let draft = store.add_draft();
    store.local_edit(draft.id, ProductField::Name, "Harina de maíz 1 kg").unwrap();
    store.local_edit(draft.id, ProductField::CostUsdt, "10").unwrap();
    store.local_edit(draft.id, ProductField::ProfitPercent, "30").unwrap();

    let product = store.get(draft.id).unwrap();
    let priced = quote(&product, &board.rates());
    assert_eq!(
        format_usd(priced.sale_usd().unwrap(), 2, NumberLocale::EnUs),
        "$28.49"
    );

    let report = store.save_all().await.unwrap();
    let id = report.promoted[0].id;
    assert!(id > 0);
    assert_eq!(store.state_of(id), RecordState::Clean);
    assert!(!store.has_unsaved_changes());

    // Echo from the feed must not duplicate the promoted row
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.products().len(), 1);

    let stored = backend.list_all().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, id);
    assert_eq!(stored[0].cost_usdt, 10.0);

    // A fresh store sees the persisted product
    let reloaded = DraftStore::new(backend.clone());
    reloaded.load().await.unwrap();
    assert_eq!(reloaded.get(id).unwrap().name, "Harina de maíz 1 kg");

    listener.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_official_outage_keeps_last_rate() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/oficial"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "promedio": 36.5 })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/oficial"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let provider = Arc::new(RateProvider::new(&settings(&server)).unwrap());
    let board = RateBoard::new(provider, chrono::Duration::hours(24));

    board.refresh(RateKind::Official).await;
    let after_outage = board.refresh(RateKind::Official).await;

    assert_eq!(after_outage.value.map(|r| r.value), Some(36.5));
    assert!(!after_outage.loading);
    assert!(after_outage.last_error.is_some());
}

#[tokio::test]
async fn test_remote_edit_reaches_clean_product_only() {
    let backend = sqlite_backend().await;
    let store = Arc::new(DraftStore::new(backend.clone()));

    let first = store.add_draft();
    let second = store.add_draft();
    store.local_edit(first.id, ProductField::Name, "Arroz").unwrap();
    store.local_edit(second.id, ProductField::Name, "Pasta").unwrap();
    let report = store.save_all().await.unwrap();
    let ids: Vec<_> = report.promoted.iter().map(|p| p.id).collect();

    let listener = store.listen();

    // Local edit pending on the first product
    store.local_edit(ids[0], ProductField::CostUsdt, "3").unwrap();

    // Another writer changes both through the same backend
    for &id in &ids {
        let patch = vitrina_core::ProductPatch {
            name: Some("Cambiado afuera".into()),
            ..Default::default()
        };
        backend.update(id, &patch).await.unwrap();
    }

    tokio::time::timeout(Duration::from_secs(5), async {
        while store.get(ids[1]).map(|p| p.name) != Some("Cambiado afuera".to_string()) {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();

    let pending = store.get(ids[0]).unwrap();
    assert_eq!(pending.name, "Arroz");
    assert_eq!(pending.cost_usdt, 3.0);

    listener.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_delete_missing_remote_record_is_not_an_error() {
    let backend = sqlite_backend().await;
    let store = DraftStore::new(backend.clone());

    let draft = store.add_draft();
    let report = store.save_all().await.unwrap();
    let id = report.promoted[0].id;
    assert_ne!(id, draft.id);

    // Gone behind the store's back
    backend.delete(id).await.unwrap();

    let result = store.remove_local_and_remote(id).await;
    assert!(!matches!(result, Err(DraftError::DeleteFailed { .. })));
    assert!(store.get(id).is_none());
}
