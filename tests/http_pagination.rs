//! End-to-end pagination runs against a mock HTTP server and an on-disk store.

mod common;

use common::{STORE_LISTING_PATH, config_for, listing_page, mount_listing};
use paged_fetch::{
    Error, Event, LocalStore, MediaKind, PageStore, Paginator, Phase, ResourceKind,
    fetch_all_pages,
};
use tempfile::tempdir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn all_pages_land_in_the_local_store() {
    let server = MockServer::start().await;
    mount_listing(&server, STORE_LISTING_PATH, 4, 1).await;
    let root = tempdir().unwrap();

    let paginator = Paginator::new(config_for(&server, root.path(), 3)).unwrap();
    let summary = paginator
        .fetch_all_pages(ResourceKind::StoreProducts, MediaKind::Game)
        .await
        .unwrap();

    assert_eq!(summary.total_pages.get(), 4);
    assert_eq!(summary.requests, 4);

    let dir = root.path().join("store-products").join("game");
    for page in 1..=4 {
        let stored = std::fs::read_to_string(dir.join(format!("{page}.json"))).unwrap();
        assert_eq!(stored, listing_page(page, 4));
    }
    assert!(dir.join("_index.json").exists());

    let store = LocalStore::open(&dir).await.unwrap();
    let mut keys = store.keys().await.unwrap();
    keys.sort_by_key(|k| k.parse::<u32>().unwrap());
    assert_eq!(keys, vec!["1", "2", "3", "4"]);
    // `expect(1)` on every page is verified when the server drops.
}

#[tokio::test]
async fn caller_supplied_client_drives_the_run() {
    let server = MockServer::start().await;
    mount_listing(&server, STORE_LISTING_PATH, 2, 1).await;
    let root = tempdir().unwrap();
    let config = config_for(&server, root.path(), 2);

    let summary = fetch_all_pages(
        reqwest::Client::new(),
        &config,
        ResourceKind::StoreProducts,
        MediaKind::Game,
    )
    .await
    .unwrap();

    assert_eq!(summary.total_pages.get(), 2);
    assert!(
        root.path()
            .join("store-products/game/2.json")
            .exists()
    );
}

#[tokio::test]
async fn account_listing_uses_numeric_media_type() {
    let server = MockServer::start().await;
    for page in 1..=2u32 {
        Mock::given(method("GET"))
            .and(path("/account/getFilteredProducts"))
            .and(query_param("mediaType", "2"))
            .and(query_param("page", page.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(page, 2)))
            .expect(1)
            .mount(&server)
            .await;
    }
    let root = tempdir().unwrap();

    let paginator = Paginator::new(config_for(&server, root.path(), 2)).unwrap();
    paginator
        .fetch_all_pages(ResourceKind::AccountProducts, MediaKind::Movie)
        .await
        .unwrap();

    assert!(
        root.path()
            .join("account-products/movie/2.json")
            .exists()
    );
}

#[tokio::test]
async fn server_error_on_one_page_fails_the_run() {
    let server = MockServer::start().await;
    for page in [1u32, 3, 4, 5] {
        Mock::given(method("GET"))
            .and(path(STORE_LISTING_PATH))
            .and(query_param("page", page.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(page, 5)))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path(STORE_LISTING_PATH))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let root = tempdir().unwrap();

    let paginator = Paginator::new(config_for(&server, root.path(), 4)).unwrap();
    let mut events = paginator.subscribe();
    let err = paginator
        .fetch_all_pages(ResourceKind::StoreProducts, MediaKind::Game)
        .await
        .unwrap_err();

    match &err {
        Error::Transport { url, message } => {
            assert!(url.ends_with("page=2"), "url was {url}");
            assert!(message.contains("500"), "message was {message}");
        }
        other => panic!("expected transport error, got {other:?}"),
    }

    let dir = root.path().join("store-products/game");
    assert!(dir.join("1.json").exists());
    assert!(!dir.join("2.json").exists());

    let mut last_phase = None;
    while let Ok(event) = events.try_recv() {
        if let Event::PhaseChanged { phase, .. } = event {
            last_phase = Some(phase);
        }
    }
    assert_eq!(last_phase, Some(Phase::Failed));
}

#[tokio::test]
async fn rerun_against_unchanged_listing_keeps_stored_pages() {
    let server = MockServer::start().await;
    mount_listing(&server, STORE_LISTING_PATH, 3, 2).await;
    let root = tempdir().unwrap();
    let paginator = Paginator::new(config_for(&server, root.path(), 2)).unwrap();
    let dir = root.path().join("store-products/game");

    paginator
        .fetch_all_pages(ResourceKind::StoreProducts, MediaKind::Game)
        .await
        .unwrap();
    let before = LocalStore::open(&dir).await.unwrap();
    let first_records = [
        before.record("1").await.unwrap(),
        before.record("2").await.unwrap(),
        before.record("3").await.unwrap(),
    ];

    paginator
        .fetch_all_pages(ResourceKind::StoreProducts, MediaKind::Game)
        .await
        .unwrap();
    let after = LocalStore::open(&dir).await.unwrap();
    let second_records = [
        after.record("1").await.unwrap(),
        after.record("2").await.unwrap(),
        after.record("3").await.unwrap(),
    ];

    assert_eq!(first_records, second_records);
    assert_eq!(after.keys().await.unwrap().len(), 3);
}

#[tokio::test]
async fn probe_without_total_pages_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STORE_LISTING_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"products":[]}"#))
        .expect(1)
        .mount(&server)
        .await;
    let root = tempdir().unwrap();

    let paginator = Paginator::new(config_for(&server, root.path(), 4)).unwrap();
    let err = paginator
        .fetch_all_pages(ResourceKind::StoreProducts, MediaKind::Game)
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "decode_error");
}
