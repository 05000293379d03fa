//! Common test utilities for paged-fetch integration tests

use paged_fetch::Config;
use std::path::Path;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path of the store listing on the mock server
pub const STORE_LISTING_PATH: &str = "/games/ajax/filtered";

/// JSON body of one listing page
pub fn listing_page(page: u32, total: u32) -> String {
    format!(r#"{{"page":{page},"totalPages":{total},"products":[{{"id":{page}00}}]}}"#)
}

/// Config pointing both hosts at the mock server and the store at `root`
pub fn config_for(server: &MockServer, root: &Path, concurrency: usize) -> Config {
    let mut config = Config::default();
    config.http.store_host = server.uri();
    config.http.embed_host = server.uri();
    config.storage.store_root = root.to_path_buf();
    config.fetch.concurrency = concurrency;
    config
}

/// Serve `total` store listing pages, each expected exactly `hits` times
pub async fn mount_listing(server: &MockServer, listing_path: &str, total: u32, hits: u64) {
    for page in 1..=total {
        Mock::given(method("GET"))
            .and(path(listing_path))
            .and(query_param("page", page.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(page, total)))
            .expect(hits)
            .mount(server)
            .await;
    }
}
