//! Shared fixtures: a mock catalog server and a client cached in a temp dir.

#![allow(dead_code)]

use pokecache_core::{CatalogClient, Config};
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::MockServer;

pub struct Fixture {
    pub server: MockServer,
    pub cache_dir: TempDir,
}

impl Fixture {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
            cache_dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn config(&self) -> Config {
        Config {
            api_base_url: Some(format!("{}/api/v2", self.server.uri())),
            sprite_base_url: Some(format!("{}/sprites", self.server.uri())),
            request_timeout_secs: Some(5),
            ..Config::default()
        }
        .with_cache_dir(self.cache_dir.path())
    }

    /// A fresh client over the same cache root.
    pub fn client(&self) -> CatalogClient {
        CatalogClient::new(&self.config()).unwrap()
    }

    /// Absolute catalog URL on the mock server.
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v2/{}", self.server.uri(), path)
    }

    /// Number of requests the server saw for `path`.
    pub async fn hits(&self, path: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == path)
            .count()
    }

    pub async fn total_hits(&self) -> usize {
        self.server.received_requests().await.unwrap_or_default().len()
    }

    /// Complete listing document for `endpoint` with `(name, id)` members.
    pub fn listing(&self, endpoint: &str, members: &[(&str, u32)]) -> Value {
        let results: Vec<Value> = members
            .iter()
            .map(|(name, id)| json!({"name": name, "url": self.url(&format!("{}/{}/", endpoint, id))}))
            .collect();
        json!({
            "count": results.len(),
            "next": null,
            "previous": null,
            "results": results
        })
    }

    /// The `berry/1` document, trimmed to the fields the tests read.
    pub fn cheri(&self) -> Value {
        json!({
            "id": 1,
            "name": "cheri",
            "growth_time": 3,
            "max_harvest": 5,
            "natural_gift_power": 60,
            "size": 20,
            "smoothness": 25,
            "soil_dryness": 15,
            "firmness": {"name": "soft", "url": self.url("berry-firmness/2/")},
            "flavors": [
                {"potency": 10, "flavor": {"name": "spicy", "url": self.url("berry-flavor/1/")}},
                {"potency": 0, "flavor": {"name": "dry", "url": self.url("berry-flavor/2/")}}
            ],
            "item": {"name": "cheri-berry", "url": self.url("item/126/")},
            "natural_gift_type": {"name": "fire", "url": self.url("type/10/")}
        })
    }
}
