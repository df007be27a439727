//! End-to-end tests of the cache-first client and the lazy resource graph
//! against a mock catalog.

mod common;

use common::Fixture;
use pokecache_core::{
    ApiError, CatalogError, DocumentKey, Endpoint, NameOrId, ResourceOptions, Value,
};
use serde_json::json;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, ResponseTemplate};

async fn mount_berries(fx: &Fixture) {
    Mock::given(method("GET"))
        .and(path("/api/v2/berry/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(fx.listing("berry", &[("cheri", 1), ("chesto", 2), ("pecha", 3)])),
        )
        .mount(&fx.server)
        .await;
}

async fn mount_cheri(fx: &Fixture, expected_fetches: u64) {
    Mock::given(method("GET"))
        .and(path("/api/v2/berry/1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fx.cheri()))
        .expect(expected_fetches)
        .mount(&fx.server)
        .await;
}

// ── get_document ─────────────────────────────────────────────────────

#[tokio::test]
async fn second_lookup_is_served_from_cache() {
    let fx = Fixture::start().await;
    mount_cheri(&fx, 1).await;

    let client = fx.client();
    let key = DocumentKey::entry(Endpoint::Berry, 1);
    let first = client.get_document(&key, false).await.unwrap();
    let second = client.get_document(&key, false).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first["name"], "cheri");
}

#[tokio::test]
async fn cache_survives_a_new_client() {
    let fx = Fixture::start().await;
    mount_cheri(&fx, 1).await;

    let key = DocumentKey::entry(Endpoint::Berry, 1);
    fx.client().get_document(&key, false).await.unwrap();
    let doc = fx.client().get_document(&key, false).await.unwrap();

    assert_eq!(doc["size"], 20);
    assert!(fx.cache_dir.path().join("api.cache").exists());
}

#[tokio::test]
async fn force_bypasses_cache() {
    let fx = Fixture::start().await;
    mount_cheri(&fx, 2).await;

    let client = fx.client();
    let key = DocumentKey::entry(Endpoint::Berry, 1);
    client.get_document(&key, false).await.unwrap();
    client.get_document(&key, true).await.unwrap();
    // cached again after the forced fetch
    client.get_document(&key, false).await.unwrap();
}

#[tokio::test]
async fn incomplete_listing_is_refetched_once_with_limit() {
    let fx = Fixture::start().await;
    let full = fx.listing("berry", &[("cheri", 1), ("chesto", 2), ("pecha", 3)]);
    let mut first_page = full.clone();
    first_page["results"] = json!([full["results"][0].clone()]);
    first_page["next"] = json!(fx.url("berry/?offset=1&limit=1"));

    Mock::given(method("GET"))
        .and(path("/api/v2/berry/"))
        .and(query_param_is_missing("limit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(first_page))
        .expect(1)
        .mount(&fx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/berry/"))
        .and(query_param("limit", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(full))
        .expect(1)
        .mount(&fx.server)
        .await;

    let client = fx.client();
    let doc = client
        .get_document(&DocumentKey::listing(Endpoint::Berry), false)
        .await
        .unwrap();
    assert_eq!(doc["results"].as_array().map(|r| r.len()), Some(3));

    let listing = client.list(Endpoint::Berry).await.unwrap();
    assert_eq!(listing.len(), 3);
    assert_eq!(listing.name_to_id("pecha"), Some(3));
}

#[tokio::test]
async fn endpoint_name_parsing_rejects_unknown_names() {
    let fx = Fixture::start().await;

    let err = "berries".parse::<Endpoint>().unwrap_err();
    assert!(matches!(err, CatalogError::UnknownEndpoint(ref name) if name == "berries"));
    assert_eq!(fx.total_hits().await, 0);
    assert!(!fx.cache_dir.path().join("api.cache").exists());
}

#[tokio::test]
async fn http_errors_surface_as_remote() {
    let fx = Fixture::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/berry/1/"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&fx.server)
        .await;

    let err = fx
        .client()
        .get_document(&DocumentKey::entry(Endpoint::Berry, 1), false)
        .await
        .unwrap_err();
    assert!(err.is_remote());
    assert!(matches!(
        err,
        CatalogError::Remote(ApiError::ServerError { ref body, .. }) if body == "maintenance"
    ));
}

// ── Resource ─────────────────────────────────────────────────────────

#[tokio::test]
async fn construction_is_lazy_and_materializes_once() {
    let fx = Fixture::start().await;
    mount_berries(&fx).await;
    mount_cheri(&fx, 1).await;

    let client = fx.client();
    let cheri = client.berry("cheri").await.unwrap();
    assert_eq!(cheri.id(), 1);
    assert_eq!(cheri.name(), Some("cheri"));
    assert!(!cheri.is_loaded().await);
    assert_eq!(fx.hits("/api/v2/berry/1/").await, 0);

    for field in ["size", "growth_time", "firmness", "flavors", "item"] {
        cheri.field(field).await.unwrap();
    }
    assert!(cheri.is_loaded().await);
    assert_eq!(fx.hits("/api/v2/berry/1/").await, 1);
}

#[tokio::test]
async fn cheri_fields_and_children() {
    let fx = Fixture::start().await;
    mount_berries(&fx).await;
    mount_cheri(&fx, 1).await;

    let client = fx.client();
    let cheri = client.berry("cheri").await.unwrap();
    let fields = cheri.fields().await.unwrap();

    assert_eq!(fields.get_str("name").unwrap(), "cheri");
    assert_eq!(fields.get_i64("size").unwrap(), 20);

    let item = fields.get_resource("item").unwrap();
    assert_eq!(item.endpoint(), Endpoint::Item);
    assert_eq!(item.id(), 126);
    assert_eq!(item.name(), Some("cheri-berry"));
    assert!(!item.is_loaded().await);

    let flavors = fields.get_sequence("flavors").unwrap();
    let first = flavors[0].as_metadata().unwrap();
    assert_eq!(first.get_i64("potency").unwrap(), 10);
    assert_eq!(first.get_resource("flavor").unwrap().endpoint(), Endpoint::BerryFlavor);

    // children never touched the network
    assert_eq!(fx.hits("/api/v2/item/126/").await, 0);
}

#[tokio::test]
async fn child_resource_loads_on_access() {
    let fx = Fixture::start().await;
    mount_berries(&fx).await;
    mount_cheri(&fx, 1).await;
    Mock::given(method("GET"))
        .and(path("/api/v2/item/126/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 126,
            "name": "cheri-berry",
            "cost": 80
        })))
        .expect(1)
        .mount(&fx.server)
        .await;

    let cheri = fx.client().berry(1u32).await.unwrap();
    let item = cheri.field("item").await.unwrap();
    let item = item.as_resource().unwrap();

    assert_eq!(item.field("cost").await.unwrap().as_i64(), Some(80));
    assert_eq!(item.field("name").await.unwrap().as_str(), Some("cheri-berry"));
}

#[tokio::test]
async fn eager_construction_loads_immediately() {
    let fx = Fixture::start().await;
    mount_berries(&fx).await;
    mount_cheri(&fx, 1).await;

    let cheri = fx
        .client()
        .resource_with(Endpoint::Berry, "cheri", ResourceOptions::eager())
        .await
        .unwrap();
    assert!(cheri.is_loaded().await);
    assert_eq!(fx.hits("/api/v2/berry/1/").await, 1);
}

#[tokio::test]
async fn explicit_load_reads_cache_unless_forced() {
    let fx = Fixture::start().await;
    mount_berries(&fx).await;
    mount_cheri(&fx, 2).await;
    let client = fx.client();

    let cheri = client.berry("cheri").await.unwrap();
    assert_eq!(cheri.field("size").await.unwrap().as_i64(), Some(20));
    cheri.load().await.unwrap();
    assert_eq!(cheri.field("size").await.unwrap().as_i64(), Some(20));
    assert_eq!(fx.hits("/api/v2/berry/1/").await, 1);

    let forced = client
        .resource_with(Endpoint::Berry, "cheri", ResourceOptions::default().force())
        .await
        .unwrap();
    assert_eq!(fx.hits("/api/v2/berry/1/").await, 1);
    assert_eq!(forced.field("name").await.unwrap().as_str(), Some("cheri"));
    assert_eq!(fx.hits("/api/v2/berry/1/").await, 2);

    // a fresh unforced handle is served from the cache the forced fetch refreshed
    client.berry("cheri").await.unwrap().load().await.unwrap();
    assert_eq!(fx.hits("/api/v2/berry/1/").await, 2);
}

#[tokio::test]
async fn forced_load_refetches_and_replaces_fields() {
    let fx = Fixture::start().await;
    mount_berries(&fx).await;
    let mut updated = fx.cheri();
    updated["size"] = json!(21);
    Mock::given(method("GET"))
        .and(path("/api/v2/berry/1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fx.cheri()))
        .up_to_n_times(1)
        .expect(1)
        .mount(&fx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/berry/1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(updated))
        .expect(1)
        .mount(&fx.server)
        .await;

    let cheri = fx
        .client()
        .resource_with(Endpoint::Berry, "cheri", ResourceOptions::default().force())
        .await
        .unwrap();
    assert_eq!(cheri.field("size").await.unwrap().as_i64(), Some(20));
    cheri.load().await.unwrap();
    assert_eq!(cheri.field("size").await.unwrap().as_i64(), Some(21));
    assert_eq!(fx.hits("/api/v2/berry/1/").await, 2);
}

#[tokio::test]
async fn nested_unknown_field_names_its_path() {
    let fx = Fixture::start().await;
    mount_berries(&fx).await;
    mount_cheri(&fx, 1).await;

    let cheri = fx.client().berry("cheri").await.unwrap();
    let flavors = cheri.field("flavors").await.unwrap();
    let first = flavors.as_sequence().unwrap()[0].as_metadata().unwrap().clone();

    let err = first.get("colour").unwrap_err();
    assert!(matches!(
        err,
        CatalogError::UnknownField { ref owner, ref field }
            if owner == "berry cheri.flavors[0]" && field == "colour"
    ));
    assert_eq!(err.to_string(), "berry cheri.flavors[0] has no field 'colour'");
}

#[tokio::test]
async fn unknown_name_and_id_are_not_found() {
    let fx = Fixture::start().await;
    mount_berries(&fx).await;

    let client = fx.client();
    let err = client.berry("oran").await.unwrap_err();
    assert!(matches!(
        err,
        CatalogError::NotFound { ref endpoint, ref key } if endpoint == "berry" && key == "oran"
    ));

    let err = client
        .resource(Endpoint::Berry, NameOrId::parse("64"))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { .. }));
}

#[tokio::test]
async fn unknown_field_is_reported() {
    let fx = Fixture::start().await;
    mount_berries(&fx).await;
    mount_cheri(&fx, 1).await;

    let cheri = fx.client().berry("cheri").await.unwrap();
    let err = cheri.field("colour").await.unwrap_err();
    assert!(matches!(err, CatalogError::UnknownField { ref field, .. } if field == "colour"));
}

#[tokio::test]
async fn failed_materialization_leaves_resource_unloaded() {
    let fx = Fixture::start().await;
    mount_berries(&fx).await;
    Mock::given(method("GET"))
        .and(path("/api/v2/berry/2/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&fx.server)
        .await;

    let chesto = fx.client().berry("chesto").await.unwrap();
    assert!(chesto.field("size").await.unwrap_err().is_remote());
    assert!(!chesto.is_loaded().await);
}

#[tokio::test]
async fn empty_encounters_become_empty_sequence() {
    let fx = Fixture::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/pokemon/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fx.listing("pokemon", &[("mew", 151)])))
        .mount(&fx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/pokemon/151/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 151,
            "name": "mew",
            "location_area_encounters": fx.url("pokemon/151/encounters"),
            "species": {"name": "mew", "url": fx.url("pokemon-species/151/")}
        })))
        .mount(&fx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/pokemon/151/encounters/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&fx.server)
        .await;

    let mew = fx.client().pokemon("mew").await.unwrap();
    let encounters = mew.field("location_area_encounters").await.unwrap();
    assert_eq!(encounters.as_sequence().map(|s| s.len()), Some(0));
    assert!(matches!(mew.field("species").await.unwrap(), Value::Resource(_)));
}

#[tokio::test]
async fn encounters_are_classified() {
    let fx = Fixture::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/pokemon/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fx.listing("pokemon", &[("pikachu", 25)])))
        .mount(&fx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/pokemon/25/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 25,
            "name": "pikachu",
            "location_area_encounters": fx.url("pokemon/25/encounters")
        })))
        .mount(&fx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/pokemon/25/encounters/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "location_area": {"name": "viridian-forest-area", "url": fx.url("location-area/321/")},
                "version_details": []
            }
        ])))
        .mount(&fx.server)
        .await;

    let pikachu = fx.client().pokemon(25u32).await.unwrap();
    let encounters = pikachu.field("location_area_encounters").await.unwrap();
    let first = encounters.as_sequence().unwrap()[0].as_metadata().unwrap().clone();
    let area = first.get_resource("location_area").unwrap();
    assert_eq!(area.endpoint(), Endpoint::LocationArea);
    assert_eq!(area.id(), 321);
}

#[tokio::test]
async fn listing_resources_are_placeholders() {
    let fx = Fixture::start().await;
    mount_berries(&fx).await;

    let client = fx.client();
    let listing = client.list(Endpoint::Berry).await.unwrap();
    let resources = listing.resources(&client);

    assert_eq!(resources.len(), 3);
    assert_eq!(resources[2].name(), Some("pecha"));
    assert_eq!(resources[2].url(), fx.url("berry/3/"));
    assert_eq!(fx.total_hits().await, 1);
}
