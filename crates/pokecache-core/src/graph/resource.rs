use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};
use tokio::sync::Mutex;
use tracing::debug;

use crate::api::{ApiError, CatalogClient};
use crate::endpoint::{DocumentKey, Endpoint, ResourceRef};
use crate::error::{CatalogError, Result};

use super::value::{classify, field_path, Fields, Value};

/// Field whose value is the URL of a per-entry subresource rather than an
/// embedded reference. It is fetched during materialization and replaced by
/// the list it points to.
const ENCOUNTERS_FIELD: &str = "location_area_encounters";

/// How a caller names a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NameOrId {
    Id(u32),
    Name(String),
}

impl NameOrId {
    /// Digits become an id, anything else a name.
    pub fn parse(s: &str) -> Self {
        match s.trim().parse() {
            Ok(id) => NameOrId::Id(id),
            Err(_) => NameOrId::Name(s.trim().to_string()),
        }
    }
}

impl From<u32> for NameOrId {
    fn from(id: u32) -> Self {
        NameOrId::Id(id)
    }
}

impl From<&str> for NameOrId {
    fn from(name: &str) -> Self {
        NameOrId::Name(name.to_string())
    }
}

impl From<String> for NameOrId {
    fn from(name: String) -> Self {
        NameOrId::Name(name)
    }
}

impl fmt::Display for NameOrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameOrId::Id(id) => write!(f, "{}", id),
            NameOrId::Name(name) => f.write_str(name),
        }
    }
}

/// Construction options for `Resource::construct`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceOptions {
    /// Materialize during construction instead of on first access.
    pub eager: bool,
    /// Fetch the entry document from the network even when cached.
    pub force: bool,
}

impl ResourceOptions {
    pub fn eager() -> Self {
        Self {
            eager: true,
            force: false,
        }
    }

    pub fn force(mut self) -> Self {
        self.force = true;
        self
    }
}

/// Resolve a name or id against the endpoint's full listing.
///
/// Returns the entry's name (unnamed endpoints have none) and numeric id.
pub async fn resolve_identity(
    client: &CatalogClient,
    endpoint: Endpoint,
    name_or_id: &NameOrId,
) -> Result<(Option<String>, u32)> {
    let listing = client.list(endpoint).await?;

    let resolved = match name_or_id {
        NameOrId::Id(id) => listing
            .entry_by_id(*id)
            .map(|entry| (entry.name.clone(), *id)),
        NameOrId::Name(name) => listing
            .entry_by_name(name)
            .and_then(|entry| entry.id().ok())
            .map(|id| (Some(name.clone()), id)),
    };

    resolved.ok_or_else(|| CatalogError::NotFound {
        endpoint: endpoint.to_string(),
        key: name_or_id.to_string(),
    })
}

enum LoadState {
    Unloaded,
    Loaded(Fields),
}

struct Inner {
    client: CatalogClient,
    reference: ResourceRef,
    name: Option<String>,
    url: String,
    force: bool,
    state: Mutex<LoadState>,
}

/// One catalog entry, materialized on first field access.
///
/// Handles are cheap to clone; clones share the load state, so an entry
/// is fetched once no matter how many handles reach it.
#[derive(Clone)]
pub struct Resource {
    inner: Arc<Inner>,
}

impl Resource {
    /// Resolve `name_or_id` on `endpoint` and build a handle for it.
    ///
    /// Resolution reads the endpoint listing (cached after the first call).
    /// The entry document itself is fetched here only if `options.eager`.
    pub async fn construct(
        client: &CatalogClient,
        endpoint: Endpoint,
        name_or_id: impl Into<NameOrId>,
        options: ResourceOptions,
    ) -> Result<Self> {
        let name_or_id = name_or_id.into();
        let (name, id) = resolve_identity(client, endpoint, &name_or_id).await?;
        let resource = Self::new(
            client.clone(),
            ResourceRef::new(endpoint, id),
            name,
            options.force,
        );

        if options.eager {
            resource.load().await?;
        }
        Ok(resource)
    }

    /// Unloaded handle for a reference found inside another document.
    pub(crate) fn placeholder(client: CatalogClient, reference: ResourceRef, name: Option<String>) -> Self {
        Self::new(client, reference, name, false)
    }

    fn new(client: CatalogClient, reference: ResourceRef, name: Option<String>, force: bool) -> Self {
        let url = client.resource_url(reference);
        Self {
            inner: Arc::new(Inner {
                client,
                reference,
                name,
                url,
                force,
                state: Mutex::new(LoadState::Unloaded),
            }),
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        self.inner.reference.endpoint
    }

    pub fn id(&self) -> u32 {
        self.inner.reference.id
    }

    /// Name known at construction, if any.
    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    pub fn reference(&self) -> ResourceRef {
        self.inner.reference
    }

    pub async fn is_loaded(&self) -> bool {
        matches!(*self.inner.state.lock().await, LoadState::Loaded(_))
    }

    /// Fetch (cache first) and classify the entry document, replacing any
    /// fields loaded before.
    pub async fn load(&self) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        let fields = self.materialize().await?;
        *state = LoadState::Loaded(fields);
        Ok(())
    }

    /// All fields, materializing on the first call.
    pub async fn fields(&self) -> Result<Fields> {
        let mut state = self.inner.state.lock().await;
        if let LoadState::Loaded(ref fields) = *state {
            return Ok(fields.clone());
        }
        let fields = self.materialize().await?;
        *state = LoadState::Loaded(fields.clone());
        Ok(fields)
    }

    /// One field, materializing on the first access.
    pub async fn field(&self, name: &str) -> Result<Value> {
        let fields = self.fields().await?;
        Ok(fields.get(name)?.clone())
    }

    async fn materialize(&self) -> Result<Fields> {
        let client = &self.inner.client;
        let key = self.inner.reference.document_key();
        debug!(resource = %self.inner.reference, "Materializing");

        let doc = client.get_document(&key, self.inner.force).await?;
        let serde_json::Value::Object(map) = doc else {
            return Err(ApiError::InvalidResponse {
                url: self.inner.url.clone(),
                detail: "expected a JSON object".to_string(),
            }
            .into());
        };

        let owner = self.owner();
        let mut fields = BTreeMap::new();
        for (key, raw) in map {
            let path = field_path(&owner, &key);
            let value = match raw {
                serde_json::Value::String(ref url) if key == ENCOUNTERS_FIELD => {
                    self.follow_subresource(&path, url).await?
                }
                raw => classify(client, &path, raw),
            };
            fields.insert(key, value);
        }

        Ok(Fields::new(owner, fields))
    }

    /// Fetch the list a subresource URL points at.
    async fn follow_subresource(&self, path: &str, url: &str) -> Result<Value> {
        let key = DocumentKey::from_subresource_url(url)?;
        let doc = self.inner.client.get_document(&key, self.inner.force).await?;
        Ok(match doc {
            serde_json::Value::Null => Value::Sequence(Vec::new()),
            other => classify(&self.inner.client, path, other),
        })
    }

    fn owner(&self) -> String {
        format!("{} {}", self.endpoint(), self)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.name {
            Some(ref name) => f.write_str(name),
            None => write!(f, "{}", self.inner.reference.id),
        }
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("endpoint", &self.endpoint())
            .field("id", &self.id())
            .field("name", &self.inner.name)
            .finish()
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.inner.reference == other.inner.reference
    }
}

impl Eq for Resource {}

/// Serialized as the reference it was built from: `{"name", "url"}`.
impl Serialize for Resource {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(ref name) = self.inner.name {
            map.serialize_entry("name", name)?;
        }
        map.serialize_entry("url", &self.inner.url)?;
        map.end()
    }
}
