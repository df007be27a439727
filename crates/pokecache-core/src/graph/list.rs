use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::CatalogClient;
use crate::endpoint::{Endpoint, ResourceRef};
use crate::error::Result;

use super::Resource;

/// One member of an endpoint listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEntry {
    /// Unnamed endpoints (e.g. `characteristic`) list urls only.
    #[serde(default)]
    pub name: Option<String>,
    pub url: String,
}

impl ListEntry {
    /// Trailing id segment of the url, unparsed.
    fn id_segment(&self) -> &str {
        self.url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }

    pub fn id(&self) -> Result<u32> {
        ResourceRef::from_url(&self.url).map(|r| r.id)
    }

    /// Name, or the id for unnamed entries.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.id_segment())
    }
}

#[derive(Debug, Deserialize)]
struct ListingDocument {
    count: usize,
    #[serde(default)]
    results: Vec<ListEntry>,
}

/// Every member of one endpoint, in catalog order.
#[derive(Debug, Clone)]
pub struct ResourceList {
    endpoint: Endpoint,
    count: usize,
    entries: Vec<ListEntry>,
}

impl ResourceList {
    pub fn from_document(endpoint: Endpoint, doc: &serde_json::Value) -> Result<Self> {
        let listing = ListingDocument::deserialize(doc)?;
        if listing.results.len() != listing.count {
            warn!(
                endpoint = %endpoint,
                count = listing.count,
                returned = listing.results.len(),
                "Listing is incomplete"
            );
        }
        Ok(Self {
            endpoint,
            count: listing.count,
            entries: listing.results,
        })
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    /// Declared number of members.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn entries(&self) -> &[ListEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ListEntry> {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(ListEntry::display_name)
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.url.as_str())
    }

    pub fn entry_by_id(&self, id: u32) -> Option<&ListEntry> {
        let id = id.to_string();
        self.entries.iter().find(|e| e.id_segment() == id)
    }

    pub fn entry_by_name(&self, name: &str) -> Option<&ListEntry> {
        self.entries
            .iter()
            .find(|e| e.name.as_deref() == Some(name))
    }

    pub fn id_to_name(&self, id: u32) -> Option<&str> {
        self.entry_by_id(id).and_then(|e| e.name.as_deref())
    }

    pub fn name_to_id(&self, name: &str) -> Option<u32> {
        self.entry_by_name(name).and_then(|e| e.id().ok())
    }

    /// Unloaded handles for every member with a well-formed url.
    pub fn resources(&self, client: &CatalogClient) -> Vec<Resource> {
        self.entries
            .iter()
            .filter_map(|e| {
                let reference = ResourceRef::from_url(&e.url).ok()?;
                Some(Resource::placeholder(client.clone(), reference, e.name.clone()))
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a ResourceList {
    type Item = &'a ListEntry;
    type IntoIter = std::slice::Iter<'a, ListEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
