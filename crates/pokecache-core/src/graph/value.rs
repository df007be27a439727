use std::collections::BTreeMap;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::warn;

use crate::api::CatalogClient;
use crate::endpoint::ResourceRef;
use crate::error::{CatalogError, Result};

use super::Resource;

/// One field value of a materialized resource.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    /// Embedded structure without an identity of its own.
    Metadata(Fields),
    /// Reference to another catalog entry, loaded on first access.
    Resource(Resource),
    Sequence(Vec<Value>),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "a bool",
            Value::Number(_) => "a number",
            Value::String(_) => "a string",
            Value::Metadata(_) => "metadata",
            Value::Resource(_) => "a resource",
            Value::Sequence(_) => "a sequence",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Number(n) => n.as_u64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_metadata(&self) -> Option<&Fields> {
        match self {
            Value::Metadata(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn as_resource(&self) -> Option<&Resource> {
        match self {
            Value::Resource(resource) => Some(resource),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::Metadata(fields) => fields.serialize(serializer),
            Value::Resource(resource) => resource.serialize(serializer),
            Value::Sequence(items) => items.serialize(serializer),
        }
    }
}

/// Field map of a resource or of embedded metadata.
///
/// Cloning shares the underlying map.
#[derive(Debug, Clone)]
pub struct Fields {
    owner: Arc<str>,
    map: Arc<BTreeMap<String, Value>>,
}

impl Fields {
    pub(crate) fn new(owner: impl Into<Arc<str>>, map: BTreeMap<String, Value>) -> Self {
        Self {
            owner: owner.into(),
            map: Arc::new(map),
        }
    }

    /// Value of `name`, or `UnknownField`.
    pub fn get(&self, name: &str) -> Result<&Value> {
        self.map
            .get(name)
            .ok_or_else(|| CatalogError::UnknownField {
                owner: self.owner.to_string(),
                field: name.to_string(),
            })
    }

    fn get_as<'a, T>(
        &'a self,
        name: &str,
        expected: &'static str,
        pick: impl FnOnce(&'a Value) -> Option<T>,
    ) -> Result<T> {
        pick(self.get(name)?).ok_or_else(|| CatalogError::FieldType {
            field: name.to_string(),
            expected,
        })
    }

    pub fn get_str(&self, name: &str) -> Result<&str> {
        self.get_as(name, "a string", Value::as_str)
    }

    pub fn get_bool(&self, name: &str) -> Result<bool> {
        self.get_as(name, "a bool", Value::as_bool)
    }

    pub fn get_i64(&self, name: &str) -> Result<i64> {
        self.get_as(name, "an integer", Value::as_i64)
    }

    pub fn get_u64(&self, name: &str) -> Result<u64> {
        self.get_as(name, "a non-negative integer", Value::as_u64)
    }

    pub fn get_f64(&self, name: &str) -> Result<f64> {
        self.get_as(name, "a number", Value::as_f64)
    }

    pub fn get_metadata(&self, name: &str) -> Result<&Fields> {
        self.get_as(name, "metadata", Value::as_metadata)
    }

    pub fn get_resource(&self, name: &str) -> Result<&Resource> {
        self.get_as(name, "a resource", Value::as_resource)
    }

    pub fn get_sequence(&self, name: &str) -> Result<&[Value]> {
        self.get_as(name, "a sequence", Value::as_sequence)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Serialize for Fields {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.map.len()))?;
        for (key, value) in self.map.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Classify one raw JSON value into the graph.
///
/// - object with a `url` naming a catalog entry -> unloaded `Resource`
/// - any other object -> `Metadata`
/// - array -> `Sequence`, element by element
/// - primitives pass through
///
/// `path` names where the value sits (`berry cheri.flavors[0]`) and becomes
/// the owner reported by field errors on nested metadata.
pub(crate) fn classify(client: &CatalogClient, path: &str, raw: serde_json::Value) -> Value {
    match raw {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => Value::Number(n),
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => Value::Sequence(
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| classify(client, &format!("{}[{}]", path, i), item))
                .collect(),
        ),
        serde_json::Value::Object(map) => classify_object(client, path, map),
    }
}

fn classify_object(
    client: &CatalogClient,
    path: &str,
    map: serde_json::Map<String, serde_json::Value>,
) -> Value {
    if let Some(url) = map.get("url").and_then(|u| u.as_str()) {
        match ResourceRef::from_url(url) {
            Ok(reference) => {
                let name = map.get("name").and_then(|n| n.as_str()).map(str::to_string);
                return Value::Resource(Resource::placeholder(client.clone(), reference, name));
            }
            Err(e) => warn!(url = url, error = %e, "Reference is not a catalog entry, keeping it as metadata"),
        }
    }
    Value::Metadata(classify_fields(client, path, map))
}

/// Path of the value stored under `key` in the object at `parent`.
pub(crate) fn field_path(parent: &str, key: &str) -> String {
    format!("{}.{}", parent, key)
}

/// Classify every value of a JSON object owned by `owner`.
pub(crate) fn classify_fields(
    client: &CatalogClient,
    owner: &str,
    map: serde_json::Map<String, serde_json::Value>,
) -> Fields {
    let fields = map
        .into_iter()
        .map(|(key, raw)| {
            let value = classify(client, &field_path(owner, &key), raw);
            (key, value)
        })
        .collect();
    Fields::new(owner, fields)
}
