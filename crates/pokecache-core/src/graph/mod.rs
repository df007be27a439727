//! The lazy resource graph.
//!
//! A `Resource` is a handle on one catalog entry. Its document is fetched
//! (cache first) the first time a field is read, and every nested JSON
//! value is classified: references to other entries become unloaded
//! `Resource`s, other objects become `Metadata`, arrays become sequences.
//! Walking the graph therefore costs one fetch per entry actually visited.

pub mod image;
pub mod list;
pub mod resource;
pub mod value;

pub use image::ImageResource;
pub use list::{ListEntry, ResourceList};
pub use resource::{resolve_identity, NameOrId, Resource, ResourceOptions};
pub use value::{Fields, Value};
