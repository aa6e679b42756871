//! Typed clients for the two cached resources.
//!
//! Each client pairs the gateway with the shared cache: reads go
//! through [`ResourceCache::get_or_fetch`] under the resource's tag,
//! writes go straight to the gateway and invalidate the whole tag on
//! success. Multipart encoding of drafts lives next to the client that
//! owns the resource.

pub mod admins;
pub mod products;

pub use admins::AdminsClient;
pub use products::ProductsClient;

use crate::cache::ResourceCache;
use crate::gateway::{GatewayError, Part};
use crate::types::ImageField;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub(crate) const LIST_KEY: &str = "list";

pub(crate) fn item_key(id: &str) -> String {
    format!("item/{id}")
}

/// Deserialize a cached or fresh JSON document into its typed shape.
pub(crate) fn parse<T: DeserializeOwned>(value: Value) -> Result<T, GatewayError> {
    serde_json::from_value(value).map_err(|e| GatewayError::Parse(e.to_string()))
}

/// Encode an image field as the form part the backend expects: uploads
/// become file parts, already-hosted URLs pass through as text.
pub(crate) fn image_part(name: &str, field: &ImageField) -> Part {
    match field {
        ImageField::Url(url) => Part::text(name, url.clone()),
        ImageField::Upload(upload) => Part::file(
            name,
            upload.file_name.clone(),
            upload.content_type.clone(),
            upload.data.clone(),
        ),
    }
}
