//! Core domain types shared across the client.
//!
//! Everything that crosses the wire lives here: catalog entities, the
//! drafts used to create or update them, and the small envelopes the
//! backend wraps tokens and error messages in. Field names follow the
//! server's camelCase JSON convention via serde renames.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Languages the catalog carries content for.
///
/// Every localized field is stored in both languages; this enum selects
/// which one a display helper returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ru,
    Kz,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Ru => "ru",
            Language::Kz => "kz",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ru" => Ok(Language::Ru),
            "kz" => Ok(Language::Kz),
            other => Err(format!("unknown language '{other}' (expected 'ru' or 'kz')")),
        }
    }
}

/// A value carried in both catalog languages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Localized<T> {
    pub ru: T,
    pub kz: T,
}

impl<T> Localized<T> {
    pub fn new(ru: T, kz: T) -> Self {
        Self { ru, kz }
    }

    /// Both languages share one value.
    pub fn uniform(value: T) -> Self
    where
        T: Clone,
    {
        Self { kz: value.clone(), ru: value }
    }

    pub fn get(&self, lang: Language) -> &T {
        match lang {
            Language::Ru => &self.ru,
            Language::Kz => &self.kz,
        }
    }
}

/// Physical dimensions of a product, in centimeters.
///
/// The backend serializes the axes as uppercase keys.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Dimensions {
    #[serde(rename = "X")]
    pub x: f64,
    #[serde(rename = "Y")]
    pub y: f64,
    #[serde(rename = "Z")]
    pub z: f64,
}

/// A catalog product as the backend returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: Localized<String>,
    pub title: Localized<String>,
    pub description: Localized<String>,
    pub material: Localized<String>,
    pub code: Localized<String>,
    pub price: Localized<f64>,
    #[serde(default)]
    pub discount_percent: Localized<f64>,
    #[serde(default)]
    pub discount_price: Localized<f64>,
    #[serde(default)]
    pub size: Dimensions,
    #[serde(default)]
    pub main_image: String,
    #[serde(default)]
    pub additional_images: Vec<String>,
}

impl Product {
    /// Display name in the requested language.
    pub fn name_in(&self, lang: Language) -> &str {
        self.name.get(lang)
    }

    /// Effective price after discount, if one applies.
    pub fn effective_price(&self, lang: Language) -> f64 {
        let discounted = *self.discount_price.get(lang);
        if discounted > 0.0 {
            discounted
        } else {
            *self.price.get(lang)
        }
    }
}

/// An administrator account as the backend returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// An image attached to a draft.
///
/// Drafts loaded from JSON carry URLs; the CLI swaps in `Upload`
/// variants for local files before submitting. URLs pass through the
/// multipart body as plain text fields, uploads as file parts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "String")]
pub enum ImageField {
    /// Raw bytes to upload as a file part.
    Upload(ImageUpload),
    /// An already-hosted image the server keeps as-is.
    Url(String),
}

impl From<String> for ImageField {
    fn from(url: String) -> Self {
        ImageField::Url(url)
    }
}

/// File contents staged for a multipart upload.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl ImageField {
    pub fn upload(file_name: impl Into<String>, content_type: impl Into<String>, data: Bytes) -> Self {
        ImageField::Upload(ImageUpload {
            file_name: file_name.into(),
            content_type: content_type.into(),
            data,
        })
    }
}

/// Everything needed to create a product, or replace one wholesale on
/// update. The backend has no partial-update endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProductDraft {
    pub name: Localized<String>,
    #[serde(default)]
    pub title: Localized<String>,
    #[serde(default)]
    pub description: Localized<String>,
    #[serde(default)]
    pub material: Localized<String>,
    #[serde(default)]
    pub code: Localized<String>,
    pub price: Localized<f64>,
    #[serde(default)]
    pub discount_percent: Localized<f64>,
    #[serde(default)]
    pub size: Dimensions,
    #[serde(default)]
    pub main_image: Option<ImageField>,
    #[serde(default)]
    pub additional_images: Vec<ImageField>,
}

/// Everything needed to create or update an administrator account.
///
/// `password` is optional on update (omitting it keeps the current
/// one); the backend requires it on create.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AdminDraft {
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub image: Option<ImageField>,
}

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Successful login response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenEnvelope {
    pub token: String,
}

/// Error body the backend attaches to non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessage {
    pub message: String,
}
