//! Product catalog client

use super::{image_part, item_key, parse, LIST_KEY};
use crate::cache::{ResourceCache, Tag};
use crate::gateway::{Gateway, GatewayError, Method, Part};
use crate::types::{Product, ProductDraft};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Client for the product endpoints, cached under [`Tag::Products`].
#[derive(Clone)]
pub struct ProductsClient {
    gateway: Arc<Gateway>,
    cache: Arc<ResourceCache>,
}

impl ProductsClient {
    pub fn new(gateway: Arc<Gateway>, cache: Arc<ResourceCache>) -> Self {
        Self { gateway, cache }
    }

    /// All products. Cached until the next product write.
    pub async fn list(&self) -> Result<Vec<Product>, GatewayError> {
        let value = self
            .cache
            .get_or_fetch(Tag::Products, LIST_KEY, || {
                self.gateway.get_json("/product/get-products")
            })
            .await?;
        parse(value)
    }

    /// One product by id. Cached until the next product write.
    pub async fn get(&self, id: &str) -> Result<Product, GatewayError> {
        let key = item_key(id);
        let path = format!("/product/get-products/{id}");
        let value = self
            .cache
            .get_or_fetch(Tag::Products, &key, || self.gateway.get_json(&path))
            .await?;
        parse(value)
    }

    /// Create a product from a draft. Stales the whole partition.
    pub async fn create(&self, draft: &ProductDraft) -> Result<Product, GatewayError> {
        let parts = product_form(draft)?;
        let value = self
            .gateway
            .send_multipart(Method::Post, "/product/create-product", parts)
            .await?;
        self.cache.invalidate(Tag::Products);
        let product: Product = parse(value)?;
        info!(id = %product.id, "created product");
        Ok(product)
    }

    /// Replace a product wholesale. Stales the whole partition.
    pub async fn update(&self, id: &str, draft: &ProductDraft) -> Result<Product, GatewayError> {
        let parts = product_form(draft)?;
        let value = self
            .gateway
            .send_multipart(Method::Put, &format!("/product/update-product/{id}"), parts)
            .await?;
        self.cache.invalidate(Tag::Products);
        let product: Product = parse(value)?;
        info!(id = %product.id, "updated product");
        Ok(product)
    }

    /// Delete a product. Stales the whole partition.
    pub async fn delete(&self, id: &str) -> Result<(), GatewayError> {
        self.gateway
            .delete(&format!("/product/delete-product/{id}"))
            .await?;
        self.cache.invalidate(Tag::Products);
        info!(id, "deleted product");
        Ok(())
    }
}

fn json_field(name: &str, value: &impl Serialize) -> Result<Part, GatewayError> {
    let rendered = serde_json::to_string(value).map_err(|e| GatewayError::Parse(e.to_string()))?;
    Ok(Part::text(name, rendered))
}

/// Encode a draft as the multipart form the backend expects: localized
/// objects and dimensions as JSON-encoded text fields, images as file
/// parts or pass-through URL text.
fn product_form(draft: &ProductDraft) -> Result<Vec<Part>, GatewayError> {
    let mut parts = vec![
        json_field("name", &draft.name)?,
        json_field("title", &draft.title)?,
        json_field("description", &draft.description)?,
        json_field("material", &draft.material)?,
        json_field("code", &draft.code)?,
        json_field("price", &draft.price)?,
        json_field("discountPercent", &draft.discount_percent)?,
        json_field("size", &draft.size)?,
    ];

    if let Some(main) = &draft.main_image {
        parts.push(image_part("mainImage", main));
    }
    for image in &draft.additional_images {
        parts.push(image_part("additionalImages", image));
    }
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::PartKind;
    use crate::resources::testutil::rig_logged_in;
    use crate::types::{ImageField, Language, Localized};
    use bytes::Bytes;

    fn draft(name_ru: &str) -> ProductDraft {
        ProductDraft {
            name: Localized::new(name_ru.to_string(), format!("{name_ru}-kz")),
            price: Localized::new(700.0, 750.0),
            ..ProductDraft::default()
        }
    }

    fn client() -> (ProductsClient, crate::resources::testutil::Rig) {
        let rig = rig_logged_in();
        (
            ProductsClient::new(rig.gateway.clone(), rig.cache.clone()),
            rig,
        )
    }

    #[test]
    fn form_encodes_localized_fields_as_json_text() {
        let mut d = draft("Полка");
        d.main_image = Some(ImageField::Url("https://example.com/shelf.jpg".into()));
        d.additional_images = vec![
            ImageField::upload("side.png", "image/png", Bytes::from_static(b"png")),
            ImageField::Url("https://example.com/back.jpg".into()),
        ];

        let parts = product_form(&d).unwrap();
        let name = parts.iter().find(|p| p.name == "name").unwrap();
        match &name.kind {
            PartKind::Text(value) => {
                assert_eq!(
                    serde_json::from_str::<Localized<String>>(value).unwrap().ru,
                    "Полка"
                );
            }
            other => panic!("expected text part, got {other:?}"),
        }

        // URL images ride along as text, uploads as files, and repeated
        // additionalImages parts share one field name.
        let main = parts.iter().find(|p| p.name == "mainImage").unwrap();
        assert!(matches!(&main.kind, PartKind::Text(v) if v.contains("shelf.jpg")));
        let additional: Vec<_> = parts.iter().filter(|p| p.name == "additionalImages").collect();
        assert_eq!(additional.len(), 2);
        assert!(matches!(&additional[0].kind, PartKind::File { file_name, .. } if file_name == "side.png"));
    }

    #[tokio::test]
    async fn list_and_get_round_trip() {
        let (products, _rig) = client();

        let all = products.list().await.unwrap();
        assert_eq!(all.len(), 2);

        let chair = products.get("1").await.unwrap();
        assert_eq!(chair.name_in(Language::Ru), "Стул");

        let missing = products.get("99").await.unwrap_err();
        assert!(matches!(
            missing,
            GatewayError::Server { status: 404, .. }
        ));
    }

    #[tokio::test]
    async fn create_invalidates_so_list_sees_it() {
        let (products, _rig) = client();

        assert_eq!(products.list().await.unwrap().len(), 2);
        let created = products.create(&draft("Полка")).await.unwrap();
        assert_eq!(created.id, "3");

        let all = products.list().await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.iter().any(|p| p.id == created.id));
    }

    #[tokio::test]
    async fn reads_are_served_from_cache_until_a_write() {
        let (products, rig) = client();

        products.list().await.unwrap();
        products.get("1").await.unwrap();

        // With the transport down, cached reads still answer.
        rig.fixture.set_offline(true);
        assert_eq!(products.list().await.unwrap().len(), 2);
        assert_eq!(products.get("1").await.unwrap().id, "1");

        // A write while online stales everything at once.
        rig.fixture.set_offline(false);
        products.delete("1").await.unwrap();
        rig.fixture.set_offline(true);
        assert!(products.list().await.unwrap_err().is_network());
        assert!(products.get("1").await.unwrap_err().is_network());
    }

    #[tokio::test]
    async fn update_replaces_and_refreshes() {
        let (products, _rig) = client();
        products.list().await.unwrap();

        let mut d = draft("Стул");
        d.price = Localized::new(1234.0, 1234.0);
        let updated = products.update("1", &d).await.unwrap();
        assert_eq!(updated.price.ru, 1234.0);

        // The post-write read reflects the update, not the cached list.
        let fresh = products.get("1").await.unwrap();
        assert_eq!(fresh.price.ru, 1234.0);
    }

    #[tokio::test]
    async fn writes_without_a_session_are_unauthorized() {
        let rig = crate::resources::testutil::rig();
        let products = ProductsClient::new(rig.gateway.clone(), rig.cache.clone());

        let err = products.create(&draft("x")).await.unwrap_err();
        assert!(err.is_unauthorized());
    }
}
