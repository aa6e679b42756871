//! Administrator account client

use super::{item_key, parse, LIST_KEY};
use crate::cache::{ResourceCache, Tag};
use crate::gateway::{Gateway, GatewayError, Method, Part};
use crate::types::{Admin, AdminDraft, ImageField};
use std::sync::Arc;
use tracing::info;

/// Client for the worker endpoints, cached under [`Tag::Admins`].
#[derive(Clone)]
pub struct AdminsClient {
    gateway: Arc<Gateway>,
    cache: Arc<ResourceCache>,
}

impl AdminsClient {
    pub fn new(gateway: Arc<Gateway>, cache: Arc<ResourceCache>) -> Self {
        Self { gateway, cache }
    }

    /// All admin accounts. Cached until the next admin write.
    pub async fn list(&self) -> Result<Vec<Admin>, GatewayError> {
        let value = self
            .cache
            .get_or_fetch(Tag::Admins, LIST_KEY, || {
                self.gateway.get_json("/worker/get-workers")
            })
            .await?;
        parse(value)
    }

    /// One admin account by id. Cached until the next admin write.
    pub async fn get(&self, id: &str) -> Result<Admin, GatewayError> {
        let key = item_key(id);
        let path = format!("/worker/get-workers/{id}");
        let value = self
            .cache
            .get_or_fetch(Tag::Admins, &key, || self.gateway.get_json(&path))
            .await?;
        parse(value)
    }

    /// Create an admin account. Stales the whole partition.
    pub async fn create(&self, draft: &AdminDraft) -> Result<Admin, GatewayError> {
        let value = self
            .gateway
            .send_multipart(Method::Post, "/worker/create-worker", admin_form(draft))
            .await?;
        self.cache.invalidate(Tag::Admins);
        let admin: Admin = parse(value)?;
        info!(id = %admin.id, username = %admin.username, "created admin");
        Ok(admin)
    }

    /// Update an admin account; absent draft fields keep their stored
    /// values. Stales the whole partition.
    pub async fn update(&self, id: &str, draft: &AdminDraft) -> Result<Admin, GatewayError> {
        let value = self
            .gateway
            .send_multipart(
                Method::Put,
                &format!("/worker/update-worker/{id}"),
                admin_form(draft),
            )
            .await?;
        self.cache.invalidate(Tag::Admins);
        let admin: Admin = parse(value)?;
        info!(id = %admin.id, "updated admin");
        Ok(admin)
    }

    /// Delete an admin account. Stales the whole partition.
    pub async fn delete(&self, id: &str) -> Result<(), GatewayError> {
        self.gateway
            .delete(&format!("/worker/delete-worker/{id}"))
            .await?;
        self.cache.invalidate(Tag::Admins);
        info!(id, "deleted admin");
        Ok(())
    }
}

/// Encode an admin draft. Unlike products, the field name depends on
/// the image kind: uploads go under `image`, URLs under `imageUrl`.
fn admin_form(draft: &AdminDraft) -> Vec<Part> {
    let mut parts = vec![Part::text("username", draft.username.clone())];
    if let Some(password) = &draft.password {
        parts.push(Part::text("password", password.clone()));
    }
    if let Some(email) = &draft.email {
        parts.push(Part::text("email", email.clone()));
    }
    match &draft.image {
        Some(ImageField::Upload(upload)) => parts.push(Part::file(
            "image",
            upload.file_name.clone(),
            upload.content_type.clone(),
            upload.data.clone(),
        )),
        Some(ImageField::Url(url)) => parts.push(Part::text("imageUrl", url.clone())),
        None => {}
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::PartKind;
    use crate::resources::testutil::rig_logged_in;
    use bytes::Bytes;

    fn client() -> (AdminsClient, crate::resources::testutil::Rig) {
        let rig = rig_logged_in();
        (
            AdminsClient::new(rig.gateway.clone(), rig.cache.clone()),
            rig,
        )
    }

    #[test]
    fn image_field_name_depends_on_kind() {
        let upload = AdminDraft {
            username: "a".into(),
            image: Some(ImageField::upload(
                "face.png",
                "image/png",
                Bytes::from_static(b"png"),
            )),
            ..AdminDraft::default()
        };
        let parts = admin_form(&upload);
        assert!(parts
            .iter()
            .any(|p| p.name == "image" && matches!(p.kind, PartKind::File { .. })));

        let linked = AdminDraft {
            username: "a".into(),
            image: Some(ImageField::Url("https://example.com/a.png".into())),
            ..AdminDraft::default()
        };
        let parts = admin_form(&linked);
        assert!(parts
            .iter()
            .any(|p| p.name == "imageUrl" && matches!(p.kind, PartKind::Text(_))));
        assert!(!parts.iter().any(|p| p.name == "image"));
    }

    #[test]
    fn optional_fields_are_omitted_not_blank() {
        let parts = admin_form(&AdminDraft {
            username: "solo".into(),
            ..AdminDraft::default()
        });
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].name, "username");
    }

    #[tokio::test]
    async fn full_crud_against_fixture() {
        let (admins, _rig) = client();

        assert_eq!(admins.list().await.unwrap().len(), 2);

        let created = admins
            .create(&AdminDraft {
                username: "newbie".into(),
                password: Some("hunter2".into()),
                email: Some("newbie@example.com".into()),
                image: None,
            })
            .await
            .unwrap();
        assert_eq!(created.id, "3");
        assert_eq!(admins.list().await.unwrap().len(), 3);

        let updated = admins
            .update(
                &created.id,
                &AdminDraft {
                    username: "newbie".into(),
                    email: Some("renamed@example.com".into()),
                    ..AdminDraft::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.email.as_deref(), Some("renamed@example.com"));

        admins.delete(&created.id).await.unwrap();
        let err = admins.get(&created.id).await.unwrap_err();
        assert!(matches!(err, GatewayError::Server { status: 404, .. }));
    }

    #[tokio::test]
    async fn admin_writes_do_not_stale_products() {
        let rig = rig_logged_in();
        let admins = AdminsClient::new(rig.gateway.clone(), rig.cache.clone());
        let products =
            crate::resources::ProductsClient::new(rig.gateway.clone(), rig.cache.clone());

        products.list().await.unwrap();
        admins
            .create(&AdminDraft {
                username: "temp".into(),
                ..AdminDraft::default()
            })
            .await
            .unwrap();

        // Products cache survived the admin write; only the admins
        // partition was staled.
        rig.fixture.set_offline(true);
        assert_eq!(products.list().await.unwrap().len(), 2);
        assert!(admins.list().await.unwrap_err().is_network());
    }
}
