//! Command implementations behind the CLI.
//!
//! `Console` wires the configured transport, the credential store, the
//! shared cache, and the session manager together, then exposes one
//! method per user-facing command. Build-time validation resolves the
//! `Unchecked` startup state, so every command runs against a settled
//! session.

use crate::cache::ResourceCache;
use crate::config::Config;
use crate::credentials::{CredentialStore, StoreError};
use crate::gateway::{Gateway, GatewayError, TokenCell};
use crate::resources::{AdminsClient, ProductsClient};
use crate::session::{LoginError, SessionManager, SessionState};
use crate::types::{AdminDraft, ImageField, Language, Product, ProductDraft};
use bytes::Bytes;
use chrono::Utc;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Errors a console command can surface to the user.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error("{0}")]
    Gateway(#[from] GatewayError),

    #[error("{0}")]
    Login(#[from] LoginError),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid draft: {0}")]
    Draft(#[from] serde_json::Error),

    #[error("not logged in (run 'catalog_console login' first)")]
    NotLoggedIn,
}

/// The wired-up client, one instance per CLI invocation.
pub struct Console {
    config: Config,
    session: Arc<SessionManager>,
    products: ProductsClient,
    admins: AdminsClient,
    store: CredentialStore,
}

impl Console {
    /// Wire everything up and settle the startup session state.
    pub async fn build(config: Config) -> Result<Self, ConsoleError> {
        let token = Arc::new(TokenCell::new());
        let gateway = Arc::new(Gateway::from_config(&config, token.clone())?);
        let store = CredentialStore::open(&config.state_dir).await?;
        let cache = Arc::new(ResourceCache::new());

        let session = Arc::new(SessionManager::new(
            gateway.clone(),
            store.clone(),
            token,
        ));
        let console = Self {
            products: ProductsClient::new(gateway.clone(), cache.clone()),
            admins: AdminsClient::new(gateway, cache),
            session,
            store,
            config,
        };

        // Resolves Unchecked: purges a dead token, loads a live one.
        console.session.validate().await;
        Ok(console)
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    // === Session commands ===

    pub async fn login(&self, username: &str, password: &str) -> Result<(), ConsoleError> {
        let claims = self.session.login(username, password).await?;
        println!(
            "Logged in as {} ({})",
            claims.name.as_deref().unwrap_or(username),
            claims.role.as_deref().unwrap_or("no role")
        );
        if let Some(expires) = claims.expires_at() {
            println!("Session valid until {}", expires.to_rfc3339());
        }
        Ok(())
    }

    pub async fn logout(&self) -> Result<(), ConsoleError> {
        self.session.logout().await?;
        println!("Logged out.");
        Ok(())
    }

    /// Print the session, source, and preference state.
    pub async fn status(&self) -> Result<(), ConsoleError> {
        let state = self.session.validate().await;
        match &state {
            SessionState::Authenticated { claims } => {
                println!("Session:  authenticated");
                println!("  Subject: {}", claims.sub);
                if let Some(name) = &claims.name {
                    println!("  Name:    {name}");
                }
                if let Some(email) = &claims.email {
                    println!("  Email:   {email}");
                }
                if let Some(role) = &claims.role {
                    println!("  Role:    {role}");
                }
                if let Some(expires) = claims.expires_at() {
                    let remaining = (expires - Utc::now()).num_seconds().max(0) as u64;
                    println!(
                        "  Expires: {} (in {})",
                        expires.to_rfc3339(),
                        humantime::format_duration(Duration::from_secs(remaining))
                    );
                }
            }
            other => println!("Session:  {}", other.describe()),
        }

        match self.config.base_url() {
            Some(url) => println!("Source:   network {url}"),
            None => println!("Source:   built-in fixture"),
        }
        println!("State:    {}", self.config.state_dir.display());
        println!("Language: {}", self.store.load_language().await);
        Ok(())
    }

    /// Keep revalidating on the configured interval until `shutdown`
    /// resolves. Transitions show up in the log stream.
    pub async fn watch<F>(&self, shutdown: F) -> Result<(), ConsoleError>
    where
        F: Future<Output = ()>,
    {
        let period = self.config.revalidate_interval();
        println!(
            "Watching session (revalidating every {}). Ctrl+C to stop.",
            humantime::format_duration(period)
        );
        println!("Session: {}", self.session.state().describe());

        tokio::select! {
            _ = self.session.revalidate_every(period) => {}
            _ = shutdown => {
                info!("session watch stopped");
            }
        }
        Ok(())
    }

    // === Language commands ===

    pub async fn language(&self) -> Result<(), ConsoleError> {
        println!("{}", self.store.load_language().await);
        Ok(())
    }

    pub async fn set_language(&self, lang: Language) -> Result<(), ConsoleError> {
        self.store.store_language(lang).await?;
        println!("Language set to {lang}.");
        Ok(())
    }

    // === Product commands ===

    pub async fn list_products(
        &self,
        lang: Option<Language>,
        as_json: bool,
    ) -> Result<(), ConsoleError> {
        let products = self.relay(self.products.list().await).await?;
        if as_json {
            println!("{}", serde_json::to_string_pretty(&products)?);
            return Ok(());
        }

        let lang = self.lang_or_stored(lang).await;
        println!("{} product(s):", products.len());
        for product in &products {
            print_product_line(product, lang);
        }
        Ok(())
    }

    pub async fn show_product(
        &self,
        id: &str,
        lang: Option<Language>,
        as_json: bool,
    ) -> Result<(), ConsoleError> {
        let product = self.relay(self.products.get(id).await).await?;
        if as_json {
            println!("{}", serde_json::to_string_pretty(&product)?);
            return Ok(());
        }

        let lang = self.lang_or_stored(lang).await;
        println!("{}: {}", product.id, product.name_in(lang));
        println!("  Title:    {}", product.title.get(lang));
        println!("  Code:     {}", product.code.get(lang));
        println!("  Material: {}", product.material.get(lang));
        println!("  Price:    {:.0}", product.price.get(lang));
        let discount = *product.discount_percent.get(lang);
        if discount > 0.0 {
            println!(
                "  Discount: {discount:.0}% -> {:.0}",
                product.effective_price(lang)
            );
        }
        println!(
            "  Size:     {:.0} x {:.0} x {:.0} cm",
            product.size.x, product.size.y, product.size.z
        );
        if !product.main_image.is_empty() {
            println!("  Image:    {}", product.main_image);
        }
        for extra in &product.additional_images {
            println!("            {extra}");
        }
        Ok(())
    }

    pub async fn create_product(
        &self,
        draft_path: &Path,
        main_image: Option<&Path>,
        extra_images: &[std::path::PathBuf],
    ) -> Result<(), ConsoleError> {
        self.require_session().await?;
        let draft = self
            .product_draft_with_images(draft_path, main_image, extra_images)
            .await?;
        let product = self.relay(self.products.create(&draft).await).await?;
        println!("Created product {}", product.id);
        Ok(())
    }

    pub async fn update_product(
        &self,
        id: &str,
        draft_path: &Path,
        main_image: Option<&Path>,
        extra_images: &[std::path::PathBuf],
    ) -> Result<(), ConsoleError> {
        self.require_session().await?;
        let draft = self
            .product_draft_with_images(draft_path, main_image, extra_images)
            .await?;
        let product = self.relay(self.products.update(id, &draft).await).await?;
        println!("Updated product {}", product.id);
        Ok(())
    }

    pub async fn delete_product(&self, id: &str) -> Result<(), ConsoleError> {
        self.require_session().await?;
        self.relay(self.products.delete(id).await).await?;
        println!("Deleted product {id}");
        Ok(())
    }

    // === Admin commands ===

    pub async fn list_admins(&self, as_json: bool) -> Result<(), ConsoleError> {
        let admins = self.relay(self.admins.list().await).await?;
        if as_json {
            println!("{}", serde_json::to_string_pretty(&admins)?);
            return Ok(());
        }

        println!("{} admin account(s):", admins.len());
        for admin in &admins {
            println!(
                "{:<4} {:<20} {}",
                admin.id,
                admin.username,
                admin.email.as_deref().unwrap_or("-")
            );
        }
        Ok(())
    }

    pub async fn show_admin(&self, id: &str, as_json: bool) -> Result<(), ConsoleError> {
        let admin = self.relay(self.admins.get(id).await).await?;
        if as_json {
            println!("{}", serde_json::to_string_pretty(&admin)?);
            return Ok(());
        }
        println!("{}: {}", admin.id, admin.username);
        if let Some(email) = &admin.email {
            println!("  Email: {email}");
        }
        if let Some(image) = &admin.image {
            println!("  Image: {image}");
        }
        Ok(())
    }

    pub async fn create_admin(&self, draft: AdminSpec<'_>) -> Result<(), ConsoleError> {
        self.require_session().await?;
        let draft = draft.into_draft().await?;
        let admin = self.relay(self.admins.create(&draft).await).await?;
        println!("Created admin {} ({})", admin.id, admin.username);
        Ok(())
    }

    pub async fn update_admin(&self, id: &str, draft: AdminSpec<'_>) -> Result<(), ConsoleError> {
        self.require_session().await?;
        let draft = draft.into_draft().await?;
        let admin = self.relay(self.admins.update(id, &draft).await).await?;
        println!("Updated admin {}", admin.id);
        Ok(())
    }

    pub async fn delete_admin(&self, id: &str) -> Result<(), ConsoleError> {
        self.require_session().await?;
        self.relay(self.admins.delete(id).await).await?;
        println!("Deleted admin {id}");
        Ok(())
    }

    // === Internals ===

    /// Pass a gateway result through, reacting to a 401 by dropping
    /// the now-rejected session before reporting the error.
    async fn relay<T>(&self, result: Result<T, GatewayError>) -> Result<T, ConsoleError> {
        if let Err(e) = &result {
            if e.is_unauthorized() {
                let _ = self.session.handle_unauthorized().await;
            }
        }
        Ok(result?)
    }

    /// Writes check the session locally first: a token known to be
    /// expired fails fast instead of bouncing off the server.
    async fn require_session(&self) -> Result<(), ConsoleError> {
        if self.session.validate().await.is_authenticated() {
            Ok(())
        } else {
            Err(ConsoleError::NotLoggedIn)
        }
    }

    async fn lang_or_stored(&self, lang: Option<Language>) -> Language {
        match lang {
            Some(lang) => lang,
            None => self.store.load_language().await,
        }
    }

    async fn product_draft_with_images(
        &self,
        draft_path: &Path,
        main_image: Option<&Path>,
        extra_images: &[std::path::PathBuf],
    ) -> Result<ProductDraft, ConsoleError> {
        let raw = tokio::fs::read_to_string(draft_path).await?;
        let mut draft: ProductDraft = serde_json::from_str(&raw)?;
        if let Some(path) = main_image {
            draft.main_image = Some(load_image(path).await?);
        }
        for path in extra_images {
            draft.additional_images.push(load_image(path).await?);
        }
        Ok(draft)
    }
}

/// Admin fields as they arrive from the command line.
pub struct AdminSpec<'a> {
    pub username: String,
    pub password: Option<String>,
    pub email: Option<String>,
    pub image_file: Option<&'a Path>,
    pub image_url: Option<String>,
}

impl AdminSpec<'_> {
    async fn into_draft(self) -> Result<AdminDraft, ConsoleError> {
        let image = match (self.image_file, self.image_url) {
            (Some(path), _) => Some(load_image(path).await?),
            (None, Some(url)) => Some(ImageField::Url(url)),
            (None, None) => None,
        };
        Ok(AdminDraft {
            username: self.username,
            password: self.password,
            email: self.email,
            image,
        })
    }
}

/// Read a local file into an upload part, guessing the MIME type from
/// the file name.
async fn load_image(path: &Path) -> Result<ImageField, ConsoleError> {
    let data = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.bin")
        .to_string();
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    Ok(ImageField::upload(file_name, mime.as_ref(), Bytes::from(data)))
}

fn print_product_line(product: &Product, lang: Language) {
    println!(
        "{:<4} {:<28} {:>10.0}  {}",
        product.id,
        product.name_in(lang),
        product.effective_price(lang),
        product.code.get(lang)
    );
}
