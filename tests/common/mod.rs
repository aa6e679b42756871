//! Shared test infrastructure for integration tests
//!
//! Wires a complete client stack (gateway, session manager, cache,
//! CRUD clients) over the built-in fixture, with a throwaway
//! credential directory per test.

#![allow(dead_code)]

use catalog_console::cache::ResourceCache;
use catalog_console::credentials::CredentialStore;
use catalog_console::gateway::{FixtureTransport, Gateway, TokenCell, FIXTURE_PASSWORD, FIXTURE_USERNAME};
use catalog_console::resources::{AdminsClient, ProductsClient};
use catalog_console::session::SessionManager;
use catalog_console::token::Claims;
use catalog_console::types::{Localized, ProductDraft};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// A fully wired client over the in-memory fixture.
///
/// The fixture handle stays accessible so tests can toggle it offline
/// or share catalog state across a simulated restart.
pub struct TestClient {
    pub fixture: Arc<FixtureTransport>,
    pub gateway: Arc<Gateway>,
    pub session: Arc<SessionManager>,
    pub products: ProductsClient,
    pub admins: AdminsClient,
    pub store: CredentialStore,
    state_dir: TempDir,
}

impl TestClient {
    // ── Factory methods ──

    /// Fresh stack: seeded fixture, empty credential directory.
    pub async fn fixture() -> Self {
        let state_dir = TempDir::new().expect("failed to create temp dir");
        Self::assemble(state_dir, Arc::new(FixtureTransport::new())).await
    }

    /// Simulate a process restart: rebuild every component on top of
    /// the same credential directory and the same fixture state.
    pub async fn restart(self) -> Self {
        let TestClient {
            fixture, state_dir, ..
        } = self;
        Self::assemble(state_dir, fixture).await
    }

    async fn assemble(state_dir: TempDir, fixture: Arc<FixtureTransport>) -> Self {
        let token = Arc::new(TokenCell::new());
        let gateway = Arc::new(Gateway::new(Box::new(fixture.clone()), token.clone()));
        let store = CredentialStore::open(state_dir.path())
            .await
            .expect("failed to open credential store");
        let cache = Arc::new(ResourceCache::new());
        let session = Arc::new(SessionManager::new(gateway.clone(), store.clone(), token));

        Self {
            products: ProductsClient::new(gateway.clone(), cache.clone()),
            admins: AdminsClient::new(gateway.clone(), cache),
            fixture,
            gateway,
            session,
            store,
            state_dir,
        }
    }

    // ── Convenience ──

    /// Log in with the fixture's seeded credentials.
    pub async fn login(&self) -> Claims {
        self.session
            .login(FIXTURE_USERNAME, FIXTURE_PASSWORD)
            .await
            .expect("fixture login should succeed")
    }

    pub fn state_path(&self) -> PathBuf {
        self.state_dir.path().to_path_buf()
    }
}

// === Draft builders ===

/// Minimal valid product draft with distinguishable localized names.
pub fn product_draft(name_ru: &str, price: f64) -> ProductDraft {
    ProductDraft {
        name: Localized::new(name_ru.to_string(), format!("{name_ru}-kz")),
        price: Localized::uniform(price),
        ..ProductDraft::default()
    }
}

/// Write a hand-authored product draft JSON file inside `dir`, the way
/// a user of the CLI would, and return its path.
pub fn write_draft_file(dir: &std::path::Path, name_ru: &str, price: f64) -> PathBuf {
    let path = dir.join("draft.json");
    let json = serde_json::json!({
        "name": { "ru": name_ru, "kz": format!("{name_ru}-kz") },
        "price": { "ru": price, "kz": price },
        "code": { "ru": "TST-1", "kz": "TST-1" },
    });
    std::fs::write(&path, json.to_string()).expect("failed to write draft file");
    path
}
