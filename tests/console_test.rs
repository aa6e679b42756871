//! Console command integration tests
//!
//! Drives the `Console` wrapper the CLI dispatches into, over the
//! fixture source with a throwaway state directory. Data-level
//! assertions live in client_flow_test; these cover the wiring the
//! console adds on top: startup validation, the login gate on writes,
//! and command side effects on persisted state.

mod common;

use catalog_console::config::{Config, SourceConfig};
use catalog_console::console::{Console, ConsoleError};
use catalog_console::credentials::CredentialStore;
use catalog_console::gateway::{FIXTURE_PASSWORD, FIXTURE_USERNAME};
use catalog_console::session::SessionState;
use catalog_console::types::Language;
use common::write_draft_file;
use std::time::Duration;
use tempfile::TempDir;

fn fixture_config(dir: &TempDir) -> Config {
    Config {
        source: SourceConfig::Fixture,
        state_dir: dir.path().to_path_buf(),
        ..Config::default()
    }
}

#[tokio::test]
async fn test_build_settles_the_session() {
    let dir = TempDir::new().unwrap();
    let console = Console::build(fixture_config(&dir)).await.unwrap();

    // Build runs the startup validation, so the state is never Unchecked.
    assert!(matches!(
        console.session().state(),
        SessionState::Unauthenticated
    ));
}

#[tokio::test]
async fn test_login_persists_and_logout_clears() {
    let dir = TempDir::new().unwrap();
    let console = Console::build(fixture_config(&dir)).await.unwrap();

    console.login(FIXTURE_USERNAME, FIXTURE_PASSWORD).await.unwrap();
    assert!(console.session().state().is_authenticated());

    let store = CredentialStore::open(dir.path()).await.unwrap();
    assert!(store.load_token().await.is_some());

    console.logout().await.unwrap();
    assert!(store.load_token().await.is_none());
    assert!(!console.session().state().is_authenticated());
}

#[tokio::test]
async fn test_writes_are_gated_on_login() {
    let dir = TempDir::new().unwrap();
    let console = Console::build(fixture_config(&dir)).await.unwrap();

    let draft = write_draft_file(dir.path(), "Кровать", 9000.0);
    let err = console.create_product(&draft, None, &[]).await.unwrap_err();
    assert!(matches!(err, ConsoleError::NotLoggedIn));

    let err = console.delete_product("1").await.unwrap_err();
    assert!(matches!(err, ConsoleError::NotLoggedIn));

    // Reads pass through; the source decides what needs auth.
    console.list_products(None, false).await.unwrap();
}

#[tokio::test]
async fn test_create_product_from_draft_and_image_files() {
    let dir = TempDir::new().unwrap();
    let console = Console::build(fixture_config(&dir)).await.unwrap();
    console.login(FIXTURE_USERNAME, FIXTURE_PASSWORD).await.unwrap();

    let draft = write_draft_file(dir.path(), "Кресло", 3200.0);
    let photo = dir.path().join("armchair.png");
    std::fs::write(&photo, b"not really a png").unwrap();

    console
        .create_product(&draft, Some(&photo), &[])
        .await
        .unwrap();

    // A draft file that is not valid JSON surfaces as a draft error.
    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{ not json").unwrap();
    let err = console.create_product(&broken, None, &[]).await.unwrap_err();
    assert!(matches!(err, ConsoleError::Draft(_)));
}

#[tokio::test]
async fn test_status_and_listing_commands_run() {
    let dir = TempDir::new().unwrap();
    let console = Console::build(fixture_config(&dir)).await.unwrap();

    console.status().await.unwrap();
    console.login(FIXTURE_USERNAME, FIXTURE_PASSWORD).await.unwrap();
    console.status().await.unwrap();

    console.list_products(Some(Language::Kz), false).await.unwrap();
    console.list_products(None, true).await.unwrap();
    console.show_product("1", None, false).await.unwrap();
    console.list_admins(false).await.unwrap();
    console.show_admin("1", true).await.unwrap();
}

#[tokio::test]
async fn test_language_commands_hit_the_store() {
    let dir = TempDir::new().unwrap();
    let console = Console::build(fixture_config(&dir)).await.unwrap();

    console.set_language(Language::Kz).await.unwrap();
    console.language().await.unwrap();

    let store = CredentialStore::open(dir.path()).await.unwrap();
    assert_eq!(store.load_language().await, Language::Kz);
}

#[tokio::test]
async fn test_watch_stops_when_shutdown_resolves() {
    let dir = TempDir::new().unwrap();
    let console = Console::build(fixture_config(&dir)).await.unwrap();

    console
        .watch(async {
            tokio::time::sleep(Duration::from_millis(50)).await;
        })
        .await
        .unwrap();
}
