//! Catalog Console - admin client for a bilingual furniture catalog
//!
//! The crate is organized around a handful of small subsystems:
//!
//! - [`config`]: TOML/env configuration and the data source selection
//! - [`credentials`]: durable on-disk storage for the session token and
//!   language preference
//! - [`token`]: JWT claim decoding and expiry checks
//! - [`gateway`]: the HTTP request layer, with a swappable transport so
//!   the whole client runs against a built-in fixture
//! - [`cache`]: tag-partitioned response cache with in-flight request
//!   deduplication
//! - [`session`]: the login/logout/validate state machine
//! - [`resources`]: typed product and admin CRUD clients
//! - [`console`]: command implementations behind the CLI

pub mod cache;
pub mod config;
pub mod console;
pub mod credentials;
pub mod gateway;
pub mod init;
pub mod resources;
pub mod session;
pub mod token;
pub mod types;
