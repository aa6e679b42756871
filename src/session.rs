//! Session lifecycle: login, logout, and periodic revalidation.
//!
//! The manager owns the authoritative session state and the only paths
//! that may change it. Explicit transitions (login, logout, a server
//! 401) bump an epoch counter; background validations stamp the epoch
//! when they start and are discarded if it moved while they ran, so a
//! slow validation can never overwrite a logout or login that landed
//! mid-flight. The current state is published through an `ArcSwap` and
//! is readable without locking.

use crate::credentials::{CredentialStore, StoreError};
use crate::gateway::{Gateway, GatewayError, TokenCell};
use crate::token::{self, Claims};
use crate::types::{Credentials, TokenEnvelope};
use arc_swap::ArcSwap;
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Where the session currently stands.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Startup state, before the stored token has been examined.
    Unchecked,
    /// A valid token is loaded and attached to requests.
    Authenticated { claims: Claims },
    /// No usable credentials.
    Unauthenticated,
}

impl SessionState {
    pub fn describe(&self) -> &'static str {
        match self {
            SessionState::Unchecked => "unchecked",
            SessionState::Authenticated { .. } => "authenticated",
            SessionState::Unauthenticated => "unauthenticated",
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }
}

/// Login errors
#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    /// The server answered and said no.
    #[error("login rejected: {message}")]
    Rejected { message: String },

    /// The server could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// The server accepted the credentials but issued a token the
    /// client cannot use.
    #[error("unusable token: {0}")]
    BadToken(String),

    /// The token could not be persisted.
    #[error("credential store error: {0}")]
    Store(#[from] StoreError),
}

/// Result of examining the stored token.
enum Checked {
    /// Usable token and its claims.
    Valid { token: String, claims: Claims },
    /// Nothing stored.
    Missing,
    /// Stored but expired or malformed; must be purged.
    Invalid,
}

/// Owner of the session state machine.
pub struct SessionManager {
    gateway: Arc<Gateway>,
    store: CredentialStore,
    token: Arc<TokenCell>,
    snapshot: ArcSwap<SessionState>,
    /// Bumped by every explicit transition; validations started under
    /// an older value are discarded.
    epoch: Mutex<u64>,
    /// Serializes the persist/purge tail of every operation so a
    /// validation purge can never race a login's freshly stored token.
    ops: tokio::sync::Mutex<()>,
}

impl SessionManager {
    pub fn new(gateway: Arc<Gateway>, store: CredentialStore, token: Arc<TokenCell>) -> Self {
        Self {
            gateway,
            store,
            token,
            snapshot: ArcSwap::from_pointee(SessionState::Unchecked),
            epoch: Mutex::new(0),
            ops: tokio::sync::Mutex::new(()),
        }
    }

    /// Current state, cheap enough to call anywhere.
    pub fn state(&self) -> SessionState {
        self.snapshot.load().as_ref().clone()
    }

    /// Exchange credentials for a session token and persist it.
    pub async fn login(&self, username: &str, password: &str) -> Result<Claims, LoginError> {
        let value = self
            .gateway
            .post_json(
                "/auth/login",
                &Credentials {
                    username: username.to_string(),
                    password: password.to_string(),
                },
            )
            .await
            .map_err(map_login_error)?;

        let envelope: TokenEnvelope =
            serde_json::from_value(value).map_err(|e| LoginError::BadToken(e.to_string()))?;
        let claims =
            token::decode(&envelope.token).map_err(|e| LoginError::BadToken(e.to_string()))?;
        if claims.is_expired(Utc::now()) {
            return Err(LoginError::BadToken("token is already expired".into()));
        }

        let _ops = self.ops.lock().await;
        self.store.store_token(&envelope.token).await?;
        self.transition(
            SessionState::Authenticated {
                claims: claims.clone(),
            },
            Some(envelope.token),
        );
        info!(subject = %claims.sub, "logged in");
        Ok(claims)
    }

    /// End the session. The server is notified best-effort; the local
    /// purge happens regardless, so logout works offline.
    pub async fn logout(&self) -> Result<(), StoreError> {
        if let Err(e) = self.gateway.post_empty("/auth/logout").await {
            debug!(error = %e, "server logout failed, proceeding locally");
        }

        let _ops = self.ops.lock().await;
        let cleared = self.store.clear_token().await;
        self.transition(SessionState::Unauthenticated, None);
        info!("logged out");
        cleared
    }

    /// React to a 401 from any API call: the server no longer accepts
    /// the token, so drop it without asking the server anything.
    pub async fn handle_unauthorized(&self) -> Result<(), StoreError> {
        warn!("server rejected the session token, clearing credentials");
        let _ops = self.ops.lock().await;
        let cleared = self.store.clear_token().await;
        self.transition(SessionState::Unauthenticated, None);
        cleared
    }

    /// Examine the stored token and settle the session state.
    ///
    /// Runs at startup (resolving `Unchecked`) and on every tick of the
    /// revalidation loop. Expired or malformed tokens are purged.
    pub async fn validate(&self) -> SessionState {
        let stamp = self.begin_validation();
        let checked = self.check_stored_token().await;
        self.finish_validation(stamp, checked).await
    }

    /// Revalidate on a fixed period, forever. The first tick fires
    /// immediately, which doubles as the startup validation.
    pub async fn revalidate_every(&self, period: Duration) {
        // tokio panics on a zero-length interval.
        let period = period.max(Duration::from_secs(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.validate().await;
        }
    }

    fn begin_validation(&self) -> u64 {
        *self.epoch.lock()
    }

    async fn check_stored_token(&self) -> Checked {
        match self.store.load_token().await {
            None => Checked::Missing,
            Some(token) => match token::decode(&token) {
                Err(e) => {
                    info!(error = %e, "stored token is malformed");
                    Checked::Invalid
                }
                Ok(claims) if claims.is_expired(Utc::now()) => {
                    info!("stored token has expired");
                    Checked::Invalid
                }
                Ok(claims) => Checked::Valid { token, claims },
            },
        }
    }

    /// Apply a validation outcome unless an explicit transition landed
    /// after it started.
    async fn finish_validation(&self, stamp: u64, checked: Checked) -> SessionState {
        let _ops = self.ops.lock().await;
        {
            let epoch = self.epoch.lock();
            if *epoch != stamp {
                debug!("discarding validation result from a superseded session");
                return self.state();
            }
            match &checked {
                Checked::Valid { token, claims } => self.apply(
                    SessionState::Authenticated {
                        claims: claims.clone(),
                    },
                    Some(token.clone()),
                ),
                Checked::Missing | Checked::Invalid => {
                    self.apply(SessionState::Unauthenticated, None)
                }
            }
        }
        // Still under `ops`: no login can slip in before the purge.
        if matches!(checked, Checked::Invalid) {
            if let Err(e) = self.store.clear_token().await {
                warn!(error = %e, "failed to purge unusable token");
            }
        }
        self.state()
    }

    /// Explicit transition: bump the epoch, then publish.
    fn transition(&self, next: SessionState, token: Option<String>) {
        let mut epoch = self.epoch.lock();
        *epoch += 1;
        self.apply(next, token);
    }

    /// Publish a state and the matching bearer. Callers hold the epoch
    /// lock.
    fn apply(&self, next: SessionState, token: Option<String>) {
        self.token.set(token);
        let previous = self.snapshot.swap(Arc::new(next.clone()));
        if *previous != next {
            info!(
                from = previous.describe(),
                to = next.describe(),
                "session state changed"
            );
        }
    }
}

fn map_login_error(e: GatewayError) -> LoginError {
    match e {
        GatewayError::Network(m) => LoginError::Network(m),
        GatewayError::Server { message, .. } => LoginError::Rejected { message },
        GatewayError::Parse(m) => LoginError::BadToken(m),
    }
}
