//! # Session Manager
//!
//! Stores and clears the session credential and answers "is the user
//! logged in?" for the sync coordinator.
//!
//! ```ignore
//! use core_auth::{SessionCredential, SessionManager};
//!
//! let session = SessionManager::new(secure_store, event_bus.clone());
//! session.sign_in(SessionCredential::new(cookie)?).await?;
//! assert!(session.is_logged_in().await);
//! ```

use crate::error::{AuthError, Result};
use async_trait::async_trait;
use bridge_traits::{BridgeError, SecureStore};
use core_runtime::events::{AuthEvent, CoreEvent, EventBus};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Secure store key holding the session credential.
pub const SESSION_CREDENTIAL_KEY: &str = "library_sync.session_credential";

/// Opaque credential authenticating requests to the music service.
///
/// `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredential(String);

impl SessionCredential {
    /// Rejects blank credentials.
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AuthError::InvalidCredential(
                "credential is empty".to_string(),
            ));
        }
        Ok(Self(value))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionCredential([REDACTED])")
    }
}

/// Login gate consulted by the sync coordinator.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait LoginState: Send + Sync {
    /// `true` when a session credential is present. Storage failures read
    /// as "not logged in".
    async fn is_logged_in(&self) -> bool;
}

/// Owns the session credential in the [`SecureStore`].
pub struct SessionManager {
    secure_store: Arc<dyn SecureStore>,
    event_bus: EventBus,
}

impl SessionManager {
    pub fn new(secure_store: Arc<dyn SecureStore>, event_bus: EventBus) -> Self {
        Self {
            secure_store,
            event_bus,
        }
    }

    /// Persist the credential and announce the new session.
    #[instrument(skip_all)]
    pub async fn sign_in(&self, credential: SessionCredential) -> Result<()> {
        self.secure_store
            .set_secret(SESSION_CREDENTIAL_KEY, credential.expose().as_bytes())
            .await?;

        info!("Session credential stored");
        self.event_bus.emit(CoreEvent::Auth(AuthEvent::SignedIn)).ok();
        Ok(())
    }

    /// Remove the credential. Signing out twice is not an error.
    #[instrument(skip_all)]
    pub async fn sign_out(&self) -> Result<()> {
        self.secure_store
            .delete_secret(SESSION_CREDENTIAL_KEY)
            .await?;

        info!("Session credential removed");
        self.event_bus.emit(CoreEvent::Auth(AuthEvent::SignedOut)).ok();
        Ok(())
    }

    /// The stored credential, for the host's catalog client.
    pub async fn credential(&self) -> Result<SessionCredential> {
        let raw = self
            .secure_store
            .get_secret(SESSION_CREDENTIAL_KEY)
            .await?
            .ok_or(AuthError::NotSignedIn)?;

        let value = String::from_utf8(raw)
            .map_err(|e| AuthError::InvalidCredential(format!("not UTF-8: {}", e)))?;
        SessionCredential::new(value)
    }
}

#[async_trait]
impl LoginState for SessionManager {
    async fn is_logged_in(&self) -> bool {
        match self.secure_store.has_secret(SESSION_CREDENTIAL_KEY).await {
            Ok(present) => present,
            Err(BridgeError::NotAvailable(reason)) => {
                debug!(%reason, "Secure store unavailable; treating as signed out");
                false
            }
            Err(e) => {
                warn!(error = %e, "Failed to read session credential");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_desktop::MemorySecureStore;

    fn manager() -> (SessionManager, Arc<MemorySecureStore>, EventBus) {
        let store = Arc::new(MemorySecureStore::new());
        let bus = EventBus::new(8);
        (SessionManager::new(store.clone(), bus.clone()), store, bus)
    }

    #[test]
    fn test_blank_credential_rejected() {
        assert!(matches!(
            SessionCredential::new("  "),
            Err(AuthError::InvalidCredential(_))
        ));
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let credential = SessionCredential::new("SAPISID=secret").unwrap();
        assert!(!format!("{:?}", credential).contains("secret"));
    }

    #[core_async::test]
    async fn test_sign_in_and_out() {
        let (session, store, bus) = manager();
        let mut events = bus.subscribe();
        assert!(!session.is_logged_in().await);

        session
            .sign_in(SessionCredential::new("cookie").unwrap())
            .await
            .unwrap();
        assert!(session.is_logged_in().await);
        assert_eq!(session.credential().await.unwrap().expose(), "cookie");
        assert!(store.has_secret(SESSION_CREDENTIAL_KEY).await.unwrap());

        session.sign_out().await.unwrap();
        session.sign_out().await.unwrap();
        assert!(!session.is_logged_in().await);
        assert!(matches!(
            session.credential().await,
            Err(AuthError::NotSignedIn)
        ));

        assert_eq!(events.recv().await.unwrap(), CoreEvent::Auth(AuthEvent::SignedIn));
        assert_eq!(events.recv().await.unwrap(), CoreEvent::Auth(AuthEvent::SignedOut));
        assert_eq!(events.recv().await.unwrap(), CoreEvent::Auth(AuthEvent::SignedOut));
        assert!(matches!(
            events.try_recv(),
            Err(core_async::sync::broadcast::error::TryRecvError::Empty)
        ));
    }

    struct UnavailableStore;

    #[async_trait]
    impl SecureStore for UnavailableStore {
        async fn set_secret(&self, _key: &str, _value: &[u8]) -> bridge_traits::error::Result<()> {
            Err(BridgeError::NotAvailable("no keychain".to_string()))
        }

        async fn get_secret(&self, _key: &str) -> bridge_traits::error::Result<Option<Vec<u8>>> {
            Err(BridgeError::NotAvailable("no keychain".to_string()))
        }

        async fn delete_secret(&self, _key: &str) -> bridge_traits::error::Result<()> {
            Err(BridgeError::NotAvailable("no keychain".to_string()))
        }
    }

    #[core_async::test]
    async fn test_unavailable_store_reads_as_signed_out() {
        let session = SessionManager::new(Arc::new(UnavailableStore), EventBus::new(4));

        assert!(!session.is_logged_in().await);
        assert!(matches!(
            session.sign_in(SessionCredential::new("cookie").unwrap()).await,
            Err(AuthError::Bridge(BridgeError::NotAvailable(_)))
        ));
    }
}
