//! # Session Module
//!
//! Tracks whether a user is signed in to the music service.
//!
//! The engine does not run authentication flows; the host obtains a session
//! credential however it likes and hands it to [`SessionManager::sign_in`].
//! "Logged in" means exactly "a credential is present in the
//! [`SecureStore`](bridge_traits::SecureStore)".

pub mod error;
pub mod session;

pub use error::{AuthError, Result};
pub use session::{LoginState, SessionCredential, SessionManager, SESSION_CREDENTIAL_KEY};

#[cfg(any(test, feature = "test-utils"))]
pub use session::MockLoginState;
