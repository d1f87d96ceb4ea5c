use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Not signed in")]
    NotSignedIn,

    #[error("Invalid session credential: {0}")]
    InvalidCredential(String),

    #[error("Secure storage failed: {0}")]
    Bridge(#[from] bridge_traits::BridgeError),
}

pub type Result<T> = std::result::Result<T, AuthError>;
