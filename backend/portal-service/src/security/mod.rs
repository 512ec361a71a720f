pub mod credential;
pub mod password;
pub mod revocation_cache;
pub mod token_lifecycle;

pub use credential::{Credential, CredentialClaims};
pub use revocation_cache::RevocationCache;
pub use token_lifecycle::TokenLifecycle;
