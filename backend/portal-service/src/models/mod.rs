/// Data models for the portal service
pub mod contact;
pub mod session;
pub mod token_revocation;
pub mod user;

pub use contact::ContactRequest;
pub use session::LogoutEvent;
pub use token_revocation::{LogoutRecord, RevocationRecord};
pub use user::{LoginRequest, NewUser, RegisterRequest, User, UserProfile, UserRecord};
