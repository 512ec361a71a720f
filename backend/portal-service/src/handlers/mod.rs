pub mod auth;
pub mod contact;
pub mod site;

pub use auth::{login, logout, protected, refresh, register};
pub use contact::contact;
pub use site::{health, home};
