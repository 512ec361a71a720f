pub mod email;

pub use email::{ContactRelay, MailError};
