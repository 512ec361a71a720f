//! Signing primitives shared by the portal backend.
//!
//! The only primitive today is the JWT credential codec in [`jwt`].

pub mod jwt;

pub use jwt::{Claims, IssuedToken, JwtError, JwtKeys, TokenPair, TokenType};
