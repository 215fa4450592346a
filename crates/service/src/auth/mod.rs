//! Auth module: development login against an in-memory user directory.
//!
//! Layout follows domain / repository / service; tokens are HS256 JWTs.

pub mod domain;
pub mod errors;
pub mod repository;
pub mod service;

pub use service::{AuthConfig, AuthService};
