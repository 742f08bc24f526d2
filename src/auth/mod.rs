//! User authentication: password hashing, signed session tokens, request guard.
//!
//! Provides:
//! - Password storage with iterated SHA-256 (100k rounds) + per-user salt
//! - Stateless HMAC-SHA256 signed tokens carrying user id + expiry
//! - An axum middleware guard that rejects unauthenticated requests
//!
//! ## Design Decisions
//! - No external JWT dependency: tokens are signed claims built from the
//!   `hmac`/`sha2` crates already used for password hashing.
//! - Tokens are stateless: no server-side session table. Logout is
//!   client-side token deletion; expiry rides in the signed claims.

pub mod middleware;
pub mod password;
pub mod token;

pub use middleware::{require_auth, AuthUser};
pub use token::{TokenSigner, DEFAULT_TOKEN_TTL_SECS};
