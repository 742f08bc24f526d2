//! Salted password hashing with iterated SHA-256 key stretching.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Salt byte length before hex encoding.
const SALT_BYTES: usize = 16;

/// Number of SHA-256 iterations for password stretching.
const HASH_ITERATIONS: u32 = 100_000;

/// Generate a random salt (hex-encoded).
pub fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Hash a password with salt using iterated SHA-256.
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hash = Sha256::new();
    hash.update(salt.as_bytes());
    hash.update(password.as_bytes());
    let mut result = hash.finalize();

    // Iterated hashing for key stretching
    for _ in 1..HASH_ITERATIONS {
        let mut h = Sha256::new();
        h.update(result);
        h.update(salt.as_bytes());
        result = h.finalize();
    }

    hex::encode(result)
}

/// Verify a password attempt against a stored salt + hash.
pub fn verify_password(password: &str, salt: &str, stored_hash: &str) -> bool {
    let attempt = hash_password(password, salt);
    constant_time_eq(stored_hash.as_bytes(), attempt.as_bytes())
}

/// Burn the same amount of work as a real verification.
///
/// Called when login hits an unknown email so that "no such user" and
/// "wrong password" are indistinguishable by response time.
pub fn dummy_verify(password: &str) {
    let _ = hash_password(password, "0000000000000000");
}

/// Constant-time byte comparison to prevent timing attacks.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
