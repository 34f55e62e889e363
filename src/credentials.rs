//! Salted password hashing.
//!
//! A stored credential is the base64 text of `salt ‖ digest`, where the digest is PBKDF2-HMAC-SHA1 over the UTF-8
//! password. The parameters below are part of the storage format: hashes written with other values can't be verified,
//! so they must never change without re-hashing existing credentials.
//!
//! ```
//! use contact_cache::credentials::{hash_password, verify_password};
//!
//! let stored = hash_password("s3cret");
//! assert!(verify_password("s3cret", &stored));
//! assert!(!verify_password("guess", &stored));
//! assert!(!verify_password("s3cret", "not base64!"));
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha1::Sha1;
use subtle::ConstantTimeEq;

pub const SALT_SIZE: usize = 16;
pub const HASH_SIZE: usize = 20;
pub const ITERATIONS: u32 = 10_000;

/// Length of the decoded stored credential.
pub const STORED_SIZE: usize = SALT_SIZE + HASH_SIZE;

fn derive(password: &str, salt: &[u8]) -> [u8; HASH_SIZE] {
    let mut digest = [0u8; HASH_SIZE];
    pbkdf2_hmac::<Sha1>(password.as_bytes(), salt, ITERATIONS, &mut digest);
    digest
}

/// Hash a password with a fresh random salt. Two calls with the same password give different results.
pub fn hash_password(password: &str) -> String {
    let mut stored = [0u8; STORED_SIZE];
    rand::rng().fill_bytes(&mut stored[..SALT_SIZE]);
    let digest = derive(password, &stored[..SALT_SIZE]);
    stored[SALT_SIZE..].copy_from_slice(&digest);
    STANDARD.encode(stored)
}

/// Check a password against a value produced by [`hash_password`].
///
/// Malformed stored data (not base64, wrong length) is a mismatch, never an error. The digest comparison takes the
/// same time wherever the first differing byte is.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Ok(bytes) = STANDARD.decode(stored.trim())
    else {
        return false;
    };
    if bytes.len() != STORED_SIZE {
        return false;
    }
    let (salt, expected) = bytes.split_at(SALT_SIZE);
    derive(password, salt).as_slice().ct_eq(expected).into()
}
