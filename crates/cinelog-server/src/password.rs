//! Salted password hashing.
//!
//! Passwords are stored as `hex(salt)$hex(digest)` where the digest is a
//! BLAKE3 derive-key hash over `salt || password`. Verification compares
//! digests in constant time.

use rand::RngCore;
use subtle::ConstantTimeEq;

const SALT_LEN: usize = 16;

// Domain separation for the derive-key mode. Changing this invalidates
// every stored hash.
const HASH_CONTEXT: &str = "cinelog 2026-08 password hash v1";

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::rngs::OsRng.fill_bytes(&mut salt);

    let digest = digest(&salt, password);
    format!("{}${}", hex::encode(salt), hex::encode(digest))
}

/// Check a password against a stored `hex(salt)$hex(digest)` value.
///
/// Returns `false` for malformed stored values rather than erroring; a
/// corrupt hash behaves like a wrong password.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, digest_hex)) = stored.split_once('$') else {
        return false;
    };
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };
    let Ok(expected) = hex::decode(digest_hex) else {
        return false;
    };

    let actual = digest(&salt, password);

    expected.len() == actual.len() && actual.as_slice().ct_eq(&expected).unwrap_u8() == 1
}

fn digest(salt: &[u8], password: &str) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(HASH_CONTEXT);
    hasher.update(salt);
    hasher.update(password.as_bytes());
    *hasher.finalize().as_bytes()
}
