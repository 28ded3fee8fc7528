//! # Generate
//!
//! Generate random strings for use in tokens, nonces, and user verification
//! codes.

use base64ct::{Base64UrlUnpadded, Encoding};

const SAFE_CHARS: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789)(*&^%$#@!~";
const TOKEN_LEN: usize = 32;

const VERIFIER_CHARS: &str = "0123456789";
const VERIFIER_LEN: usize = 8;

/// Generates a base64 encoded random string for a token or token secret.
#[must_use]
pub fn token() -> String {
    let rnd = random_string(TOKEN_LEN, SAFE_CHARS);
    Base64UrlUnpadded::encode_string(rnd.as_bytes())
}

/// Generates a base64 encoded random string for a request nonce.
#[must_use]
pub fn nonce() -> String {
    let rnd = random_string(TOKEN_LEN, SAFE_CHARS);
    Base64UrlUnpadded::encode_string(rnd.as_bytes())
}

/// Generates a user verification code.
#[must_use]
pub fn verifier() -> String {
    random_string(VERIFIER_LEN, VERIFIER_CHARS)
}

// Generates a random string from a given set of characters. Uses fastrand so
// is not cryptographically secure.
fn random_string(len: usize, charset: &str) -> String {
    let chars: Vec<char> = charset.chars().collect();
    (0..len).map(|_| chars[fastrand::usize(..chars.len())]).collect()
}
