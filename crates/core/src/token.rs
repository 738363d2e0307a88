//! Shadow-token string generation and lifecycle constants.

use rand::Rng;

use crate::types::Timestamp;

/// Restricted alphabet for token strings: unambiguous uppercase
/// alphanumerics only.
const TOKEN_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Tokens look like `SID-XXXXXXXX-XXXXXXXX`.
const TOKEN_PREFIX: &str = "SID";
const GROUP_LEN: usize = 8;

/// Fixed lifetime of a token from issuance.
pub const TOKEN_TTL_SECS: i64 = 3 * 60;

/// Maximum collision retries when generating a token string. Exhaustion
/// fails closed; issuance is never retried beyond this.
pub const MAX_GENERATION_ATTEMPTS: u32 = 10;

/// Issuance rate limit: blocking threshold and trailing window.
pub const RATE_LIMIT_MAX_TOKENS: i64 = 3;
pub const RATE_LIMIT_WINDOW_SECS: i64 = 2 * 60;
pub const RATE_LIMIT_RETRY_AFTER_SECS: u64 = 2 * 60;

/// Maximum distinct device fingerprints allowed among a user's active
/// sessions before issuance from a novel device is refused.
pub const MAX_ACTIVE_DEVICES: usize = 2;

/// Generate a fresh token string in the `SID-XXXXXXXX-XXXXXXXX` shape.
///
/// Uniqueness is NOT guaranteed here; callers must check the store and
/// retry up to [`MAX_GENERATION_ATTEMPTS`] times.
pub fn generate_token_string() -> String {
    fn group(rng: &mut impl Rng) -> String {
        (0..GROUP_LEN)
            .map(|_| {
                let idx = rng.random_range(0..TOKEN_ALPHABET.len());
                TOKEN_ALPHABET[idx] as char
            })
            .collect()
    }

    let mut rng = rand::rng();
    let first = group(&mut rng);
    let second = group(&mut rng);
    format!("{TOKEN_PREFIX}-{first}-{second}")
}

/// Whether a presented string has the token shape. Used to reject junk
/// input before any store lookup.
pub fn is_well_formed(token: &str) -> bool {
    let mut parts = token.split('-');
    let (Some(prefix), Some(a), Some(b), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    prefix == TOKEN_PREFIX
        && a.len() == GROUP_LEN
        && b.len() == GROUP_LEN
        && a.bytes().chain(b.bytes()).all(|c| TOKEN_ALPHABET.contains(&c))
}

/// Whether a token with the given expiry is past its lifetime at `now`.
///
/// Expiry is reconciled lazily: a stored `is_active` flag must never be
/// trusted without re-checking this.
pub fn is_expired(expires_at: Timestamp, now: Timestamp) -> bool {
    expires_at <= now
}
