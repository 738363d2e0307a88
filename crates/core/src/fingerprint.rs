//! Heuristic device fingerprint resolution.
//!
//! A client-computed opaque fingerprint (canvas/WebGL/font signals the
//! server never sees) is authoritative when supplied. Otherwise we derive
//! a 32-character identifier by hashing request headers and any
//! client-supplied screen/timezone hints.
//!
//! This is a heuristic identifier, NOT a security boundary: two devices
//! can collide, and a fingerprint can be replayed by anyone who has seen
//! it. Risk rules treat fingerprint equality as a signal, never as proof
//! of device identity.

use crate::hashing;

/// Length of a header-derived fingerprint (hex chars).
const DERIVED_FINGERPRINT_LEN: usize = 32;

/// Server-observable signals used for the fallback fingerprint.
#[derive(Debug, Default, Clone)]
pub struct FingerprintSignals<'a> {
    pub user_agent: &'a str,
    pub accept_language: Option<&'a str>,
    pub accept_encoding: Option<&'a str>,
    pub screen_hint: Option<&'a str>,
    pub timezone_hint: Option<&'a str>,
}

/// Resolve a device fingerprint.
///
/// Priority: a non-empty client-supplied fingerprint verbatim, else a
/// truncated SHA-256 over the joined header signals.
pub fn resolve(client_fingerprint: Option<&str>, signals: &FingerprintSignals<'_>) -> String {
    if let Some(fp) = client_fingerprint {
        if !fp.is_empty() {
            return fp.to_string();
        }
    }

    let mut components: Vec<&str> = vec![signals.user_agent];
    components.extend(signals.accept_language);
    components.extend(signals.accept_encoding);
    components.extend(signals.screen_hint);
    components.extend(signals.timezone_hint);

    let digest = hashing::sha256_hex(components.join("|").as_bytes());
    digest[..DERIVED_FINGERPRINT_LEN].to_string()
}

/// Coarse device display name from a user-agent string, for session
/// listings.
pub fn device_name(user_agent: &str) -> &'static str {
    if user_agent.contains("iPhone") {
        "iPhone"
    } else if user_agent.contains("iPad") {
        "iPad"
    } else if user_agent.contains("Android") {
        "Android Device"
    } else if user_agent.contains("Windows") {
        "Windows PC"
    } else if user_agent.contains("Mac") {
        "Mac"
    } else if user_agent.contains("Linux") {
        "Linux PC"
    } else {
        "Unknown Device"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals() -> FingerprintSignals<'static> {
        FingerprintSignals {
            user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0)",
            accept_language: Some("ar-SA,ar;q=0.9"),
            accept_encoding: Some("gzip, deflate, br"),
            screen_hint: Some("390x844"),
            timezone_hint: Some("Asia/Riyadh"),
        }
    }

    #[test]
    fn client_fingerprint_wins_verbatim() {
        let fp = resolve(Some("tm-opaque-value"), &signals());
        assert_eq!(fp, "tm-opaque-value");
    }

    #[test]
    fn empty_client_fingerprint_falls_back_to_headers() {
        let fp = resolve(Some(""), &signals());
        assert_eq!(fp.len(), 32);
        assert_eq!(fp, resolve(None, &signals()));
    }

    #[test]
    fn derived_fingerprint_is_stable() {
        assert_eq!(resolve(None, &signals()), resolve(None, &signals()));
    }

    #[test]
    fn different_signals_produce_different_fingerprints() {
        let mut other = signals();
        other.timezone_hint = Some("Europe/London");
        assert_ne!(resolve(None, &signals()), resolve(None, &other));
    }

    #[test]
    fn device_names() {
        assert_eq!(device_name("Mozilla/5.0 (iPhone; ...)"), "iPhone");
        assert_eq!(device_name("Mozilla/5.0 (Windows NT 10.0)"), "Windows PC");
        assert_eq!(device_name("Mozilla/5.0 (X11; Linux x86_64)"), "Linux PC");
        assert_eq!(device_name("curl/8.0"), "Unknown Device");
    }
}
