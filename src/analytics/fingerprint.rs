//! Visitor fingerprint
//!
//! The "session id" is a hash of client IP + user-agent string, not a
//! random per-visit token. Repeat visits from the same client reuse the
//! same id, and distinct clients behind one NAT with identical browser
//! strings collide into one visitor. That trade-off comes with cookieless
//! tracking and is accepted.

use xxhash_rust::xxh64::xxh64;

const FINGERPRINT_SEED: u64 = 0x666f6c696f; // "folio"

/// Derive the deterministic session id for a client
pub fn session_fingerprint(ip: &str, user_agent: &str) -> String {
    let input = format!("{}|{}", ip, user_agent);
    format!("{:016x}", xxh64(input.as_bytes(), FINGERPRINT_SEED))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let a = session_fingerprint("203.0.113.7", "Mozilla/5.0");
        let b = session_fingerprint("203.0.113.7", "Mozilla/5.0");
        assert_eq!(a, b);
    }

    #[test]
    fn test_distinct_inputs_differ() {
        let a = session_fingerprint("203.0.113.7", "Mozilla/5.0");
        let b = session_fingerprint("203.0.113.8", "Mozilla/5.0");
        let c = session_fingerprint("203.0.113.7", "curl/8.0");
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_fixed_width_hex() {
        let id = session_fingerprint("::1", "");
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
