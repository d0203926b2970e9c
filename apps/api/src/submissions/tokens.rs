//! Claim tokens for anonymous submissions. The raw token is returned to the
//! client exactly once; only its SHA-256 hex digest is stored.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Length of a hex-encoded claim token (32 random bytes).
pub const TOKEN_LEN: usize = 64;

/// Generates a fresh claim token: 32 random bytes, hex-encoded.
pub fn generate_claim_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex(&bytes)
}

/// Hex SHA-256 digest of a claim token, as stored in `anon_token_hash`.
pub fn hash_token(token: &str) -> String {
    hex(&Sha256::digest(token.as_bytes()))
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_length_and_charset() {
        let token = generate_claim_token();
        assert_eq!(token.len(), TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_tokens_are_distinct() {
        assert_ne!(generate_claim_token(), generate_claim_token());
    }

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(hash_token("some-token"), hash_token("some-token"));
    }

    #[test]
    fn test_hash_differs_from_token() {
        let token = generate_claim_token();
        assert_ne!(hash_token(&token), token);
    }

    #[test]
    fn test_known_sha256_vector() {
        assert_eq!(
            hash_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
