/// Opaque bearer token generation
use rand::{rngs::OsRng, RngCore};

/// Raw entropy per token, before hex encoding
const TOKEN_BYTES: usize = 30;

/// Generate a fresh opaque token: 30 bytes of OS randomness, hex-encoded
/// to 60 characters
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shape() {
        let token = generate_token();
        assert_eq!(token.len(), 60);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_tokens_are_unique() {
        assert_ne!(generate_token(), generate_token());
    }
}
