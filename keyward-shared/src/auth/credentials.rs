/// Credential generation
///
/// - Developer API tokens are random (v4) UUIDs: 122 random bits from the
///   OS-seeded generator, rendered as canonical hyphenated hex.
/// - Session tokens are 32 random bytes, hex encoded (64 characters).

use rand::RngCore;
use uuid::Uuid;

/// Length of a session token in bytes before encoding
pub const SESSION_TOKEN_BYTES: usize = 32;

/// Generates a fresh developer API token
pub fn generate_api_token() -> Uuid {
    Uuid::new_v4()
}

/// Generates a fresh session token value
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Parses a presented API token; anything but a canonical UUID is rejected
pub fn parse_api_token(presented: &str) -> Option<Uuid> {
    Uuid::parse_str(presented.trim()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_api_tokens_are_unique_v4() {
        let tokens: HashSet<Uuid> = (0..1000).map(|_| generate_api_token()).collect();
        assert_eq!(tokens.len(), 1000);
        assert!(tokens.iter().all(|t| t.get_version_num() == 4));
    }

    #[test]
    fn test_session_token_format() {
        let token = generate_session_token();
        assert_eq!(token.len(), SESSION_TOKEN_BYTES * 2);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_session_token());
    }

    #[test]
    fn test_parse_api_token() {
        let token = generate_api_token();
        assert_eq!(parse_api_token(&token.to_string()), Some(token));
        assert_eq!(parse_api_token("not-a-token"), None);
        assert_eq!(parse_api_token(""), None);
    }
}
