//! Bearer-token access gate checked before any document work starts.

use thiserror::Error;

/// Reasons a presented credential was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No `Authorization` header was supplied.
    #[error("Missing Authorization header")]
    MissingCredential,
    /// Header was present but did not follow the `Bearer <token>` scheme.
    #[error("Authorization header must use the Bearer scheme")]
    MalformedCredential,
    /// Token did not match the configured value.
    #[error("Invalid bearer token")]
    InvalidToken,
}

/// Check a raw `Authorization` header value against the expected bearer token.
pub fn authorize(presented: Option<&str>, expected: &str) -> Result<(), AuthError> {
    let header = presented.ok_or(AuthError::MissingCredential)?;
    // Scheme is case-sensitive; the token is everything after the first space, untrimmed.
    let (scheme, token) = header
        .split_once(' ')
        .ok_or(AuthError::MalformedCredential)?;
    if scheme != "Bearer" {
        return Err(AuthError::MalformedCredential);
    }
    if token.is_empty() {
        return Err(AuthError::MalformedCredential);
    }
    if tokens_match(token.as_bytes(), expected.as_bytes()) {
        Ok(())
    } else {
        Err(AuthError::InvalidToken)
    }
}

// Compares every byte regardless of where the first mismatch sits.
fn tokens_match(presented: &[u8], expected: &[u8]) -> bool {
    if presented.len() != expected.len() {
        return false;
    }
    presented
        .iter()
        .zip(expected)
        .fold(0u8, |acc, (left, right)| acc | (left ^ right))
        == 0
}
