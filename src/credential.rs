//! Client-side credential format check.

use thiserror::Error;

/// Literal every credential starts with.
pub const CREDENTIAL_PREFIX: &str = "sk-";

/// A credential must be strictly longer than this many characters.
pub const CREDENTIAL_MIN_LEN: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("credential is empty")]
    Missing,
    #[error(
        "credential must start with \"{}\" and be longer than {} characters",
        CREDENTIAL_PREFIX,
        CREDENTIAL_MIN_LEN
    )]
    Malformed,
}

/// Checks `credential` against the prefix and minimum length.
/// Nothing else about its structure is inspected.
pub fn validate(credential: &str) -> Result<(), CredentialError> {
    if credential.is_empty() {
        return Err(CredentialError::Missing);
    }

    // Length is counted in Unicode scalar values, not bytes or UTF-16 units.
    if !credential.starts_with(CREDENTIAL_PREFIX) || credential.chars().count() <= CREDENTIAL_MIN_LEN {
        return Err(CredentialError::Malformed);
    }

    Ok(())
}

/// Masks a credential for logging: first 6 and last 4 characters.
pub fn mask(credential: &str) -> String {
    let chars: Vec<char> = credential.chars().collect();
    if chars.len() <= 10 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}*********{}", head, tail)
}
