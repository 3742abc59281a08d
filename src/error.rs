use thiserror::Error;

/// Failure kinds of the cipher core.
///
/// Validation failures (`InvalidImage`, `InvalidKey`, `MissingNonce`) are
/// raised before any numeric work starts. `NumericDivergence` is raised by a
/// chaotic generator whose state left the finite range.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CipherError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Encryption key cannot be empty")]
    InvalidKey,

    #[error("This algorithm requires a nonce")]
    MissingNonce,

    #[error("Chaotic state diverged: {0}")]
    NumericDivergence(String),

    #[error("Unknown algorithm: {0}")]
    UnknownAlgorithm(String),
}

pub type Result<T> = std::result::Result<T, CipherError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            CipherError::InvalidImage("image is empty".into()).to_string(),
            "Invalid image: image is empty"
        );
        assert_eq!(CipherError::InvalidKey.to_string(), "Encryption key cannot be empty");
        assert_eq!(CipherError::MissingNonce.to_string(), "This algorithm requires a nonce");
        assert_eq!(
            CipherError::UnknownAlgorithm("aes".into()).to_string(),
            "Unknown algorithm: aes"
        );
    }

    #[test]
    fn test_error_equality() {
        assert_eq!(CipherError::InvalidKey, CipherError::InvalidKey);
        assert_ne!(CipherError::InvalidKey, CipherError::MissingNonce);
    }
}
