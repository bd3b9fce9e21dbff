use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("decryption failed: wrong key or corrupt ciphertext")]
    AuthError,
    #[error("malformed ciphertext encoding: {0}")]
    Malformed(String),
}
