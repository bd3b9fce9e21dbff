use base64::{engine::general_purpose::STANDARD, Engine};
use chacha20poly1305::aead::{Aead, KeyInit, OsRng};
use chacha20poly1305::{AeadCore, ChaCha20Poly1305, Key, Nonce};

use crate::error::CryptoError;
use crate::key::EscrowKey;

const NONCE_LEN: usize = 12;

/// Encrypt a mnemonic (or any short secret string) under `key`. The nonce is
/// generated fresh per call and prepended to the ciphertext before base64
/// encoding, so the result is a single self-contained text blob suitable
/// for storing in the `escrow_wallets.encrypted_mnemonic` column.
pub fn encrypt(key: &EscrowKey, plaintext: &str) -> String {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.bytes()));
    let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext.as_bytes())
        .expect("chacha20poly1305 encryption over a valid key and buffer is infallible");

    let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);
    STANDARD.encode(blob)
}

/// Decrypt a blob produced by [`encrypt`]. A wrong key or corrupted
/// ciphertext both surface as [`CryptoError::AuthError`] — never partial
/// plaintext.
pub fn decrypt(key: &EscrowKey, blob_b64: &str) -> Result<String, CryptoError> {
    let blob = STANDARD
        .decode(blob_b64)
        .map_err(|e| CryptoError::Malformed(e.to_string()))?;
    if blob.len() < NONCE_LEN {
        return Err(CryptoError::Malformed("ciphertext shorter than nonce".into()));
    }
    let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.bytes()));
    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| CryptoError::AuthError)?;

    String::from_utf8(plaintext).map_err(|_| CryptoError::AuthError)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_under_the_same_key() {
        let key = EscrowKey::generate();
        let mnemonic = "topic buzz sunny fabric weasel orbit tiger panel custom glow ridge humor";
        let blob = encrypt(&key, mnemonic);
        assert_eq!(decrypt(&key, &blob).unwrap(), mnemonic);
    }

    #[test]
    fn wrong_key_fails_with_auth_error() {
        let key_a = EscrowKey::generate();
        let key_b = EscrowKey::generate();
        let blob = encrypt(&key_a, "some mnemonic words here");
        let err = decrypt(&key_b, &blob).unwrap_err();
        assert!(matches!(err, CryptoError::AuthError));
    }

    #[test]
    fn distinct_calls_use_distinct_nonces() {
        let key = EscrowKey::generate();
        let a = encrypt(&key, "same plaintext");
        let b = encrypt(&key, "same plaintext");
        assert_ne!(a, b);
    }
}
