use base64::{engine::general_purpose::STANDARD, Engine};
use rand::RngCore;
use tracing::warn;
use zeroize::Zeroize;

use crate::error::CryptoError;

const KEY_LEN: usize = 32;

/// Process-wide symmetric key for mnemonic encryption. Immutable after
/// startup; wiped on drop the way private key material is handled elsewhere
/// in this codebase.
pub struct EscrowKey(Vec<u8>);

impl EscrowKey {
    /// Load the key from `ESCROW_SECRET_KEY` (base64, 32 bytes).
    ///
    /// If the variable is absent in a non-production context, a key is
    /// generated and logged so the operator can pin it across restarts.
    /// In production, a missing or malformed key is a CONFIG error and the
    /// caller should refuse to start (spec §9: self-generated keys are a
    /// development affordance only).
    pub fn from_env(production: bool) -> Result<Self, CryptoError> {
        match std::env::var("ESCROW_SECRET_KEY") {
            Ok(encoded) => Self::from_base64(&encoded),
            Err(_) if production => Err(CryptoError::Config(
                "ESCROW_SECRET_KEY is required in production".into(),
            )),
            Err(_) => {
                let key = Self::generate();
                warn!(
                    key_b64 = %key.to_base64(),
                    "ESCROW_SECRET_KEY not set; generated an ephemeral development key. \
                     Set this value in the environment or mnemonics encrypted this \
                     session cannot be decrypted after restart."
                );
                Ok(key)
            }
        }
    }

    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CryptoError::Config(format!("ESCROW_SECRET_KEY not valid base64: {e}")))?;
        if bytes.len() != KEY_LEN {
            return Err(CryptoError::Config(format!(
                "ESCROW_SECRET_KEY must decode to {KEY_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self(bytes))
    }

    pub fn generate() -> Self {
        let mut bytes = vec![0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Drop for EscrowKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl std::fmt::Debug for EscrowKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EscrowKey(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_key_is_32_bytes() {
        let key = EscrowKey::generate();
        assert_eq!(key.bytes().len(), KEY_LEN);
    }

    #[test]
    fn rejects_wrong_length_base64() {
        let short = STANDARD.encode([0u8; 16]);
        assert!(EscrowKey::from_base64(&short).is_err());
    }

    #[test]
    fn debug_never_prints_key_material() {
        let key = EscrowKey::generate();
        let b64 = key.to_base64();
        assert!(!format!("{:?}", key).contains(&b64));
    }
}
