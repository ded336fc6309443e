//! Software stand-in for the secure execution environment.

use crate::enclave::{KeyClass, SecureEnclave};
use crate::error::{CoreError, CoreResult};
use aes_gcm::{
    aead::{generic_array::GenericArray, Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the device-unique secret in bytes.
pub const DEVICE_SECRET_LEN: usize = 32;

const AES_BLOCK: usize = 16;
const NONCE_SIZE: usize = 12;

const GENERAL_INFO: &[u8] = b"secstore general storage key v1";
const ROOT_INFO: &[u8] = b"secstore device root key v1";

/// A software enclave for hosts without a secure world.
///
/// Wraps payloads the way the hardware environment does at the
/// interface level: a per-class key is derived from a device-unique
/// secret (HKDF-SHA256 with a distinct info label per
/// [`KeyClass`]), the payload is zero-padded to the AES block, and the
/// output is `nonce || ciphertext || tag`. The secret is zeroized on
/// drop.
///
/// This is a development and test double. It does not talk to any
/// trusted hardware and must not be shipped where a real secure world
/// is available.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SoftEnclave {
    secret: [u8; DEVICE_SECRET_LEN],
}

impl SoftEnclave {
    /// Creates an enclave from a device-unique secret.
    ///
    /// # Errors
    ///
    /// Returns an error unless `secret` is exactly
    /// [`DEVICE_SECRET_LEN`] bytes.
    pub fn from_secret(secret: &[u8]) -> CoreResult<Self> {
        if secret.len() != DEVICE_SECRET_LEN {
            return Err(CoreError::encryption_failure(format!(
                "device secret must be {DEVICE_SECRET_LEN} bytes, got {}",
                secret.len()
            )));
        }
        let mut bytes = [0u8; DEVICE_SECRET_LEN];
        bytes.copy_from_slice(secret);
        Ok(Self { secret: bytes })
    }

    /// Creates an enclave with a freshly generated random secret.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; DEVICE_SECRET_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self { secret: bytes }
    }

    fn class_key(&self, class: KeyClass) -> CoreResult<[u8; 32]> {
        let info = match class {
            KeyClass::General => GENERAL_INFO,
            KeyClass::HdmiRoot => ROOT_INFO,
        };
        let hk = Hkdf::<Sha256>::new(None, &self.secret);
        let mut key = [0u8; 32];
        hk.expand(info, &mut key)
            .map_err(|_| CoreError::encryption_failure("key derivation failed"))?;
        Ok(key)
    }
}

impl std::fmt::Debug for SoftEnclave {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoftEnclave")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl SecureEnclave for SoftEnclave {
    fn wrap(&self, class: KeyClass, plaintext: &[u8]) -> CoreResult<Vec<u8>> {
        let key = self.class_key(class)?;
        let cipher = Aes256Gcm::new(GenericArray::from_slice(&key));

        // Pad to the cipher block before sealing; the recorded length is
        // the wrapped length, not the plaintext length.
        let padded_len = plaintext.len().div_ceil(AES_BLOCK) * AES_BLOCK;
        let mut padded = vec![0u8; padded_len];
        padded[..plaintext.len()].copy_from_slice(plaintext);

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, padded.as_slice())
            .map_err(|_| CoreError::encryption_failure("AEAD seal failed"))?;
        padded.zeroize();

        let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_expands_to_aligned_framing() {
        let enclave = SoftEnclave::from_secret(&[7u8; DEVICE_SECRET_LEN]).unwrap();
        let wrapped = enclave.wrap(KeyClass::General, b"0123456789").unwrap();
        // nonce + one padded block + tag
        assert_eq!(wrapped.len(), NONCE_SIZE + AES_BLOCK + 16);
    }

    #[test]
    fn classes_wrap_differently() {
        let enclave = SoftEnclave::from_secret(&[7u8; DEVICE_SECRET_LEN]).unwrap();
        let general = enclave.wrap(KeyClass::General, b"same input").unwrap();
        let root = enclave.wrap(KeyClass::HdmiRoot, b"same input").unwrap();
        // Random nonces already differ; check the derived keys do too.
        assert_ne!(
            enclave.class_key(KeyClass::General).unwrap(),
            enclave.class_key(KeyClass::HdmiRoot).unwrap()
        );
        assert_ne!(general, root);
    }

    #[test]
    fn short_secret_is_rejected() {
        let err = SoftEnclave::from_secret(&[0u8; 16]).unwrap_err();
        assert!(matches!(err, CoreError::EncryptionFailure { .. }));
    }

    #[test]
    fn debug_redacts_secret() {
        let enclave = SoftEnclave::from_secret(&[9u8; DEVICE_SECRET_LEN]).unwrap();
        let rendered = format!("{enclave:?}");
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains('9'));
    }
}
