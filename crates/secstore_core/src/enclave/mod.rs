//! The secure-execution-environment seam.
//!
//! Payload encryption is performed by an external trusted environment
//! bound to a device-unique key. This module defines the call interface
//! and the key-class routing; the production implementation lives in
//! firmware behind this trait. A software stand-in for development and
//! testing is available behind the `soft-enclave` feature.

use crate::error::CoreResult;

#[cfg(feature = "soft-enclave")]
mod software;

#[cfg(feature = "soft-enclave")]
pub use software::{SoftEnclave, DEVICE_SECRET_LEN};

/// The reserved name whose key is wrapped with the device root key.
pub const HDMI_ROOT_KEY_NAME: &str = "hdcpkey";

/// Which device-key derivation path wraps a payload.
///
/// Resolved once from the object name; HDMI content-protection keys use
/// a distinct root-key path, everything else the general storage-key
/// path. The two paths are mutually exclusive for any given name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyClass {
    /// General storage-key derivation path.
    General,
    /// Device-root-key derivation path for HDMI content protection.
    HdmiRoot,
}

impl KeyClass {
    /// Resolves the key class for an object name.
    ///
    /// The comparison is exact and case-sensitive on the name as given.
    #[must_use]
    pub fn of(name: &str) -> Self {
        if name == HDMI_ROOT_KEY_NAME {
            Self::HdmiRoot
        } else {
            Self::General
        }
    }
}

/// A trusted execution environment that wraps payloads with a
/// device-unique key.
///
/// The returned vector is the ciphertext at its aligned length: the
/// environment may pad to a cipher block, and callers must record the
/// returned length, not the plaintext length.
///
/// An *absent* enclave is not an error - it is the distinct
/// "no secure world" condition, in which payloads pass through
/// unencrypted and the encryption flag records intent only.
pub trait SecureEnclave: Send + Sync {
    /// Wraps `plaintext` under the derivation path selected by `class`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EncryptionFailure`](crate::CoreError::EncryptionFailure)
    /// if the environment reports any internal error.
    fn wrap(&self, class: KeyClass, plaintext: &[u8]) -> CoreResult<Vec<u8>>;
}
