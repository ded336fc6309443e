//! The secure-info provisioning record.

use crate::enclave::{KeyClass, SecureEnclave};
use crate::error::{CoreError, CoreResult};
use secstore_codec::{CodecError, NAME_LEN};
use tracing::debug;

/// Fixed header length of a serialized record: name + len + encrypted +
/// write_protect.
pub const INFO_HEAD_LEN: usize = NAME_LEN + 4 + 4 + 4;

/// Maximum accepted payload size, checked before any encryption attempt.
pub const MAX_KEY_LEN: usize = 4096;

/// A named, possibly-encrypted key record ready for persistence.
///
/// A `SecureInfo` is what provisioning actually stores: the key bytes
/// (raw, or as wrapped by the secure execution environment) together
/// with the flags recorded at build time. When persisted it becomes the
/// payload of an integrity envelope; the envelope format is agnostic to
/// its internal structure.
///
/// Note the `encrypted` flag records *intent*: when no enclave is
/// available the payload passes through unchanged and the flag is still
/// stored as requested. Callers must treat "encrypted but no secure
/// world" as unencrypted in practice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecureInfo {
    name: String,
    encrypted: bool,
    write_protect: bool,
    key_data: Vec<u8>,
}

impl SecureInfo {
    /// Builds a record from a raw payload.
    ///
    /// When `encrypt` is set and an enclave is present, the payload is
    /// wrapped under the derivation path of [`KeyClass::of`]`(name)` and
    /// the wrapped (aligned) length replaces the plaintext length.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::PayloadTooLarge`] if the payload exceeds
    /// [`MAX_KEY_LEN`] (checked before any encryption attempt), a name
    /// error if `name` does not fit the 64-byte field, or
    /// [`CoreError::EncryptionFailure`] from the enclave.
    pub fn build(
        name: &str,
        payload: &[u8],
        encrypt: bool,
        write_protect: bool,
        enclave: Option<&dyn SecureEnclave>,
    ) -> CoreResult<Self> {
        if payload.len() > MAX_KEY_LEN {
            return Err(CoreError::PayloadTooLarge {
                len: payload.len(),
                max: MAX_KEY_LEN,
            });
        }
        if name.len() >= NAME_LEN {
            return Err(CodecError::NameTooLong { len: name.len() }.into());
        }

        let key_data = match (encrypt, enclave) {
            (true, Some(enclave)) => {
                let class = KeyClass::of(name);
                let wrapped = enclave.wrap(class, payload)?;
                debug!(name, ?class, wrapped_len = wrapped.len(), "payload wrapped");
                wrapped
            }
            (true, None) => {
                debug!(name, "no secure world, storing payload unencrypted");
                payload.to_vec()
            }
            (false, _) => payload.to_vec(),
        };

        Ok(Self {
            name: name.to_string(),
            encrypted: encrypt,
            write_protect,
            key_data,
        })
    }

    /// Reconstructs a record from the serialized form.
    ///
    /// Trailing bytes beyond the recorded length are ignored; the data
    /// block of a fixed-size envelope is zero-padded by construction.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MalformedRecord`] if the buffer is shorter
    /// than the header or than the recorded key length.
    pub fn parse(bytes: &[u8]) -> CoreResult<Self> {
        if bytes.len() < INFO_HEAD_LEN {
            return Err(CoreError::malformed_record(format!(
                "record is {} bytes, header alone is {INFO_HEAD_LEN}",
                bytes.len()
            )));
        }

        let name_field = &bytes[..NAME_LEN];
        let name_end = name_field.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
        let name = String::from_utf8_lossy(&name_field[..name_end]).into_owned();

        let len = read_u32(bytes, NAME_LEN) as usize;
        let encrypted = read_u32(bytes, NAME_LEN + 4) != 0;
        let write_protect = read_u32(bytes, NAME_LEN + 8) != 0;

        if INFO_HEAD_LEN + len > bytes.len() {
            return Err(CoreError::malformed_record(format!(
                "recorded key length {len} exceeds record body {}",
                bytes.len() - INFO_HEAD_LEN
            )));
        }

        Ok(Self {
            name,
            encrypted,
            write_protect,
            key_data: bytes[INFO_HEAD_LEN..INFO_HEAD_LEN + len].to_vec(),
        })
    }

    /// Serializes the record: 76-byte header followed by the key bytes.
    #[must_use]
    pub fn encode_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; INFO_HEAD_LEN + self.key_data.len()];
        buf[..self.name.len()].copy_from_slice(self.name.as_bytes());
        buf[NAME_LEN..NAME_LEN + 4].copy_from_slice(&(self.key_data.len() as u32).to_le_bytes());
        buf[NAME_LEN + 4..NAME_LEN + 8]
            .copy_from_slice(&u32::from(self.encrypted).to_le_bytes());
        buf[NAME_LEN + 8..NAME_LEN + 12]
            .copy_from_slice(&u32::from(self.write_protect).to_le_bytes());
        buf[INFO_HEAD_LEN..].copy_from_slice(&self.key_data);
        buf
    }

    /// The record's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether encryption was requested when the record was built.
    #[must_use]
    pub fn encrypted(&self) -> bool {
        self.encrypted
    }

    /// Whether write protection was requested when the record was built.
    #[must_use]
    pub fn write_protected(&self) -> bool {
        self.write_protect
    }

    /// The stored key bytes (wrapped or raw).
    #[must_use]
    pub fn key_data(&self) -> &[u8] {
        &self.key_data
    }

    /// Length of the stored key bytes.
    ///
    /// After encryption this is the wrapped (aligned) length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.key_data.len()
    }

    /// Whether the record holds no key bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.key_data.is_empty()
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut field = [0u8; 4];
    field.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records which key class each wrap call used.
    struct RecordingEnclave {
        calls: Mutex<Vec<KeyClass>>,
    }

    impl RecordingEnclave {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl SecureEnclave for RecordingEnclave {
        fn wrap(&self, class: KeyClass, plaintext: &[u8]) -> CoreResult<Vec<u8>> {
            self.calls.lock().unwrap().push(class);
            // Invert and pad to a 16-byte boundary, like a block cipher would.
            let mut out: Vec<u8> = plaintext.iter().map(|b| !b).collect();
            out.resize(out.len().div_ceil(16) * 16, 0);
            Ok(out)
        }
    }

    struct FailingEnclave;

    impl SecureEnclave for FailingEnclave {
        fn wrap(&self, _class: KeyClass, _plaintext: &[u8]) -> CoreResult<Vec<u8>> {
            Err(CoreError::encryption_failure("secure world fault"))
        }
    }

    #[test]
    fn build_without_enclave_passes_payload_through() {
        let info = SecureInfo::build("widevine", b"keybox", true, false, None).unwrap();
        assert_eq!(info.key_data(), b"keybox");
        assert!(info.encrypted(), "the flag records intent");
        assert_eq!(info.len(), 6);
    }

    #[test]
    fn build_plain_copies_payload() {
        let info = SecureInfo::build("flag", b"01", false, true, None).unwrap();
        assert_eq!(info.key_data(), b"01");
        assert!(!info.encrypted());
        assert!(info.write_protected());
    }

    #[test]
    fn hdcp_name_uses_root_path() {
        let enclave = RecordingEnclave::new();
        SecureInfo::build("hdcpkey", b"k", true, false, Some(&enclave)).unwrap();
        assert_eq!(*enclave.calls.lock().unwrap(), vec![KeyClass::HdmiRoot]);
    }

    #[test]
    fn other_names_use_general_path() {
        let enclave = RecordingEnclave::new();
        SecureInfo::build("widevine", b"k", true, false, Some(&enclave)).unwrap();
        SecureInfo::build("hdcpkey2", b"k", true, false, Some(&enclave)).unwrap();
        assert_eq!(
            *enclave.calls.lock().unwrap(),
            vec![KeyClass::General, KeyClass::General]
        );
    }

    #[test]
    fn wrapped_length_replaces_plaintext_length() {
        let enclave = RecordingEnclave::new();
        let info = SecureInfo::build("k1", b"12345", true, false, Some(&enclave)).unwrap();
        assert_eq!(info.len(), 16, "length is the aligned wrapped length");
    }

    #[test]
    fn enclave_failure_propagates() {
        let err = SecureInfo::build("k1", b"data", true, false, Some(&FailingEnclave)).unwrap_err();
        assert!(matches!(err, CoreError::EncryptionFailure { .. }));
    }

    #[test]
    fn unencrypted_build_never_calls_enclave() {
        let enclave = RecordingEnclave::new();
        SecureInfo::build("k1", b"data", false, false, Some(&enclave)).unwrap();
        assert!(enclave.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn oversize_payload_rejected_before_encryption() {
        let enclave = RecordingEnclave::new();
        let payload = vec![0u8; MAX_KEY_LEN + 1];
        let err =
            SecureInfo::build("big", &payload, true, false, Some(&enclave)).unwrap_err();
        assert!(matches!(err, CoreError::PayloadTooLarge { .. }));
        assert!(
            enclave.calls.lock().unwrap().is_empty(),
            "no encryption attempt for oversize payloads"
        );
    }

    #[test]
    fn record_roundtrip() {
        let info = SecureInfo::build("hdcpkey", b"wrapped-ish", true, true, None).unwrap();
        let bytes = info.encode_bytes();
        assert_eq!(bytes.len(), INFO_HEAD_LEN + 11);

        let parsed = SecureInfo::parse(&bytes).unwrap();
        assert_eq!(parsed, info);
    }

    #[test]
    fn parse_tolerates_zero_padding() {
        let info = SecureInfo::build("k", b"abc", false, false, None).unwrap();
        let mut bytes = info.encode_bytes();
        bytes.resize(bytes.len() + 100, 0);
        let parsed = SecureInfo::parse(&bytes).unwrap();
        assert_eq!(parsed.key_data(), b"abc");
    }

    #[test]
    fn parse_short_header_fails() {
        let err = SecureInfo::parse(&[0u8; INFO_HEAD_LEN - 1]).unwrap_err();
        assert!(matches!(err, CoreError::MalformedRecord { .. }));
    }

    #[test]
    fn parse_overlong_recorded_length_fails() {
        let info = SecureInfo::build("k", b"abc", false, false, None).unwrap();
        let mut bytes = info.encode_bytes();
        bytes[NAME_LEN..NAME_LEN + 4].copy_from_slice(&1000u32.to_le_bytes());
        let err = SecureInfo::parse(&bytes).unwrap_err();
        assert!(matches!(err, CoreError::MalformedRecord { .. }));
    }
}
