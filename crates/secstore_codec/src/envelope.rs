//! The fixed-size on-medium envelope.

use crate::crc::crc32;
use crate::error::{CodecError, CodecResult};

/// Magic sentinel identifying a valid envelope.
pub const OBJECT_MAGIC: u32 = 0x1725_3948;

/// Sentinel in the `write_protect` field of protected objects.
pub const WRITE_PROTECT_MAGIC: u32 = 0x7022_3311;

/// Sentinel the secure world sets after re-encrypting a payload in place.
pub const REENCRYPT_MAGIC: u32 = 0x2989_dbca;

/// Current envelope format version.
pub const FORMAT_VERSION: u32 = 1;

/// Size of the fixed name field in bytes.
pub const NAME_LEN: usize = 64;

/// Payload capacity of the data block.
pub const MAX_STORE_LEN: usize = 3072;

const RESERVED_LEN: usize = 12;

/// Total envelope size on the medium.
///
/// magic + name + re_encrypt + version + id + write_protect + reserved +
/// actual_len + data + crc. Constant by construction: short payloads
/// waste space, the format never varies size.
pub const ENVELOPE_SIZE: usize =
    4 + NAME_LEN + 4 + 4 + 4 + 4 + RESERVED_LEN + 4 + MAX_STORE_LEN + 4;

const NAME_OFF: usize = 4;
const REENCRYPT_OFF: usize = NAME_OFF + NAME_LEN;
const VERSION_OFF: usize = REENCRYPT_OFF + 4;
const ID_OFF: usize = VERSION_OFF + 4;
const WRITE_PROTECT_OFF: usize = ID_OFF + 4;
const RESERVED_OFF: usize = WRITE_PROTECT_OFF + 4;
const ACTUAL_LEN_OFF: usize = RESERVED_OFF + RESERVED_LEN;
const DATA_OFF: usize = ACTUAL_LEN_OFF + 4;
const CRC_OFF: usize = DATA_OFF + MAX_STORE_LEN;

/// An integrity-checked secure object.
///
/// A `SecureObject` wraps an opaque payload with a name and the metadata
/// needed to validate it on read-back. On the medium every object
/// occupies exactly [`ENVELOPE_SIZE`] bytes, little-endian, with a
/// trailing CRC-32 over everything before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecureObject {
    name: String,
    re_encrypt: u32,
    version: u32,
    id: u32,
    write_protect: u32,
    payload: Vec<u8>,
}

impl SecureObject {
    /// Wraps `payload` into a new envelope named `name`.
    ///
    /// `write_protect` is resolved by the caller (normally from the
    /// session's write-protect registry) and stored as the protection
    /// sentinel.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::PayloadTooLarge`] if the payload exceeds
    /// [`MAX_STORE_LEN`], or [`CodecError::NameTooLong`] if the name does
    /// not leave room for its NUL terminator.
    pub fn seal(name: &str, payload: &[u8], write_protect: bool) -> CodecResult<Self> {
        if payload.len() > MAX_STORE_LEN {
            return Err(CodecError::PayloadTooLarge {
                len: payload.len(),
                max: MAX_STORE_LEN,
            });
        }
        if name.len() >= NAME_LEN {
            return Err(CodecError::NameTooLong { len: name.len() });
        }
        Ok(Self {
            name: name.to_string(),
            re_encrypt: 0,
            version: FORMAT_VERSION,
            id: 0,
            write_protect: if write_protect {
                WRITE_PROTECT_MAGIC
            } else {
                0
            },
            payload: payload.to_vec(),
        })
    }

    /// Serializes the envelope to its fixed on-medium form.
    ///
    /// The checksum is computed last, over every byte before the
    /// checksum field. The excluded range is pure size arithmetic
    /// (`..ENVELOPE_SIZE - 4`), never a field-by-field skip.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![0u8; ENVELOPE_SIZE];
        buf[..4].copy_from_slice(&OBJECT_MAGIC.to_le_bytes());
        buf[NAME_OFF..NAME_OFF + self.name.len()].copy_from_slice(self.name.as_bytes());
        buf[REENCRYPT_OFF..REENCRYPT_OFF + 4].copy_from_slice(&self.re_encrypt.to_le_bytes());
        buf[VERSION_OFF..VERSION_OFF + 4].copy_from_slice(&self.version.to_le_bytes());
        buf[ID_OFF..ID_OFF + 4].copy_from_slice(&self.id.to_le_bytes());
        buf[WRITE_PROTECT_OFF..WRITE_PROTECT_OFF + 4]
            .copy_from_slice(&self.write_protect.to_le_bytes());
        // reserved stays zero-filled
        let actual_len = self.payload.len() as u32;
        buf[ACTUAL_LEN_OFF..ACTUAL_LEN_OFF + 4].copy_from_slice(&actual_len.to_le_bytes());
        buf[DATA_OFF..DATA_OFF + self.payload.len()].copy_from_slice(&self.payload);

        let crc = crc32(&buf[..CRC_OFF]);
        buf[CRC_OFF..].copy_from_slice(&crc.to_le_bytes());
        buf
    }

    /// Validates and unwraps an envelope read back from the medium.
    ///
    /// Checks run in a fixed order: exact size, magic, checksum. The
    /// recorded payload length is only trusted once magic and checksum
    /// both pass. A re-encrypt sentinel is surfaced through
    /// [`chip_encrypted`](Self::chip_encrypted), never as an error.
    ///
    /// # Errors
    ///
    /// - [`CodecError::SizeMismatch`] unless `bytes` is exactly
    ///   [`ENVELOPE_SIZE`] long
    /// - [`CodecError::MagicMismatch`] if the sentinel is absent
    /// - [`CodecError::IntegrityFailure`] if the checksum does not match
    /// - [`CodecError::LengthOutOfRange`] if the recorded length exceeds
    ///   the data block (a checksum collision on a corrupt envelope)
    pub fn decode(bytes: &[u8]) -> CodecResult<Self> {
        if bytes.len() != ENVELOPE_SIZE {
            return Err(CodecError::SizeMismatch {
                expected: ENVELOPE_SIZE,
                actual: bytes.len(),
            });
        }

        let magic = read_u32(bytes, 0);
        if magic != OBJECT_MAGIC {
            return Err(CodecError::MagicMismatch { found: magic });
        }

        let stored_crc = read_u32(bytes, CRC_OFF);
        let computed_crc = crc32(&bytes[..CRC_OFF]);
        if stored_crc != computed_crc {
            return Err(CodecError::IntegrityFailure {
                expected: stored_crc,
                actual: computed_crc,
            });
        }

        let actual_len = read_u32(bytes, ACTUAL_LEN_OFF) as usize;
        if actual_len > MAX_STORE_LEN {
            return Err(CodecError::LengthOutOfRange {
                len: actual_len,
                max: MAX_STORE_LEN,
            });
        }

        let name_field = &bytes[NAME_OFF..NAME_OFF + NAME_LEN];
        let name_end = name_field.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
        let name = String::from_utf8_lossy(&name_field[..name_end]).into_owned();

        Ok(Self {
            name,
            re_encrypt: read_u32(bytes, REENCRYPT_OFF),
            version: read_u32(bytes, VERSION_OFF),
            id: read_u32(bytes, ID_OFF),
            write_protect: read_u32(bytes, WRITE_PROTECT_OFF),
            payload: bytes[DATA_OFF..DATA_OFF + actual_len].to_vec(),
        })
    }

    /// The object's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The meaningful payload bytes.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Consumes the object, returning the payload.
    #[must_use]
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Whether the write-protect sentinel is set.
    #[must_use]
    pub fn write_protected(&self) -> bool {
        self.write_protect == WRITE_PROTECT_MAGIC
    }

    /// Whether the secure world has re-encrypted this object in place.
    ///
    /// Informational only; the codec does not change behavior on it.
    #[must_use]
    pub fn chip_encrypted(&self) -> bool {
        self.re_encrypt == REENCRYPT_MAGIC
    }

    /// The envelope format version the object was written with.
    #[must_use]
    pub fn version(&self) -> u32 {
        self.version
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut field = [0u8; 4];
    field.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(field)
}
