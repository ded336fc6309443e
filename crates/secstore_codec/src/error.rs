//! Error types for the envelope codec.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while sealing or decoding an envelope.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The payload does not fit in the envelope's data block.
    #[error("payload is {len} bytes, envelope holds at most {max}")]
    PayloadTooLarge {
        /// Length of the offered payload.
        len: usize,
        /// The fixed payload capacity.
        max: usize,
    },

    /// The object name does not fit in the 64-byte name field.
    #[error("name is {len} bytes, at most 63 are allowed")]
    NameTooLong {
        /// Byte length of the offered name.
        len: usize,
    },

    /// The input buffer is not exactly one envelope.
    #[error("input is {actual} bytes, an envelope is {expected}")]
    SizeMismatch {
        /// The fixed envelope size.
        expected: usize,
        /// Length of the input buffer.
        actual: usize,
    },

    /// The leading magic field is not the envelope sentinel.
    #[error("bad envelope magic 0x{found:08x}")]
    MagicMismatch {
        /// The value found where the magic belongs.
        found: u32,
    },

    /// The trailing checksum does not match the envelope contents.
    #[error("checksum mismatch: stored 0x{expected:08x}, computed 0x{actual:08x}")]
    IntegrityFailure {
        /// The checksum stored in the envelope.
        expected: u32,
        /// The freshly computed checksum.
        actual: u32,
    },

    /// The recorded payload length exceeds the data block.
    #[error("recorded length {len} exceeds payload capacity {max}")]
    LengthOutOfRange {
        /// The recorded actual length.
        len: usize,
        /// The fixed payload capacity.
        max: usize,
    },
}
