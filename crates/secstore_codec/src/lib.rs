//! # secstore codec
//!
//! Integrity-checked envelope codec for secstore.
//!
//! Every stored object occupies a fixed-size envelope on the medium:
//! a magic sentinel, a 64-byte name, format metadata, a zero-filled
//! reserved block, the payload, and a trailing CRC-32 over every byte
//! before it. Whatever is read back either decodes to exactly what was
//! written or is rejected.
//!
//! This crate knows nothing about storage backends, encryption, or the
//! directory index - it is a pure byte-level codec.
//!
//! ## Example
//!
//! ```
//! use secstore_codec::SecureObject;
//!
//! let obj = SecureObject::seal("hdcpkey", b"key material", false).unwrap();
//! let bytes = obj.encode();
//! let decoded = SecureObject::decode(&bytes).unwrap();
//! assert_eq!(decoded.payload(), b"key material");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod crc;
mod envelope;
mod error;

pub use crc::crc32;
pub use envelope::{
    SecureObject, ENVELOPE_SIZE, FORMAT_VERSION, MAX_STORE_LEN, NAME_LEN, OBJECT_MAGIC,
    REENCRYPT_MAGIC, WRITE_PROTECT_MAGIC,
};
pub use error::{CodecError, CodecResult};
