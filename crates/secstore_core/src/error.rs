//! Error types for the provisioning core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in secure-object operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Envelope codec error.
    #[error("codec error: {0}")]
    Codec(#[from] secstore_codec::CodecError),

    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] secstore_storage::StoreError),

    /// The payload exceeds the provisioning size limit.
    #[error("payload is {len} bytes, the limit is {max}")]
    PayloadTooLarge {
        /// Length of the offered payload.
        len: usize,
        /// The provisioning limit.
        max: usize,
    },

    /// The secure execution environment reported an error.
    #[error("encryption failed: {message}")]
    EncryptionFailure {
        /// Description of the failure.
        message: String,
    },

    /// The directory index blob could not be read at all.
    #[error("directory index read failed: {message}")]
    IndexReadFailure {
        /// Description of the failure.
        message: String,
    },

    /// The directory index blob violates the token grammar.
    #[error("malformed directory index at byte {offset}: {message}")]
    IndexMalformed {
        /// Byte offset where parsing stopped.
        offset: usize,
        /// Description of the violation.
        message: String,
    },

    /// A decoded payload is not a valid secure-info record.
    #[error("malformed secure-info record: {message}")]
    MalformedRecord {
        /// Description of the violation.
        message: String,
    },
}

impl CoreError {
    /// Creates an encryption failure error.
    pub fn encryption_failure(message: impl Into<String>) -> Self {
        Self::EncryptionFailure {
            message: message.into(),
        }
    }

    /// Creates an index-malformed error.
    pub fn index_malformed(offset: usize, message: impl Into<String>) -> Self {
        Self::IndexMalformed {
            offset,
            message: message.into(),
        }
    }

    /// Creates a malformed-record error.
    pub fn malformed_record(message: impl Into<String>) -> Self {
        Self::MalformedRecord {
            message: message.into(),
        }
    }
}
