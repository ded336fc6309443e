//! Directory index blob rendering.
//!
//! The index lives in slot [`INDEX_SLOT`](crate::INDEX_SLOT) as ASCII
//! `name:len ` tokens terminated by a NUL byte, zero-padded to the slot
//! size. Backends regenerate the whole blob from their object list on
//! every named write; nothing above the backend ever writes it.

use crate::error::{StoreError, StoreResult};

/// Renders the directory index blob for the given `(name, len)` entries.
///
/// The result is exactly `capacity` bytes.
///
/// # Errors
///
/// Returns [`StoreError::IndexOverflow`] if the rendered entries plus the
/// NUL terminator do not fit in `capacity`.
pub fn render(entries: &[(String, usize)], capacity: usize) -> StoreResult<Vec<u8>> {
    let mut blob = Vec::with_capacity(capacity);
    for (name, len) in entries {
        blob.extend_from_slice(name.as_bytes());
        blob.push(b':');
        blob.extend_from_slice(len.to_string().as_bytes());
        blob.push(b' ');
    }
    blob.push(0);

    if blob.len() > capacity {
        return Err(StoreError::IndexOverflow {
            needed: blob.len(),
            capacity,
        });
    }
    blob.resize(capacity, 0);
    Ok(blob)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_empty_is_single_nul() {
        let blob = render(&[], 16).unwrap();
        assert_eq!(blob.len(), 16);
        assert_eq!(blob[0], 0);
    }

    #[test]
    fn render_tokens_in_order() {
        let entries = vec![("alpha".to_string(), 3176), ("beta".to_string(), 12)];
        let blob = render(&entries, 64).unwrap();
        assert!(blob.starts_with(b"alpha:3176 beta:12 \0"));
    }

    #[test]
    fn render_overflow_is_reported() {
        let entries = vec![("a-rather-long-object-name".to_string(), 4096)];
        let err = render(&entries, 8).unwrap_err();
        assert!(matches!(err, StoreError::IndexOverflow { .. }));
    }
}
