//! Directory index parsing.
//!
//! The storage backend keeps a compact text index of stored objects in
//! its first numeric slot: `name:len ` tokens, one per object, with a
//! NUL byte where the next name would start. This module is the read
//! side only - backends own the blob and regenerate it themselves.

use crate::error::{CoreError, CoreResult};
use secstore_codec::NAME_LEN;

/// Placeholder entry name the backend uses for unoccupied positions.
pub const DUMMY_KEY_NAME: &str = "dummy_key";

/// Name prefix of burn-flag objects, which are stored raw (no
/// integrity envelope).
pub const BURNED_FLAG_PREFIX: &str = "key_burned_flag";

/// One `name:len` token from the directory index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// The object name.
    pub name: String,
    /// The recorded stored length in bytes.
    pub len: usize,
}

impl IndexEntry {
    /// Whether this is the backend's unused-position placeholder.
    #[must_use]
    pub fn is_dummy(&self) -> bool {
        self.name == DUMMY_KEY_NAME && self.len == 0
    }

    /// Whether the referenced object is stored raw, outside the
    /// integrity envelope.
    #[must_use]
    pub fn is_raw(&self) -> bool {
        self.name.starts_with(BURNED_FLAG_PREFIX)
    }
}

/// Parses a directory index blob into its entries.
///
/// The grammar is `token*` NUL with `token := name ':' digits ' '`.
/// Parsing is bounded: a name with no `':'` within [`NAME_LEN`] bytes
/// fails fast instead of scanning the whole slot, and a blob with no
/// NUL terminator at all is rejected. The digits field is parsed
/// leniently - the longest leading decimal run counts, anything else
/// reads as zero - matching the conversion the index was written
/// against.
///
/// # Errors
///
/// Returns [`CoreError::IndexMalformed`] on a bound or terminator
/// violation. Entries before the violation are not returned; a corrupt
/// index is rejected as a whole.
pub fn parse_index(blob: &[u8]) -> CoreResult<Vec<IndexEntry>> {
    let mut entries = Vec::new();
    let mut pos = 0;

    loop {
        match blob.get(pos) {
            None => {
                return Err(CoreError::index_malformed(pos, "missing NUL terminator"));
            }
            Some(0) => break,
            Some(_) => {}
        }

        let bound = blob.len().min(pos + NAME_LEN);
        let colon = blob[pos..bound]
            .iter()
            .position(|&b| b == b':')
            .ok_or_else(|| {
                CoreError::index_malformed(pos, format!("no ':' within {NAME_LEN} bytes of name"))
            })?;
        let name = String::from_utf8_lossy(&blob[pos..pos + colon]).into_owned();
        pos += colon + 1;

        let digits_start = pos;
        while pos < blob.len() && blob[pos] != b' ' && blob[pos] != 0 {
            pos += 1;
        }
        if pos >= blob.len() {
            return Err(CoreError::index_malformed(digits_start, "unterminated entry"));
        }
        let len = lenient_decimal(&blob[digits_start..pos]);

        entries.push(IndexEntry { name, len });

        if blob[pos] == b' ' {
            pos += 1;
        }
    }

    Ok(entries)
}

/// Parses the longest leading decimal-digit run; empty or non-numeric
/// input reads as zero.
fn lenient_decimal(text: &[u8]) -> usize {
    let mut value = 0usize;
    for &b in text {
        if !b.is_ascii_digit() {
            break;
        }
        value = value
            .saturating_mul(10)
            .saturating_add(usize::from(b - b'0'));
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn blob(text: &str) -> Vec<u8> {
        let mut bytes = text.as_bytes().to_vec();
        bytes.push(0);
        bytes.resize(4096, 0);
        bytes
    }

    #[test]
    fn parse_two_entries() {
        let entries = parse_index(&blob("hdcpkey:3176 widevine:3176 ")).unwrap();
        assert_eq!(
            entries,
            vec![
                IndexEntry {
                    name: "hdcpkey".to_string(),
                    len: 3176
                },
                IndexEntry {
                    name: "widevine".to_string(),
                    len: 3176
                },
            ]
        );
    }

    #[test]
    fn parse_empty_index() {
        assert!(parse_index(&blob("")).unwrap().is_empty());
    }

    #[test]
    fn entry_terminated_by_nul_instead_of_space() {
        let mut bytes = b"alpha:42".to_vec();
        bytes.push(0);
        let entries = parse_index(&bytes).unwrap();
        assert_eq!(entries[0].len, 42);
    }

    #[test]
    fn lenient_length_parse() {
        assert_eq!(parse_index(&blob("a:12xy ")).unwrap()[0].len, 12);
        assert_eq!(parse_index(&blob("a:xy ")).unwrap()[0].len, 0);
        assert_eq!(parse_index(&blob("a: ")).unwrap()[0].len, 0);
    }

    #[test]
    fn missing_colon_fails_fast() {
        let long_run = "x".repeat(200);
        let err = parse_index(&blob(&long_run)).unwrap_err();
        assert!(matches!(err, CoreError::IndexMalformed { offset: 0, .. }));
    }

    #[test]
    fn unterminated_blob_is_rejected() {
        let err = parse_index(b"alpha:42 ").unwrap_err();
        assert!(matches!(err, CoreError::IndexMalformed { .. }));
    }

    #[test]
    fn dummy_and_raw_classification() {
        let entries = parse_index(&blob("dummy_key:0 key_burned_flag_widevine:16 hdcpkey:3176 "))
            .unwrap();
        assert!(entries[0].is_dummy());
        assert!(entries[1].is_raw());
        assert!(!entries[2].is_dummy());
        assert!(!entries[2].is_raw());

        // A dummy-named entry with a nonzero length is a live object.
        let live = parse_index(&blob("dummy_key:8 ")).unwrap();
        assert!(!live[0].is_dummy());
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 64, ..ProptestConfig::default() })]

        #[test]
        fn rendered_entries_roundtrip(
            entries in proptest::collection::vec(("[a-z_][a-z0-9_]{0,30}", 0usize..100_000), 0..12)
        ) {
            let mut text = String::new();
            for (name, len) in &entries {
                text.push_str(&format!("{name}:{len} "));
            }
            let parsed = parse_index(&blob(&text)).unwrap();
            prop_assert_eq!(parsed.len(), entries.len());
            for (parsed, (name, len)) in parsed.iter().zip(&entries) {
                prop_assert_eq!(&parsed.name, name);
                prop_assert_eq!(parsed.len, *len);
            }
        }
    }
}
