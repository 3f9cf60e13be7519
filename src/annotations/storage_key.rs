//! Local storage key scheme
//!
//! Shared documents keep their annotations under the share code, so every
//! visit to the same code finds the same set. Anything else is keyed by a
//! hash of the markdown source, which means editing the text starts a new set.

use std::fmt;

/// Key of the last-session snapshot
pub const SESSION_KEY: &str = "markdown_annotator_session_v1";

/// Key under which one document's annotation set is stored
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    /// Key for a document opened from a share code
    pub fn for_share(code: &str) -> Self {
        StorageKey(format!("annotations_share_{}", code.trim().to_uppercase()))
    }

    /// Key for locally entered markdown
    pub fn for_content(markdown: &str) -> Self {
        StorageKey(format!("annotations_{}", content_hash(markdown)))
    }

    /// Share code wins over the content hash
    pub fn for_document(markdown: &str, share_code: Option<&str>) -> Self {
        match share_code {
            Some(code) if !code.trim().is_empty() => Self::for_share(code),
            _ => Self::for_content(markdown),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 32-bit rolling hash (`h * 31 + unit`) over UTF-16 code units.
///
/// Must stay bit-compatible with keys already written by browser clients.
pub fn content_hash(content: &str) -> i32 {
    content.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    })
}
