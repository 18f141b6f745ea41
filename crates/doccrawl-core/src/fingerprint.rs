//! Content fingerprints used for change detection.
//!
//! A fingerprint is `sha256:` followed by the first 16 hex characters of the
//! SHA-256 digest of the UTF-8 input. Inputs are hashed exactly as given, so
//! every code path that compares fingerprints must hash the same composition.
//! [`page_document`] is that composition for generated pages.

use std::fmt::Write;

use sha2::{Digest, Sha256};

/// Algorithm tag prefixed to every fingerprint.
pub const FINGERPRINT_ALGORITHM: &str = "sha256";

/// Number of hex characters kept from the digest.
pub const FINGERPRINT_HEX_LEN: usize = 16;

/// Compute the fingerprint tag for `text`.
///
/// ```rust
/// use doccrawl_core::fingerprint::fingerprint;
///
/// let tag = fingerprint("hello");
/// assert_eq!(tag, "sha256:2cf24dba5fb0a30e");
/// ```
#[must_use]
pub fn fingerprint(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let hex = digest
        .iter()
        .take(FINGERPRINT_HEX_LEN / 2)
        .fold(String::with_capacity(FINGERPRINT_HEX_LEN), |mut acc, b| {
            // write! to String is infallible
            let _ = write!(acc, "{b:02x}");
            acc
        });
    format!("{FINGERPRINT_ALGORITHM}:{hex}")
}

/// Compose the canonical page document: `# {title}` heading, blank line, body.
///
/// Generation writes this string (after front matter), remote checks hash a
/// freshly rendered copy of it, and local checks hash what follows the front
/// matter on disk.
#[must_use]
pub fn page_document(title: &str, markdown: &str) -> String {
    format!("# {title}\n\n{markdown}")
}

/// Fingerprint of [`page_document`] for `title` and `markdown`.
#[must_use]
pub fn page_fingerprint(title: &str, markdown: &str) -> String {
    fingerprint(&page_document(title, markdown))
}
