//! Content-derived entity tags.

use sha2::{Digest, Sha256};

/// Strong ETag for a body: the quoted hex SHA-256 of its bytes.
pub fn etag_for(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    format!("\"{}\"", hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_etag_stability() {
        assert_eq!(etag_for(b"body"), etag_for(b"body"));
    }

    #[test]
    fn test_etag_differs_by_content() {
        assert_ne!(etag_for(b"v1"), etag_for(b"v2"));
    }

    #[test]
    fn test_etag_format() {
        let tag = etag_for(b"");
        assert_eq!(tag.len(), 66);
        assert!(tag.starts_with('"') && tag.ends_with('"'));
        assert!(tag.trim_matches('"').chars().all(|c| c.is_ascii_hexdigit()));
    }
}
