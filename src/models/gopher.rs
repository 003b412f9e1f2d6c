// src/models/gopher.rs
// DOCUMENTATION: Uploaded gopher pictures and their content hash
// PURPOSE: Identity type shared by storage, handlers and views

use crate::errors::GopherError;
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Size of a SHA-256 digest in bytes
pub const HASH_SIZE: usize = 32;

/// SHA-256 digest of a gopher's raw bytes
/// DOCUMENTATION: Primary key of the gophers table and join key for ratings.
/// Rendered as lowercase hex in URLs, ordered bytewise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentHash([u8; HASH_SIZE]);

impl ContentHash {
    /// Hash arbitrary content
    pub fn of(content: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content);
        Self(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Rebuild a hash from a database column
    pub fn from_slice(bytes: &[u8]) -> Result<Self, GopherError> {
        let digest: [u8; HASH_SIZE] = bytes.try_into().map_err(|_| {
            GopherError::ValidationError(format!(
                "hash must be {} bytes, got {}",
                HASH_SIZE,
                bytes.len()
            ))
        })?;
        Ok(Self(digest))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Parse a hex-encoded hash taken from a URL path
impl FromStr for ContentHash {
    type Err = GopherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)
            .map_err(|e| GopherError::ValidationError(format!("malformed hash {:?}: {}", s, e)))?;
        Self::from_slice(&bytes)
    }
}

/// A picture of a gopher together with the SHA-256 digest of its content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gopher {
    hash: ContentHash,
    raw: Vec<u8>,
}

impl Gopher {
    /// Wrap raw image bytes, computing their hash
    pub fn new(raw: Vec<u8>) -> Self {
        Self {
            hash: ContentHash::of(&raw),
            raw,
        }
    }

    pub fn hash(&self) -> ContentHash {
        self.hash
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.raw
    }

    /// Best-effort MIME type from the leading magic bytes
    pub fn content_type(&self) -> &'static str {
        let raw = self.raw.as_slice();
        if raw.starts_with(b"\x89PNG\r\n\x1a\n") {
            "image/png"
        } else if raw.starts_with(&[0xff, 0xd8, 0xff]) {
            "image/jpeg"
        } else if raw.starts_with(b"GIF87a") || raw.starts_with(b"GIF89a") {
            "image/gif"
        } else if raw.len() >= 12 && raw.starts_with(b"RIFF") && &raw[8..12] == b"WEBP" {
            "image/webp"
        } else if raw.starts_with(b"BM") {
            "image/bmp"
        } else if looks_like_svg(raw) {
            "image/svg+xml"
        } else {
            "application/octet-stream"
        }
    }
}

fn looks_like_svg(raw: &[u8]) -> bool {
    let head = &raw[..raw.len().min(256)];
    let head = String::from_utf8_lossy(head);
    let head = head.trim_start();
    head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        let a = ContentHash::of(b"gopher");
        let b = ContentHash::of(b"gopher");
        assert_eq!(a, b);
        assert_ne!(a, ContentHash::of(b"ferris"));
    }

    #[test]
    fn test_new_gopher_hashes_content() {
        let gopher = Gopher::new(b"some picture".to_vec());
        assert_eq!(gopher.hash(), ContentHash::of(b"some picture"));
        assert_eq!(gopher.raw(), b"some picture");
    }

    #[test]
    fn test_known_digest() {
        // sha256("abc")
        assert_eq!(
            ContentHash::of(b"abc").to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_parse_hex() {
        let hash = ContentHash::of(b"gopher");
        let parsed: ContentHash = hash.to_hex().parse().unwrap();
        assert_eq!(parsed, hash);

        let upper: ContentHash = hash.to_hex().to_uppercase().parse().unwrap();
        assert_eq!(upper, hash);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("abc".parse::<ContentHash>().is_err()); // odd length
        assert!("zz".repeat(32).parse::<ContentHash>().is_err()); // not hex
        assert!("ab".repeat(31).parse::<ContentHash>().is_err()); // too short
        assert!("ab".repeat(33).parse::<ContentHash>().is_err()); // too long
        assert!("".parse::<ContentHash>().is_err());
    }

    #[test]
    fn test_ordering_matches_hex() {
        let mut hashes: Vec<ContentHash> = (0u8..20).map(|i| ContentHash::of(&[i])).collect();
        hashes.sort();
        let hex: Vec<String> = hashes.iter().map(|h| h.to_hex()).collect();
        let mut sorted = hex.clone();
        sorted.sort();
        assert_eq!(hex, sorted);
    }

    #[test]
    fn test_content_type_sniffing() {
        let png = Gopher::new(b"\x89PNG\r\n\x1a\n rest".to_vec());
        assert_eq!(png.content_type(), "image/png");

        let jpeg = Gopher::new(vec![0xff, 0xd8, 0xff, 0xe0, 0x00]);
        assert_eq!(jpeg.content_type(), "image/jpeg");

        let webp = Gopher::new(b"RIFF\x00\x00\x00\x00WEBPVP8 ".to_vec());
        assert_eq!(webp.content_type(), "image/webp");

        let svg = Gopher::new(b"<?xml version=\"1.0\"?>\n<svg></svg>".to_vec());
        assert_eq!(svg.content_type(), "image/svg+xml");

        let unknown = Gopher::new(b"plain text".to_vec());
        assert_eq!(unknown.content_type(), "application/octet-stream");
    }
}
