//! SHA-256 digests for verifying downloaded chart archives.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `bytes`.
pub fn hash_bytes(bytes: &[u8]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(bytes);
  hex::encode(hasher.finalize())
}

/// Compare `bytes` against an expected digest.
///
/// Repository indexes sometimes prefix digests with `sha256:`; the prefix and
/// letter case are ignored.
pub fn digest_matches(bytes: &[u8], expected: &str) -> bool {
  let expected = expected.trim();
  let expected = expected.strip_prefix("sha256:").unwrap_or(expected);
  hash_bytes(bytes).eq_ignore_ascii_case(expected)
}
