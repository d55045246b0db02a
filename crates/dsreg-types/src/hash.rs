use sha2::{Digest, Sha256};

/// SHA-256 of `data` as 64 lowercase hex characters.
///
/// This is the canonical [`File`](crate::File) key: identical bytes always
/// map to the same file entry.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::is_sha256_hex;

    #[test]
    fn known_digest() {
        assert_eq!(
            sha256_hex(b"0"),
            "5feceb66ffc86f38d952786c6d696c79c2dbc239dd4e91b46729d73a27fb57e9"
        );
    }

    #[test]
    fn digest_is_valid_file_hash() {
        assert!(is_sha256_hex(&sha256_hex(b"")));
        assert!(is_sha256_hex(&sha256_hex(b"some file contents")));
    }
}
