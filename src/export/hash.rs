//! SHA-256 helpers shared by the export formats.
//!
//! Report hashes are self-referential: the document is serialized with a
//! placeholder where its own hash will live, the placeholder is blanked,
//! the remainder is hashed, and the digest is substituted back in. A
//! verifier repeats the blank-then-hash step to confirm integrity.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of arbitrary bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

/// Compute the self-referential hash for `document`: blank the first
/// occurrence of `placeholder`, hash the remainder, and return both the
/// digest and the finalized document with the digest substituted in.
pub fn seal_document(document: &str, placeholder: &str) -> (String, String) {
    let blanked = document.replacen(placeholder, "", 1);
    let digest = sha256_hex(blanked.as_bytes());
    let sealed = document.replacen(placeholder, &digest, 1);
    (digest, sealed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_sha256_hex_empty_input() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_seal_document_round_trip() {
        let doc = "header %%HASH%% body";
        let (digest, sealed) = seal_document(doc, "%%HASH%%");

        assert!(sealed.contains(&digest));
        // Blanking the digest and re-hashing reproduces it.
        let blanked = sealed.replacen(&digest, "", 1);
        assert_eq!(sha256_hex(blanked.as_bytes()), digest);
    }

    #[test]
    fn test_seal_document_only_first_occurrence() {
        let doc = "%%HASH%% and again %%HASH%%";
        let (digest, sealed) = seal_document(doc, "%%HASH%%");
        assert!(sealed.starts_with(&digest));
        assert!(sealed.ends_with("%%HASH%%"));
    }
}
