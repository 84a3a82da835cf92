//! KRC container decryption: strip the 4-byte magic header, XOR the
//! remainder with a 16-byte literal key cycled by position, zlib-inflate,
//! and decode as UTF-8.

use super::zlib_inflate;
use crate::error::{FetchError, Result};

const KRC_KEY: [u8; 16] = [
    b'@', b'G', b'a', b'w', b'^', b'2', b't', b'G', b'Q', b'6', b'1', b'-', 0xCE, 0xD2, b'n', b'i',
];

const MAGIC_LEN: usize = 4;

/// XOR `data` against the KRC literal key, cycling by byte position.
pub fn krc_xor(data: &[u8]) -> Vec<u8> {
    data.iter()
        .enumerate()
        .map(|(i, &b)| b ^ KRC_KEY[i % KRC_KEY.len()])
        .collect()
}

/// Strip the magic header, XOR-decrypt, inflate, and decode as UTF-8.
pub fn krc_decrypt(data: &[u8]) -> Result<String> {
    if data.len() <= MAGIC_LEN {
        return Err(FetchError::Decrypt("KRC payload too short".into()));
    }
    let body = &data[MAGIC_LEN..];
    let xored = krc_xor(body);
    let inflated = zlib_inflate(&xored)?;
    String::from_utf8(inflated).map_err(|e| FetchError::Decrypt(format!("KRC utf8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xor_applied_twice_returns_original() {
        let data = b"arbitrary krc body bytes of any length".to_vec();
        let once = krc_xor(&data);
        let twice = krc_xor(&once);
        assert_eq!(twice, data);
    }

    #[test]
    fn rejects_payload_shorter_than_magic() {
        assert!(krc_decrypt(b"abc").is_err());
    }
}
