//! Cipher kit (component B): Triple-DES, QMC1 XOR, KRC XOR, NE's EAPI
//! envelope, and the shared zlib-inflate helper all the container formats
//! lean on after decryption.

pub mod eapi;
pub mod krc_xor;
pub mod qmc1;
pub mod tripledes;

use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::error::{FetchError, Result};

/// Decompress raw zlib-framed bytes. Any failure collapses to a single
/// decrypt error bearing the proximate cause, per the "no partial results"
/// failure mode shared by every container format.
pub fn zlib_inflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| FetchError::Decrypt(format!("zlib inflate: {e}")))?;
    Ok(out)
}

/// The literal 24-byte QRC Triple-DES key.
pub const QRC_KEY: &[u8; 24] = b"!@#)(*$%123ZXC!@!@#)(NHL";

/// Decrypt a hex-encoded QRC ciphertext blob: hex-decode, Triple-DES ECB
/// decrypt, zlib inflate, UTF-8 decode.
pub fn qrc_decrypt_hex(hex_cipher: &str) -> Result<String> {
    let raw = hex::decode(hex_cipher.trim())
        .map_err(|e| FetchError::Decrypt(format!("qrc hex decode: {e}")))?;
    let des = tripledes::TripleDesEcb::new(QRC_KEY)
        .expect("QRC_KEY is a fixed 24-byte literal");
    let plain = des
        .decrypt(&raw)
        .ok_or_else(|| FetchError::Decrypt("qrc ciphertext not block-aligned".into()))?;
    let inflated = zlib_inflate(&plain)?;
    String::from_utf8(inflated).map_err(|e| FetchError::Decrypt(format!("qrc utf8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qrc_decrypt_rejects_bad_hex() {
        assert!(qrc_decrypt_hex("not hex at all!!").is_err());
    }
}
