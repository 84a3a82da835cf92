//! NE's EAPI envelope: AES-128-ECB with PKCS#7 padding, keyed by the
//! well-known public NetEase eapi key, with a path-derived MD5 digest tag
//! folded into the plaintext before encryption.

use aes::Aes128;
use cipher::block_padding::Pkcs7;
use cipher::{BlockDecryptMut, BlockEncryptMut, KeyInit};
use md5::{Digest, Md5};

use crate::error::{FetchError, Result};

type Aes128EcbEnc = ecb::Encryptor<Aes128>;
type Aes128EcbDec = ecb::Decryptor<Aes128>;

const EAPI_KEY: &[u8; 16] = b"e82ckenh8dichen8";

/// Encrypt `params` (a compact JSON string) for `path` into the EAPI wire
/// form: `{url_path}-36cd479b6b5-{params}-36cd479b6b5-{digest}`, AES-ECB
/// encrypted and hex-encoded.
pub fn eapi_params_encrypt(path: &str, params: &str) -> Result<String> {
    let message = format!("nobody{path}use{params}md5forencrypt");
    let mut hasher = Md5::new();
    hasher.update(message.as_bytes());
    let digest = hex::encode(hasher.finalize());

    let data = format!("{path}-36cd479b6b5-{params}-36cd479b6b5-{digest}");

    let enc = Aes128EcbEnc::new_from_slice(EAPI_KEY).expect("EAPI_KEY is a fixed 16-byte literal");
    let ciphertext = enc.encrypt_padded_vec_mut::<Pkcs7>(data.as_bytes());
    Ok(hex::encode_upper(ciphertext))
}

/// Decrypt a hex-encoded EAPI response body back to its plaintext JSON.
pub fn eapi_response_decrypt(body: &[u8]) -> Result<Vec<u8>> {
    let dec = Aes128EcbDec::new_from_slice(EAPI_KEY).expect("EAPI_KEY is a fixed 16-byte literal");
    dec.decrypt_padded_vec_mut::<Pkcs7>(body)
        .map_err(|e| FetchError::Decrypt(format!("eapi response: {e}")))
}

/// Deterministic synthetic username derived from a device id, used during
/// NE anonymous-session bootstrap.
pub fn anonymous_username(device_id: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(device_id.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_decrypt_inverts_params_encrypt() {
        let path = "/api/song/lyric/v1";
        let params = r#"{"id":123,"lv":-1,"tv":-1}"#;
        let encrypted_hex = eapi_params_encrypt(path, params).unwrap();
        let raw = hex::decode(&encrypted_hex).unwrap();
        let decrypted = eapi_response_decrypt(&raw).unwrap();
        let decrypted_str = String::from_utf8(decrypted).unwrap();
        // The encrypted payload embeds path/params/digest joined by the
        // `-36cd479b6b5-` separator, not the raw params alone.
        assert!(decrypted_str.contains(params));
        assert!(decrypted_str.starts_with(path));
    }

    #[test]
    fn anonymous_username_is_deterministic() {
        let a = anonymous_username("device-1");
        let b = anonymous_username("device-1");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }
}
