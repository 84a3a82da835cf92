//! QMC1 per-byte XOR keystream, used to strip the 11-byte envelope from
//! "local QRC" payloads (`local=true` callers only — upstream QRC never
//! uses this).

const QMC1_KEY: [u8; 11] = [
    0x77, 0x21, 0x35, 0x5C, 0x47, 0x8A, 0x8D, 0x62, 0x40, 0xED, 0x2F,
];

/// XOR each byte of `data` with a position-derived keystream byte.
pub fn qmc1_xor(data: &[u8]) -> Vec<u8> {
    data.iter()
        .enumerate()
        .map(|(i, &b)| b ^ QMC1_KEY[i % QMC1_KEY.len()])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applied_twice_returns_original() {
        let data = b"some local qrc envelope bytes".to_vec();
        let once = qmc1_xor(&data);
        let twice = qmc1_xor(&once);
        assert_eq!(twice, data);
    }
}
