//! CRC-64 as used by the .xz container (ECMA-182 polynomial, reflected).

/// The reflected form of the ECMA-182 polynomial.
const POLY: u64 = 0xC96C_5795_D787_0F42;

const fn make_table() -> [u64; 256] {
    let mut table = [0u64; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u64;
        let mut bit = 0;
        while bit < 8 {
            if crc & 1 == 1 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Built at compile time, never modified.
static TABLE: [u64; 256] = make_table();

/// Continue the CRC 'crc' (the value returned for all of the previous bytes,
/// or zero at the start) over 'buf'.
pub fn crc64(buf: &[u8], crc: u64) -> u64 {
    let mut crc = !crc;
    for &byte in buf {
        crc = TABLE[((crc ^ byte as u64) & 0xff) as usize] ^ (crc >> 8);
    }
    !crc
}
