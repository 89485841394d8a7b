#![no_main]

use coderchain::{code_buffer, simple_coder_init, FilterOptions, Transform};
use libfuzzer_sys::fuzz_target;

/// Rewrites the word after each 0xE8 marker, with five bytes of lookahead.
struct CallMarker;

impl Transform for CallMarker {
    fn filter(
        &mut self,
        now_pos: u32,
        is_encoder: bool,
        buf: &mut [u8],
    ) -> usize {
        let mut i = 0;
        while i + 5 <= buf.len() {
            if buf[i] != 0xE8 {
                i += 1;
                continue;
            }
            let mut word = [0u8; 4];
            word.copy_from_slice(&buf[i + 1..i + 5]);
            let src = u32::from_le_bytes(word);
            let pos = now_pos.wrapping_add(i as u32 + 5);
            let dest = if is_encoder {
                src.wrapping_add(pos)
            } else {
                src.wrapping_sub(pos)
            };
            buf[i + 1..i + 5].copy_from_slice(&dest.to_le_bytes());
            i += 5;
        }
        i
    }
}

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }
    let chunk_size = data[0] as usize + 1;
    let data = &data[1..];
    let options = FilterOptions::new();

    let mut encoder =
        simple_coder_init(None, CallMarker, 4, true, &options).unwrap();
    let encoded = code_buffer(encoder.as_mut(), data, chunk_size).unwrap();
    assert_eq!(encoded.len(), data.len());

    let options = FilterOptions::with_uncompressed_size(data.len() as u64);
    let mut decoder =
        simple_coder_init(None, CallMarker, 4, false, &options).unwrap();
    let decoded = code_buffer(decoder.as_mut(), &encoded, chunk_size).unwrap();
    assert_eq!(decoded, data);
});
