//! Transforms and drivers shared by the integration tests.

#![allow(dead_code)]

use coderchain::{
    Action, Coder, Error, FilterCoder, InBuf, OutBuf, Status, Transform,
};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A toy branch converter: the four bytes after each 0xE8 marker hold an
/// address that is made absolute when encoding and relative when decoding.
/// Needs five bytes of lookahead.
pub struct CallMarker;

impl Transform for CallMarker {
    fn filter(
        &mut self,
        now_pos: u32,
        is_encoder: bool,
        buffer: &mut [u8],
    ) -> usize {
        let mut i = 0;
        while i + 5 <= buffer.len() {
            if buffer[i] != 0xE8 {
                i += 1;
                continue;
            }
            let mut word = [0u8; 4];
            word.copy_from_slice(&buffer[i + 1..i + 5]);
            let src = u32::from_le_bytes(word);
            let pos = now_pos.wrapping_add(i as u32 + 5);
            let dest = if is_encoder {
                src.wrapping_add(pos)
            } else {
                src.wrapping_sub(pos)
            };
            buffer[i + 1..i + 5].copy_from_slice(&dest.to_le_bytes());
            i += 5;
        }
        i
    }
}

/// Mixes every byte with its position. No lookahead.
pub struct PosXor;

impl Transform for PosXor {
    fn filter(&mut self, now_pos: u32, _: bool, buffer: &mut [u8]) -> usize {
        for (i, byte) in buffer.iter_mut().enumerate() {
            *byte ^= (now_pos.wrapping_add(i as u32) as u8) ^ 0x5A;
        }
        buffer.len()
    }
}

/// Adds the position to every aligned 32-bit word, and refuses to leave a
/// partial word behind at the end of the stream.
pub struct StrictWords;

impl Transform for StrictWords {
    fn filter(
        &mut self,
        now_pos: u32,
        is_encoder: bool,
        buffer: &mut [u8],
    ) -> usize {
        let len = buffer.len() / 4 * 4;
        for (i, word) in buffer[..len].chunks_exact_mut(4).enumerate() {
            let mut val = [0u8; 4];
            val.copy_from_slice(word);
            let val = u32::from_le_bytes(val);
            let pos = now_pos.wrapping_add(i as u32 * 4);
            let val = if is_encoder {
                val.wrapping_add(pos)
            } else {
                val.wrapping_sub(pos)
            };
            word.copy_from_slice(&val.to_le_bytes());
        }
        len
    }

    fn unfiltered_tail_allowed(&self) -> bool {
        false
    }
}

/// Check the ordering of the buffer indices of 'coder'.
pub fn assert_invariant<T: Transform>(coder: &FilterCoder<T>) {
    let (pos, filtered, size) = coder.buffered();
    assert!(pos <= filtered, "pos {} > filtered {}", pos, filtered);
    assert!(filtered <= size, "filtered {} > size {}", filtered, size);
    assert!(size <= coder.capacity(), "size {} > capacity", size);
}

/// Feed 'input' to 'coder' until the stream ends. Each call gets the next
/// (input, output) chunk sizes from 'sizes', cycling. The buffer invariant is
/// checked after every call.
pub fn run_chunked<T: Transform>(
    coder: &mut FilterCoder<T>,
    input: &[u8],
    sizes: &[(usize, usize)],
) -> Result<Vec<u8>, Error> {
    assert!(!sizes.is_empty());
    let mut output = Vec::new();
    let mut consumed = 0;

    for step in 0..10_000_000 {
        let (in_len, out_len) = sizes[step % sizes.len()];
        let end = (consumed + in_len.max(1)).min(input.len());
        let action = if end == input.len() {
            Action::Finish
        } else {
            Action::Run
        };

        let mut out = vec![0u8; out_len.max(1)];
        let mut inbuf = InBuf::new(&input[consumed..end]);
        let mut outbuf = OutBuf::new(&mut out);
        let res = coder.code(&mut inbuf, &mut outbuf, action);
        consumed += inbuf.pos();
        output.extend_from_slice(outbuf.written());
        assert_invariant(coder);

        if res? == Status::StreamEnd {
            assert_eq!(consumed, input.len());
            return Ok(output);
        }
    }
    panic!("The coder did not finish");
}

/// Generate a buffer with plenty of 0xE8 markers.
pub fn get_test_data(len: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(len);
    let mut v: u32 = 7;
    for i in 0..len {
        v = v.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        if i % 11 == 3 {
            data.push(0xE8);
        } else {
            data.push((v >> 16) as u8);
        }
    }
    data
}
