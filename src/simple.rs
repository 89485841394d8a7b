//! The buffered engine behind the "simple" filters. A simple filter rewrites
//! bytes in place (for example to turn relative branch addresses into
//! absolute ones) and may need a few bytes of lookahead before it can decide
//! what to do with a byte. The engine owns a small temporary buffer, feeds the
//! transform, and hands the filtered bytes to the next coder in the chain.
//!
//! The buffer is split by three indices:
//!
//! ```text
//!  0          pos          filtered          size          capacity
//!  | flushed  | filtered,   | raw, waiting   |  free        |
//!  |          | to flush    | for transform  |              |
//! ```

use crate::error::Error;
use crate::stream::{Action, Coder, InBuf, OutBuf, Status};
use crate::FilterOptions;

/// The byte rewriting logic of a single filter, together with its state.
pub trait Transform: Send {
    /// Filter a prefix of 'buffer' in place and return the length of the
    /// prefix. 'now_pos' is the low 32 bits of the absolute stream position of
    /// buffer[0]. Returning zero is allowed only when the transform needs more
    /// lookahead than 'buffer' holds.
    fn filter(&mut self, now_pos: u32, is_encoder: bool, buffer: &mut [u8])
        -> usize;

    /// Returns true if the bytes that are left unfiltered at the end of the
    /// stream (because they are shorter than the lookahead window) may be
    /// passed through as they are. Both directions leave them untouched, so
    /// round trips are preserved.
    fn unfiltered_tail_allowed(&self) -> bool {
        true
    }
}

/// A coder that runs a [`Transform`] over the stream and forwards the result to
/// the next coder.
pub struct FilterCoder<T: Transform> {
    /// Next coder in the chain. None means that filtered bytes are copied
    /// directly into the output.
    next: Option<Box<dyn Coder>>,
    /// Set when the next coder returned StreamEnd.
    next_finished: bool,
    /// Set when no more input will arrive, either because the caller finished
    /// the stream or because 'uncompressed_size' bytes were consumed.
    end_was_reached: bool,
    /// Selects the encoding or the decoding direction of the transform.
    is_encoder: bool,
    /// Number of bytes *left* to consume, or None if unknown.
    uncompressed_size: Option<u64>,
    /// The filter logic and its state.
    transform: T,
    /// Low 32 bits of the position of buffer[filtered] in the stream.
    now_pos: u32,
    /// buffer[pos] is the next byte to flush.
    pos: usize,
    /// buffer[filtered] is the first byte that was not filtered yet.
    filtered: usize,
    /// Number of bytes in the buffer (filtered and unfiltered).
    size: usize,
    /// Temporary buffer.
    buffer: Box<[u8]>,
    /// Set after a fatal error.
    poisoned: bool,
}

impl<T: Transform> FilterCoder<T> {
    /// Creates a new filter coder. 'max_unfiltered' is the largest number of
    /// bytes that 'transform' may leave unfiltered at the end of the region it
    /// was given.
    pub fn new(
        next: Option<Box<dyn Coder>>,
        transform: T,
        max_unfiltered: usize,
        is_encoder: bool,
        options: &FilterOptions,
    ) -> Result<Self, Error> {
        let uncompressed_size = options.validated_size()?;
        let capacity = max_unfiltered.max(1).checked_mul(2).ok_or(Error::Mem)?;

        let mut buffer = Vec::new();
        buffer.try_reserve_exact(capacity).map_err(|_| Error::Mem)?;
        buffer.resize(capacity, 0);

        log::debug!(
            "New filter coder: capacity={} size={:?} encoder={} next={}",
            capacity,
            uncompressed_size,
            is_encoder,
            next.is_some()
        );

        Ok(Self {
            next,
            next_finished: false,
            end_was_reached: false,
            is_encoder,
            uncompressed_size,
            transform,
            now_pos: 0,
            pos: 0,
            filtered: 0,
            size: 0,
            buffer: buffer.into_boxed_slice(),
            poisoned: false,
        })
    }

    /// The size of the temporary buffer.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Returns the (pos, filtered, size) indices of the temporary buffer.
    pub fn buffered(&self) -> (usize, usize, usize) {
        (self.pos, self.filtered, self.size)
    }

    /// Low 32 bits of the number of bytes that went through the transform.
    pub fn now_pos(&self) -> u32 {
        self.now_pos
    }

    /// Returns true if the transform runs in the encoding direction.
    pub fn is_encoder(&self) -> bool {
        self.is_encoder
    }

    /// Returns true if all of the input was consumed, filtered and flushed,
    /// and the next coder ended its stream.
    pub fn is_finished(&self) -> bool {
        self.end_was_reached
            && self.size == 0
            && (self.next_finished || self.next.is_none())
    }

    /// Check the ordering of the buffer indices.
    fn verify(&self) -> Result<(), Error> {
        if self.pos <= self.filtered
            && self.filtered <= self.size
            && self.size <= self.buffer.len()
        {
            return Ok(());
        }
        Err(Error::Program("filter buffer indices out of order"))
    }

    /// Hand buffer[pos..filtered] to the next coder, or copy it into the
    /// output. With nothing pending, this lets the next coder drain what it
    /// still holds. Returns true if anything moved.
    fn flush(&mut self, output: &mut OutBuf) -> Result<bool, Error> {
        let pending = &self.buffer[self.pos..self.filtered];
        let out_before = output.pos();

        let consumed = match self.next.as_mut() {
            None => output.copy_from(pending),
            Some(_) if self.next_finished && pending.is_empty() => 0,
            Some(next) => {
                if self.next_finished {
                    log::warn!("The next coder ended too early");
                    return Err(Error::Data("next coder ended early"));
                }
                let mut slice = InBuf::new(pending);
                match next.code(&mut slice, output, Action::Run) {
                    Ok(Status::StreamEnd) => {
                        self.next_finished = true;
                        if !slice.is_empty() {
                            log::warn!("The next coder ended too early");
                            return Err(Error::Data("next coder ended early"));
                        }
                    }
                    Ok(_) => {}
                    // The next coder stalled. Whether this call made any
                    // progress is decided below.
                    Err(Error::Buf) => {}
                    Err(err) => return Err(err),
                }
                slice.pos()
            }
        };

        self.pos += consumed;
        Ok(consumed > 0 || output.pos() > out_before)
    }

    /// Move the unfiltered bytes to the start of the buffer once everything
    /// before them was flushed.
    fn compact(&mut self) {
        debug_assert!(self.pos == self.filtered);
        if self.pos == self.size {
            self.pos = 0;
            self.filtered = 0;
            self.size = 0;
            return;
        }

        if self.pos > 0 {
            log::trace!("Compacting {} raw bytes", self.size - self.filtered);
            self.buffer.copy_within(self.filtered..self.size, 0);
            self.size -= self.filtered;
            self.pos = 0;
            self.filtered = 0;
        }
    }

    /// Copy input into the free part of the buffer, never past the declared
    /// uncompressed size. Returns true if anything changed.
    fn fill(
        &mut self,
        input: &mut InBuf,
        action: Action,
    ) -> Result<bool, Error> {
        let free = self.buffer.len() - self.size;
        let mut len = input.remaining().len().min(free);
        if let Some(left) = self.uncompressed_size {
            len = len.min(usize::try_from(left).unwrap_or(usize::MAX));
        }

        self.buffer[self.size..self.size + len]
            .copy_from_slice(&input.remaining()[..len]);
        input.advance(len);
        self.size += len;

        if let Some(left) = self.uncompressed_size.as_mut() {
            *left -= len as u64;
            if *left == 0 {
                if !input.is_empty() {
                    log::warn!("Input exceeds the declared uncompressed size");
                    return Err(Error::Data("input exceeds uncompressed size"));
                }
                self.end_was_reached = true;
                return Ok(true);
            }
        }

        if action == Action::Finish && input.is_empty() {
            if self.uncompressed_size.is_some() {
                log::warn!("Input ended before the declared uncompressed size");
                return Err(Error::Data("input shorter than uncompressed size"));
            }
            self.end_was_reached = true;
            return Ok(true);
        }

        Ok(len > 0)
    }

    /// Run the transform over the raw bytes. Returns true if it consumed any.
    fn filter(&mut self) -> Result<bool, Error> {
        if self.filtered == self.size {
            return Ok(false);
        }

        let raw = &mut self.buffer[self.filtered..self.size];
        let len = raw.len();
        let done = self.transform.filter(self.now_pos, self.is_encoder, raw);
        if done > len {
            return Err(Error::Program("transform overran its buffer"));
        }

        self.filtered += done;
        self.now_pos = self.now_pos.wrapping_add(done as u32);
        Ok(done > 0)
    }

    /// Tell the next coder that the stream is over. Returns true once it
    /// reported the end of its own stream.
    fn finish_next(&mut self, output: &mut OutBuf) -> Result<bool, Error> {
        if self.next_finished {
            return Ok(true);
        }

        let Some(next) = self.next.as_mut() else {
            return Ok(true);
        };

        match next.code(&mut InBuf::new(&[]), output, Action::Finish) {
            Ok(Status::StreamEnd) => self.next_finished = true,
            Ok(_) | Err(Error::Buf) => {}
            Err(err) => return Err(err),
        }
        Ok(self.next_finished)
    }

    fn code_impl(
        &mut self,
        input: &mut InBuf,
        output: &mut OutBuf,
        action: Action,
    ) -> Result<Status, Error> {
        if self.is_finished() {
            return Ok(Status::StreamEnd);
        }

        let in_before = input.pos();
        let out_before = output.pos();
        let empty_request = input.is_empty() && output.is_full();
        let mut progress = false;

        // The next coder may hold output from a call that ran out of space.
        if self.pos == self.filtered && !self.end_was_reached {
            progress |= self.flush(output)?;
        }

        loop {
            // Flush the filtered bytes. Don't read more input before they are
            // gone.
            if self.pos < self.filtered {
                progress |= self.flush(output)?;
                if self.pos < self.filtered {
                    break;
                }
            }

            self.compact();

            if self.end_was_reached {
                if !input.is_empty() {
                    log::warn!("Input continues past the end of the stream");
                    return Err(Error::Data("input past the end of the stream"));
                }

                // The last few bytes were too short for the transform.
                if self.size > 0 {
                    if !self.transform.unfiltered_tail_allowed() {
                        log::warn!("Stream ended with {} raw bytes", self.size);
                        return Err(Error::Data("unexpected end of input"));
                    }
                    let tail = self.size - self.filtered;
                    self.now_pos = self.now_pos.wrapping_add(tail as u32);
                    self.filtered = self.size;
                    continue;
                }

                if self.finish_next(output)? {
                    log::trace!("Filter reached the end of the stream");
                    return Ok(Status::StreamEnd);
                }
                break;
            }

            let mut moved = self.fill(input, action)?;
            moved |= self.filter()?;
            progress |= moved;
            if !moved && !self.end_was_reached {
                break;
            }
        }

        self.verify()?;

        let progress =
            progress || input.pos() > in_before || output.pos() > out_before;
        if !progress && !empty_request {
            return Err(Error::Buf);
        }

        if output.is_full() {
            return Ok(Status::NeedOutput);
        }
        Ok(Status::NeedInput)
    }
}

impl<T: Transform> Coder for FilterCoder<T> {
    fn code(
        &mut self,
        input: &mut InBuf,
        output: &mut OutBuf,
        action: Action,
    ) -> Result<Status, Error> {
        if self.poisoned {
            return Err(Error::Program("coder used after a fatal error"));
        }

        let res = self.code_impl(input, output, action);
        if let Err(err) = res {
            if !err.is_recoverable() {
                self.poisoned = true;
            }
        }
        res
    }
}
