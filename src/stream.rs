//! The streaming interface that every stage of a coder chain implements, and
//! the cursors that track how much of the caller's buffers were used.

use crate::error::Error;

/// A read cursor over a caller-owned input slice.
pub struct InBuf<'a> {
    /// The input bytes.
    buf: &'a [u8],
    /// Index of the next unread byte.
    pos: usize,
}

impl<'a> InBuf<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// The number of bytes consumed so far.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// The bytes that were not consumed yet.
    pub fn remaining(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    pub fn is_empty(&self) -> bool {
        self.pos == self.buf.len()
    }

    /// Mark 'amt' more bytes as consumed.
    pub fn advance(&mut self, amt: usize) {
        debug_assert!(self.pos + amt <= self.buf.len(), "Advancing past end");
        self.pos += amt;
    }
}

/// A write cursor over a caller-owned output slice.
pub struct OutBuf<'a> {
    /// The output bytes.
    buf: &'a mut [u8],
    /// Index of the next byte to write.
    pos: usize,
}

impl<'a> OutBuf<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// The number of bytes written so far.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// The bytes written so far.
    pub fn written(&self) -> &[u8] {
        &self.buf[..self.pos]
    }

    /// The number of bytes that can still be written.
    pub fn available(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_full(&self) -> bool {
        self.pos == self.buf.len()
    }

    /// Copy as much of 'input' as fits and return the number of bytes copied.
    pub fn copy_from(&mut self, input: &[u8]) -> usize {
        let len = input.len().min(self.available());
        self.buf[self.pos..self.pos + len].copy_from_slice(&input[..len]);
        self.pos += len;
        len
    }
}

/// Tells a coder whether more input may follow the current call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// More input may arrive in later calls.
    Run,
    /// The input passed to this call (and to all the following calls) is the
    /// last input of the stream.
    Finish,
}

/// The outcome of a successful call to [`Coder::code`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// All the input was used. Call again with more input.
    NeedInput,
    /// The output is full. Call again with more output space.
    NeedOutput,
    /// The stream ended. The coder will not produce more output.
    StreamEnd,
}

/// A stream transformation stage. Stages are chained by letting each one own
/// the next stage and hand its output to it.
pub trait Coder: Send {
    /// Consume bytes from 'input' and write bytes into 'output', advancing
    /// both cursors. The call returns as soon as no further progress is
    /// possible, and the caller resumes by calling again with fresh buffers.
    fn code(
        &mut self,
        input: &mut InBuf,
        output: &mut OutBuf,
        action: Action,
    ) -> Result<Status, Error>;

    /// Release the coder, and with it every stage that it owns.
    fn end(self: Box<Self>) {}
}
