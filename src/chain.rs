//! Builds chains of coders, where each stage owns the next one, and drives a
//! coder over whole buffers.

use crate::error::Error;
use crate::simple::{FilterCoder, Transform};
use crate::stream::{Action, Coder, InBuf, OutBuf, Status};
use crate::FilterOptions;

/// A callback that creates one stage of the chain, given the stage that
/// follows it.
type StageInit =
    Box<dyn FnOnce(Option<Box<dyn Coder>>) -> Result<Box<dyn Coder>, Error>>;

/// Wrap 'transform' in a buffered filter coder that forwards its output to
/// 'next', and return the result as a single coder that can be chained
/// further.
pub fn simple_coder_init<T: Transform + 'static>(
    next: Option<Box<dyn Coder>>,
    transform: T,
    max_unfiltered: usize,
    is_encoder: bool,
    options: &FilterOptions,
) -> Result<Box<dyn Coder>, Error> {
    let coder =
        FilterCoder::new(next, transform, max_unfiltered, is_encoder, options)?;
    Ok(Box::new(coder))
}

/// Collects the stages of a chain, outermost first, and links them together.
#[derive(Default)]
pub struct Chain {
    /// The stage constructors, in the order they were added.
    stages: Vec<StageInit>,
    /// The coder at the end of the chain, if any.
    last: Option<Box<dyn Coder>>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter stage. The first stage added receives the caller's
    /// input.
    pub fn filter<T: Transform + 'static>(
        mut self,
        transform: T,
        max_unfiltered: usize,
        is_encoder: bool,
        options: FilterOptions,
    ) -> Self {
        self.stages.push(Box::new(move |next| {
            let opts = &options;
            simple_coder_init(next, transform, max_unfiltered, is_encoder, opts)
        }));
        self
    }

    /// Set the coder that receives the output of the last filter, for example
    /// the entropy coder.
    pub fn last(mut self, coder: Box<dyn Coder>) -> Self {
        self.last = Some(coder);
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len() + usize::from(self.last.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Create the stages, back to front, so that each one owns its successor.
    pub fn build(self) -> Result<Box<dyn Coder>, Error> {
        log::debug!("Building a chain of {} coders", self.len());
        let mut next = self.last;
        for init in self.stages.into_iter().rev() {
            next = Some(init(next)?);
        }
        next.ok_or(Error::Program("empty coder chain"))
    }
}

/// Run 'coder' over all of 'input', feeding it and draining it in chunks of
/// 'chunk_size' bytes, and finish the stream. Returns the output.
pub fn code_buffer(
    coder: &mut dyn Coder,
    input: &[u8],
    chunk_size: usize,
) -> Result<Vec<u8>, Error> {
    let chunk_size = chunk_size.max(1);
    let mut output = Vec::with_capacity(input.len());
    let mut out_chunk = vec![0u8; chunk_size];

    for chunk in input.chunks(chunk_size) {
        let mut inbuf = InBuf::new(chunk);
        loop {
            let mut outbuf = OutBuf::new(&mut out_chunk);
            let res = coder.code(&mut inbuf, &mut outbuf, Action::Run);
            output.extend_from_slice(outbuf.written());
            match res {
                Ok(Status::StreamEnd) => return Ok(output),
                Ok(Status::NeedOutput) => {}
                Ok(Status::NeedInput) if inbuf.is_empty() => break,
                Ok(Status::NeedInput) => {}
                // Everything was consumed and there was nothing to flush.
                Err(Error::Buf) if inbuf.is_empty() => break,
                Err(err) => return Err(err),
            }
        }
    }

    loop {
        let mut inbuf = InBuf::new(&[]);
        let mut outbuf = OutBuf::new(&mut out_chunk);
        let status = coder.code(&mut inbuf, &mut outbuf, Action::Finish)?;
        output.extend_from_slice(outbuf.written());
        if status == Status::StreamEnd {
            log::debug!("Coded {} bytes into {}", input.len(), output.len());
            return Ok(output);
        }
    }
}
