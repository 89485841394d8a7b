//! This is a simple coder that copies the input to the output and does not
//! change it. It terminates chains and stands in for real downstream coders.

use crate::error::Error;
use crate::stream::{Action, Coder, InBuf, OutBuf, Status};

#[derive(Default)]
pub struct NopCoder {
    /// Set once the end of the stream was reported.
    finished: bool,
}

impl NopCoder {
    pub fn new() -> Self {
        Self { finished: false }
    }
}

impl Coder for NopCoder {
    fn code(
        &mut self,
        input: &mut InBuf,
        output: &mut OutBuf,
        action: Action,
    ) -> Result<Status, Error> {
        if self.finished {
            return Ok(Status::StreamEnd);
        }

        let copied = output.copy_from(input.remaining());
        input.advance(copied);

        if !input.is_empty() {
            return Ok(Status::NeedOutput);
        }
        if action == Action::Finish {
            self.finished = true;
            return Ok(Status::StreamEnd);
        }
        Ok(Status::NeedInput)
    }
}
