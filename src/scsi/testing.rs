//! In-memory transport used by the protocol tests

use std::collections::VecDeque;

use crate::error::{Result, RustBurnError};

use super::core::ScsiTransport;
use super::types::Direction;

pub(crate) enum Reply {
    Data(Vec<u8>),
    Fail,
}

#[derive(Debug, Clone)]
pub(crate) struct SentCommand {
    pub cdb: Vec<u8>,
    pub direction: Direction,
    pub buffer_len: usize,
    pub timeout_secs: u32,
}

/// Answers each command with the next scripted reply, copying as much as fits
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    replies: VecDeque<Reply>,
    calls: Vec<SentCommand>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_data(&mut self, data: Vec<u8>) {
        self.replies.push_back(Reply::Data(data));
    }

    pub fn push_failure(&mut self) {
        self.replies.push_back(Reply::Fail);
    }

    pub fn calls(&self) -> &[SentCommand] {
        &self.calls
    }
}

impl ScsiTransport for ScriptedTransport {
    fn execute(
        &mut self,
        cdb: &[u8],
        direction: Direction,
        buffer: &mut [u8],
        timeout_secs: u32,
    ) -> Result<usize> {
        self.calls.push(SentCommand {
            cdb: cdb.to_vec(),
            direction,
            buffer_len: buffer.len(),
            timeout_secs,
        });

        match self.replies.pop_front() {
            Some(Reply::Data(data)) => {
                let n = data.len().min(buffer.len());
                buffer[..n].copy_from_slice(&data[..n]);
                Ok(n)
            }
            Some(Reply::Fail) => Err(RustBurnError::scsi_device("Invalid field in CDB")),
            None => Err(RustBurnError::scsi_transport(5, "no scripted reply")),
        }
    }
}
