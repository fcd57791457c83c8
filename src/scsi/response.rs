//! Variable-length response protocol
//!
//! Some MMC queries answer with a fixed header followed by N fixed-size
//! descriptors, where N is only known at run time. The exchange is done in two
//! phases: probe with a header-sized buffer to learn the declared length, then
//! fetch the whole payload. Drives are not always consistent between the two
//! phases, so the declared length is sanitised and the fetch is re-issued once if
//! the drive declares more than was asked for.

use std::marker::PhantomData;

use crate::error::{Result, RustBurnError};
use tracing::{debug, info, warn};

use super::constants::MAX_RESPONSE_SIZE;

/// A fixed-size record trailing a response header
pub trait Descriptor: Sized {
    const SIZE: usize;

    /// `raw` is exactly `SIZE` bytes
    fn parse(raw: &[u8]) -> Self;
}

/// A command whose response follows the header + descriptors shape
pub trait VariableLengthQuery {
    const HEADER_SIZE: usize;

    /// Patch the "maximum number of descriptors" field of the CDB
    fn set_descriptor_count(&mut self, count: u16);

    /// Total response size declared by `header`, including the bytes in front of
    /// and inside the length field itself
    fn declared_size(header: &[u8]) -> usize;

    fn issue(&mut self, buffer: &mut [u8]) -> Result<usize>;
}

/// Header plus descriptors as returned by the drive. The effective length is
/// tracked next to the buffer and never exceeds it.
#[derive(Debug, Clone)]
pub struct VariableResponse<D> {
    buffer: Vec<u8>,
    header_size: usize,
    requested: usize,
    declared: usize,
    fetches: usize,
    _descriptor: PhantomData<D>,
}

impl<D: Descriptor> VariableResponse<D> {
    /// Size actually trusted: the smaller of what was requested and what the drive declared
    pub fn data_len(&self) -> usize {
        self.requested.min(self.declared).min(self.buffer.len())
    }

    pub fn data(&self) -> &[u8] {
        &self.buffer[..self.data_len()]
    }

    pub fn header(&self) -> &[u8] {
        let end = self.header_size.min(self.data_len());
        &self.buffer[..end]
    }

    pub fn requested_size(&self) -> usize {
        self.requested
    }

    pub fn declared_size(&self) -> usize {
        self.declared
    }

    /// Number of full-payload fetches that were needed (1 or 2)
    pub fn fetches(&self) -> usize {
        self.fetches
    }

    pub fn descriptor_count(&self) -> usize {
        self.data_len().saturating_sub(self.header_size) / D::SIZE
    }

    pub fn descriptors(&self) -> impl Iterator<Item = D> + '_ {
        let body = &self.buffer[self.header_size.min(self.data_len())..self.data_len()];
        body.chunks_exact(D::SIZE).map(D::parse)
    }
}

/// Sanitise a declared response size before allocating for it
pub fn correct_request_size(request: usize, header_size: usize, descriptor_size: usize) -> usize {
    debug_assert!(descriptor_size > 0);

    if request > MAX_RESPONSE_SIZE {
        info!(
            "Oversized data ({}) setting to max ({})",
            request, MAX_RESPONSE_SIZE
        );
        MAX_RESPONSE_SIZE
    } else if request < header_size {
        info!(
            "Undersized data ({}) setting to max ({})",
            request, MAX_RESPONSE_SIZE
        );
        MAX_RESPONSE_SIZE
    } else if (request - header_size) % descriptor_size != 0 {
        info!(
            "Unaligned data ({}) setting to max ({})",
            request, MAX_RESPONSE_SIZE
        );
        MAX_RESPONSE_SIZE
    } else {
        request
    }
}

/// Allocate for `declared` bytes (after correction) and issue the full query.
/// Returns the buffer and the corrected request size.
fn fetch<D: Descriptor, Q: VariableLengthQuery + ?Sized>(
    cmd: &mut Q,
    declared: usize,
) -> Result<(Vec<u8>, usize)> {
    let request = correct_request_size(declared, Q::HEADER_SIZE, D::SIZE);
    let count = (request - Q::HEADER_SIZE) / D::SIZE;

    let mut buffer = vec![0u8; request];
    cmd.set_descriptor_count(count.min(u16::MAX as usize) as u16);
    let transferred = cmd.issue(&mut buffer)?;
    if transferred == 0 {
        return Err(RustBurnError::scsi("Empty response to full query"));
    }

    Ok((buffer, request))
}

/// Run the two-phase query against `cmd`
pub fn query<D: Descriptor, Q: VariableLengthQuery + ?Sized>(
    cmd: &mut Q,
) -> Result<VariableResponse<D>> {
    // Phase 1: header only, no descriptors
    let mut header = vec![0u8; Q::HEADER_SIZE];
    cmd.set_descriptor_count(0);
    let transferred = cmd.issue(&mut header)?;
    if transferred == 0 {
        return Err(RustBurnError::scsi("Empty response to header probe"));
    }
    let first_declared = Q::declared_size(&header);
    debug!("Header probe declared {} bytes", first_declared);

    // Phase 2: the payload
    let (mut buffer, mut requested) = fetch::<D, Q>(cmd, first_declared)?;
    let mut received = Q::declared_size(&buffer);
    let mut fetches = 1;

    if requested < received {
        // Some drives declare more on the second call than on the first one
        warn!(
            "Sizes mismatch asked {} / received {}, re-issuing the command with received size",
            requested, received
        );
        let (retry_buffer, retry_requested) = fetch::<D, Q>(cmd, received)?;
        buffer = retry_buffer;
        requested = retry_requested;
        received = Q::declared_size(&buffer);
        fetches = 2;
    } else if requested > received {
        debug!("Sizes mismatch asked {} / received {}", requested, received);
    }

    Ok(VariableResponse {
        buffer,
        header_size: Q::HEADER_SIZE,
        requested,
        declared: received,
        fetches,
        _descriptor: PhantomData,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 4 byte length + 4 byte flags header, 8 byte descriptors
    struct FakeQuery {
        script: Vec<Vec<u8>>,
        counts: Vec<u16>,
        issued: usize,
        fail_at: Option<usize>,
    }

    #[derive(Debug, PartialEq)]
    struct Pair(u32, u32);

    impl Descriptor for Pair {
        const SIZE: usize = 8;
        fn parse(raw: &[u8]) -> Self {
            Pair(
                u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]),
                u32::from_be_bytes([raw[4], raw[5], raw[6], raw[7]]),
            )
        }
    }

    impl FakeQuery {
        fn new(script: Vec<Vec<u8>>) -> Self {
            Self {
                script,
                counts: Vec::new(),
                issued: 0,
                fail_at: None,
            }
        }
    }

    impl VariableLengthQuery for FakeQuery {
        const HEADER_SIZE: usize = 8;

        fn set_descriptor_count(&mut self, count: u16) {
            self.counts.push(count);
        }

        fn declared_size(header: &[u8]) -> usize {
            u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize + 4
        }

        fn issue(&mut self, buffer: &mut [u8]) -> Result<usize> {
            let index = self.issued;
            self.issued += 1;
            if self.fail_at == Some(index) {
                return Err(RustBurnError::scsi_device("Medium not present"));
            }
            let reply = self
                .script
                .get(index)
                .ok_or_else(|| RustBurnError::scsi("script exhausted"))?;
            let n = reply.len().min(buffer.len());
            buffer[..n].copy_from_slice(&reply[..n]);
            Ok(n)
        }
    }

    /// Response declaring `len` in its header and holding `descs` descriptors
    fn response(len: u32, descs: u32) -> Vec<u8> {
        let mut out = len.to_be_bytes().to_vec();
        out.extend_from_slice(&[0; 4]);
        for i in 0..descs {
            out.extend_from_slice(&i.to_be_bytes());
            out.extend_from_slice(&(i * 10).to_be_bytes());
        }
        out
    }

    #[test]
    fn test_correct_request_size_bounds() {
        assert_eq!(correct_request_size(24, 8, 8), 24);
        assert_eq!(correct_request_size(4096, 8, 8), MAX_RESPONSE_SIZE);
        assert_eq!(correct_request_size(27, 8, 8), MAX_RESPONSE_SIZE);
        assert_eq!(correct_request_size(4, 8, 8), MAX_RESPONSE_SIZE);
        assert_eq!(correct_request_size(8, 8, 8), 8);
    }

    #[test]
    fn test_consistent_drive_single_fetch() {
        // 2 descriptors: 8 header + 16 = 24 bytes total, length field = 20
        let mut q = FakeQuery::new(vec![response(20, 0), response(20, 2)]);
        let resp: VariableResponse<Pair> = query(&mut q).unwrap();

        assert_eq!(resp.fetches(), 1);
        assert_eq!(resp.data_len(), 24);
        assert_eq!(q.counts, vec![0, 2]);
        let descs: Vec<Pair> = resp.descriptors().collect();
        assert_eq!(descs, vec![Pair(0, 0), Pair(1, 10)]);
    }

    #[test]
    fn test_drive_declares_more_on_second_call() {
        // probe says 1 descriptor, payload says 3, retry gets all 3
        let mut q = FakeQuery::new(vec![response(12, 0), response(28, 1), response(28, 3)]);
        let resp: VariableResponse<Pair> = query(&mut q).unwrap();

        assert_eq!(resp.fetches(), 2);
        assert_eq!(q.issued, 3);
        assert_eq!(q.counts, vec![0, 1, 3]);
        assert_eq!(resp.data_len(), 32);
        assert_eq!(resp.descriptor_count(), 3);
    }

    #[test]
    fn test_never_more_than_two_fetches() {
        // drive keeps growing its declared length
        let mut q = FakeQuery::new(vec![
            response(12, 0),
            response(20, 1),
            response(28, 2),
            response(36, 3),
        ]);
        let resp: VariableResponse<Pair> = query(&mut q).unwrap();

        assert_eq!(q.issued, 3);
        assert_eq!(resp.fetches(), 2);
        // requested 24 on the retry, drive declared 32: trust the smaller
        assert_eq!(resp.requested_size(), 24);
        assert_eq!(resp.data_len(), 24);
        assert_eq!(resp.descriptor_count(), 2);
    }

    #[test]
    fn test_drive_declares_less_truncates() {
        let mut q = FakeQuery::new(vec![response(28, 0), response(12, 1)]);
        let resp: VariableResponse<Pair> = query(&mut q).unwrap();

        assert_eq!(resp.fetches(), 1);
        assert_eq!(resp.requested_size(), 32);
        assert_eq!(resp.data_len(), 16);
        assert_eq!(resp.descriptor_count(), 1);
    }

    #[test]
    fn test_unaligned_probe_uses_max_buffer() {
        let mut q = FakeQuery::new(vec![response(13, 0), response(12, 1)]);
        let resp: VariableResponse<Pair> = query(&mut q).unwrap();

        assert_eq!(resp.requested_size(), MAX_RESPONSE_SIZE);
        assert_eq!(q.counts[1] as usize, (MAX_RESPONSE_SIZE - 8) / 8);
        assert_eq!(resp.data_len(), 16);
    }

    #[test]
    fn test_transport_failure_propagates() {
        let mut q = FakeQuery::new(vec![response(20, 0), response(20, 2)]);
        q.fail_at = Some(1);
        let result: Result<VariableResponse<Pair>> = query(&mut q);
        assert!(matches!(result, Err(RustBurnError::ScsiDevice(_))));
    }

    #[test]
    fn test_empty_probe_is_failure() {
        let mut q = FakeQuery::new(vec![Vec::new()]);
        let result: Result<VariableResponse<Pair>> = query(&mut q);
        assert!(result.is_err());
    }
}
