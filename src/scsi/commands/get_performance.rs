//! GET PERFORMANCE (MMC2 / MMC3)
//!
//! CDB layout (12 bytes):
//! ```text
//! 0      opcode 0xAC
//! 1      except:2 write:1 tolerance:2 reserved:3   (lowest bit first)
//! 2..6   starting LBA
//! 6..8   reserved
//! 8..10  maximum number of descriptors
//! 10     type
//! 11     control
//! ```

use tracing::debug;

use crate::error::Result;
use crate::scsi::command::ScsiCommand;
use crate::scsi::constants::{mmc_commands, performance_types};
use crate::scsi::core::ScsiTransport;
use crate::scsi::layout::{get_be32, set_be16, set_be32, BitLayout, BitOrder};
use crate::scsi::response::{self, Descriptor, VariableLengthQuery, VariableResponse};
use crate::scsi::types::{CommandInfo, Direction};

pub static GET_PERFORMANCE_INFO: CommandInfo = CommandInfo::new(
    mmc_commands::GET_PERFORMANCE,
    12,
    Direction::READ,
    "GET PERFORMANCE",
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CdbField {
    Except,
    Write,
    Tolerance,
    Reserved0,
}

pub const CDB_BYTE1_LE: BitLayout<CdbField> = BitLayout::new(
    BitOrder::LsbFirst,
    &[
        (CdbField::Except, 2),
        (CdbField::Write, 1),
        (CdbField::Tolerance, 2),
        (CdbField::Reserved0, 3),
    ],
);

pub const CDB_BYTE1_BE: BitLayout<CdbField> = BitLayout::new(
    BitOrder::MsbFirst,
    &[
        (CdbField::Reserved0, 3),
        (CdbField::Tolerance, 2),
        (CdbField::Write, 1),
        (CdbField::Except, 2),
    ],
);

#[cfg(target_endian = "little")]
const CDB_BYTE1: BitLayout<CdbField> = CDB_BYTE1_LE;
#[cfg(target_endian = "big")]
const CDB_BYTE1: BitLayout<CdbField> = CDB_BYTE1_BE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderField {
    Except,
    Write,
    Reserved,
}

pub const HDR_BYTE4_LE: BitLayout<HeaderField> = BitLayout::new(
    BitOrder::LsbFirst,
    &[
        (HeaderField::Except, 1),
        (HeaderField::Write, 1),
        (HeaderField::Reserved, 6),
    ],
);

pub const HDR_BYTE4_BE: BitLayout<HeaderField> = BitLayout::new(
    BitOrder::MsbFirst,
    &[
        (HeaderField::Reserved, 6),
        (HeaderField::Write, 1),
        (HeaderField::Except, 1),
    ],
);

#[cfg(target_endian = "little")]
const HDR_BYTE4: BitLayout<HeaderField> = HDR_BYTE4_LE;
#[cfg(target_endian = "big")]
const HDR_BYTE4: BitLayout<HeaderField> = HDR_BYTE4_BE;

/// Size of the response header; the length field occupies bytes 0..4
pub const PERFORMANCE_HEADER_SIZE: usize = 8;

/// Response header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerformanceHeader {
    /// Bytes following the length field
    pub data_len: u32,
    pub write: bool,
    pub except: bool,
}

impl PerformanceHeader {
    pub fn parse(raw: &[u8]) -> Option<Self> {
        if raw.len() < PERFORMANCE_HEADER_SIZE {
            return None;
        }
        Some(Self {
            data_len: get_be32(&raw[0..4]),
            write: HDR_BYTE4.get(raw[4], HeaderField::Write) != 0,
            except: HDR_BYTE4.get(raw[4], HeaderField::Except) != 0,
        })
    }
}

/// GET PERFORMANCE bound to a transport
pub struct GetPerformanceCommand<'h, T: ScsiTransport + ?Sized> {
    cmd: ScsiCommand<'h, T>,
}

impl<'h, T: ScsiTransport + ?Sized> GetPerformanceCommand<'h, T> {
    pub fn new(handle: &'h mut T) -> Self {
        Self {
            cmd: ScsiCommand::new(&GET_PERFORMANCE_INFO, handle),
        }
    }

    fn byte1(&mut self) -> &mut u8 {
        &mut self.cmd.fields_mut()[0]
    }

    pub fn set_type(&mut self, kind: u8) {
        self.cmd.fields_mut()[9] = kind;
    }

    pub fn set_write(&mut self, write: bool) {
        CDB_BYTE1.set(self.byte1(), CdbField::Write, write as u8);
    }

    pub fn set_except(&mut self, except: u8) {
        CDB_BYTE1.set(self.byte1(), CdbField::Except, except);
    }

    pub fn set_tolerance(&mut self, tolerance: u8) {
        CDB_BYTE1.set(self.byte1(), CdbField::Tolerance, tolerance);
    }

    pub fn set_start_lba(&mut self, lba: u32) {
        set_be32(&mut self.cmd.fields_mut()[1..5], lba);
    }

    pub fn cdb(&self) -> &[u8] {
        self.cmd.cdb()
    }
}

impl<'h, T: ScsiTransport + ?Sized> VariableLengthQuery for GetPerformanceCommand<'h, T> {
    const HEADER_SIZE: usize = PERFORMANCE_HEADER_SIZE;

    fn set_descriptor_count(&mut self, count: u16) {
        set_be16(&mut self.cmd.fields_mut()[7..9], count);
    }

    fn declared_size(header: &[u8]) -> usize {
        // length field at offset 0, 4 bytes wide, counts what follows it
        get_be32(&header[0..4]) as usize + 4
    }

    fn issue(&mut self, buffer: &mut [u8]) -> Result<usize> {
        self.cmd.issue_sync(buffer)
    }
}

/// Nominal performance descriptor (type 0x00, except = 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerformanceDescriptor {
    pub start_lba: u32,
    /// kB/s
    pub start_performance: u32,
    pub end_lba: u32,
    /// kB/s
    pub end_performance: u32,
}

impl Descriptor for PerformanceDescriptor {
    const SIZE: usize = 16;

    fn parse(raw: &[u8]) -> Self {
        Self {
            start_lba: get_be32(&raw[0..4]),
            start_performance: get_be32(&raw[4..8]),
            end_lba: get_be32(&raw[8..12]),
            end_performance: get_be32(&raw[12..16]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteSpeedField {
    Mrw,
    Exact,
    Rdd,
    Wrc,
    Reserved,
}

pub const WRT_SPD_BYTE0_LE: BitLayout<WriteSpeedField> = BitLayout::new(
    BitOrder::LsbFirst,
    &[
        (WriteSpeedField::Mrw, 1),
        (WriteSpeedField::Exact, 1),
        (WriteSpeedField::Rdd, 1),
        (WriteSpeedField::Wrc, 2),
        (WriteSpeedField::Reserved, 3),
    ],
);

pub const WRT_SPD_BYTE0_BE: BitLayout<WriteSpeedField> = BitLayout::new(
    BitOrder::MsbFirst,
    &[
        (WriteSpeedField::Reserved, 3),
        (WriteSpeedField::Wrc, 2),
        (WriteSpeedField::Rdd, 1),
        (WriteSpeedField::Exact, 1),
        (WriteSpeedField::Mrw, 1),
    ],
);

#[cfg(target_endian = "little")]
const WRT_SPD_BYTE0: BitLayout<WriteSpeedField> = WRT_SPD_BYTE0_LE;
#[cfg(target_endian = "big")]
const WRT_SPD_BYTE0: BitLayout<WriteSpeedField> = WRT_SPD_BYTE0_BE;

/// Write speed descriptor (type 0x03)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteSpeedDescriptor {
    /// Write rotation control
    pub wrc: u8,
    pub rdd: bool,
    pub exact: bool,
    pub mrw: bool,
    /// Capacity in sectors the speeds apply to
    pub end_lba: u32,
    /// kB/s
    pub read_speed: u32,
    /// kB/s
    pub write_speed: u32,
}

impl Descriptor for WriteSpeedDescriptor {
    const SIZE: usize = 16;

    fn parse(raw: &[u8]) -> Self {
        Self {
            wrc: WRT_SPD_BYTE0.get(raw[0], WriteSpeedField::Wrc),
            rdd: WRT_SPD_BYTE0.get(raw[0], WriteSpeedField::Rdd) != 0,
            exact: WRT_SPD_BYTE0.get(raw[0], WriteSpeedField::Exact) != 0,
            mrw: WRT_SPD_BYTE0.get(raw[0], WriteSpeedField::Mrw) != 0,
            end_lba: get_be32(&raw[4..8]),
            read_speed: get_be32(&raw[8..12]),
            write_speed: get_be32(&raw[12..16]),
        }
    }
}

/// MMC3 write speed descriptors of the loaded medium
pub fn mmc3_get_performance_wrt_spd_desc<T: ScsiTransport + ?Sized>(
    handle: &mut T,
) -> Result<VariableResponse<WriteSpeedDescriptor>> {
    let mut cmd = GetPerformanceCommand::new(handle);
    cmd.set_type(performance_types::WRITE_SPEED);

    let response = response::query::<WriteSpeedDescriptor, _>(&mut cmd)?;
    debug!(
        "GET PERFORMANCE write speeds: {} descriptors",
        response.descriptor_count()
    );
    Ok(response)
}

/// MMC2 nominal performance descriptors, for reading or writing
pub fn mmc2_get_performance_perf_desc<T: ScsiTransport + ?Sized>(
    handle: &mut T,
    write: bool,
) -> Result<VariableResponse<PerformanceDescriptor>> {
    let mut cmd = GetPerformanceCommand::new(handle);
    cmd.set_type(performance_types::PERFORMANCE);
    cmd.set_write(write);

    let response = response::query::<PerformanceDescriptor, _>(&mut cmd)?;
    debug!(
        "GET PERFORMANCE nominal ({}): {} descriptors",
        if write { "write" } else { "read" },
        response.descriptor_count()
    );
    Ok(response)
}

/// Highest write speed in bytes per second (1 kB = 1000 bytes in MMC)
pub fn max_write_speed<'a, I>(descriptors: I) -> Option<u64>
where
    I: IntoIterator<Item = &'a WriteSpeedDescriptor>,
{
    descriptors
        .into_iter()
        .map(|d| d.write_speed as u64 * 1000)
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scsi::testing::ScriptedTransport;

    fn wrt_spd_response(speeds: &[u32]) -> Vec<u8> {
        let len = (4 + speeds.len() * 16) as u32;
        let mut out = len.to_be_bytes().to_vec();
        out.extend_from_slice(&[0; 4]);
        for speed in speeds {
            let mut desc = [0u8; 16];
            desc[0] = 0b0000_1010; // wrc = 1, exact
            desc[4..8].copy_from_slice(&359_847u32.to_be_bytes());
            desc[8..12].copy_from_slice(&(speed * 2).to_be_bytes());
            desc[12..16].copy_from_slice(&speed.to_be_bytes());
            out.extend_from_slice(&desc);
        }
        out
    }

    #[test]
    fn test_cdb_encoding() {
        let mut transport = ScriptedTransport::new();
        let mut cmd = GetPerformanceCommand::new(&mut transport);
        cmd.set_type(performance_types::WRITE_SPEED);
        cmd.set_write(true);
        cmd.set_tolerance(0b10);
        cmd.set_except(0b01);
        cmd.set_start_lba(0x0102_0304);
        cmd.set_descriptor_count(0x0A0B);

        let cdb = cmd.cdb();
        assert_eq!(cdb[0], 0xAC);
        assert_eq!(cdb[1], 0b0001_0101);
        assert_eq!(&cdb[2..6], &[1, 2, 3, 4]);
        assert_eq!(&cdb[8..10], &[0x0A, 0x0B]);
        assert_eq!(cdb[10], 0x03);
        assert_eq!(cdb[11], 0);
    }

    #[test]
    fn test_le_encoding_decodes_with_be_layout() {
        for except in 0..4u8 {
            for write in 0..2u8 {
                for tolerance in 0..4u8 {
                    let byte = CDB_BYTE1_LE.pack(&[
                        (CdbField::Except, except),
                        (CdbField::Write, write),
                        (CdbField::Tolerance, tolerance),
                    ]);
                    assert_eq!(CDB_BYTE1_BE.get(byte, CdbField::Except), except);
                    assert_eq!(CDB_BYTE1_BE.get(byte, CdbField::Write), write);
                    assert_eq!(CDB_BYTE1_BE.get(byte, CdbField::Tolerance), tolerance);
                    assert_eq!(CDB_BYTE1_BE.get(byte, CdbField::Reserved0), 0);
                }
            }
        }
    }

    #[test]
    fn test_write_speed_layouts_agree() {
        for raw in 0..=255u8 {
            assert_eq!(
                WRT_SPD_BYTE0_LE.unpack(raw).iter().map(|(_, v)| *v).sum::<u8>(),
                WRT_SPD_BYTE0_BE.unpack(raw).iter().map(|(_, v)| *v).sum::<u8>()
            );
            assert_eq!(
                WRT_SPD_BYTE0_LE.get(raw, WriteSpeedField::Wrc),
                WRT_SPD_BYTE0_BE.get(raw, WriteSpeedField::Wrc)
            );
        }
    }

    #[test]
    fn test_write_speed_query() {
        let full = wrt_spd_response(&[7056, 5645, 2822]);
        let mut transport = ScriptedTransport::new();
        transport.push_data(full.clone());
        transport.push_data(full);

        let response = mmc3_get_performance_wrt_spd_desc(&mut transport).unwrap();
        let descs: Vec<WriteSpeedDescriptor> = response.descriptors().collect();
        assert_eq!(descs.len(), 3);
        assert_eq!(descs[0].write_speed, 7056);
        assert_eq!(descs[0].read_speed, 14112);
        assert_eq!(descs[0].wrc, 1);
        assert!(descs[0].exact);
        assert!(!descs[0].mrw);
        assert_eq!(descs[0].end_lba, 359_847);
        assert_eq!(max_write_speed(&descs), Some(7_056_000));

        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].buffer_len, PERFORMANCE_HEADER_SIZE);
        assert_eq!(&calls[0].cdb[8..10], &[0, 0]);
        assert_eq!(&calls[1].cdb[8..10], &[0, 3]);
        assert_eq!(calls[1].cdb[10], performance_types::WRITE_SPEED);
    }

    #[test]
    fn test_device_failure_on_payload_fetch() {
        let mut transport = ScriptedTransport::new();
        transport.push_data(wrt_spd_response(&[7056]));
        transport.push_failure();

        let result = mmc3_get_performance_wrt_spd_desc(&mut transport);
        assert!(matches!(result, Err(crate::error::RustBurnError::ScsiDevice(_))));
        assert_eq!(transport.calls().len(), 2);
    }

    #[test]
    fn test_header_parse() {
        let raw = [0, 0, 0, 36, 0b10, 0, 0, 0];
        let header = PerformanceHeader::parse(&raw).unwrap();
        assert_eq!(header.data_len, 36);
        assert!(header.write);
        assert!(!header.except);
    }
}
