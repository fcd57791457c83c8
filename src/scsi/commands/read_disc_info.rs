//! READ DISC INFORMATION (MMC)
//!
//! Returns the standard disc information block followed by the OPC table.
//! The OPC table is handled through the variable-length protocol with 8 byte
//! entries.

use tracing::debug;

use crate::error::{Result, RustBurnError};
use crate::scsi::command::ScsiCommand;
use crate::scsi::constants::mmc_commands;
use crate::scsi::core::ScsiTransport;
use crate::scsi::layout::{get_be16, get_be32, set_be16, BitLayout, BitOrder};
use crate::scsi::response::{self, Descriptor, VariableLengthQuery};
use crate::scsi::types::{
    BgFormatStatus, CommandInfo, Direction, DiscStatus, SessionState, TrackDataFormat,
};

pub static READ_DISC_INFORMATION_INFO: CommandInfo = CommandInfo::new(
    mmc_commands::READ_DISC_INFORMATION,
    10,
    Direction::READ,
    "READ DISC INFORMATION",
);

/// Bytes of the standard block up to and including the OPC entry count
pub const DISC_INFO_STD_SIZE: usize = 34;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusField {
    Status,
    LastSessionState,
    Erasable,
    InfoType,
}

pub const BYTE2_LE: BitLayout<StatusField> = BitLayout::new(
    BitOrder::LsbFirst,
    &[
        (StatusField::Status, 2),
        (StatusField::LastSessionState, 2),
        (StatusField::Erasable, 1),
        (StatusField::InfoType, 3),
    ],
);

pub const BYTE2_BE: BitLayout<StatusField> = BitLayout::new(
    BitOrder::MsbFirst,
    &[
        (StatusField::InfoType, 3),
        (StatusField::Erasable, 1),
        (StatusField::LastSessionState, 2),
        (StatusField::Status, 2),
    ],
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidityField {
    BgFormatStatus,
    Dbit,
    Reserved0,
    DiscAppCodeValid,
    UnrestrictedUse,
    DiscBarcodeValid,
    DiscIdValid,
}

pub const BYTE7_LE: BitLayout<ValidityField> = BitLayout::new(
    BitOrder::LsbFirst,
    &[
        (ValidityField::BgFormatStatus, 2),
        (ValidityField::Dbit, 1),
        (ValidityField::Reserved0, 1),
        (ValidityField::DiscAppCodeValid, 1),
        (ValidityField::UnrestrictedUse, 1),
        (ValidityField::DiscBarcodeValid, 1),
        (ValidityField::DiscIdValid, 1),
    ],
);

pub const BYTE7_BE: BitLayout<ValidityField> = BitLayout::new(
    BitOrder::MsbFirst,
    &[
        (ValidityField::DiscIdValid, 1),
        (ValidityField::DiscBarcodeValid, 1),
        (ValidityField::UnrestrictedUse, 1),
        (ValidityField::DiscAppCodeValid, 1),
        (ValidityField::Reserved0, 1),
        (ValidityField::Dbit, 1),
        (ValidityField::BgFormatStatus, 2),
    ],
);

#[cfg(target_endian = "little")]
const BYTE2: BitLayout<StatusField> = BYTE2_LE;
#[cfg(target_endian = "big")]
const BYTE2: BitLayout<StatusField> = BYTE2_BE;

#[cfg(target_endian = "little")]
const BYTE7: BitLayout<ValidityField> = BYTE7_LE;
#[cfg(target_endian = "big")]
const BYTE7: BitLayout<ValidityField> = BYTE7_BE;

/// Optimum power calibration entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcEntry {
    /// kB/s
    pub speed: u16,
    pub opc: [u8; 6],
}

impl Descriptor for OpcEntry {
    const SIZE: usize = 8;

    fn parse(raw: &[u8]) -> Self {
        let mut opc = [0u8; 6];
        opc.copy_from_slice(&raw[2..8]);
        Self {
            speed: get_be16(&raw[0..2]),
            opc,
        }
    }
}

/// Decoded standard disc information block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscInfo {
    pub status: DiscStatus,
    pub last_session_state: SessionState,
    pub erasable: bool,
    pub info_type: u8,
    pub first_track_num: u8,
    pub sessions_num: u16,
    pub first_track_in_last_session: u16,
    pub last_track_in_last_session: u16,
    pub bg_format_status: BgFormatStatus,
    pub dbit: bool,
    pub disc_app_code_valid: bool,
    pub unrestricted_use: bool,
    pub disc_barcode_valid: bool,
    pub disc_id_valid: bool,
    pub disc_type: TrackDataFormat,
    pub disc_id: u32,
    /// MSF of the last session lead-in start
    pub last_session_leadin: [u8; 4],
    /// MSF of the last possible lead-out start
    pub last_possible_leadout: [u8; 4],
    pub disc_barcode: [u8; 8],
    pub opc_entries: Vec<OpcEntry>,
}

impl DiscInfo {
    /// Parse the block. `raw` must hold at least the standard part; the OPC table
    /// is limited to the entries actually present.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        if raw.len() < DISC_INFO_STD_SIZE {
            return Err(RustBurnError::parse(format!(
                "Disc information too short: {} bytes",
                raw.len()
            )));
        }

        let mut leadin = [0u8; 4];
        leadin.copy_from_slice(&raw[16..20]);
        let mut leadout = [0u8; 4];
        leadout.copy_from_slice(&raw[20..24]);
        let mut barcode = [0u8; 8];
        barcode.copy_from_slice(&raw[24..32]);

        let announced = raw[33] as usize;
        let opc_entries = raw[DISC_INFO_STD_SIZE..]
            .chunks_exact(OpcEntry::SIZE)
            .take(announced)
            .map(OpcEntry::parse)
            .collect();

        Ok(Self {
            status: DiscStatus::from_bits(BYTE2.get(raw[2], StatusField::Status)),
            last_session_state: SessionState::from_bits(
                BYTE2.get(raw[2], StatusField::LastSessionState),
            ),
            erasable: BYTE2.get(raw[2], StatusField::Erasable) != 0,
            info_type: BYTE2.get(raw[2], StatusField::InfoType),
            first_track_num: raw[3],
            sessions_num: ((raw[9] as u16) << 8) + raw[4] as u16,
            first_track_in_last_session: ((raw[10] as u16) << 8) + raw[5] as u16,
            last_track_in_last_session: ((raw[11] as u16) << 8) + raw[6] as u16,
            bg_format_status: BgFormatStatus::from_bits(
                BYTE7.get(raw[7], ValidityField::BgFormatStatus),
            ),
            dbit: BYTE7.get(raw[7], ValidityField::Dbit) != 0,
            disc_app_code_valid: BYTE7.get(raw[7], ValidityField::DiscAppCodeValid) != 0,
            unrestricted_use: BYTE7.get(raw[7], ValidityField::UnrestrictedUse) != 0,
            disc_barcode_valid: BYTE7.get(raw[7], ValidityField::DiscBarcodeValid) != 0,
            disc_id_valid: BYTE7.get(raw[7], ValidityField::DiscIdValid) != 0,
            disc_type: TrackDataFormat::from_code(raw[8]),
            disc_id: get_be32(&raw[12..16]),
            last_session_leadin: leadin,
            last_possible_leadout: leadout,
            disc_barcode: barcode,
            opc_entries,
        })
    }

    /// Last possible lead-out start converted from MSF to sectors
    pub fn last_possible_leadout_sectors(&self) -> i64 {
        let [_, m, s, f] = self.last_possible_leadout;
        (m as i64 * 60 + s as i64) * 75 + f as i64 - 150
    }
}

struct ReadDiscInfoCommand<'h, T: ScsiTransport + ?Sized> {
    cmd: ScsiCommand<'h, T>,
}

impl<'h, T: ScsiTransport + ?Sized> VariableLengthQuery for ReadDiscInfoCommand<'h, T> {
    const HEADER_SIZE: usize = DISC_INFO_STD_SIZE;

    // the allocation length follows the buffer handed to issue()
    fn set_descriptor_count(&mut self, _count: u16) {}

    fn declared_size(header: &[u8]) -> usize {
        get_be16(&header[0..2]) as usize + 2
    }

    fn issue(&mut self, buffer: &mut [u8]) -> Result<usize> {
        set_be16(&mut self.cmd.fields_mut()[6..8], buffer.len() as u16);
        self.cmd.issue_sync(buffer)
    }
}

/// Standard disc information of the loaded medium
pub fn read_disc_information<T: ScsiTransport + ?Sized>(handle: &mut T) -> Result<DiscInfo> {
    let mut cmd = ReadDiscInfoCommand {
        cmd: ScsiCommand::new(&READ_DISC_INFORMATION_INFO, handle),
    };

    let response = response::query::<OpcEntry, _>(&mut cmd)?;
    if response.data_len() < DISC_INFO_STD_SIZE {
        return Err(RustBurnError::parse(format!(
            "Drive declared a {} byte disc information block",
            response.data_len()
        )));
    }

    let info = DiscInfo::parse(response.data())?;
    debug!(
        "Disc information: status {:?}, erasable {}, {} sessions",
        info.status, info.erasable, info.sessions_num
    );
    Ok(info)
}
