use bitflags::bitflags;

bitflags! {
    /// Data phase direction declared by an opcode
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Direction: u8 {
        /// Device to host
        const READ = 1 << 0;
        /// Host to device
        const WRITE = 1 << 1;
    }
}

/// Static description of an opcode (corresponds to the command info table of an MMC opcode)
#[derive(Debug, Clone, Copy)]
pub struct CommandInfo {
    pub opcode: u8,
    /// CDB length in bytes
    pub size: usize,
    pub direction: Direction,
    pub name: &'static str,
}

impl CommandInfo {
    pub const fn new(opcode: u8, size: usize, direction: Direction, name: &'static str) -> Self {
        Self {
            opcode,
            size,
            direction,
            name,
        }
    }
}

/// Disc status reported by READ DISC INFORMATION
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscStatus {
    Empty,
    Incomplete,
    Finalized,
    Others,
}

impl DiscStatus {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0x00 => DiscStatus::Empty,
            0x01 => DiscStatus::Incomplete,
            0x02 => DiscStatus::Finalized,
            _ => DiscStatus::Others,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            DiscStatus::Empty => "Empty",
            DiscStatus::Incomplete => "Incomplete (appendable)",
            DiscStatus::Finalized => "Finalized",
            DiscStatus::Others => "Other (random access)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Empty,
    Incomplete,
    Damaged,
    Complete,
}

impl SessionState {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0x00 => SessionState::Empty,
            0x01 => SessionState::Incomplete,
            0x02 => SessionState::Damaged,
            _ => SessionState::Complete,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BgFormatStatus {
    BlankOrNotRewritable,
    Started,
    InProgress,
    Completed,
}

impl BgFormatStatus {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0x00 => BgFormatStatus::BlankOrNotRewritable,
            0x01 => BgFormatStatus::Started,
            0x02 => BgFormatStatus::InProgress,
            _ => BgFormatStatus::Completed,
        }
    }
}

/// Disc type byte of the disc information block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackDataFormat {
    CddaCdrom,
    CdI,
    Xa,
    Undefined,
    Reserved(u8),
}

impl TrackDataFormat {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x00 => TrackDataFormat::CddaCdrom,
            0x10 => TrackDataFormat::CdI,
            0x20 => TrackDataFormat::Xa,
            0xFF => TrackDataFormat::Undefined,
            other => TrackDataFormat::Reserved(other),
        }
    }
}
