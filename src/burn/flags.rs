//! Burn flags
//!
//! Options that change how a burn session is performed. The negotiator walks them
//! one bit at a time, from `BurnFlags::FIRST` up to (not including) `BurnFlags::LAST`.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct BurnFlags: u32 {
        const EJECT = 1 << 0;
        const NOGRACE = 1 << 1;
        /// Disc-at-once writing
        const DAO = 1 << 2;
        const RAW = 1 << 3;
        const CHECK_SIZE = 1 << 4;
        const OVERBURN = 1 << 5;
        /// Buffer underrun protection
        const BURNPROOF = 1 << 6;
        const NO_TMP_FILES = 1 << 7;
        /// Simulate the burn
        const DUMMY = 1 << 8;
        /// Leave the disc open for further sessions
        const MULTI = 1 << 9;
        const APPEND = 1 << 10;
        const MERGE = 1 << 11;
        const DONT_CLEAN_OUTPUT = 1 << 12;
        const BLANK_BEFORE_WRITE = 1 << 13;
        const FAST_BLANK = 1 << 14;
        const DONT_OVERWRITE = 1 << 15;
    }
}

impl BurnFlags {
    /// First flag of the negotiation catalog
    pub const FIRST: u32 = Self::EJECT.bits();
    /// One past the last catalog flag
    pub const LAST: u32 = 1 << 16;

    /// Always supported; set on every negotiation pass
    pub const ALWAYS_SAFE: BurnFlags = BurnFlags::DONT_OVERWRITE
        .union(BurnFlags::CHECK_SIZE)
        .union(BurnFlags::NOGRACE);

    /// Write modes chosen later when copying with a single drive
    pub const WRITE_MODES: BurnFlags = BurnFlags::DAO.union(BurnFlags::RAW);

    /// Flags remembered per drive and disc type
    pub const DRIVE_PROPERTIES: BurnFlags = BurnFlags::EJECT
        .union(BurnFlags::DUMMY)
        .union(BurnFlags::NO_TMP_FILES)
        .union(BurnFlags::BURNPROOF);

    /// Subset written to the preference store
    pub const SAVED: BurnFlags = BurnFlags::DRIVE_PROPERTIES.union(BurnFlags::MULTI);

    /// Flags that make the capacity check use free space instead of full capacity
    pub const ADDS_TO_DISC: BurnFlags = BurnFlags::APPEND.union(BurnFlags::MERGE);

    /// Impossible when the output is an image file
    pub const NOT_FOR_FILE_OUTPUT: BurnFlags = BurnFlags::DUMMY.union(BurnFlags::NO_TMP_FILES);

    /// Single-bit flags of the catalog in increasing bit order
    pub fn catalog() -> impl Iterator<Item = BurnFlags> {
        std::iter::successors(Some(Self::FIRST), |bit| {
            let next = bit << 1;
            (next < Self::LAST).then_some(next)
        })
        .map(BurnFlags::from_bits_retain)
    }

    /// Number of flags in the catalog
    pub fn catalog_len() -> usize {
        (Self::LAST.trailing_zeros() - Self::FIRST.trailing_zeros()) as usize
    }
}
