//! Burn session model
//!
//! The mutable aggregate the negotiator and the validity state machine work on:
//! which drive burns, what goes in, which flags are active.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::flags::BurnFlags;
use crate::scsi::constants::sector_sizes::SECTORS_PER_SECOND;

bitflags! {
    /// State of a medium as seen by the drive. Empty means no medium.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct MediumStatus: u32 {
        const FILE = 1 << 0;
        const CD = 1 << 1;
        const DVD = 1 << 2;
        const REWRITABLE = 1 << 3;
        const BLANK = 1 << 4;
        const APPENDABLE = 1 << 5;
        const CLOSED = 1 << 6;
        const HAS_DATA = 1 << 7;
        const HAS_AUDIO = 1 << 8;
        /// Encrypted video disc
        const PROTECTED = 1 << 9;
    }
}

impl MediumStatus {
    pub const NONE: MediumStatus = MediumStatus::empty();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// Not detected
    #[default]
    None,
    Bin,
    Cue,
    Clone,
    Cdrdao,
}

/// What the session reads from
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InputType {
    #[default]
    None,
    Disc {
        #[serde(default)]
        media: MediumStatus,
    },
    Data,
    Image {
        #[serde(default)]
        format: ImageFormat,
    },
    Audio {
        #[serde(default)]
        cd_text: bool,
    },
}

/// Input kind without its subtype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    None,
    Disc,
    Data,
    Image,
    Audio,
}

impl InputType {
    pub fn kind(&self) -> InputKind {
        match self {
            InputType::None => InputKind::None,
            InputType::Disc { .. } => InputKind::Disc,
            InputType::Data => InputKind::Data,
            InputType::Image { .. } => InputKind::Image,
            InputType::Audio { .. } => InputKind::Audio,
        }
    }

    /// Prefix used in preference keys
    pub fn key_prefix(&self) -> &'static str {
        match self.kind() {
            InputKind::None => "none",
            InputKind::Disc => "disc",
            InputKind::Data => "data",
            InputKind::Image => "image",
            InputKind::Audio => "audio",
        }
    }

    pub fn has_cd_text(&self) -> bool {
        matches!(self, InputType::Audio { cd_text: true })
    }

    /// Same input with CD-TEXT toggled; other kinds are returned unchanged
    pub fn with_cd_text(&self, cd_text: bool) -> InputType {
        match self {
            InputType::Audio { .. } => InputType::Audio { cd_text },
            other => other.clone(),
        }
    }
}

/// One source track with the size facts the validator needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Track {
    /// Copy of a disc sitting in `drive_id`
    Disc {
        drive_id: String,
        #[serde(default)]
        data_sectors: i64,
    },
    Image {
        #[serde(default)]
        uri: Option<String>,
        #[serde(default)]
        sectors: i64,
    },
    Audio {
        #[serde(default)]
        uri: Option<String>,
        #[serde(default)]
        duration_ns: i64,
    },
    /// File tree; its size only comes from the session data size tag
    Data,
}

impl Track {
    pub fn sectors(&self) -> i64 {
        match self {
            Track::Disc { data_sectors, .. } => *data_sectors,
            Track::Image { sectors, .. } => *sectors,
            Track::Audio { duration_ns, .. } => duration_to_sectors(*duration_ns),
            Track::Data => 0,
        }
    }

    pub fn image_uri(&self) -> Option<&str> {
        match self {
            Track::Image { uri, .. } => uri.as_deref(),
            _ => None,
        }
    }
}

/// Audio duration in nanoseconds to CD sectors (75 per second)
pub fn duration_to_sectors(duration_ns: i64) -> i64 {
    (duration_ns as i128 * SECTORS_PER_SECOND as i128 / 1_000_000_000) as i64
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Medium {
    #[serde(default)]
    pub status: MediumStatus,
    /// Human readable disc type, e.g. "CD-RW"
    #[serde(default)]
    pub type_string: String,
    #[serde(default)]
    pub capacity_sectors: i64,
    #[serde(default)]
    pub free_space_sectors: i64,
    /// Bytes per second
    #[serde(default)]
    pub max_write_speed: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drive {
    pub id: String,
    pub display_name: String,
    /// Image file writer instead of a real recorder
    #[serde(default)]
    pub fake: bool,
    #[serde(default)]
    pub medium: Option<Medium>,
}

impl Drive {
    pub fn medium_status(&self) -> MediumStatus {
        self.medium
            .as_ref()
            .map(|m| m.status)
            .unwrap_or(MediumStatus::NONE)
    }
}

/// Precomputed session sizes in sectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SizeTags {
    #[serde(default)]
    pub data_size: Option<i64>,
    #[serde(default)]
    pub audio_size: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnSession {
    #[serde(default)]
    pub burner: Option<Drive>,
    #[serde(default)]
    pub input: InputType,
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub flags: BurnFlags,
    /// Bytes per second
    #[serde(default)]
    pub rate: u64,
    #[serde(default)]
    pub tmpdir: Option<String>,
    #[serde(default)]
    pub tags: SizeTags,
}

impl BurnSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flags(&self) -> BurnFlags {
        self.flags
    }

    pub fn set_flags(&mut self, flags: BurnFlags) {
        self.flags = flags;
    }

    pub fn add_flags(&mut self, flags: BurnFlags) {
        self.flags |= flags;
    }

    pub fn remove_flags(&mut self, flags: BurnFlags) {
        self.flags &= !flags;
    }

    pub fn burner(&self) -> Option<&Drive> {
        self.burner.as_ref()
    }

    /// The disc being copied sits in the drive that burns
    pub fn same_src_dest_drive(&self) -> bool {
        if !matches!(self.input, InputType::Disc { .. }) {
            return false;
        }
        let Some(burner) = &self.burner else {
            return false;
        };
        self.tracks.iter().any(|track| match track {
            Track::Disc { drive_id, .. } => drive_id == &burner.id,
            _ => false,
        })
    }

    /// Sectors needed: a size tag when present, else the sum of the tracks.
    /// Negative sizes count as zero and the sum saturates at `i64::MAX`.
    pub fn size_sectors(&self) -> i64 {
        if let Some(size) = self.tags.data_size {
            return size.max(0);
        }
        if let Some(size) = self.tags.audio_size {
            return size.max(0);
        }
        self.tracks
            .iter()
            .map(|track| track.sectors().max(0))
            .fold(0i64, i64::saturating_add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drive(id: &str) -> Drive {
        Drive {
            id: id.to_string(),
            display_name: format!("Drive {}", id),
            fake: false,
            medium: None,
        }
    }

    #[test]
    fn test_duration_to_sectors() {
        assert_eq!(duration_to_sectors(1_000_000_000), 75);
        assert_eq!(duration_to_sectors(60 * 1_000_000_000), 4500);
        assert_eq!(duration_to_sectors(0), 0);
    }

    #[test]
    fn test_size_prefers_tags() {
        let mut session = BurnSession::new();
        session.tracks = vec![Track::Image {
            uri: None,
            sectors: 10,
        }];
        assert_eq!(session.size_sectors(), 10);

        session.tags.audio_size = Some(20);
        assert_eq!(session.size_sectors(), 20);

        session.tags.data_size = Some(30);
        assert_eq!(session.size_sectors(), 30);
    }

    #[test]
    fn test_size_sums_tracks() {
        let mut session = BurnSession::new();
        session.tracks = vec![
            Track::Disc {
                drive_id: "sr0".into(),
                data_sectors: 100,
            },
            Track::Audio {
                uri: None,
                duration_ns: 2_000_000_000,
            },
            Track::Data,
        ];
        assert_eq!(session.size_sectors(), 250);
    }

    #[test]
    fn test_size_saturates_on_huge_tracks() {
        let mut session = BurnSession::new();
        let huge = Track::Image {
            uri: None,
            sectors: i64::MAX / 2 + 1,
        };
        session.tracks = vec![huge.clone(), huge];
        assert_eq!(session.size_sectors(), i64::MAX);

        session.tracks = vec![
            Track::Image {
                uri: None,
                sectors: -500,
            },
            Track::Image {
                uri: None,
                sectors: 300,
            },
        ];
        assert_eq!(session.size_sectors(), 300);
    }

    #[test]
    fn test_same_src_dest_drive() {
        let mut session = BurnSession::new();
        session.burner = Some(drive("sr0"));
        session.input = InputType::Disc {
            media: MediumStatus::CD,
        };
        session.tracks = vec![Track::Disc {
            drive_id: "sr1".into(),
            data_sectors: 0,
        }];
        assert!(!session.same_src_dest_drive());

        session.tracks = vec![Track::Disc {
            drive_id: "sr0".into(),
            data_sectors: 0,
        }];
        assert!(session.same_src_dest_drive());

        session.input = InputType::Data;
        assert!(!session.same_src_dest_drive());
    }

    #[test]
    fn test_input_type_json() {
        let input: InputType =
            serde_json::from_str(r#"{"type":"audio","cd_text":true}"#).unwrap();
        assert_eq!(input, InputType::Audio { cd_text: true });
        assert_eq!(input.key_prefix(), "audio");
        assert_eq!(input.with_cd_text(false), InputType::Audio { cd_text: false });

        let disc: InputType =
            serde_json::from_str(r#"{"type":"disc","media":"CD | PROTECTED"}"#).unwrap();
        assert_eq!(
            disc,
            InputType::Disc {
                media: MediumStatus::CD | MediumStatus::PROTECTED
            }
        );
    }
}
