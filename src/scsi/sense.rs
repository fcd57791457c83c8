//! SCSI Sense Data Parsing
//!
//! Decodes fixed-format sense data returned with CHECK CONDITION.

use tracing::debug;

/// Decoded sense key / additional sense code triple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SenseData {
    pub sense_key: u8,
    pub asc: u8,
    pub ascq: u8,
}

impl SenseData {
    /// Parse fixed format (0x70/0x71) or descriptor format (0x72/0x73) sense data
    pub fn parse(sense_data: &[u8]) -> Option<Self> {
        if sense_data.len() < 3 {
            return None;
        }

        let response_code = sense_data[0] & 0x7F;
        let parsed = match response_code {
            0x72 | 0x73 => {
                if sense_data.len() < 4 {
                    return None;
                }
                SenseData {
                    sense_key: sense_data[1] & 0x0F,
                    asc: sense_data[2],
                    ascq: sense_data[3],
                }
            }
            _ => SenseData {
                sense_key: sense_data[2] & 0x0F,
                asc: sense_data.get(12).copied().unwrap_or(0),
                ascq: sense_data.get(13).copied().unwrap_or(0),
            },
        };

        debug!(
            "Sense data - Key: 0x{:02X}, ASC: 0x{:02X}, ASCQ: 0x{:02X}",
            parsed.sense_key, parsed.asc, parsed.ascq
        );
        Some(parsed)
    }

    /// Human readable interpretation for the MMC conditions a burner commonly reports
    pub fn describe(&self) -> String {
        match (self.sense_key, self.asc, self.ascq) {
            (0x00, _, _) => "No sense".to_string(),
            (0x02, 0x3A, _) => "Medium not present".to_string(),
            (0x02, 0x04, 0x01) => "Drive not ready - becoming ready".to_string(),
            (0x02, 0x04, _) => "Drive not ready".to_string(),
            (0x02, 0x30, _) => "Incompatible medium installed".to_string(),
            (0x05, 0x20, 0x00) => "Invalid command operation code".to_string(),
            (0x05, 0x24, 0x00) => "Invalid field in CDB".to_string(),
            (0x05, 0x21, 0x00) => "Logical block address out of range".to_string(),
            (0x06, 0x28, 0x00) => "Unit attention - medium may have changed".to_string(),
            (0x06, 0x29, _) => "Unit attention - power on or reset".to_string(),
            (0x07, 0x27, _) => "Write protected".to_string(),
            _ => format!(
                "Sense Key: 0x{:02X}, ASC/ASCQ: 0x{:02X}/0x{:02X}",
                self.sense_key, self.asc, self.ascq
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_format_medium_not_present() {
        let mut raw = [0u8; 18];
        raw[0] = 0x70;
        raw[2] = 0x02;
        raw[12] = 0x3A;
        let sense = SenseData::parse(&raw).unwrap();
        assert_eq!(sense.describe(), "Medium not present");
    }

    #[test]
    fn test_descriptor_format() {
        let raw = [0x72, 0x05, 0x24, 0x00, 0, 0, 0, 0];
        let sense = SenseData::parse(&raw).unwrap();
        assert_eq!(sense.sense_key, 0x05);
        assert_eq!(sense.describe(), "Invalid field in CDB");
    }

    #[test]
    fn test_too_short() {
        assert!(SenseData::parse(&[0x70]).is_none());
    }
}
