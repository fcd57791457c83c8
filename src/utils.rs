//! Utility functions for rustburn

use crate::scsi::constants::sector_sizes::{CD_SECTOR_SIZE, SECTORS_PER_SECOND};

/// 1x CD speed in bytes per second
pub const CD_SPEED: u64 = 176_400;
/// 1x DVD speed in bytes per second
pub const DVD_SPEED: u64 = 1_385_000;

/// Format bytes in human-readable format (B, KB, MB, GB, TB)
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: u64 = 1024;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= THRESHOLD as f64 && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD as f64;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

/// Sector count with its data size and its audio length (mm:ss)
pub fn format_sectors(sectors: i64) -> String {
    let sectors = sectors.max(0);
    let seconds = sectors / SECTORS_PER_SECOND;
    format!(
        "{} sectors ({}, {:02}:{:02})",
        sectors,
        format_bytes(sectors as u64 * CD_SECTOR_SIZE),
        seconds / 60,
        seconds % 60
    )
}

/// Drive speed in kB/s (1 kB = 1000 bytes) with its CD and DVD factors
pub fn format_drive_speed(kbytes_per_sec: u32) -> String {
    let bytes = kbytes_per_sec as u64 * 1000;
    format!(
        "{} kB/s ({:.1}x CD, {:.1}x DVD)",
        kbytes_per_sec,
        bytes as f64 / CD_SPEED as f64,
        bytes as f64 / DVD_SPEED as f64
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(500), "500 B");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1073741824), "1.00 GB");
    }

    #[test]
    fn test_format_sectors() {
        assert_eq!(format_sectors(4500), "4500 sectors (8.79 MB, 01:00)");
        assert_eq!(format_sectors(-5), "0 sectors (0 B, 00:00)");
    }

    #[test]
    fn test_format_drive_speed() {
        assert_eq!(format_drive_speed(1764), "1764 kB/s (10.0x CD, 1.3x DVD)");
    }
}
