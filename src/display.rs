use crate::burn::{BurnFlags, BurnSession, FlagSupport, SessionError, SessionNotice};
use crate::scsi::commands::{DiscInfo, PerformanceDescriptor, WriteSpeedDescriptor};
use crate::utils::{format_drive_speed, format_sectors};

/// Display write speed descriptors as a table
pub fn display_write_speeds(descriptors: &[WriteSpeedDescriptor]) {
    println!("💿 Write Speeds:");
    if descriptors.is_empty() {
        println!("  No write speed reported for this disc");
        return;
    }

    println!("  {:<36} {:<36} {:>10} {:>4}", "Write", "Read", "End LBA", "WRC");
    println!("  {:-<90}", "");
    for desc in descriptors {
        println!(
            "  {:<36} {:<36} {:>10} {:>4}",
            format_drive_speed(desc.write_speed),
            format_drive_speed(desc.read_speed),
            desc.end_lba,
            desc.wrc
        );
    }
}

/// Display nominal performance descriptors
pub fn display_performance(descriptors: &[PerformanceDescriptor], write: bool) {
    println!(
        "📈 Nominal {} Performance:",
        if write { "Write" } else { "Read" }
    );
    if descriptors.is_empty() {
        println!("  No performance data reported");
        return;
    }

    for (i, desc) in descriptors.iter().enumerate() {
        println!(
            "  Zone {}: LBA {} -> {}, {} -> {}",
            i + 1,
            desc.start_lba,
            desc.end_lba,
            format_drive_speed(desc.start_performance),
            format_drive_speed(desc.end_performance)
        );
    }
}

pub fn display_disc_info(info: &DiscInfo) {
    println!("📀 Disc Information:");
    println!("  Status: {}", info.status.description());
    println!("  Last Session: {:?}", info.last_session_state);
    println!("  Erasable: {}", info.erasable);
    println!("  Sessions: {}", info.sessions_num);
    println!(
        "  Tracks in Last Session: {} - {}",
        info.first_track_in_last_session, info.last_track_in_last_session
    );
    println!("  Disc Type: {:?}", info.disc_type);
    println!("  Background Format: {:?}", info.bg_format_status);
    if info.disc_id_valid {
        println!("  Disc ID: {:08X}", info.disc_id);
    }
    println!(
        "  Last Possible Lead-out: {}",
        format_sectors(info.last_possible_leadout_sectors())
    );
    if !info.opc_entries.is_empty() {
        println!("  OPC Table:");
        for entry in &info.opc_entries {
            println!("    {} kB/s: {:02X?}", entry.speed, entry.opc);
        }
    }
}

fn flag_names(flags: BurnFlags) -> String {
    if flags.is_empty() {
        return "-".to_string();
    }
    flags
        .iter_names()
        .map(|(name, _)| name)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Display the outcome of a session check
pub fn display_check_result(
    session: &BurnSession,
    outcome: SessionError,
    notice: Option<SessionNotice>,
    support: FlagSupport,
) {
    let marker = if outcome.is_valid() { "✅" } else { "❌" };
    println!("{} Session: {}", marker, outcome);
    println!("  Required: {}", format_sectors(session.size_sectors()));
    if let Some(medium) = session.burner().and_then(|b| b.medium.as_ref()) {
        println!("  Disc: {} ({})", medium.type_string, format_sectors(medium.capacity_sectors));
    }
    println!("  Flags: {}", flag_names(session.flags()));
    println!("  Supported: {}", flag_names(support.supported));
    println!("  Compulsory: {}", flag_names(support.compulsory));
    if session.rate > 0 {
        println!("  Rate: {} kB/s", session.rate / 1000);
    }

    if notice == Some(SessionNotice::SameDriveCopy) {
        println!("ℹ️  The drive holding the source disc will also record the copy");
    }
}

/// Display warning message in consistent format
pub fn display_warning(warning: &str) {
    eprintln!("Warning: {}", warning);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_names() {
        assert_eq!(flag_names(BurnFlags::empty()), "-");
        assert_eq!(
            flag_names(BurnFlags::EJECT | BurnFlags::DAO),
            "EJECT DAO"
        );
    }
}
