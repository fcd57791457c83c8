//! Command descriptor block builder
//!
//! A command is a zeroed CDB bound to a transport with its opcode pre-filled.
//! Callers patch the remaining fields through the typed command wrappers in
//! `scsi::commands`.

use crate::error::Result;
use tracing::debug;

use super::constants::{DEFAULT_TIMEOUT_SECS, SCSI_CMD_MAX_LEN};
use super::core::ScsiTransport;
use super::types::{CommandInfo, Direction};

pub struct ScsiCommand<'h, T: ScsiTransport + ?Sized> {
    cdb: [u8; SCSI_CMD_MAX_LEN],
    info: &'static CommandInfo,
    handle: &'h mut T,
}

impl<'h, T: ScsiTransport + ?Sized> ScsiCommand<'h, T> {
    pub fn new(info: &'static CommandInfo, handle: &'h mut T) -> Self {
        debug_assert!(info.size > 0 && info.size <= SCSI_CMD_MAX_LEN);

        let mut cdb = [0u8; SCSI_CMD_MAX_LEN];
        cdb[0] = info.opcode;
        Self { cdb, info, handle }
    }

    pub fn info(&self) -> &'static CommandInfo {
        self.info
    }

    /// The significant part of the CDB (opcode at offset 0)
    pub fn cdb(&self) -> &[u8] {
        &self.cdb[..self.info.size]
    }

    /// Mutable access to the field bytes; the opcode byte is not exposed
    pub fn fields_mut(&mut self) -> &mut [u8] {
        &mut self.cdb[1..self.info.size]
    }

    /// Issue the command and block until it completes or fails.
    /// An empty `buffer` means no data phase.
    pub fn issue_sync(&mut self, buffer: &mut [u8]) -> Result<usize> {
        assert!(
            self.info.direction.intersects(Direction::READ | Direction::WRITE),
            "opcode 0x{:02X} ({}) declares no data direction",
            self.info.opcode,
            self.info.name
        );

        // a bidirectional declaration is issued as a read
        let direction = if self.info.direction.contains(Direction::READ) {
            Direction::READ
        } else {
            Direction::WRITE
        };

        debug!(
            "Issuing {} CDB: {:02X?}, buffer {} bytes",
            self.info.name,
            self.cdb(),
            buffer.len()
        );

        let size = self.info.size;
        self.handle
            .execute(&self.cdb[..size], direction, buffer, DEFAULT_TIMEOUT_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scsi::testing::ScriptedTransport;

    static TEST_INFO: CommandInfo = CommandInfo::new(0xAC, 12, Direction::READ, "TEST");
    static NO_DIRECTION: CommandInfo = CommandInfo::new(0x00, 6, Direction::empty(), "NONE");

    #[test]
    fn test_new_command_is_zeroed_with_opcode() {
        let mut transport = ScriptedTransport::new();
        let cmd = ScsiCommand::new(&TEST_INFO, &mut transport);
        assert_eq!(cmd.cdb().len(), 12);
        assert_eq!(cmd.cdb()[0], 0xAC);
        assert!(cmd.cdb()[1..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_issue_passes_cdb_and_direction() {
        let mut transport = ScriptedTransport::new();
        transport.push_data(vec![1, 2, 3, 4]);
        {
            let mut cmd = ScsiCommand::new(&TEST_INFO, &mut transport);
            cmd.fields_mut()[9] = 0x03;
            let mut buf = [0u8; 4];
            let n = cmd.issue_sync(&mut buf).unwrap();
            assert_eq!(n, 4);
            assert_eq!(buf, [1, 2, 3, 4]);
        }
        let sent = &transport.calls()[0];
        assert_eq!(sent.cdb[10], 0x03);
        assert_eq!(sent.direction, Direction::READ);
        assert_eq!(sent.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    #[should_panic(expected = "declares no data direction")]
    fn test_missing_direction_is_a_programming_error() {
        let mut transport = ScriptedTransport::new();
        let mut cmd = ScsiCommand::new(&NO_DIRECTION, &mut transport);
        let _ = cmd.issue_sync(&mut []);
    }
}
