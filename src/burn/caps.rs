//! Capability backend seam
//!
//! Whatever knows which burn options the installed backends can honour for a
//! given session. The negotiator and the validity state machine only see this
//! trait; the concrete backend is handed to them by the caller.

use crate::error::Result;

use super::flags::BurnFlags;
use super::session::{BurnSession, InputType};

/// Flags the backend can honour and flags it requires, for one session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlagSupport {
    pub supported: BurnFlags,
    pub compulsory: BurnFlags,
}

impl FlagSupport {
    pub fn new(supported: BurnFlags, compulsory: BurnFlags) -> Self {
        Self {
            supported,
            compulsory,
        }
    }

    /// Compulsory flags are set and not all present in `flags`
    pub fn compulsory_missing(&self, flags: BurnFlags) -> bool {
        !self.compulsory.is_empty() && !flags.contains(self.compulsory)
    }
}

pub trait BurnCaps {
    /// Supported and compulsory flags for `session` as it currently stands
    fn get_flags(&self, session: &BurnSession) -> Result<FlagSupport>;

    /// Input and output of `session` can be handled, flags aside
    fn is_session_supported(&self, session: &BurnSession) -> bool;

    /// `input` could be burnt to the output of `session`
    fn is_input_supported(&self, session: &BurnSession, input: &InputType) -> bool;

    /// Some backend handles this kind of input at all
    fn is_track_type_supported(&self, input: &InputType) -> bool;
}

impl<T: BurnCaps + ?Sized> BurnCaps for &T {
    fn get_flags(&self, session: &BurnSession) -> Result<FlagSupport> {
        (**self).get_flags(session)
    }

    fn is_session_supported(&self, session: &BurnSession) -> bool {
        (**self).is_session_supported(session)
    }

    fn is_input_supported(&self, session: &BurnSession, input: &InputType) -> bool {
        (**self).is_input_supported(session, input)
    }

    fn is_track_type_supported(&self, input: &InputType) -> bool {
        (**self).is_track_type_supported(input)
    }
}
