//! Session size against disc capacity

use tracing::info;

use super::flags::BurnFlags;
use super::session::BurnSession;
use super::validity::SessionError;

/// Overburn tolerance, in percent of the nominal capacity
pub const OVERBURN_PERCENT: i64 = 103;

/// Sectors available on the burner's medium: free space when adding to the disc,
/// full capacity otherwise. Unknown or negative values count as zero.
pub fn disc_size_sectors(session: &BurnSession) -> Option<i64> {
    let medium = session.burner()?.medium.as_ref()?;
    let size = if session.flags().intersects(BurnFlags::ADDS_TO_DISC) {
        medium.free_space_sectors
    } else {
        medium.capacity_sectors
    };
    Some(size.max(0))
}

/// Compare what the session needs with what the disc offers.
///
/// `supported` is the currently negotiated supported mask; it decides whether
/// overburning can be proposed.
pub fn check_size(session: &BurnSession, supported: BurnFlags) -> SessionError {
    let Some(burner) = session.burner() else {
        return SessionError::NoOutput;
    };

    // image files have no capacity limit here
    if burner.fake {
        return SessionError::Valid;
    }

    let Some(disc_size) = disc_size_sectors(session) else {
        return SessionError::NoOutput;
    };

    let session_size = session.size_sectors();
    info!("Session size {}/Disc size {}", session_size, disc_size);

    if session_size < disc_size {
        return SessionError::Valid;
    }

    let max_sectors = disc_size.saturating_mul(OVERBURN_PERCENT) / 100;
    if max_sectors < session_size {
        return SessionError::InsufficientSpace;
    }

    if !session.flags().contains(BurnFlags::OVERBURN) {
        if !supported.contains(BurnFlags::OVERBURN) {
            return SessionError::InsufficientSpace;
        }
        return SessionError::OverburnNecessary;
    }

    SessionError::Valid
}
