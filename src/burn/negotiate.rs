//! Flag negotiation
//!
//! Converges the session flags on a set the capability backend accepts. Flags are
//! retried one at a time in catalog order, pulling in compulsory flags as they
//! show up, and the supported/compulsory masks are recomputed after every change.
//! Within one pass flags are only ever added, so the pass ends after at most one
//! iteration per catalog flag.

use tracing::{debug, info};

use super::caps::{BurnCaps, FlagSupport};
use super::flags::BurnFlags;
use super::session::BurnSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationOutcome {
    Completed {
        /// Catalog flags examined
        iterations: usize,
        /// Calls made to the capability backend
        recomputations: usize,
    },
    /// The backend could not compute flags; the session kept its merged flags
    NotRun,
}

impl NegotiationOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, NegotiationOutcome::Completed { .. })
    }
}

struct Negotiator<'a, C: BurnCaps + ?Sized> {
    caps: &'a C,
    session: &'a mut BurnSession,
    support: &'a mut FlagSupport,
    recomputations: usize,
}

impl<'a, C: BurnCaps + ?Sized> Negotiator<'a, C> {
    /// Failures while negotiating leave both masks empty
    fn refresh(&mut self) {
        self.recomputations += 1;
        *self.support = self.caps.get_flags(&*self.session).unwrap_or_else(|e| {
            debug!("Capability recomputation failed: {}", e);
            FlagSupport::default()
        });
    }

    fn add(&mut self, flags: BurnFlags) {
        self.session.add_flags(flags);
        self.refresh();
    }

    fn satisfy_compulsory(&mut self) {
        if self.support.compulsory_missing(self.session.flags()) {
            let compulsory = self.support.compulsory;
            self.add(compulsory);
        }
    }
}

/// Negotiate `requested` together with the flags already on `session`.
///
/// `support` receives the masks matching the final flag set.
pub fn negotiate_flags<C: BurnCaps + ?Sized>(
    caps: &C,
    session: &mut BurnSession,
    requested: BurnFlags,
    support: &mut FlagSupport,
) -> NegotiationOutcome {
    *support = FlagSupport::default();

    let flags = requested | session.flags();
    session.remove_flags(flags);

    match caps.get_flags(session) {
        Ok(initial) => *support = initial,
        Err(e) => {
            info!("Could not get supported flags: {}", e);
            session.set_flags(flags);
            return NegotiationOutcome::NotRun;
        }
    }

    let same_drive = session.same_src_dest_drive();
    let mut negotiator = Negotiator {
        caps,
        session: &mut *session,
        support: &mut *support,
        recomputations: 1,
    };

    negotiator.session.add_flags(BurnFlags::ALWAYS_SAFE);

    let mut iterations = 0;
    for flag in BurnFlags::catalog() {
        iterations += 1;
        if !flags.contains(flag) {
            continue;
        }

        // write mode is chosen later when copying in place
        if same_drive && BurnFlags::WRITE_MODES.intersects(flag) {
            continue;
        }

        negotiator.satisfy_compulsory();

        if negotiator.support.supported.contains(flag) {
            negotiator.add(flag);
        }
    }

    if negotiator
        .support
        .supported
        .contains(BurnFlags::BLANK_BEFORE_WRITE)
    {
        let mut blank = BurnFlags::BLANK_BEFORE_WRITE;
        if negotiator.support.supported.contains(BurnFlags::FAST_BLANK) {
            blank |= BurnFlags::FAST_BLANK;
        }
        negotiator.add(blank);
    }

    if !same_drive && negotiator.support.supported.contains(BurnFlags::DAO) {
        negotiator.add(BurnFlags::DAO);
    }

    // DAO or blanking may have made more flags compulsory
    negotiator.satisfy_compulsory();

    let recomputations = negotiator.recomputations;
    info!(
        "Negotiated flags {:?} (supported {:?}, compulsory {:?})",
        session.flags(),
        support.supported,
        support.compulsory
    );

    NegotiationOutcome::Completed {
        iterations,
        recomputations,
    }
}
