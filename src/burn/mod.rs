//! Burn session configuration
//!
//! Negotiates burn flags against a capability backend, checks the session fits
//! the disc and tracks the resulting validity.

pub mod caps;
pub mod flags;
pub mod negotiate;
pub mod prefs;
pub mod profile;
pub mod session;
pub mod size;
pub mod validity;

pub use caps::{BurnCaps, FlagSupport};
pub use flags::BurnFlags;
pub use negotiate::{negotiate_flags, NegotiationOutcome};
pub use prefs::{JsonFilePreferences, MemoryPreferences, PreferenceStore};
pub use profile::{CapsProfile, CapsRule};
pub use session::{
    BurnSession, Drive, ImageFormat, InputKind, InputType, Medium, MediumStatus, SizeTags, Track,
};
pub use size::check_size;
pub use validity::{ObserverId, SessionCfg, SessionError, SessionNotice};
