//! rust-burn library
//!
//! Optical drive plumbing for disc burning: MMC commands over a SCSI
//! pass-through with variable-length response handling, and the burn session
//! configuration that negotiates flags against a capability backend.

pub mod burn;
pub mod cli;
pub mod commands;
pub mod config;
pub mod display;
pub mod error;
pub mod logger;
pub mod scsi;
pub mod utils;


// Re-export key types for easier use
pub use burn::{
    BurnCaps, BurnFlags, BurnSession, CapsProfile, FlagSupport, PreferenceStore, SessionCfg,
    SessionError,
};
pub use error::{Result, RustBurnError};
pub use scsi::{ScsiInterface, ScsiTransport};
