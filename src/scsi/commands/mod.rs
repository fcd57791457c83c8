//! MMC Commands Module
//!
//! Typed wrappers for the MMC commands used to gather drive and medium facts.

pub mod get_performance;
pub mod read_disc_info;

pub use get_performance::{
    max_write_speed, mmc2_get_performance_perf_desc, mmc3_get_performance_wrt_spd_desc,
    GetPerformanceCommand, PerformanceDescriptor, PerformanceHeader, WriteSpeedDescriptor,
};
pub use read_disc_info::{read_disc_information, DiscInfo, OpcEntry};
