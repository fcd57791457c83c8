use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rustburn")]
#[command(about = "Query optical drives and check burn sessions against drive capabilities")]
#[command(version = "0.1.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Specify configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List write speeds supported for the loaded disc
    Speeds {
        /// Optical drive path (e.g. /dev/sr0 or \\.\CdRom0)
        #[arg(value_name = "DEVICE")]
        device: String,
    },

    /// Show the nominal performance curve of the drive
    Performance {
        /// Optical drive path
        #[arg(value_name = "DEVICE")]
        device: String,

        /// Query write performance instead of read performance
        #[arg(short, long)]
        write: bool,
    },

    /// Show disc information of the loaded medium
    DiscInfo {
        /// Optical drive path
        #[arg(value_name = "DEVICE")]
        device: String,
    },

    /// Validate a burn project against a capability profile
    Check {
        /// Project file (JSON)
        #[arg(value_name = "PROJECT")]
        project: PathBuf,

        /// Capability profile (JSON)
        #[arg(long, value_name = "PROFILE")]
        caps: PathBuf,

        /// Accept overburning when the data only fits that way
        #[arg(long)]
        overburn: bool,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
