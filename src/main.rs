use rust_burn::cli::{Cli, Commands};
use rust_burn::commands;
use rust_burn::config::AppConfig;
use rust_burn::error::Result;
use rust_burn::logger;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse_args();

    // Initialize logging system
    logger::init(args.verbose)?;

    debug!("rustburn CLI starting");

    match run(args).await {
        Ok(_) => {
            info!("Operation completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Operation failed: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run(args: Cli) -> Result<()> {
    let config = AppConfig::load(args.config.as_deref())?;

    match args.command {
        Commands::Speeds { device } => commands::speeds::execute(device).await,

        Commands::Performance { device, write } => {
            commands::performance::execute(device, write).await
        }

        Commands::DiscInfo { device } => commands::disc_info::execute(device).await,

        Commands::Check {
            project,
            caps,
            overburn,
        } => commands::check::execute(project, caps, overburn, &config).await,
    }
}
