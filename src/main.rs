use chain_capture::cli::{Cli, Commands};
use chain_capture::config::Config;
use chain_capture::store::SnapshotStore;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        toml::from_str(include_str!("../config.toml.example")).expect("Invalid default config")
    });

    // Initialize telemetry
    let _telemetry = chain_capture::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!("Starting capture loop");
            args.execute(&config).await?;
        }
        Commands::Fetch(args) => {
            tracing::info!("Fetching one snapshot");
            args.execute(&config).await?;
        }
        Commands::Export(args) => {
            args.execute(&config)?;
        }
        Commands::Status => {
            let store = SnapshotStore::new(&config.storage.history_file, &config.storage.latest_file);
            println!("chain-capture status");
            println!(
                "  History: {} ({} snapshots)",
                config.storage.history_file.display(),
                store.history_len()?
            );
            match store.read_latest()? {
                Some(snapshot) => println!(
                    "  Latest:  {} ({})",
                    config.storage.latest_file.display(),
                    snapshot.timestamp_utc
                ),
                None => println!(
                    "  Latest:  {} (none yet)",
                    config.storage.latest_file.display()
                ),
            }
        }
        Commands::Config => {
            println!("Current configuration:");
            println!("  API: {} {}", config.api.base_url, config.api.instrument_key);
            println!(
                "  Poll: every {}s, expiry {}",
                config.poll_interval().as_secs(),
                config.poll.expiry.as_deref().unwrap_or("auto")
            );
            println!(
                "  Storage: history={} latest={}",
                config.storage.history_file.display(),
                config.storage.latest_file.display()
            );
            println!(
                "  Telemetry: log_level={} metrics_port={}",
                config.telemetry.log_level, config.telemetry.metrics_port
            );
        }
    }

    Ok(())
}
