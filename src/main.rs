use armkit::shell::Shell;
use armkit::{init_logging, OperatorConsole, SettingsManager, BUILD_DATE, VERSION};
use clap::Parser;
use std::path::PathBuf;

/// Operator console for SCARA and industrial robot arms
#[derive(Parser, Debug)]
#[command(name = "armkit", version, about)]
struct Args {
    /// Config file (.toml or .json); defaults to the platform config dir
    #[arg(long)]
    config: Option<PathBuf>,

    /// Controller host to connect to at startup
    #[arg(long)]
    host: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(args.log_json)?;
    tracing::info!("ArmKit {} (built {})", VERSION, BUILD_DATE);

    let config_path = match args.config {
        Some(path) => path,
        None => SettingsManager::ensure_config_dir()?.join("config.toml"),
    };
    let config = SettingsManager::load_or_default(&config_path)?;
    let console = OperatorConsole::new(&config)?;

    let host = args.host.or_else(|| config.connection.last_host.clone());
    let mut shell = Shell::new(console, config, Some(config_path));
    if let Some(host) = host {
        shell.execute(&format!("connect {}", host)).await;
    }

    shell.run().await?;
    Ok(())
}
