//! gateway-server: accepts LoRaWAN gateway connections over TCP.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use log::{error, info};

use gateway_server::config::{ConfigFile, Overrides, Settings, DEFAULT_CONFIG_PATH};
use gateway_server::gateway::Pool;
use gateway_server::logging;
use gateway_server::server::{Server, ServerConfig, TokenTable};

/// gateway-server - LoRaWAN gateway link server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on [default: 0.0.0.0:1700]
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Configuration file path
    #[arg(short = 'f', long)]
    config: Option<PathBuf>,

    /// Downlink delivery timeout in milliseconds
    #[arg(long)]
    send_timeout_ms: Option<u64>,

    /// Uplink messages buffered per gateway
    #[arg(long)]
    uplink_buffer: Option<usize>,

    /// Directory where log files are stored [default: logs]
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Number of days to keep log files [default: 7]
    #[arg(long)]
    log_retention_days: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            listen: self.listen,
            send_timeout_ms: self.send_timeout_ms,
            uplink_buffer: self.uplink_buffer,
            log_dir: self.log_dir.clone(),
            log_retention_days: self.log_retention_days,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Explicit path > ./gateway-server.toml > defaults
    let config_path = args.config.clone().or_else(|| {
        let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
        default_path.exists().then_some(default_path)
    });
    let file_config = match &config_path {
        Some(path) => match ConfigFile::load(path) {
            Ok(c) => {
                eprintln!("Loaded config from: {}", path.display());
                c
            }
            Err(e) => {
                eprintln!("Failed to load config file: {}", e);
                return Err(e.into());
            }
        },
        None => ConfigFile::default(),
    };

    let settings = Settings::resolve(args.overrides(), file_config)?;

    logging::init_logging(
        &settings.log_dir,
        settings.log_retention_days,
        args.verbose,
        settings.log_level.as_deref(),
    )?;

    info!("gateway-server starting...");
    info!("  Listen address: {}", settings.listen);
    info!("  Send timeout: {:?}", settings.pool.send_timeout);
    info!("  Uplink buffer: {}", settings.pool.uplink_buffer);
    for gateway in &settings.gateways {
        info!("  Gateway {} ({})", gateway.id, gateway.frequency_plan);
    }

    let pool = Arc::new(Pool::new(settings.pool.clone()));
    let tokens = Arc::new(TokenTable::new(settings.gateways.clone()));
    let config = ServerConfig {
        listen_addr: settings.listen,
    };
    let server = Server::bind(&config, Arc::clone(&pool), tokens).await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = &result {
                error!("Server error: {}", e);
            }
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
        }
    }

    pool.close_all();
    Ok(())
}
