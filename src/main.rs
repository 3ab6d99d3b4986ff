use anyhow::Context;
use clap::Parser;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use stringstore::{Config, Server};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Redis-compatible in-memory string store
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides the config file
    #[arg(short, long)]
    addr: Option<String>,

    /// Log level, overrides the config file
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn load_config(&self) -> anyhow::Result<Config> {
        let config = Config::load(
            self.config.as_deref(),
            self.addr.clone(),
            self.log_level.clone(),
        )?;
        Ok(config)
    }
}

/// Initialize logging; `RUST_LOG` takes precedence over the configured level
fn init_logging(config: &Config) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log.level)
            .with_context(|| format!("invalid log level '{}'", config.log.level))?,
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true);

    match &config.log.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file '{}'", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = args.load_config()?;
    init_logging(&config)?;

    info!("Starting StringStore - Redis compatible string store");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let server = Server::bind(&config.server_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server_addr))?;
    let server = Arc::new(server);
    info!("Server listening on: {}", server.local_addr());

    tokio::select! {
        _ = Arc::clone(&server).run() => {}
        res = tokio::signal::ctrl_c() => {
            res.context("failed to listen for ctrl-c")?;
            info!("Received ctrl-c, shutting down with {} keys in memory", server.store().len());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stringstore::ConfigError;

    #[test]
    fn test_flags_override_defaults() {
        let args = Args::try_parse_from([
            "stringstore",
            "--addr",
            "0.0.0.0:7000",
            "--log-level",
            "debug",
        ])
        .unwrap();
        let config = args.load_config().unwrap();
        assert_eq!(config.server_addr, "0.0.0.0:7000");
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn test_bad_flags_are_rejected() {
        let args = Args::try_parse_from(["stringstore", "-a", "7000"]).unwrap();
        let err = args.load_config().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::InvalidAddr { .. })
        ));

        let args = Args::try_parse_from(["stringstore", "--log-level", "verbose"]).unwrap();
        let err = args.load_config().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::InvalidLogLevel { .. })
        ));
    }

    #[test]
    fn test_config_flag_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stringstore.toml");
        std::fs::write(&path, "server_addr = \"localhost:7100\"\n").unwrap();

        let args = Args::try_parse_from(["stringstore", "-c", path.to_str().unwrap()]).unwrap();
        assert_eq!(args.load_config().unwrap().server_addr, "localhost:7100");
    }
}
