mod api_client;
mod classify;
mod config;
mod error;
mod fs;
mod mirror;

use clap::Parser;
use config::Config;
use fs::{FsWrapper, RemoteFs};
use fuser::MountOption;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// Mount a wiki namespace as a local filesystem.
#[derive(Parser, Debug)]
#[command(name = "wikifs")]
struct Cli {
    /// INI config file with a `[wikifs]` section.
    config_file: PathBuf,
    /// Directory to mount the filesystem at.
    mountpoint: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config_file) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "failed to load config");
            std::process::exit(1);
        }
    };

    let filesystem = match RemoteFs::new(config) {
        Ok(fs) => FsWrapper(Arc::new(Mutex::new(fs))),
        Err(e) => {
            tracing::error!(error = %e, "failed to initialize filesystem state");
            std::process::exit(1);
        }
    };

    let options = vec![MountOption::AutoUnmount, MountOption::FSName("wikifs".to_string())];
    tracing::info!(mountpoint = %cli.mountpoint.display(), "mounting wikifs");
    if let Err(e) = fuser::mount2(filesystem, &cli.mountpoint, &options) {
        tracing::error!(error = %e, "failed to mount filesystem");
        std::process::exit(1);
    }
}
