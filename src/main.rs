// src/main.rs
use std::io::ErrorKind;
use std::process::ExitCode;

use bin_packer_3d::api;
use bin_packer_3d::config::AppConfig;
use log::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv_result = dotenvy::dotenv();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = dotenv_result
        && !matches!(&err, dotenvy::Error::Io(io_err) if io_err.kind() == ErrorKind::NotFound)
    {
        warn!("⚠️ Could not load .env: {}", err);
    }

    let app_config = AppConfig::from_env();

    info!("🚀 Bin packing service starting...");
    match api::start_api_server(app_config.api, app_config.optimizer).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("Server stopped: {}", err);
            ExitCode::FAILURE
        }
    }
}
