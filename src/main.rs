//! Sample App Records - Main entry point.
//!
//! One binary serves the records API on Lambda, the table bootstrap hook on
//! Lambda, or the records API on a local HTTP port, depending on `--mode`.

#![recursion_limit = "256"]

use aws_config::{BehaviorVersion, Region};
use clap::Parser;
use sampleapp_records::config::{Config, Mode};
use sampleapp_records::credentials::{RdsTokenSigner, SecretsManagerResolver};
use sampleapp_records::db::{ConnectionFactory, Connector, DirectConnector};
use sampleapp_records::handlers::RecordsApi;
use sampleapp_records::transport::{
    BoxError, HookTransport, HttpTransport, LambdaTransport, Transport,
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    // CloudWatch stamps every line itself
    match (config.json_logs, config.mode.is_lambda()) {
        (true, true) => subscriber.with(fmt::layer().json().without_time()).init(),
        (true, false) => subscriber.with(fmt::layer().json()).init(),
        (false, true) => subscriber
            .with(fmt::layer().with_target(false).with_ansi(false).without_time())
            .init(),
        (false, false) => subscriber.with(fmt::layer().with_target(true)).init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Parse configuration from command line and environment
    let config = Config::parse();

    // Initialize logging
    init_tracing(&config);

    info!(
        mode = %config.mode,
        "Starting sampleapp-records v{}",
        env!("CARGO_PKG_VERSION")
    );

    let result = match config.direct_database_url() {
        Some(url) => {
            info!("Using direct database connection from DATABASE_URL");
            let connector =
                DirectConnector::from_url(url, config.connect_timeout()?, config.query_timeout()?)?;
            run_mode(&config, connector).await
        }
        None => {
            let settings = config.connection_settings()?;
            info!(
                region = %settings.region,
                host = %settings.host,
                secret_name = %settings.secret_name,
                "Using IAM-authenticated connections"
            );

            let sdk_config = aws_config::defaults(BehaviorVersion::latest())
                .region(Region::new(settings.region.clone()))
                .load()
                .await;
            let credentials = sdk_config
                .credentials_provider()
                .ok_or("No AWS credentials provider available")?;

            let factory = ConnectionFactory::new(
                SecretsManagerResolver::new(sdk_config),
                RdsTokenSigner::new(credentials),
                settings,
            );
            run_mode(&config, factory).await
        }
    };

    if let Err(e) = &result {
        error!(error = %e, "Server error");
    }
    result
}

async fn run_mode<C: Connector + 'static>(config: &Config, connector: C) -> Result<(), BoxError> {
    match config.mode {
        Mode::Api => {
            let transport = LambdaTransport::new(RecordsApi::new(connector));
            info!(transport = transport.name(), "Using Lambda API transport");
            transport.run().await
        }
        Mode::Hook => {
            let transport = HookTransport::new(connector);
            info!(transport = transport.name(), "Using lifecycle hook transport");
            transport.run().await
        }
        Mode::Serve => {
            let transport =
                HttpTransport::new(RecordsApi::new(connector), &config.http_host, config.http_port);
            info!(
                transport = transport.name(),
                addr = %transport.bind_addr(),
                "Using HTTP transport"
            );
            transport.run().await
        }
    }
}
