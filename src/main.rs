use anyhow::Result;
use clap::Parser;
use isbul::cli::{handle_command, Cli};
use isbul::environment::AppConfig;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

#[tokio::main]
async fn main() -> Result<()> {
    Registry::default()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("isbul=info,rocket::server=off")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;

    handle_command(cli, config).await
}
