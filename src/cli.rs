// src/cli.rs
use crate::core::location::{acquire_location, position_source_from_config, StaticPosition};
use crate::core::{GeminiClient, GenerativeService, PositionSource};
use crate::discovery::description::ensure_title_and_company;
use crate::discovery::{DescriptionWriter, OpportunityFinder};
use crate::environment::AppConfig;
use crate::web::start_web_server;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "isbul")]
#[command(about = "Nearby job board with AI-assisted discovery")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the JSON API server
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
    /// Look up places near a position that might be hiring
    Discover {
        /// Job category, e.g. "garson"
        #[arg(default_value = "")]
        query: String,
        #[arg(long, requires = "lng", allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lng: Option<f64>,
    },
    /// Write a short job description for a title and company
    Describe { title: String, company: String },
}

pub async fn handle_command(cli: Cli, mut config: AppConfig) -> Result<()> {
    match cli.command {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            start_web_server(config).await
        }

        Command::Discover { query, lat, lng } => {
            let source: Box<dyn PositionSource> = match (lat, lng) {
                (Some(latitude), Some(longitude)) => Box::new(StaticPosition {
                    latitude,
                    longitude,
                }),
                _ => position_source_from_config(&config.location)?,
            };
            let location = acquire_location(source.as_ref()).await;

            let service: Arc<dyn GenerativeService> = Arc::new(GeminiClient::new(&config.gemini)?);
            let finder = OpportunityFinder::new(service);
            let jobs = finder.find_nearby(&query, Some(&location)).await?;

            if jobs.is_empty() {
                println!("No nearby opportunities found. Try another search term.");
                return Ok(());
            }

            info!("Discovered {} opportunities", jobs.len());
            println!("{}", serde_json::to_string_pretty(&jobs)?);
            Ok(())
        }

        Command::Describe { title, company } => {
            ensure_title_and_company(&title, &company)?;

            let service: Arc<dyn GenerativeService> = Arc::new(GeminiClient::new(&config.gemini)?);
            let description = DescriptionWriter::new(service)
                .generate(title.trim(), company.trim())
                .await;
            println!("{}", description);
            Ok(())
        }
    }
}
