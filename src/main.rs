//! Command line front end for the onboarding service.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hotspot_onboarding::chain::address;
use hotspot_onboarding::chain::location::{h3_location, location_to_hex};
use hotspot_onboarding::types::parse_network_details;
use hotspot_onboarding::{AssertRequest, OnboardingBuilder, OnboardingConfig};
use solana_sdk::signature::{read_keypair_file, Signer};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "hotspot-onboarding")]
#[command(about = "Compute fees and build transactions for onboarding Helium hotspots")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the onboarding record for a hotspot
    Record {
        /// Hotspot address
        gateway: String,
    },
    /// Compute assert-location fees and transactions
    Assert {
        /// Hotspot address
        gateway: String,
        /// Owner wallet, Solana or legacy Helium format
        #[arg(long)]
        owner: String,
        /// JSON array of network details, e.g. '[{"hotspotType":"IOT","lat":45.0,"lng":-122.0}]'
        #[arg(long)]
        networks: String,
        /// Pay fees from this wallet instead of the maker
        #[arg(long)]
        payer: Option<String>,
        /// Sign with this keypair and submit the transactions
        #[arg(long)]
        keypair: Option<PathBuf>,
    },
    /// Convert an address between legacy Helium and Solana formats
    Address { address: String },
    /// H3 location for a coordinate
    Location { lat: f64, lng: f64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => OnboardingConfig::load(path)?,
        None => OnboardingConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_max_level(config.log_level())
        .init();

    match cli.command {
        Command::Address { address } => {
            let key = address::parse_any(&address)?;
            println!("solana: {key}");
            println!("helium: {}", address::solana_to_helium(&key));
        }
        Command::Location { lat, lng } => {
            let location = h3_location(lat, lng)?;
            println!("{location} ({})", location_to_hex(location));
        }
        Command::Record { gateway } => {
            let service = OnboardingBuilder::new().with_config(config).build()?;
            match service.get_onboarding_record(&gateway).await? {
                Some(record) => println!("{}", serde_json::to_string_pretty(record.as_ref())?),
                None => println!("onboarding record unavailable (rate limited)"),
            }
            println!("issued: {}", service.is_hotspot_issued(&gateway).await?);
        }
        Command::Assert {
            gateway,
            owner,
            networks,
            payer,
            keypair,
        } => {
            let service = OnboardingBuilder::new().with_config(config).build()?;
            let owner = address::parse_any(&owner)?;
            let details = parse_network_details(&networks)?;

            let mut request = AssertRequest::new(gateway, owner, details)?;
            if let Some(payer) = payer {
                request = request.with_payer(address::parse_any(&payer)?);
            }

            let data = service.get_assert_data(&request).await?;
            println!("{}", serde_json::to_string_pretty(&data)?);

            if let Some(path) = keypair {
                let signer = read_keypair_file(&path)
                    .map_err(|e| anyhow::anyhow!("{e}"))
                    .with_context(|| format!("Failed to read keypair {}", path.display()))?;
                anyhow::ensure!(signer.pubkey() == owner, "keypair does not match owner");
                anyhow::ensure!(data.has_sufficient_balance, "insufficient balance to assert");

                info!("Submitting {} transactions", data.plan.len());
                let results = service.submit(&data.plan, &signer).await?;
                println!("{}", serde_json::to_string_pretty(&results)?);
            }
        }
    }

    Ok(())
}
