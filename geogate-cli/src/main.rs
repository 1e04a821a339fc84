use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod commands;

/// Geocoding lookups from the command line
#[derive(Parser)]
#[command(name = "geogate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    provider: ProviderArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Where lookups are answered from.
#[derive(Args)]
pub struct ProviderArgs {
    /// Answer from the fixture file (mock) or the provider (live)
    #[arg(
        short,
        long,
        env = "GEOCODE_MODE",
        value_enum,
        default_value = "mock",
        global = true
    )]
    pub mode: ModeArg,

    /// Provider API key
    #[arg(
        long,
        env = "GOOGLE_API_KEY",
        default_value = "",
        hide_env_values = true,
        global = true
    )]
    pub api_key: String,

    /// Fixture file used in mock mode
    #[arg(
        short,
        long,
        env = "GEOCODE_FIXTURE",
        default_value = "data/LA.json",
        global = true
    )]
    pub fixture: PathBuf,

    /// Provider endpoint override
    #[arg(long, env = "GEOCODE_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Provider request timeout in seconds
    #[arg(long, env = "GEOCODE_TIMEOUT_SECS", default_value = "10", global = true)]
    pub timeout: u64,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Mock,
    Live,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up the coordinates of an address
    Geocode {
        /// Free-form address
        address: String,

        /// Output result as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Look up the address at a coordinate pair
    Reverse {
        /// Latitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,

        /// Output result as JSON
        #[arg(short, long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Geocode { address, json } => {
            commands::geocode::run(&cli.provider, address, json).await
        }
        Commands::Reverse { lat, lng, json } => {
            commands::reverse::run(&cli.provider, lat, lng, json).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_accepts_negative_coordinates() {
        let cli =
            Cli::try_parse_from(["geogate", "reverse", "--lat", "34.05", "--lng", "-118.24"])
                .unwrap();
        match cli.command {
            Commands::Reverse { lat, lng, json } => {
                assert_eq!(lat, 34.05);
                assert_eq!(lng, -118.24);
                assert!(!json);
            }
            _ => panic!("expected reverse command"),
        }
    }

    #[test]
    fn test_geocode_with_live_mode() {
        let cli =
            Cli::try_parse_from(["geogate", "geocode", "Los Angeles", "--mode", "live", "-j"])
                .unwrap();
        assert!(matches!(cli.provider.mode, ModeArg::Live));
        match cli.command {
            Commands::Geocode { address, json } => {
                assert_eq!(address, "Los Angeles");
                assert!(json);
            }
            _ => panic!("expected geocode command"),
        }
    }

    #[test]
    fn test_fixture_lookup_through_builder() {
        let cli = Cli::try_parse_from([
            "geogate",
            "geocode",
            "anywhere",
            "--mode",
            "mock",
            "--fixture",
            concat!(env!("CARGO_MANIFEST_DIR"), "/../data/LA.json"),
        ])
        .unwrap();
        let geocoder = commands::build_geocoder(&cli.provider).unwrap();
        assert_eq!(geocoder.mode(), geogate::Mode::Mock);
    }
}
