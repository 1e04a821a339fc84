//! Forward lookups served from a fixture file.
//!
//! Run with: cargo run --example fixture_lookup -- data/LA.json

use geogate::{GeocodeError, GeocodeQuery, Geocoder};
use std::env;

#[tokio::main]
async fn main() -> Result<(), GeocodeError> {
    let fixture = env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: cargo run --example fixture_lookup -- /path/to/fixture.json");
        std::process::exit(1);
    });

    let geocoder = Geocoder::fixture(&fixture);

    // Mock mode ignores the address, so every query prints the same match
    let addresses = ["Los Angeles", "Griffith Observatory", "Santa Monica Pier"];

    println!("Geocoding from {}:", fixture);
    println!("{:-<50}", "");

    for address in &addresses {
        match geocoder.first_match(&GeocodeQuery::address(*address)).await {
            Ok(best) => {
                println!(
                    "{}: {} ({}, {})",
                    address, best.address, best.geometry.location.lat, best.geometry.location.lng
                );
            }
            Err(GeocodeError::NoResults) => {
                println!("{}: no match", address);
            }
            Err(e) => {
                println!("{}: error - {}", address, e);
            }
        }
    }

    Ok(())
}
