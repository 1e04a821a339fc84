pub mod geocode;
pub mod reverse;

use anyhow::{Context, Result};
use geogate::{GeocodeResult, Geocoder, GeocoderBuilder, Mode};
use serde::Serialize;
use std::time::Duration;

use crate::{ModeArg, ProviderArgs};

/// One-line JSON shape printed with `--json`.
#[derive(Serialize)]
struct MatchOutput<'a> {
    query: &'a str,
    address: &'a str,
    lat: f64,
    lng: f64,
    location_type: &'a str,
}

/// Build a geocoder from the command-line provider options.
pub fn build_geocoder(args: &ProviderArgs) -> Result<Geocoder> {
    let mode = match args.mode {
        ModeArg::Mock => Mode::Mock,
        ModeArg::Live => Mode::Live,
    };

    let mut builder = GeocoderBuilder::new()
        .mode(mode)
        .api_key(args.api_key.clone())
        .fixture_path(args.fixture.clone())
        .timeout(Duration::from_secs(args.timeout));

    if let Some(base_url) = &args.base_url {
        builder = builder.base_url(base_url.clone());
    }

    builder.build().context("Failed to create geocoder")
}

/// Print a match either as `address (lat, lng)` or as JSON.
pub fn print_match(query: &str, result: &GeocodeResult, json: bool) -> Result<()> {
    let location = result.geometry.location;

    if json {
        let output = MatchOutput {
            query,
            address: &result.address,
            lat: location.lat,
            lng: location.lng,
            location_type: &result.geometry.location_type,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{} ({}, {})", result.address, location.lat, location.lng);
    }

    Ok(())
}
