use anyhow::{Context, Result};
use geogate::GeocodeQuery;

use super::{build_geocoder, print_match};
use crate::ProviderArgs;

pub async fn run(provider: &ProviderArgs, lat: f64, lng: f64, json: bool) -> Result<()> {
    let geocoder = build_geocoder(provider)?;
    let query = GeocodeQuery::lat_lng(lat, lng);

    let result = geocoder
        .first_match(&query)
        .await
        .with_context(|| format!("Failed to reverse geocode {}", query.value))?;

    print_match(&query.value, &result, json)
}
