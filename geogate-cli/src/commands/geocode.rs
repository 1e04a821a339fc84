use anyhow::{Context, Result};
use geogate::GeocodeQuery;

use super::{build_geocoder, print_match};
use crate::ProviderArgs;

pub async fn run(provider: &ProviderArgs, address: String, json: bool) -> Result<()> {
    let geocoder = build_geocoder(provider)?;
    let query = GeocodeQuery::address(address);

    let result = geocoder
        .first_match(&query)
        .await
        .with_context(|| format!("Failed to geocode '{}'", query.value))?;

    print_match(&query.value, &result, json)
}
