//! Delivery settings read from the environment.
//!
//! - `STORE_LATITUDE`, `STORE_LONGITUDE` — where orders leave from
//! - `DELIVERY_BASE_FEE` (default `5.00`), `DELIVERY_PER_KM_RATE` (default `2.00`)
//! - `DELIVERY_MAX_DISTANCE_KM` (default `7.0`)

use std::collections::BTreeMap;
use std::env;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use thiserror::Error;

use crate::domain::geo::{Coordinates, DeliveryRadius};
use crate::domain::pricing::DeliveryTariff;

const DEFAULT_STORE_LATITUDE: f64 = -23.5614;
const DEFAULT_STORE_LONGITUDE: f64 = -46.6559;

#[derive(Debug, Error)]
#[error("Invalid value '{value}' for {key}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    pub store_location: Coordinates,
    pub radius: DeliveryRadius,
    pub tariff: DeliveryTariff,
    pub partner_links: BTreeMap<String, String>,
}

impl DeliveryConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let latitude = parse_checked(
            &lookup,
            "STORE_LATITUDE",
            defaults.store_location.latitude,
            |lat| (-90.0..=90.0).contains(lat),
        )?;
        let longitude = parse_checked(
            &lookup,
            "STORE_LONGITUDE",
            defaults.store_location.longitude,
            |lon| (-180.0..=180.0).contains(lon),
        )?;
        let max_distance_km = parse_checked(
            &lookup,
            "DELIVERY_MAX_DISTANCE_KM",
            defaults.radius.max_distance_km(),
            |km| km.is_finite() && *km >= 0.0,
        )?;
        let zero = BigDecimal::from(0);

        Ok(Self {
            store_location: Coordinates::new(latitude, longitude),
            radius: DeliveryRadius::new(max_distance_km),
            tariff: DeliveryTariff {
                base_fee: parse_checked(
                    &lookup,
                    "DELIVERY_BASE_FEE",
                    defaults.tariff.base_fee,
                    |fee| *fee >= zero,
                )?,
                per_km_rate: parse_checked(
                    &lookup,
                    "DELIVERY_PER_KM_RATE",
                    defaults.tariff.per_km_rate,
                    |rate| *rate >= zero,
                )?,
            },
            partner_links: defaults.partner_links,
        })
    }
}

/// Parses `key` when set; values that fail to parse or fail `valid` are errors.
fn parse_checked<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
    valid: impl Fn(&T) -> bool,
) -> Result<T, ConfigError> {
    let Some(value) = lookup(key) else {
        return Ok(default);
    };
    match value.trim().parse() {
        Ok(parsed) if valid(&parsed) => Ok(parsed),
        _ => Err(ConfigError { key, value }),
    }
}

pub fn default_partner_links() -> BTreeMap<String, String> {
    [
        ("iFood", "https://www.ifood.com.br"),
        ("Rappi", "https://www.rappi.com.br"),
        ("Uber Eats", "https://www.ubereats.com/br"),
    ]
    .into_iter()
    .map(|(name, url)| (name.to_string(), url.to_string()))
    .collect()
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            store_location: Coordinates::new(DEFAULT_STORE_LATITUDE, DEFAULT_STORE_LONGITUDE),
            radius: DeliveryRadius::default(),
            tariff: DeliveryTariff::default(),
            partner_links: default_partner_links(),
        }
    }
}
