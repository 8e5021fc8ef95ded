//! Core types shared across the onboarding pipeline.

use crate::chain::{address, location};
use crate::error::{OnboardingError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::fmt;
use std::str::FromStr;

/// The Helium subnetwork a hotspot is asserted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum NetworkType {
    Iot,
    Mobile,
}

impl NetworkType {
    /// Returns the on-chain symbol used in rewardable entity config seeds.
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkType::Iot => "IOT",
            NetworkType::Mobile => "MOBILE",
        }
    }

    pub fn all() -> [NetworkType; 2] {
        [NetworkType::Iot, NetworkType::Mobile]
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkType {
    type Err = OnboardingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "IOT" => Ok(NetworkType::Iot),
            "MOBILE" => Ok(NetworkType::Mobile),
            _ => Err(OnboardingError::UnsupportedHotspotType(s.to_string())),
        }
    }
}

impl TryFrom<String> for NetworkType {
    type Error = OnboardingError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<NetworkType> for String {
    fn from(value: NetworkType) -> Self {
        value.as_str().to_string()
    }
}

/// What the caller wants asserted on one network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDetail {
    pub hotspot_type: NetworkType,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// Antenna gain in dBi, e.g. `1.2`
    pub decimal_gain: Option<f64>,
    /// Elevation in meters
    pub elevation: Option<i32>,
    pub antenna: Option<u32>,
    pub azimuth: Option<u16>,
    pub mechanical_down_tilt: Option<u16>,
    pub electrical_down_tilt: Option<u16>,
    pub serial: Option<String>,
}

impl NetworkDetail {
    pub fn new(hotspot_type: NetworkType) -> Self {
        Self {
            hotspot_type,
            lat: None,
            lng: None,
            decimal_gain: None,
            elevation: None,
            antenna: None,
            azimuth: None,
            mechanical_down_tilt: None,
            electrical_down_tilt: None,
            serial: None,
        }
    }

    pub fn with_location(mut self, lat: f64, lng: f64) -> Self {
        self.lat = Some(lat);
        self.lng = Some(lng);
        self
    }

    pub fn with_gain(mut self, decimal_gain: f64) -> Self {
        self.decimal_gain = Some(decimal_gain);
        self
    }

    pub fn with_elevation(mut self, elevation: i32) -> Self {
        self.elevation = Some(elevation);
        self
    }

    /// H3 cell the caller wants asserted, if a usable coordinate was given.
    pub fn location(&self) -> Result<Option<u64>> {
        location::requested_location(self.lat, self.lng)
    }

    /// Whether any wifi deployment field was set explicitly.
    pub fn has_wifi_overrides(&self) -> bool {
        self.antenna.is_some()
            || self.azimuth.is_some()
            || self.mechanical_down_tilt.is_some()
            || self.electrical_down_tilt.is_some()
            || self.elevation.is_some()
    }
}

/// Parse a batch of network details, rejecting the whole batch if any entry
/// names an unsupported hotspot type.
pub fn parse_network_details(json: &str) -> Result<Vec<NetworkDetail>> {
    let raw: Vec<serde_json::Value> = serde_json::from_str(json)
        .map_err(|e| OnboardingError::Config(format!("invalid network details: {e}")))?;

    raw.into_iter()
        .map(|value| {
            if let Some(kind) = value.get("hotspotType").and_then(|v| v.as_str()) {
                kind.parse::<NetworkType>()?;
            }
            serde_json::from_value(value)
                .map_err(|e| OnboardingError::Config(format!("invalid network detail: {e}")))
        })
        .collect()
}

/// The maker sponsoring a hotspot, as returned by the onboarding server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Maker {
    #[serde(default)]
    pub id: Option<u64>,
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub location_nonce_limit: Option<u32>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Maker {
    /// Solana key of the maker wallet, accepting either address format.
    pub fn pubkey(&self) -> Result<Pubkey> {
        address::parse_any(&self.address)
    }
}

/// Links a hotspot to the maker that sponsors its onboarding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingRecord {
    #[serde(default)]
    pub id: Option<u64>,
    pub onboarding_key: String,
    #[serde(default)]
    pub public_address: Option<String>,
    #[serde(default)]
    pub mac_eth0: Option<String>,
    #[serde(default)]
    pub mac_wlan0: Option<String>,
    #[serde(default)]
    pub rpi_serial: Option<String>,
    #[serde(default)]
    pub helium_serial: Option<String>,
    #[serde(default)]
    pub batch: Option<String>,
    #[serde(default)]
    pub maker_id: Option<u64>,
    pub maker: Maker,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}
