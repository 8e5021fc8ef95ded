//! Decoders for the entity-manager accounts the fee pipeline reads.
//!
//! Accounts are Anchor-serialized: an 8 byte discriminator followed by the
//! borsh encoding of the struct. Only the fields the pipeline needs are kept.

use crate::error::{OnboardingError, Result};
use crate::types::NetworkType;
use byteorder::{LittleEndian, ReadBytesExt};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use solana_sdk::pubkey::Pubkey;
use std::io::{Cursor, Read};

/// Anchor account discriminator: first 8 bytes of `sha256("account:<Name>")`.
pub fn account_discriminator(name: &str) -> [u8; 8] {
    let hash = Sha256::digest(format!("account:{name}").as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&hash[..8]);
    out
}

/// Little-endian borsh reader over account data.
struct AccountReader<'a> {
    name: &'static str,
    cursor: Cursor<&'a [u8]>,
}

impl<'a> AccountReader<'a> {
    fn new(name: &'static str, data: &'a [u8]) -> Result<Self> {
        if data.len() < 8 || data[..8] != account_discriminator(name) {
            return Err(OnboardingError::AccountDecode {
                account: name.to_string(),
                reason: "discriminator mismatch".to_string(),
            });
        }
        let mut cursor = Cursor::new(data);
        cursor.set_position(8);
        Ok(Self { name, cursor })
    }

    fn err(&self, e: impl std::fmt::Display) -> OnboardingError {
        OnboardingError::AccountDecode {
            account: self.name.to_string(),
            reason: format!("{e} at offset {}", self.cursor.position()),
        }
    }

    fn u8(&mut self) -> Result<u8> {
        self.cursor.read_u8().map_err(|e| self.err(e))
    }

    fn bool(&mut self) -> Result<bool> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(self.err(format!("invalid bool {other}"))),
        }
    }

    fn u16(&mut self) -> Result<u16> {
        self.cursor.read_u16::<LittleEndian>().map_err(|e| self.err(e))
    }

    fn u32(&mut self) -> Result<u32> {
        self.cursor.read_u32::<LittleEndian>().map_err(|e| self.err(e))
    }

    fn i32(&mut self) -> Result<i32> {
        self.cursor.read_i32::<LittleEndian>().map_err(|e| self.err(e))
    }

    fn u64(&mut self) -> Result<u64> {
        self.cursor.read_u64::<LittleEndian>().map_err(|e| self.err(e))
    }

    fn pubkey(&mut self) -> Result<Pubkey> {
        let mut buf = [0u8; 32];
        self.cursor.read_exact(&mut buf).map_err(|e| self.err(e))?;
        Ok(Pubkey::new_from_array(buf))
    }

    fn string(&mut self) -> Result<String> {
        let len = self.u32()? as usize;
        let remaining = self.cursor.get_ref().len() as u64 - self.cursor.position();
        if len as u64 > remaining {
            return Err(self.err(format!("string length {len} exceeds data")));
        }
        let mut buf = vec![0u8; len];
        self.cursor.read_exact(&mut buf).map_err(|e| self.err(e))?;
        String::from_utf8(buf).map_err(|e| self.err(e))
    }

    fn option<T>(&mut self, read: impl FnOnce(&mut Self) -> Result<T>) -> Result<Option<T>> {
        match self.u8()? {
            0 => Ok(None),
            1 => read(self).map(Some),
            other => Err(self.err(format!("invalid option tag {other}"))),
        }
    }

    fn vec<T>(&mut self, mut read: impl FnMut(&mut Self) -> Result<T>) -> Result<Vec<T>> {
        let len = self.u32()? as usize;
        // every element is at least one byte
        let remaining = self.cursor.get_ref().len() as u64 - self.cursor.position();
        if len as u64 > remaining {
            return Err(self.err(format!("vec length {len} exceeds data")));
        }
        (0..len).map(|_| read(self)).collect()
    }
}

/// On-chain IOT metadata for a hotspot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IotHotspotInfo {
    pub asset: Pubkey,
    pub location: Option<u64>,
    pub elevation: Option<i32>,
    /// Gain in tenths of a dBi
    pub gain: Option<i32>,
    pub is_full_hotspot: bool,
    pub num_location_asserts: u16,
    pub is_active: bool,
    pub dc_onboarding_fee_paid: u64,
}

impl IotHotspotInfo {
    pub const ACCOUNT_NAME: &'static str = "IotHotspotInfoV0";

    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut r = AccountReader::new(Self::ACCOUNT_NAME, data)?;
        let asset = r.pubkey()?;
        let _bump_seed = r.u8()?;
        Ok(Self {
            asset,
            location: r.option(|r| r.u64())?,
            elevation: r.option(|r| r.i32())?,
            gain: r.option(|r| r.i32())?,
            is_full_hotspot: r.bool()?,
            num_location_asserts: r.u16()?,
            is_active: r.bool()?,
            dc_onboarding_fee_paid: r.u64()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MobileDeviceType {
    Cbrs,
    WifiIndoor,
    WifiOutdoor,
    WifiDataOnly,
}

impl MobileDeviceType {
    fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(MobileDeviceType::Cbrs),
            1 => Some(MobileDeviceType::WifiIndoor),
            2 => Some(MobileDeviceType::WifiOutdoor),
            3 => Some(MobileDeviceType::WifiDataOnly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WifiDeploymentInfo {
    pub antenna: u32,
    pub elevation: i32,
    pub azimuth: u16,
    pub mechanical_down_tilt: u16,
    pub electrical_down_tilt: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CbrsRadioInfo {
    pub radio_id: String,
    pub elevation: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeploymentInfo {
    WifiInfoV0(WifiDeploymentInfo),
    CbrsInfoV0 { radio_infos: Vec<CbrsRadioInfo> },
}

/// On-chain MOBILE metadata for a hotspot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MobileHotspotInfo {
    pub asset: Pubkey,
    pub location: Option<u64>,
    pub is_full_hotspot: bool,
    pub num_location_asserts: u16,
    pub is_active: bool,
    pub dc_onboarding_fee_paid: u64,
    pub device_type: MobileDeviceType,
    pub deployment_info: Option<DeploymentInfo>,
}

impl MobileHotspotInfo {
    pub const ACCOUNT_NAME: &'static str = "MobileHotspotInfoV0";

    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut r = AccountReader::new(Self::ACCOUNT_NAME, data)?;
        let asset = r.pubkey()?;
        let _bump_seed = r.u8()?;
        let location = r.option(|r| r.u64())?;
        let is_full_hotspot = r.bool()?;
        let num_location_asserts = r.u16()?;
        let is_active = r.bool()?;
        let dc_onboarding_fee_paid = r.u64()?;
        let device_index = r.u8()?;
        let device_type = MobileDeviceType::from_index(device_index)
            .ok_or_else(|| r.err(format!("unknown device type {device_index}")))?;
        let deployment_info = r.option(|r| match r.u8()? {
            0 => Ok(DeploymentInfo::WifiInfoV0(WifiDeploymentInfo {
                antenna: r.u32()?,
                elevation: r.i32()?,
                azimuth: r.u16()?,
                mechanical_down_tilt: r.u16()?,
                electrical_down_tilt: r.u16()?,
            })),
            1 => Ok(DeploymentInfo::CbrsInfoV0 {
                radio_infos: r.vec(|r| {
                    Ok(CbrsRadioInfo {
                        radio_id: r.string()?,
                        elevation: r.i32()?,
                    })
                })?,
            }),
            other => Err(r.err(format!("unknown deployment info variant {other}"))),
        })?;

        Ok(Self {
            asset,
            location,
            is_full_hotspot,
            num_location_asserts,
            is_active,
            dc_onboarding_fee_paid,
            device_type,
            deployment_info,
        })
    }

    pub fn wifi_info(&self) -> Option<&WifiDeploymentInfo> {
        match &self.deployment_info {
            Some(DeploymentInfo::WifiInfoV0(info)) => Some(info),
            _ => None,
        }
    }
}

/// Existing on-chain info for one network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExistingHotspotInfo {
    Iot(IotHotspotInfo),
    Mobile(MobileHotspotInfo),
}

impl ExistingHotspotInfo {
    pub fn location(&self) -> Option<u64> {
        match self {
            ExistingHotspotInfo::Iot(info) => info.location,
            ExistingHotspotInfo::Mobile(info) => info.location,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceFees {
    pub device_type: MobileDeviceType,
    pub dc_onboarding_fee: u64,
    pub location_staking_fee: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSettings {
    IotConfig {
        min_gain: i32,
        max_gain: i32,
        full_location_staking_fee: u64,
        dataonly_location_staking_fee: u64,
    },
    MobileConfig {
        full_location_staking_fee: u64,
        dataonly_location_staking_fee: u64,
    },
    MobileConfigV1 {
        fees_by_device: Vec<DeviceFees>,
    },
    MobileConfigV2 {
        fees_by_device: Vec<DeviceFees>,
    },
}

impl ConfigSettings {
    /// Full-hotspot location staking fee in DC, if these settings apply to `network`.
    ///
    /// Per-device mobile settings report the highest device fee.
    pub fn location_staking_fee(&self, network: NetworkType) -> Option<u64> {
        match (network, self) {
            (
                NetworkType::Iot,
                ConfigSettings::IotConfig {
                    full_location_staking_fee,
                    ..
                },
            ) => Some(*full_location_staking_fee),
            (
                NetworkType::Mobile,
                ConfigSettings::MobileConfig {
                    full_location_staking_fee,
                    ..
                },
            ) => Some(*full_location_staking_fee),
            (NetworkType::Mobile, ConfigSettings::MobileConfigV1 { fees_by_device })
            | (NetworkType::Mobile, ConfigSettings::MobileConfigV2 { fees_by_device }) => {
                fees_by_device.iter().map(|f| f.location_staking_fee).max()
            }
            (NetworkType::Iot, _) | (NetworkType::Mobile, _) => None,
        }
    }
}

/// Per-network configuration account, keyed by subDAO and symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardableEntityConfig {
    pub authority: Pubkey,
    pub symbol: String,
    pub sub_dao: Pubkey,
    pub settings: ConfigSettings,
}

impl RewardableEntityConfig {
    pub const ACCOUNT_NAME: &'static str = "RewardableEntityConfigV0";

    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut r = AccountReader::new(Self::ACCOUNT_NAME, data)?;
        let authority = r.pubkey()?;
        let symbol = r.string()?;
        let sub_dao = r.pubkey()?;
        let settings = match r.u8()? {
            0 => ConfigSettings::IotConfig {
                min_gain: r.i32()?,
                max_gain: r.i32()?,
                full_location_staking_fee: r.u64()?,
                dataonly_location_staking_fee: r.u64()?,
            },
            1 => ConfigSettings::MobileConfig {
                full_location_staking_fee: r.u64()?,
                dataonly_location_staking_fee: r.u64()?,
            },
            2 => ConfigSettings::MobileConfigV1 {
                fees_by_device: r.vec(|r| read_device_fees(r, false))?,
            },
            3 => ConfigSettings::MobileConfigV2 {
                fees_by_device: r.vec(|r| read_device_fees(r, true))?,
            },
            other => return Err(r.err(format!("unknown settings variant {other}"))),
        };

        Ok(Self {
            authority,
            symbol,
            sub_dao,
            settings,
        })
    }
}

fn read_device_fees(r: &mut AccountReader<'_>, extended: bool) -> Result<DeviceFees> {
    let device_index = r.u8()?;
    let device_type = MobileDeviceType::from_index(device_index)
        .ok_or_else(|| r.err(format!("unknown device type {device_index}")))?;
    let fees = DeviceFees {
        device_type,
        dc_onboarding_fee: r.u64()?,
        location_staking_fee: r.u64()?,
    };
    if extended {
        // mobile_onboarding_fee_usd + 8 reserved words
        for _ in 0..9 {
            r.u64()?;
        }
    }
    Ok(fees)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(name: &str) -> Vec<u8> {
        account_discriminator(name).to_vec()
    }

    fn iot_info_bytes(location: Option<u64>, gain: Option<i32>) -> Vec<u8> {
        let mut data = header(IotHotspotInfo::ACCOUNT_NAME);
        data.extend_from_slice(Pubkey::new_unique().as_ref());
        data.push(255); // bump
        match location {
            Some(l) => {
                data.push(1);
                data.extend_from_slice(&l.to_le_bytes());
            }
            None => data.push(0),
        }
        data.push(1);
        data.extend_from_slice(&25i32.to_le_bytes()); // elevation
        match gain {
            Some(g) => {
                data.push(1);
                data.extend_from_slice(&g.to_le_bytes());
            }
            None => data.push(0),
        }
        data.push(1); // full hotspot
        data.extend_from_slice(&2u16.to_le_bytes());
        data.push(1); // active
        data.extend_from_slice(&4_000_000u64.to_le_bytes());
        data
    }

    #[test]
    fn test_decode_iot_info() {
        let info = IotHotspotInfo::decode(&iot_info_bytes(Some(631_246_145_620_711_423), Some(12))).unwrap();
        assert_eq!(info.location, Some(631_246_145_620_711_423));
        assert_eq!(info.elevation, Some(25));
        assert_eq!(info.gain, Some(12));
        assert_eq!(info.num_location_asserts, 2);
        assert!(info.is_active);
        assert_eq!(info.dc_onboarding_fee_paid, 4_000_000);
    }

    #[test]
    fn test_decode_rejects_wrong_discriminator() {
        let mut data = iot_info_bytes(None, None);
        data[0] ^= 0xff;
        assert!(matches!(
            IotHotspotInfo::decode(&data),
            Err(OnboardingError::AccountDecode { .. })
        ));
    }

    #[test]
    fn test_decode_truncated_account() {
        let data = iot_info_bytes(Some(1), Some(1));
        assert!(IotHotspotInfo::decode(&data[..data.len() - 4]).is_err());
    }

    #[test]
    fn test_decode_mobile_info_with_wifi_deployment() {
        let mut data = header(MobileHotspotInfo::ACCOUNT_NAME);
        data.extend_from_slice(Pubkey::new_unique().as_ref());
        data.push(254);
        data.push(0); // no location
        data.push(1);
        data.extend_from_slice(&0u16.to_le_bytes());
        data.push(0);
        data.extend_from_slice(&0u64.to_le_bytes());
        data.push(2); // wifi outdoor
        data.push(1); // Some(deployment)
        data.push(0); // WifiInfoV0
        data.extend_from_slice(&6u32.to_le_bytes());
        data.extend_from_slice(&(-3i32).to_le_bytes());
        data.extend_from_slice(&180u16.to_le_bytes());
        data.extend_from_slice(&5u16.to_le_bytes());
        data.extend_from_slice(&7u16.to_le_bytes());

        let info = MobileHotspotInfo::decode(&data).unwrap();
        assert_eq!(info.location, None);
        assert_eq!(info.device_type, MobileDeviceType::WifiOutdoor);
        let wifi = info.wifi_info().unwrap();
        assert_eq!(wifi.antenna, 6);
        assert_eq!(wifi.elevation, -3);
        assert_eq!(wifi.azimuth, 180);
        assert_eq!(wifi.electrical_down_tilt, 7);
    }

    #[test]
    fn test_decode_iot_config_staking_fee() {
        let mut data = header(RewardableEntityConfig::ACCOUNT_NAME);
        data.extend_from_slice(Pubkey::new_unique().as_ref());
        data.extend_from_slice(&3u32.to_le_bytes());
        data.extend_from_slice(b"IOT");
        data.extend_from_slice(Pubkey::new_unique().as_ref());
        data.push(0);
        data.extend_from_slice(&(-20i32).to_le_bytes());
        data.extend_from_slice(&150i32.to_le_bytes());
        data.extend_from_slice(&1_000_000u64.to_le_bytes());
        data.extend_from_slice(&50_000u64.to_le_bytes());

        let config = RewardableEntityConfig::decode(&data).unwrap();
        assert_eq!(config.symbol, "IOT");
        assert_eq!(config.settings.location_staking_fee(NetworkType::Iot), Some(1_000_000));
        assert_eq!(config.settings.location_staking_fee(NetworkType::Mobile), None);
    }

    #[test]
    fn test_mobile_v2_fee_takes_highest_device() {
        let settings = ConfigSettings::MobileConfigV2 {
            fees_by_device: vec![
                DeviceFees {
                    device_type: MobileDeviceType::Cbrs,
                    dc_onboarding_fee: 4_000_000,
                    location_staking_fee: 0,
                },
                DeviceFees {
                    device_type: MobileDeviceType::WifiOutdoor,
                    dc_onboarding_fee: 4_000_000,
                    location_staking_fee: 1_000_000,
                },
            ],
        };
        assert_eq!(settings.location_staking_fee(NetworkType::Mobile), Some(1_000_000));
    }

    #[test]
    fn test_decode_mobile_v2_config() {
        let mut data = header(RewardableEntityConfig::ACCOUNT_NAME);
        data.extend_from_slice(Pubkey::new_unique().as_ref());
        data.extend_from_slice(&6u32.to_le_bytes());
        data.extend_from_slice(b"MOBILE");
        data.extend_from_slice(Pubkey::new_unique().as_ref());
        data.push(3);
        data.extend_from_slice(&1u32.to_le_bytes());
        data.push(1); // wifi indoor
        data.extend_from_slice(&1_000_000u64.to_le_bytes());
        data.extend_from_slice(&500_000u64.to_le_bytes());
        for _ in 0..9 {
            data.extend_from_slice(&0u64.to_le_bytes());
        }

        let config = RewardableEntityConfig::decode(&data).unwrap();
        assert_eq!(config.settings.location_staking_fee(NetworkType::Mobile), Some(500_000));
    }

    #[test]
    fn test_decode_mobile_v1_config_without_trailing_words() {
        let mut data = header(RewardableEntityConfig::ACCOUNT_NAME);
        data.extend_from_slice(Pubkey::new_unique().as_ref());
        data.extend_from_slice(&6u32.to_le_bytes());
        data.extend_from_slice(b"MOBILE");
        data.extend_from_slice(Pubkey::new_unique().as_ref());
        data.push(2);
        data.extend_from_slice(&2u32.to_le_bytes());
        data.push(0); // cbrs
        data.extend_from_slice(&4_000_000u64.to_le_bytes());
        data.extend_from_slice(&0u64.to_le_bytes());
        data.push(2); // wifi outdoor
        data.extend_from_slice(&4_000_000u64.to_le_bytes());
        data.extend_from_slice(&750_000u64.to_le_bytes());

        let config = RewardableEntityConfig::decode(&data).unwrap();
        let ConfigSettings::MobileConfigV1 { fees_by_device } = &config.settings else {
            panic!("unexpected settings: {:?}", config.settings);
        };
        assert_eq!(fees_by_device.len(), 2);
        assert_eq!(fees_by_device[1].device_type, MobileDeviceType::WifiOutdoor);
        assert_eq!(config.settings.location_staking_fee(NetworkType::Mobile), Some(750_000));
    }
}
