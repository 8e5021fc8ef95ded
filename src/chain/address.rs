//! Conversion between legacy Helium addresses and Solana keys.
//!
//! A legacy address is base58check over `[version=0, key_type, key[32]]`.
//! Only ed25519 keys map onto Solana.

use crate::error::{OnboardingError, Result};
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

const ADDRESS_VERSION: u8 = 0;
/// Ed25519 key type, mainnet network tag.
const ED25519_MAINNET: u8 = 0x01;
/// Ed25519 key type, testnet network tag.
const ED25519_TESTNET: u8 = 0x11;

fn invalid(address: &str, reason: impl Into<String>) -> OnboardingError {
    OnboardingError::InvalidAddress {
        address: address.to_string(),
        reason: reason.into(),
    }
}

/// Decode a legacy Helium address into the Solana key it wraps.
pub fn helium_to_solana(address: &str) -> Result<Pubkey> {
    let bytes = bs58::decode(address)
        .with_check(Some(ADDRESS_VERSION))
        .into_vec()
        .map_err(|e| invalid(address, e.to_string()))?;

    // version byte, key type byte, 32 key bytes
    if bytes.len() != 34 {
        return Err(invalid(address, format!("unexpected length {}", bytes.len())));
    }
    match bytes[1] {
        ED25519_MAINNET | ED25519_TESTNET => {}
        other => return Err(invalid(address, format!("unsupported key type {other:#04x}"))),
    }

    let key: [u8; 32] = bytes[2..]
        .try_into()
        .map_err(|_| invalid(address, "malformed key"))?;
    Ok(Pubkey::new_from_array(key))
}

/// Encode a Solana key as a mainnet legacy Helium address.
pub fn solana_to_helium(key: &Pubkey) -> String {
    let mut payload = Vec::with_capacity(34);
    payload.push(ADDRESS_VERSION);
    payload.push(ED25519_MAINNET);
    payload.extend_from_slice(key.as_ref());
    bs58::encode(payload).with_check().into_string()
}

/// Parse either a Solana key or a legacy Helium address.
pub fn parse_any(address: &str) -> Result<Pubkey> {
    if let Ok(key) = Pubkey::from_str(address) {
        return Ok(key);
    }
    helium_to_solana(address)
}

/// Raw bytes of an entity key as used in program-derived address seeds.
///
/// Hotspot entity keys are hashed from the plain base58 decoding of the
/// legacy address, checksum included. The address must be a valid legacy
/// ed25519 address.
pub fn entity_key_bytes(address: &str) -> Result<Vec<u8>> {
    helium_to_solana(address)?;
    bs58::decode(address)
        .into_vec()
        .map_err(|e| invalid(address, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_between_formats() {
        let key = Pubkey::new_unique();
        let helium = solana_to_helium(&key);
        assert_ne!(helium, key.to_string());
        assert_eq!(helium_to_solana(&helium).unwrap(), key);
    }

    #[test]
    fn test_parse_any_accepts_both_formats() {
        let key = Pubkey::new_unique();
        assert_eq!(parse_any(&key.to_string()).unwrap(), key);
        assert_eq!(parse_any(&solana_to_helium(&key)).unwrap(), key);
    }

    #[test]
    fn test_bad_checksum_is_rejected() {
        let key = Pubkey::new_unique();
        let mut helium = solana_to_helium(&key);
        let last = helium.pop().unwrap();
        helium.push(if last == '1' { '2' } else { '1' });
        assert!(matches!(
            helium_to_solana(&helium),
            Err(OnboardingError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn test_entity_key_bytes_include_checksum() {
        let key = Pubkey::new_unique();
        let bytes = entity_key_bytes(&solana_to_helium(&key)).unwrap();
        // version + key type + key + 4 checksum bytes
        assert_eq!(bytes.len(), 38);
        assert_eq!(&bytes[2..34], key.as_ref());
    }

    #[test]
    fn test_entity_key_bytes_rejects_non_hotspot_strings() {
        let solana = Pubkey::new_unique().to_string();
        assert!(matches!(
            entity_key_bytes(&solana),
            Err(OnboardingError::InvalidAddress { .. })
        ));

        let mut helium = solana_to_helium(&Pubkey::new_unique());
        let last = helium.pop().unwrap();
        helium.push(if last == '1' { '2' } else { '1' });
        assert!(entity_key_bytes(&helium).is_err());
    }
}
