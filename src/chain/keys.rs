//! Program ids, mints, and program-derived addresses for the Helium programs.

use crate::types::NetworkType;
use sha2::{Digest, Sha256};
use solana_sdk::{pubkey, pubkey::Pubkey};

pub const HELIUM_SUB_DAOS_PROGRAM_ID: Pubkey = pubkey!("hdaoVTCqhfHHo75XdAMxBKdUqvq1i5bF23sisBqVgGR");
pub const HELIUM_ENTITY_MANAGER_PROGRAM_ID: Pubkey =
    pubkey!("hemjuPXBpNvggtaUnN1MwT3wrdhttKEfosTcc2P9Pg8");
pub const DATA_CREDITS_PROGRAM_ID: Pubkey = pubkey!("credMBJhYFzfn7NxBMdU4aUqFggAjgztaCcv2Fo6fPT");
pub const CIRCUIT_BREAKER_PROGRAM_ID: Pubkey = pubkey!("circAbx64bbsscPbQzZAUvuXpHqrCe6fLMzc2uKXz9g");

pub const HNT_MINT: Pubkey = pubkey!("hntyVP6YFm1Hg25TN9WGLqM12b8TQmcknKrdu1oxWux");
pub const DC_MINT: Pubkey = pubkey!("dcuc8Amr83Wz27ZkQ2K9NS6r8zRpf1J6cvArEBDZDmm");
pub const IOT_MINT: Pubkey = pubkey!("iotEVVZLEywoTn1QdwNPddxPWszn3zFhEot3MfL9fns");
pub const MOBILE_MINT: Pubkey = pubkey!("mb1eu7TzEc71KxDpsmsKoucSSuuoGLv1drys1oP2jh6");

/// Pyth HNT/USD price account read by the data credits program.
pub const HNT_PRICE_ORACLE: Pubkey = pubkey!("4DdmDswskDxXGpwHrXUfn2CNUm9rt21ac79GHNTN3J33");

/// Mint backing a subnetwork's subDAO.
pub fn network_mint(network: NetworkType) -> Pubkey {
    match network {
        NetworkType::Iot => IOT_MINT,
        NetworkType::Mobile => MOBILE_MINT,
    }
}

pub fn dao_key(mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[b"dao", mint.as_ref()], &HELIUM_SUB_DAOS_PROGRAM_ID).0
}

pub fn sub_dao_key(mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[b"sub_dao", mint.as_ref()], &HELIUM_SUB_DAOS_PROGRAM_ID).0
}

pub fn rewardable_entity_config_key(sub_dao: &Pubkey, symbol: &str) -> Pubkey {
    Pubkey::find_program_address(
        &[
            b"rewardable_entity_config",
            sub_dao.as_ref(),
            symbol.to_uppercase().as_bytes(),
        ],
        &HELIUM_ENTITY_MANAGER_PROGRAM_ID,
    )
    .0
}

/// Rewardable entity config for a network, derived from its subDAO.
pub fn network_config_key(network: NetworkType) -> Pubkey {
    rewardable_entity_config_key(&sub_dao_key(&network_mint(network)), network.as_str())
}

pub fn key_to_asset_key(dao: &Pubkey, entity_key: &[u8]) -> Pubkey {
    let hash = Sha256::digest(entity_key);
    Pubkey::find_program_address(
        &[b"key_to_asset", dao.as_ref(), hash.as_slice()],
        &HELIUM_ENTITY_MANAGER_PROGRAM_ID,
    )
    .0
}

pub fn iot_info_key(rewardable_entity_config: &Pubkey, entity_key: &[u8]) -> Pubkey {
    let hash = Sha256::digest(entity_key);
    Pubkey::find_program_address(
        &[b"iot_info", rewardable_entity_config.as_ref(), hash.as_slice()],
        &HELIUM_ENTITY_MANAGER_PROGRAM_ID,
    )
    .0
}

pub fn mobile_info_key(rewardable_entity_config: &Pubkey, entity_key: &[u8]) -> Pubkey {
    let hash = Sha256::digest(entity_key);
    Pubkey::find_program_address(
        &[b"mobile_info", rewardable_entity_config.as_ref(), hash.as_slice()],
        &HELIUM_ENTITY_MANAGER_PROGRAM_ID,
    )
    .0
}

/// Per-network hotspot info account for an entity key.
pub fn hotspot_info_key(network: NetworkType, entity_key: &[u8]) -> Pubkey {
    let config = network_config_key(network);
    match network {
        NetworkType::Iot => iot_info_key(&config, entity_key),
        NetworkType::Mobile => mobile_info_key(&config, entity_key),
    }
}

pub fn data_credits_key() -> Pubkey {
    Pubkey::find_program_address(&[b"dc", DC_MINT.as_ref()], &DATA_CREDITS_PROGRAM_ID).0
}

/// Windowed mint breaker guarding DC issuance.
pub fn mint_windowed_breaker_key(mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[b"mint_windowed_breaker", mint.as_ref()],
        &CIRCUIT_BREAKER_PROGRAM_ID,
    )
    .0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_keys_differ_per_network() {
        let iot = network_config_key(NetworkType::Iot);
        let mobile = network_config_key(NetworkType::Mobile);
        assert_ne!(iot, mobile);
        assert!(!iot.is_on_curve());
    }

    #[test]
    fn test_info_keys_are_deterministic() {
        let entity = b"entity-key".to_vec();
        let a = hotspot_info_key(NetworkType::Iot, &entity);
        let b = hotspot_info_key(NetworkType::Iot, &entity);
        assert_eq!(a, b);
        assert_ne!(a, hotspot_info_key(NetworkType::Mobile, &entity));
        assert_ne!(a, hotspot_info_key(NetworkType::Iot, b"other-key"));
    }

    #[test]
    fn test_symbol_seed_is_case_insensitive() {
        let sub_dao = sub_dao_key(&IOT_MINT);
        assert_eq!(
            rewardable_entity_config_key(&sub_dao, "iot"),
            rewardable_entity_config_key(&sub_dao, "IOT")
        );
    }
}
