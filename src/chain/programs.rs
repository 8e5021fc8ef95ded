//! Instruction builders and the base64 transaction wire format.

use super::keys::{
    data_credits_key, mint_windowed_breaker_key, CIRCUIT_BREAKER_PROGRAM_ID,
    DATA_CREDITS_PROGRAM_ID, DC_MINT, HNT_MINT, HNT_PRICE_ORACLE,
};
use crate::currency::{Balance, Dc};
use crate::error::Result;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};
use solana_sdk::{
    hash::Hash,
    instruction::{AccountMeta, Instruction},
    message::{Message, VersionedMessage},
    pubkey::Pubkey,
    signature::Signature,
    transaction::VersionedTransaction,
};
use solana_system_interface::program as system_program;
use spl_associated_token_account::get_associated_token_address;

/// Anchor instruction discriminator: first 8 bytes of `sha256("global:<name>")`.
pub fn instruction_discriminator(name: &str) -> [u8; 8] {
    let hash = Sha256::digest(format!("global:{name}").as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&hash[..8]);
    out
}

/// Burn HNT from `owner` to mint exactly `dc` data credits back to `owner`.
pub fn mint_data_credits_instruction(owner: &Pubkey, dc: Balance<Dc>) -> Instruction {
    let burner = get_associated_token_address(owner, &HNT_MINT);
    let recipient_token_account = get_associated_token_address(owner, &DC_MINT);

    let mut data = instruction_discriminator("mint_data_credits_v0").to_vec();
    // MintDataCreditsArgsV0 { hnt_amount: None, dc_amount: Some(dc) }
    data.push(0);
    data.push(1);
    data.extend_from_slice(&dc.amount().to_le_bytes());

    Instruction {
        program_id: DATA_CREDITS_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new_readonly(data_credits_key(), false),
            AccountMeta::new_readonly(HNT_PRICE_ORACLE, false),
            AccountMeta::new(burner, false),
            AccountMeta::new(recipient_token_account, false),
            AccountMeta::new_readonly(*owner, false),
            AccountMeta::new(*owner, true),
            AccountMeta::new(HNT_MINT, false),
            AccountMeta::new(DC_MINT, false),
            AccountMeta::new(mint_windowed_breaker_key(&DC_MINT), false),
            AccountMeta::new_readonly(CIRCUIT_BREAKER_PROGRAM_ID, false),
            AccountMeta::new_readonly(spl_token::ID, false),
            AccountMeta::new_readonly(system_program::ID, false),
            AccountMeta::new_readonly(spl_associated_token_account::ID, false),
        ],
        data,
    }
}

/// Build an unsigned transaction with placeholder signatures, ready to be
/// simulated or handed to a signer.
pub fn unsigned_transaction(
    instructions: &[Instruction],
    payer: &Pubkey,
    blockhash: Hash,
) -> VersionedTransaction {
    let message = Message::new_with_blockhash(instructions, Some(payer), &blockhash);
    let signatures = vec![Signature::default(); message.header.num_required_signatures as usize];
    VersionedTransaction {
        signatures,
        message: VersionedMessage::Legacy(message),
    }
}

pub fn encode_transaction(tx: &VersionedTransaction) -> Result<String> {
    Ok(STANDARD.encode(bincode::serialize(tx)?))
}

pub fn decode_transaction(encoded: &str) -> Result<VersionedTransaction> {
    let bytes = STANDARD.decode(encoded)?;
    Ok(bincode::deserialize(&bytes)?)
}
