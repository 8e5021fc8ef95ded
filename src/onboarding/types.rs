//! Value types flowing through the fee pipeline.

use crate::chain::programs::encode_transaction;
use crate::currency::{Balance, Dc, Hnt, Sol, Usd};
use crate::error::{OnboardingError, Result};
use crate::types::{NetworkDetail, NetworkType};
use nonempty::NonEmpty;
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::transaction::VersionedTransaction;
use std::ops::Add;

/// Flat signature fee charged per transaction.
pub const TXN_FEE_IN_LAMPORTS: u64 = 5_000;

/// Rent-exempt minimum for an SPL token account.
pub const ATA_RENT_LAMPORTS: u64 = 2_039_280;

/// Fallback location staking fee when a network config carries none.
pub const DEFAULT_STAKING_FEE_DC: u64 = 1_000_000;

/// Fees owed by one party.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fees {
    pub lamports: Balance<Sol>,
    pub dc: Balance<Dc>,
}

impl Fees {
    pub fn new(lamports: u64, dc: u64) -> Self {
        Self {
            lamports: Balance::new(lamports),
            dc: Balance::new(dc),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.lamports.is_zero() && self.dc.is_zero()
    }
}

impl Add for Fees {
    type Output = Fees;

    fn add(self, rhs: Fees) -> Fees {
        Fees {
            lamports: self.lamports + rhs.lamports,
            dc: self.dc + rhs.dc,
        }
    }
}

/// Cost of one synthesized transaction, split by who pays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeEstimate {
    pub maker_fees: Fees,
    pub owner_fees: Fees,
    pub is_free: bool,
}

/// Summed fees across every requested network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeTotals {
    pub maker_fees: Fees,
    pub owner_fees: Fees,
}

impl FeeTotals {
    /// The owner pays nothing in either currency.
    pub fn is_free(&self) -> bool {
        self.owner_fees.is_zero()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Balances {
    pub hnt: Balance<Hnt>,
    pub dc: Balance<Dc>,
    pub sol: Balance<Sol>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "network")]
pub enum TransactionKind {
    CreateHotspot,
    Onboard(NetworkType),
    UpdateMetadata(NetworkType),
    MintDataCredits,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingTransaction {
    pub kind: TransactionKind,
    pub transaction: VersionedTransaction,
}

impl PendingTransaction {
    pub fn new(kind: TransactionKind, transaction: VersionedTransaction) -> Self {
        Self { kind, transaction }
    }
}

/// Ordered transactions to submit. A dependency, when present, is always at
/// index 0 and must land before anything after it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionPlan {
    transactions: Vec<PendingTransaction>,
    has_dependency: bool,
}

impl TransactionPlan {
    pub fn new(transactions: Vec<PendingTransaction>) -> Self {
        Self {
            transactions,
            has_dependency: false,
        }
    }

    pub fn push(&mut self, transaction: PendingTransaction) {
        self.transactions.push(transaction);
    }

    /// Place `transaction` at the front. A plan holds at most one dependency,
    /// so an earlier one is replaced.
    pub fn insert_dependency(&mut self, transaction: PendingTransaction) {
        if self.has_dependency {
            self.transactions[0] = transaction;
        } else {
            self.transactions.insert(0, transaction);
            self.has_dependency = true;
        }
    }

    pub fn has_dependency(&self) -> bool {
        self.has_dependency
    }

    pub fn dependency(&self) -> Option<&PendingTransaction> {
        self.has_dependency.then(|| &self.transactions[0])
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn transactions(&self) -> &[PendingTransaction] {
        &self.transactions
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingTransaction> {
        self.transactions.iter()
    }

    /// Base64 wire form, in submission order.
    pub fn to_base64(&self) -> Result<Vec<String>> {
        self.transactions
            .iter()
            .map(|pending| encode_transaction(&pending.transaction))
            .collect()
    }
}

/// Input to the assert-location fee computation.
#[derive(Debug, Clone, PartialEq)]
pub struct AssertRequest {
    /// Hotspot address, legacy Helium format.
    pub gateway: String,
    /// Wallet that owns the hotspot.
    pub owner: Pubkey,
    /// Overrides the maker as fee payer.
    pub payer: Option<Pubkey>,
    pub network_details: NonEmpty<NetworkDetail>,
}

impl AssertRequest {
    pub fn new(
        gateway: impl Into<String>,
        owner: Pubkey,
        network_details: Vec<NetworkDetail>,
    ) -> Result<Self> {
        let network_details =
            NonEmpty::from_vec(network_details).ok_or(OnboardingError::NoNetworksRequested)?;
        Ok(Self {
            gateway: gateway.into(),
            owner,
            payer: None,
            network_details,
        })
    }

    pub fn with_payer(mut self, payer: Pubkey) -> Self {
        self.payer = Some(payer);
        self
    }
}

/// Everything the caller needs to decide whether, and how, to assert.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertData {
    pub balances: Balances,
    pub owner_fees: Fees,
    pub maker_fees: Fees,
    pub is_free: bool,
    pub has_sufficient_sol: bool,
    pub has_sufficient_dc: bool,
    pub has_sufficient_hnt: bool,
    pub has_sufficient_balance: bool,
    pub dc_needed: Balance<Dc>,
    pub hnt_needed: Balance<Hnt>,
    pub oracle_price: Balance<Usd>,
    /// Base64 transactions, dependency first.
    pub solana_transactions: Vec<String>,
    #[serde(skip)]
    pub plan: TransactionPlan,
}
