//! Burn-HNT-for-DC top-up planning.

use super::types::{
    Balances, FeeTotals, PendingTransaction, TransactionKind, TransactionPlan, TXN_FEE_IN_LAMPORTS,
};
use crate::chain::programs::{mint_data_credits_instruction, unsigned_transaction};
use crate::chain::ChainClient;
use crate::currency::{Balance, Dc, Hnt, Usd};
use crate::error::Result;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use tracing::{info, instrument};

/// Outcome of checking balances against fees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopUp {
    /// Totals including the top-up transaction's signature fee, if one was added.
    pub totals: FeeTotals,
    pub dc_needed: Balance<Dc>,
    pub hnt_needed: Balance<Hnt>,
    pub has_sufficient_dc: bool,
    pub has_sufficient_hnt: bool,
    pub has_sufficient_sol: bool,
    pub has_sufficient_balance: bool,
    pub needs_mint: bool,
}

/// Decide whether a DC top-up is needed and affordable. Pure.
pub fn assess(totals: FeeTotals, balances: &Balances, price: Balance<Usd>) -> Result<TopUp> {
    let mut totals = totals;
    let has_sufficient_dc = balances.dc >= totals.owner_fees.dc;
    let dc_needed = totals.owner_fees.dc - balances.dc;

    let hnt_needed = if dc_needed.is_zero() {
        Balance::zero()
    } else {
        dc_needed.to_network_tokens(price)?
    };
    let has_sufficient_hnt = balances.hnt >= hnt_needed;

    let needs_mint = !has_sufficient_dc && has_sufficient_hnt;
    if needs_mint {
        totals.owner_fees.lamports += Balance::new(TXN_FEE_IN_LAMPORTS);
    }

    let has_sufficient_sol = balances.sol >= totals.owner_fees.lamports;
    Ok(TopUp {
        totals,
        dc_needed,
        hnt_needed,
        has_sufficient_dc,
        has_sufficient_hnt,
        has_sufficient_sol,
        has_sufficient_balance: (has_sufficient_dc || has_sufficient_hnt) && has_sufficient_sol,
        needs_mint,
    })
}

#[derive(Clone)]
pub struct TopUpPlanner {
    chain: Arc<dyn ChainClient>,
}

impl TopUpPlanner {
    pub fn new(chain: Arc<dyn ChainClient>) -> Self {
        Self { chain }
    }

    /// Assess balances and, when the owner is short on DC but holds enough
    /// HNT, prepend a mint transaction to `plan`.
    #[instrument(skip(self, totals, balances, plan), fields(owner = %owner, price = %price))]
    pub async fn plan(
        &self,
        owner: &Pubkey,
        totals: FeeTotals,
        balances: &Balances,
        price: Balance<Usd>,
        plan: &mut TransactionPlan,
    ) -> Result<TopUp> {
        let top_up = assess(totals, balances, price)?;
        if top_up.needs_mint {
            let blockhash = self.chain.latest_blockhash().await?;
            let ix = mint_data_credits_instruction(owner, top_up.dc_needed);
            plan.insert_dependency(PendingTransaction::new(
                TransactionKind::MintDataCredits,
                unsigned_transaction(&[ix], owner, blockhash),
            ));
            info!(dc = %top_up.dc_needed, hnt = %top_up.hnt_needed, "Prepended DC top-up");
        }
        Ok(top_up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::types::Fees;

    const ONE_USD: Balance<Usd> = Balance::new(100_000_000);

    fn totals(lamports: u64, dc: u64) -> FeeTotals {
        FeeTotals {
            maker_fees: Fees::default(),
            owner_fees: Fees::new(lamports, dc),
        }
    }

    fn balances(hnt: u64, dc: u64, sol: u64) -> Balances {
        Balances {
            hnt: Balance::new(hnt),
            dc: Balance::new(dc),
            sol: Balance::new(sol),
        }
    }

    #[test]
    fn test_top_up_when_hnt_covers_deficit() {
        let result = assess(totals(5_000, 1_000), &balances(800_000, 200, 1_000_000), ONE_USD).unwrap();
        assert_eq!(result.dc_needed.amount(), 800);
        assert_eq!(result.hnt_needed.amount(), 800_000);
        assert!(result.needs_mint);
        assert!(result.has_sufficient_hnt);
        assert!(result.has_sufficient_balance);
        assert_eq!(result.totals.owner_fees.lamports.amount(), 10_000);
    }

    #[test]
    fn test_no_top_up_when_hnt_short() {
        let result = assess(totals(5_000, 1_000), &balances(799_999, 200, 1_000_000), ONE_USD).unwrap();
        assert!(!result.needs_mint);
        assert!(!result.has_sufficient_hnt);
        assert!(!result.has_sufficient_balance);
        assert_eq!(result.totals.owner_fees.lamports.amount(), 5_000);
    }

    #[test]
    fn test_enough_dc_needs_nothing() {
        let result = assess(totals(5_000, 1_000), &balances(0, 1_000, 5_000), ONE_USD).unwrap();
        assert!(result.has_sufficient_dc);
        assert!(!result.needs_mint);
        assert!(result.hnt_needed.is_zero());
        assert!(result.has_sufficient_balance);
    }

    #[test]
    fn test_sol_shortfall_is_insufficient() {
        let result = assess(totals(5_000, 0), &balances(0, 0, 4_999), ONE_USD).unwrap();
        assert!(!result.has_sufficient_sol);
        assert!(!result.has_sufficient_balance);
    }

    #[test]
    fn test_more_balance_never_hurts() {
        let fees = totals(5_000, 1_000);
        for (sol, dc) in [(0u64, 0u64), (5_000, 0), (10_000, 200), (10_000, 1_000), (20_000, 5_000)] {
            let before = assess(fees, &balances(800_000, dc, sol), ONE_USD).unwrap();
            let more_sol = assess(fees, &balances(800_000, dc, sol + 10_000), ONE_USD).unwrap();
            let more_dc = assess(fees, &balances(800_000, dc + 500, sol), ONE_USD).unwrap();
            if before.has_sufficient_balance {
                assert!(more_sol.has_sufficient_balance);
                assert!(more_dc.has_sufficient_balance);
            }
        }
    }
}
