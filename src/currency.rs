//! Currency-tagged balances.
//!
//! `Balance<C>` carries its currency as a type parameter so that adding HNT to
//! DC, or comparing lamports with data credits, does not compile. Converting
//! between denominations always goes through an explicit oracle price.

use crate::error::{OnboardingError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Add, AddAssign, Sub};

/// A currency denomination with a fixed number of decimals.
pub trait Currency: Copy + fmt::Debug + Send + Sync + 'static {
    const TICKER: &'static str;
    const DECIMALS: u32;
}

/// Helium network token, 8 decimals ("bones").
#[derive(Debug, Clone, Copy)]
pub struct Hnt;

/// Data credits, indivisible.
#[derive(Debug, Clone, Copy)]
pub struct Dc;

/// SOL, 9 decimals (lamports).
#[derive(Debug, Clone, Copy)]
pub struct Sol;

/// US dollars, 8 decimals to match the oracle feed.
#[derive(Debug, Clone, Copy)]
pub struct Usd;

impl Currency for Hnt {
    const TICKER: &'static str = "HNT";
    const DECIMALS: u32 = 8;
}

impl Currency for Dc {
    const TICKER: &'static str = "DC";
    const DECIMALS: u32 = 0;
}

impl Currency for Sol {
    const TICKER: &'static str = "SOL";
    const DECIMALS: u32 = 9;
}

impl Currency for Usd {
    const TICKER: &'static str = "USD";
    const DECIMALS: u32 = 8;
}

/// One data credit is worth $0.00001, i.e. 1000 USD base units.
pub const USD_UNITS_PER_DC: u64 = 1_000;

/// An integer amount in the smallest unit of `C`.
pub struct Balance<C: Currency> {
    amount: u64,
    currency: PhantomData<C>,
}

impl<C: Currency> Balance<C> {
    pub const fn new(amount: u64) -> Self {
        Self {
            amount,
            currency: PhantomData,
        }
    }

    pub const fn zero() -> Self {
        Self::new(0)
    }

    /// Amount in the smallest unit (bones, lamports, credits, USD e-8).
    pub const fn amount(&self) -> u64 {
        self.amount
    }

    pub const fn is_zero(&self) -> bool {
        self.amount == 0
    }

    pub fn ticker(&self) -> &'static str {
        C::TICKER
    }

    /// Amount as a float in whole units, for display only.
    pub fn to_decimal(&self) -> f64 {
        self.amount as f64 / 10f64.powi(C::DECIMALS as i32)
    }
}

impl Balance<Dc> {
    /// Dollar value of these credits.
    pub fn to_usd(self) -> Balance<Usd> {
        Balance::new(self.amount.saturating_mul(USD_UNITS_PER_DC))
    }

    /// HNT required to mint these credits at `price` (USD per HNT), rounded up
    /// so that burning the result always covers the credits.
    pub fn to_network_tokens(self, price: Balance<Usd>) -> Result<Balance<Hnt>> {
        if price.is_zero() {
            return Err(OnboardingError::MissingOraclePrice);
        }
        let usd = self.to_usd().amount as u128;
        let scale = 10u128.pow(Hnt::DECIMALS);
        let price = price.amount as u128;
        let bones = (usd * scale).div_ceil(price);
        Ok(Balance::new(u64::try_from(bones).unwrap_or(u64::MAX)))
    }
}

impl Balance<Hnt> {
    /// Credits minted by burning this much HNT at `price`, rounded down.
    pub fn to_data_credits(self, price: Balance<Usd>) -> Balance<Dc> {
        let usd = self.amount as u128 * price.amount as u128 / 10u128.pow(Hnt::DECIMALS);
        let dc = usd / USD_UNITS_PER_DC as u128;
        Balance::new(u64::try_from(dc).unwrap_or(u64::MAX))
    }
}

impl<C: Currency> Add for Balance<C> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.amount.saturating_add(rhs.amount))
    }
}

impl<C: Currency> AddAssign for Balance<C> {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Saturates at zero: a balance is never negative.
impl<C: Currency> Sub for Balance<C> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.amount.saturating_sub(rhs.amount))
    }
}

impl<C: Currency> std::iter::Sum for Balance<C> {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), Add::add)
    }
}

impl<C: Currency> Clone for Balance<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: Currency> Copy for Balance<C> {}

impl<C: Currency> PartialEq for Balance<C> {
    fn eq(&self, other: &Self) -> bool {
        self.amount == other.amount
    }
}

impl<C: Currency> Eq for Balance<C> {}

impl<C: Currency> PartialOrd for Balance<C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<C: Currency> Ord for Balance<C> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.amount.cmp(&other.amount)
    }
}

impl<C: Currency> Default for Balance<C> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<C: Currency> fmt::Debug for Balance<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Balance<{}>({})", C::TICKER, self.amount)
    }
}

impl<C: Currency> fmt::Display for Balance<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.prec$} {}",
            self.to_decimal(),
            C::TICKER,
            prec = C::DECIMALS as usize
        )
    }
}

impl<C: Currency> Serialize for Balance<C> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.amount)
    }
}

impl<'de, C: Currency> Deserialize<'de> for Balance<C> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        u64::deserialize(deserializer).map(Self::new)
    }
}
