//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use hotspot_onboarding::api::{
    CreateHotspotRequest, IotMetadataRequest, MobileMetadataRequest, OnboardRequest,
    OnboardingApi, PriceFeed, PriceQuote, TransactionResponse,
};
use hotspot_onboarding::chain::accounts::{
    account_discriminator, IotHotspotInfo, MobileHotspotInfo, RewardableEntityConfig,
};
use hotspot_onboarding::chain::address::{entity_key_bytes, solana_to_helium};
use hotspot_onboarding::chain::keys::{hotspot_info_key, network_config_key, sub_dao_key, IOT_MINT};
use hotspot_onboarding::chain::programs::{encode_transaction, unsigned_transaction};
use hotspot_onboarding::chain::{AccountSnapshot, ChainClient};
use hotspot_onboarding::error::{OnboardingError, Result};
use hotspot_onboarding::onboarding::OnboardingService;
use hotspot_onboarding::types::{Maker, NetworkType, OnboardingRecord};
use hotspot_onboarding::OnboardingBuilder;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::program_pack::Pack;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::VersionedTransaction;
use spl_associated_token_account::get_associated_token_address;
use spl_token::state::{Account as TokenAccount, AccountState};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const ONE_USD: PriceQuote = PriceQuote {
    price: 100_000_000,
    expo: -8,
};

#[derive(Debug, Clone)]
pub enum Simulation {
    /// Post-state equals current state.
    Unchanged,
    /// Post-state overrides for specific accounts.
    Accounts(HashMap<Pubkey, AccountSnapshot>),
    WouldFail(String),
    Error(String),
}

pub struct MockChain {
    pub accounts: Mutex<HashMap<Pubkey, Vec<u8>>>,
    pub lamports: Mutex<HashMap<Pubkey, u64>>,
    pub simulation: Mutex<Simulation>,
    pub simulate_calls: AtomicUsize,
    pub sent: Mutex<Vec<VersionedTransaction>>,
    /// Zero-based index of the send that fails.
    pub fail_send_at: Mutex<Option<usize>>,
}

impl Default for MockChain {
    fn default() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            lamports: Mutex::new(HashMap::new()),
            simulation: Mutex::new(Simulation::Unchanged),
            simulate_calls: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
            fail_send_at: Mutex::new(None),
        }
    }
}

impl MockChain {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_account(&self, key: Pubkey, data: Vec<u8>) {
        self.accounts.lock().unwrap().insert(key, data);
    }

    pub fn set_lamports(&self, key: Pubkey, lamports: u64) {
        self.lamports.lock().unwrap().insert(key, lamports);
    }

    pub fn set_token_balance(&self, owner: &Pubkey, mint: &Pubkey, amount: u64) {
        let ata = get_associated_token_address(owner, mint);
        self.set_account(ata, token_account_data(owner, mint, amount));
    }

    pub fn set_simulation(&self, simulation: Simulation) {
        *self.simulation.lock().unwrap() = simulation;
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    fn snapshot(&self, key: &Pubkey) -> Option<AccountSnapshot> {
        let lamports = self.lamports.lock().unwrap().get(key).copied();
        let data = self.accounts.lock().unwrap().get(key).cloned();
        match (lamports, data) {
            (None, None) => None,
            (lamports, data) => Some(AccountSnapshot {
                lamports: lamports.unwrap_or(0),
                data: data.unwrap_or_default(),
            }),
        }
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>> {
        Ok(self.accounts.lock().unwrap().get(address).cloned())
    }

    async fn lamports(&self, address: &Pubkey) -> Result<u64> {
        Ok(self.lamports.lock().unwrap().get(address).copied().unwrap_or(0))
    }

    async fn simulate(
        &self,
        _tx: &VersionedTransaction,
        watched: &[Pubkey],
    ) -> Result<Vec<Option<AccountSnapshot>>> {
        self.simulate_calls.fetch_add(1, Ordering::SeqCst);
        let simulation = self.simulation.lock().unwrap().clone();
        match simulation {
            Simulation::Unchanged => Ok(watched.iter().map(|key| self.snapshot(key)).collect()),
            Simulation::Accounts(overrides) => Ok(watched
                .iter()
                .map(|key| overrides.get(key).cloned().or_else(|| self.snapshot(key)))
                .collect()),
            Simulation::WouldFail(message) => Err(OnboardingError::SimulationWouldFail(message)),
            Simulation::Error(message) => Err(OnboardingError::Simulation(message)),
        }
    }

    async fn latest_blockhash(&self) -> Result<Hash> {
        Ok(Hash::new_from_array([7; 32]))
    }

    async fn send_transaction(
        &self,
        tx: &VersionedTransaction,
        _skip_preflight: bool,
    ) -> Result<Signature> {
        let mut sent = self.sent.lock().unwrap();
        let index = sent.len();
        sent.push(tx.clone());
        if *self.fail_send_at.lock().unwrap() == Some(index) {
            return Err(OnboardingError::Simulation("blockhash not found".to_string()));
        }
        Ok(tx.signatures.first().copied().unwrap_or_default())
    }

    async fn confirm_transaction(
        &self,
        _signature: &Signature,
        _commitment: CommitmentConfig,
    ) -> Result<u64> {
        Ok(42)
    }
}

#[derive(Default)]
pub struct MockApi {
    pub records: Mutex<HashMap<String, OnboardingRecord>>,
    pub rate_limited: AtomicBool,
    pub record_calls: AtomicUsize,
    pub iot_response: Mutex<Option<TransactionResponse>>,
    pub mobile_response: Mutex<Option<TransactionResponse>>,
    pub create_response: Mutex<Option<TransactionResponse>>,
    pub iot_requests: Mutex<Vec<IotMetadataRequest>>,
    pub mobile_requests: Mutex<Vec<MobileMetadataRequest>>,
    pub onboard_requests: Mutex<Vec<(NetworkType, OnboardRequest)>>,
}

impl MockApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_record(&self, gateway: &str, maker: &Pubkey) {
        self.records
            .lock()
            .unwrap()
            .insert(gateway.to_string(), sample_record(gateway, maker));
    }

    pub fn respond_iot(&self, response: TransactionResponse) {
        *self.iot_response.lock().unwrap() = Some(response);
    }

    pub fn respond_mobile(&self, response: TransactionResponse) {
        *self.mobile_response.lock().unwrap() = Some(response);
    }

    pub fn respond_create(&self, response: TransactionResponse) {
        *self.create_response.lock().unwrap() = Some(response);
    }

    fn response(slot: &Mutex<Option<TransactionResponse>>) -> Result<TransactionResponse> {
        slot.lock()
            .unwrap()
            .clone()
            .ok_or_else(|| OnboardingError::NotFound("no canned response".to_string()))
    }
}

#[async_trait]
impl OnboardingApi for MockApi {
    async fn onboarding_record(&self, address: &str) -> Result<Option<OnboardingRecord>> {
        self.record_calls.fetch_add(1, Ordering::SeqCst);
        if self.rate_limited.load(Ordering::SeqCst) {
            return Ok(None);
        }
        self.records
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .map(Some)
            .ok_or_else(|| OnboardingError::NotFound(address.to_string()))
    }

    async fn create_hotspot(&self, _request: &CreateHotspotRequest) -> Result<TransactionResponse> {
        Self::response(&self.create_response)
    }

    async fn onboard_iot(&self, request: &OnboardRequest) -> Result<TransactionResponse> {
        self.onboard_requests
            .lock()
            .unwrap()
            .push((NetworkType::Iot, request.clone()));
        Self::response(&self.iot_response)
    }

    async fn onboard_mobile(&self, request: &OnboardRequest) -> Result<TransactionResponse> {
        self.onboard_requests
            .lock()
            .unwrap()
            .push((NetworkType::Mobile, request.clone()));
        Self::response(&self.mobile_response)
    }

    async fn update_iot_metadata(&self, request: &IotMetadataRequest) -> Result<TransactionResponse> {
        self.iot_requests.lock().unwrap().push(request.clone());
        Self::response(&self.iot_response)
    }

    async fn update_mobile_metadata(
        &self,
        request: &MobileMetadataRequest,
    ) -> Result<TransactionResponse> {
        self.mobile_requests.lock().unwrap().push(request.clone());
        Self::response(&self.mobile_response)
    }
}

pub struct MockPriceFeed {
    pub quote: Option<PriceQuote>,
}

#[async_trait]
impl PriceFeed for MockPriceFeed {
    async fn latest_price(&self, _feed_id: &str) -> Result<Option<PriceQuote>> {
        Ok(self.quote)
    }
}

pub fn build_service(chain: Arc<MockChain>, api: Arc<MockApi>, quote: Option<PriceQuote>) -> OnboardingService {
    OnboardingBuilder::new()
        .with_chain(chain)
        .with_api(api)
        .with_price_feed(Arc::new(MockPriceFeed { quote }))
        .build()
        .expect("service builds with mocks")
}

pub fn sample_gateway() -> String {
    solana_to_helium(&Pubkey::new_unique())
}

pub fn sample_record(gateway: &str, maker: &Pubkey) -> OnboardingRecord {
    OnboardingRecord {
        id: Some(1),
        onboarding_key: gateway.to_string(),
        public_address: Some(gateway.to_string()),
        mac_eth0: None,
        mac_wlan0: None,
        rpi_serial: None,
        helium_serial: None,
        batch: None,
        maker_id: Some(1),
        maker: Maker {
            id: Some(1),
            name: "Test Maker".to_string(),
            address: maker.to_string(),
            location_nonce_limit: Some(1),
            created_at: None,
            updated_at: None,
        },
        created_at: None,
        updated_at: None,
    }
}

/// A base64 transaction paid for by `payer`, as the onboarding server returns.
pub fn encoded_transaction(payer: &Pubkey) -> String {
    let ix = Instruction {
        program_id: Pubkey::new_unique(),
        accounts: vec![AccountMeta::new(*payer, true)],
        data: vec![1, 2, 3],
    };
    let tx = unsigned_transaction(&[ix], payer, Hash::new_unique());
    encode_transaction(&tx).expect("encodes")
}

pub fn token_account_data(owner: &Pubkey, mint: &Pubkey, amount: u64) -> Vec<u8> {
    let account = TokenAccount {
        mint: *mint,
        owner: *owner,
        amount,
        state: AccountState::Initialized,
        ..Default::default()
    };
    let mut data = vec![0u8; TokenAccount::LEN];
    TokenAccount::pack(account, &mut data).expect("packs");
    data
}

pub fn iot_info_data(location: Option<u64>, gain: Option<i32>, elevation: Option<i32>) -> Vec<u8> {
    fn option<const N: usize>(data: &mut Vec<u8>, value: Option<[u8; N]>) {
        match value {
            Some(bytes) => {
                data.push(1);
                data.extend_from_slice(&bytes);
            }
            None => data.push(0),
        }
    }

    let mut data = account_discriminator(IotHotspotInfo::ACCOUNT_NAME).to_vec();
    data.extend_from_slice(Pubkey::new_unique().as_ref());
    data.push(255);
    option(&mut data, location.map(u64::to_le_bytes));
    option(&mut data, elevation.map(i32::to_le_bytes));
    option(&mut data, gain.map(i32::to_le_bytes));
    data.push(1);
    data.extend_from_slice(&1u16.to_le_bytes());
    data.push(1);
    data.extend_from_slice(&0u64.to_le_bytes());
    data
}

/// A WiFi indoor hotspot with no deployment info.
pub fn mobile_info_data(location: Option<u64>) -> Vec<u8> {
    let mut data = account_discriminator(MobileHotspotInfo::ACCOUNT_NAME).to_vec();
    data.extend_from_slice(Pubkey::new_unique().as_ref());
    data.push(255);
    match location {
        Some(l) => {
            data.push(1);
            data.extend_from_slice(&l.to_le_bytes());
        }
        None => data.push(0),
    }
    data.push(1);
    data.extend_from_slice(&1u16.to_le_bytes());
    data.push(1);
    data.extend_from_slice(&0u64.to_le_bytes());
    data.push(1); // wifi indoor
    data.push(0);
    data
}

pub fn iot_config_data(staking_fee: u64) -> Vec<u8> {
    let mut data = account_discriminator(RewardableEntityConfig::ACCOUNT_NAME).to_vec();
    data.extend_from_slice(Pubkey::new_unique().as_ref());
    data.extend_from_slice(&3u32.to_le_bytes());
    data.extend_from_slice(b"IOT");
    data.extend_from_slice(sub_dao_key(&IOT_MINT).as_ref());
    data.push(0);
    data.extend_from_slice(&(-20i32).to_le_bytes());
    data.extend_from_slice(&150i32.to_le_bytes());
    data.extend_from_slice(&staking_fee.to_le_bytes());
    data.extend_from_slice(&(staking_fee / 2).to_le_bytes());
    data
}

/// Install existing IOT info for `gateway`.
pub fn set_iot_info(chain: &MockChain, gateway: &str, data: Vec<u8>) {
    let entity_key = entity_key_bytes(gateway).expect("valid gateway");
    chain.set_account(hotspot_info_key(NetworkType::Iot, &entity_key), data);
}

/// Install existing MOBILE info for `gateway`.
pub fn set_mobile_info(chain: &MockChain, gateway: &str, data: Vec<u8>) {
    let entity_key = entity_key_bytes(gateway).expect("valid gateway");
    chain.set_account(hotspot_info_key(NetworkType::Mobile, &entity_key), data);
}

pub fn set_iot_staking_fee(chain: &MockChain, fee: u64) {
    chain.set_account(network_config_key(NetworkType::Iot), iot_config_data(fee));
}
