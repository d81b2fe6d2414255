//! In-memory collaborators shared by the flow tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bridge_core::*;
use ed25519_dalek::Signer as _;
use guardian_verifier::{GuardianKey, GuardianSet, Proposal};
use p256::ecdsa::signature::Signer as _;
use serde_json::{json, Value};
use tokio::sync::broadcast;
use wallet_connect::{
    ChainFamily, EvmWalletCapability, ProviderAnnouncement, ProviderError, ProviderEvent,
    ProviderRegistry, SolanaWalletCapability, WalletConnector,
};

pub const VENUE: &str = "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf";
pub const OTHER: &str = "0x000000000000000000000000000000000000dEaD";
pub const GUARDIAN_IDS: [&str; 3] = ["unit-node", "hl-node", "field-node"];

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn units(whole: u64, decimals: u8) -> U256 {
    U256::from(whole) * U256::from(10u64).pow(U256::from(decimals))
}

// ─── EVM wallet ──────────────────────────────────────────────────────

pub struct MockEvmWallet {
    pub address: Mutex<String>,
    pub chain_id: Mutex<String>,
    pub native_balance: Mutex<U256>,
    pub token_balance: Mutex<U256>,
    pub reject_switch: Mutex<bool>,
    pub fail_balance: Mutex<bool>,
    pub revert: Mutex<bool>,
    pub calls: Mutex<Vec<String>>,
    pub sent: Mutex<Vec<Value>>,
    pub typed_data: Mutex<Vec<Value>>,
    pub events: broadcast::Sender<ProviderEvent>,
}

impl MockEvmWallet {
    pub fn new(chain_id: &str) -> Arc<Self> {
        Arc::new(Self {
            address: Mutex::new(VENUE.to_string()),
            chain_id: Mutex::new(chain_id.to_string()),
            native_balance: Mutex::new(U256::ZERO),
            token_balance: Mutex::new(U256::ZERO),
            reject_switch: Mutex::new(false),
            fail_balance: Mutex::new(false),
            revert: Mutex::new(false),
            calls: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            typed_data: Mutex::new(Vec::new()),
            events: broadcast::channel(16).0,
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls().iter().filter(|m| *m == method).count()
    }

    pub fn position(&self, method: &str) -> Option<usize> {
        self.calls().iter().position(|m| m == method)
    }
}

#[async_trait]
impl EvmWalletCapability for MockEvmWallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        self.calls.lock().unwrap().push(method.to_string());
        match method {
            "eth_requestAccounts" | "eth_accounts" => Ok(json!([*self.address.lock().unwrap()])),
            "eth_chainId" => Ok(json!(*self.chain_id.lock().unwrap())),
            "wallet_switchEthereumChain" => {
                if *self.reject_switch.lock().unwrap() {
                    return Err(ProviderError::new(4001, "User rejected the request."));
                }
                let target = params[0]["chainId"].as_str().unwrap().to_string();
                *self.chain_id.lock().unwrap() = target;
                Ok(Value::Null)
            }
            "eth_getBalance" | "eth_call" if *self.fail_balance.lock().unwrap() => {
                Err(ProviderError::new(-32603, "header not found"))
            }
            "eth_getBalance" => Ok(json!(chain_eth::abi::format_quantity(
                *self.native_balance.lock().unwrap()
            ))),
            "eth_call" => {
                let balance = *self.token_balance.lock().unwrap();
                Ok(json!(format!("0x{}", hex::encode(balance.to_be_bytes::<32>()))))
            }
            "eth_sendTransaction" => {
                self.sent.lock().unwrap().push(params[0].clone());
                Ok(json!(format!("0x{}", "ab".repeat(32))))
            }
            "eth_getTransactionReceipt" => {
                let status = if *self.revert.lock().unwrap() { "0x0" } else { "0x1" };
                Ok(json!({ "status": status }))
            }
            "eth_signTypedData_v4" => {
                let doc: Value = serde_json::from_str(params[1].as_str().unwrap()).unwrap();
                self.typed_data.lock().unwrap().push(doc);
                Ok(json!(format!("0x{}", "11".repeat(65))))
            }
            "wallet_revokePermissions" => Ok(Value::Null),
            other => Err(ProviderError::other(format!("unsupported method {other}"))),
        }
    }

    fn events(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

// ─── Solana wallet ───────────────────────────────────────────────────

pub struct MockSolanaWallet {
    pub key: ed25519_dalek::SigningKey,
    pub sent: Mutex<Vec<Vec<u8>>>,
    pub events: broadcast::Sender<ProviderEvent>,
}

impl MockSolanaWallet {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            key: ed25519_dalek::SigningKey::from_bytes(&[42u8; 32]),
            sent: Mutex::new(Vec::new()),
            events: broadcast::channel(16).0,
        })
    }

    pub fn address(&self) -> String {
        chain_sol::bytes_to_address(&self.key.verifying_key().to_bytes())
    }
}

#[async_trait]
impl SolanaWalletCapability for MockSolanaWallet {
    async fn connect(&self, _only_if_trusted: bool) -> Result<String, ProviderError> {
        Ok(self.address())
    }

    async fn disconnect(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>, ProviderError> {
        Ok(self.key.sign(message).to_bytes().to_vec())
    }

    async fn sign_and_send_transaction(&self, transaction: &[u8]) -> Result<String, ProviderError> {
        self.sent.lock().unwrap().push(transaction.to_vec());
        Ok(bs58::encode([3u8; 64]).into_string())
    }

    fn events(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

// ─── Address service ─────────────────────────────────────────────────

pub fn guardian_keys() -> Vec<p256::ecdsa::SigningKey> {
    (1u8..=3)
        .map(|i| p256::ecdsa::SigningKey::from_slice(&[i; 32]).unwrap())
        .collect()
}

pub fn guardian_set() -> GuardianSet {
    let nodes = GUARDIAN_IDS
        .iter()
        .zip(guardian_keys())
        .map(|(id, key)| {
            let point = key.verifying_key().to_encoded_point(false);
            GuardianKey::new(*id, hex::encode(point.as_bytes()))
        })
        .collect();
    GuardianSet::new(nodes).unwrap()
}

pub struct MockAddressService {
    /// Indices into [`GUARDIAN_IDS`] that sign.
    pub signers: Mutex<Vec<usize>>,
    /// Return an address other than the one the guardians signed.
    pub substitute_address: Mutex<bool>,
    pub requests: Mutex<Vec<AddressRequest>>,
    pub fee_calls: Mutex<usize>,
}

impl MockAddressService {
    pub fn new(signers: &[usize]) -> Arc<Self> {
        Arc::new(Self {
            signers: Mutex::new(signers.to_vec()),
            substitute_address: Mutex::new(false),
            requests: Mutex::new(Vec::new()),
            fee_calls: Mutex::new(0),
        })
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// The address generated for a route.
    pub fn address_for(request: &AddressRequest) -> String {
        match request.source_chain.as_str() {
            "solana" => bs58::encode([5u8; 32]).into_string(),
            "hyperliquid" => format!("0x{}", "cd".repeat(20)),
            _ => format!("0x{}", "ef".repeat(20)),
        }
    }
}

#[async_trait]
impl AddressService for MockAddressService {
    async fn generate_address(&self, request: &AddressRequest) -> Result<GeneratedAddress, BridgeError> {
        self.requests.lock().unwrap().push(request.clone());
        let address = Self::address_for(request);
        let proposal = Proposal::new(
            &request.destination_address,
            &request.destination_chain,
            &request.asset,
            &address,
        );

        let keys = guardian_keys();
        let signatures: HashMap<String, String> = self
            .signers
            .lock()
            .unwrap()
            .iter()
            .map(|&i| {
                let id = GUARDIAN_IDS[i];
                let sig: p256::ecdsa::Signature =
                    keys[i].sign(proposal.canonical_message(id).as_bytes());
                (id.to_string(), STANDARD.encode(sig.to_bytes()))
            })
            .collect();

        let address = if *self.substitute_address.lock().unwrap() {
            format!("0x{}", "66".repeat(20))
        } else {
            address
        };
        Ok(GeneratedAddress { address, signatures })
    }

    async fn estimate_fees(&self) -> Result<FeeEstimate, BridgeError> {
        *self.fee_calls.lock().unwrap() += 1;
        Ok(serde_json::from_value(json!({ "ethereum": { "depositFee": "0.0005" } })).unwrap())
    }
}

// ─── Venue ledger ────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockLedger {
    pub balances: Mutex<HashMap<SubLedger, Vec<LedgerBalance>>>,
    pub balance_calls: Mutex<usize>,
    pub submitted: Mutex<Vec<SignedAction>>,
}

impl MockLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_balance(&self, ledger: SubLedger, asset: &str, available: &str) {
        self.balances
            .lock()
            .unwrap()
            .entry(ledger)
            .or_default()
            .push(LedgerBalance {
                asset: asset.into(),
                available: available.into(),
            });
    }

    pub fn submitted(&self) -> Vec<SignedAction> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl VenueLedger for MockLedger {
    async fn balances(&self, _user: &str, ledger: SubLedger) -> Result<Vec<LedgerBalance>, BridgeError> {
        *self.balance_calls.lock().unwrap() += 1;
        Ok(self
            .balances
            .lock()
            .unwrap()
            .get(&ledger)
            .cloned()
            .unwrap_or_default())
    }

    async fn next_nonce(&self, _user: &str) -> Result<u64, BridgeError> {
        Ok(1_700_000_000_000)
    }

    async fn submit_action(&self, action: &SignedAction) -> Result<LedgerReceipt, BridgeError> {
        self.submitted.lock().unwrap().push(action.clone());
        Ok(LedgerReceipt {
            status: "ok".into(),
            response: None,
        })
    }
}

// ─── Solana RPC ──────────────────────────────────────────────────────

pub struct MockSolanaRpc {
    pub lamports: Mutex<u64>,
    pub statuses: Mutex<Vec<Option<SignatureStatus>>>,
    pub calls: Mutex<usize>,
}

impl MockSolanaRpc {
    pub fn new(lamports: u64) -> Arc<Self> {
        Arc::new(Self {
            lamports: Mutex::new(lamports),
            statuses: Mutex::new(Vec::new()),
            calls: Mutex::new(0),
        })
    }
}

#[async_trait]
impl SolanaRpc for MockSolanaRpc {
    async fn get_balance(&self, _address: &str) -> Result<u64, BridgeError> {
        *self.calls.lock().unwrap() += 1;
        Ok(*self.lamports.lock().unwrap())
    }

    async fn latest_blockhash(&self) -> Result<[u8; 32], BridgeError> {
        *self.calls.lock().unwrap() += 1;
        Ok([8u8; 32])
    }

    /// Pops scripted statuses; finalized once the script runs out.
    async fn signature_status(&self, _signature: &str) -> Result<Option<SignatureStatus>, BridgeError> {
        *self.calls.lock().unwrap() += 1;
        let mut statuses = self.statuses.lock().unwrap();
        if statuses.is_empty() {
            Ok(Some(SignatureStatus::Finalized))
        } else {
            Ok(statuses.remove(0))
        }
    }
}

// ─── Harness ─────────────────────────────────────────────────────────

pub struct Harness {
    pub evm: Arc<MockEvmWallet>,
    pub solana: Arc<MockSolanaWallet>,
    pub address_service: Arc<MockAddressService>,
    pub ledger: Arc<MockLedger>,
    pub rpc: Arc<MockSolanaRpc>,
    pub connector: Arc<WalletConnector>,
    pub orchestrator: Arc<Orchestrator>,
}

impl Harness {
    /// Mainnet tables, wallet on Arbitrum, guardians 0 and 1 signing.
    pub fn new() -> Self {
        Self::with(MockEvmWallet::new("0xa4b1"), MockAddressService::new(&[0, 1]))
    }

    pub fn with(evm: Arc<MockEvmWallet>, address_service: Arc<MockAddressService>) -> Self {
        init_tracing();
        let solana = MockSolanaWallet::new();
        let ledger = MockLedger::new();
        let rpc = MockSolanaRpc::new(0);

        let registry = Arc::new(ProviderRegistry::new());
        registry.announce(ProviderAnnouncement {
            rdns: "io.metamask".into(),
            name: "MetaMask".into(),
            icon: None,
            provider: evm.clone(),
        });
        let probe_wallet = solana.clone();
        registry.register_probe(
            "phantom",
            "Phantom",
            Box::new(move || Some(probe_wallet.clone() as Arc<dyn SolanaWalletCapability>)),
        );
        registry.on_focus();
        let connector = Arc::new(WalletConnector::new(registry));

        let mut config = BridgeConfig::mainnet();
        config.receipt_poll_interval_ms = 1;
        let orchestrator = Orchestrator::new(
            config,
            connector.clone(),
            address_service.clone(),
            ledger.clone(),
            rpc.clone(),
        )
        .with_guardians(guardian_set());

        Self {
            evm,
            solana,
            address_service,
            ledger,
            rpc,
            connector,
            orchestrator: Arc::new(orchestrator),
        }
    }

    pub async fn connect_evm(&self) {
        self.connector
            .connect(ChainFamily::Evm, "io.metamask")
            .await
            .unwrap();
        self.evm.calls.lock().unwrap().clear();
    }

    pub async fn connect_solana(&self) {
        self.connector
            .connect(ChainFamily::Solana, "phantom")
            .await
            .unwrap();
    }
}
