//! Deposit, withdrawal and intra-venue transfer flows.
//!
//! Within a flow every step is awaited in order: network switch, balance,
//! amount check, address generation and verification, then submission.
//! Once a transaction or ledger action has been handed off it is never
//! resubmitted here.

use std::sync::Arc;

use alloy_primitives::U256;
use chain_eth::address::{addresses_equal, parse_address};
use chain_eth::chains::same_chain;
use chain_eth::transaction::{erc20_transfer, native_transfer, ReceiptStatus};
use guardian_verifier::{GuardianSet, GuardianVerifier, Proposal, VerificationResult};
use serde::Serialize;
use tracing::{debug, info, warn};
use wallet_connect::{ChainFamily, ConnectedWallet, EvmWallet, WalletConnector, WalletError};

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::ledger::{LedgerAction, SignedAction};
use crate::services::{
    AddressRequest, AddressService, FeeEstimate, LedgerReceipt, SignatureStatus, SolanaRpc, VenueLedger,
};
use crate::tokens::{SubLedger, SupportedToken, TokenRegistry};

// ─── Results ─────────────────────────────────────────────────────────

/// Handed back once a chain submission is confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReceipt {
    pub transaction_hash: String,
    pub explorer_url: String,
}

/// Where to deposit a token, and how that address was established.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositAddress {
    pub address: String,
    /// `None` for the settlement asset, which goes to the fixed bridge
    /// contract and is never guardian-checked.
    pub verification: Option<VerificationResult>,
}

impl DepositAddress {
    /// The UI `verified` flag: only ever taken from a verification result.
    pub fn verified(&self) -> Option<bool> {
        self.verification.as_ref().map(|v| v.success)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalReceipt {
    /// The address the venue sends to: the user's own destination for the
    /// settlement asset, the verified bridge address otherwise.
    pub sent_to: String,
    pub verification: Option<VerificationResult>,
    pub ledger: LedgerReceipt,
}

/// Direction of an intra-venue move of the settlement asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransferDirection {
    SpotToPerp,
    PerpToSpot,
}

impl TransferDirection {
    pub fn source(self) -> SubLedger {
        match self {
            TransferDirection::SpotToPerp => SubLedger::Spot,
            TransferDirection::PerpToSpot => SubLedger::Perp,
        }
    }

    pub fn to_perp(self) -> bool {
        self == TransferDirection::SpotToPerp
    }
}

// ─── Orchestrator ────────────────────────────────────────────────────

pub struct Orchestrator {
    config: BridgeConfig,
    tokens: TokenRegistry,
    verifier: GuardianVerifier,
    connector: Arc<WalletConnector>,
    address_service: Arc<dyn AddressService>,
    ledger: Arc<dyn VenueLedger>,
    solana: Arc<dyn SolanaRpc>,
}

impl Orchestrator {
    pub fn new(
        config: BridgeConfig,
        connector: Arc<WalletConnector>,
        address_service: Arc<dyn AddressService>,
        ledger: Arc<dyn VenueLedger>,
        solana: Arc<dyn SolanaRpc>,
    ) -> Self {
        Self {
            tokens: TokenRegistry::for_mode(config.mode),
            verifier: GuardianVerifier::for_network(config.is_mainnet()),
            config,
            connector,
            address_service,
            ledger,
            solana,
        }
    }

    /// Replaces the compiled-in guardian table.
    pub fn with_guardians(mut self, guardians: GuardianSet) -> Self {
        self.verifier = GuardianVerifier::new(guardians);
        self
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn tokens(&self) -> &TokenRegistry {
        &self.tokens
    }

    pub fn connector(&self) -> &Arc<WalletConnector> {
        &self.connector
    }

    pub async fn estimate_fees(&self) -> Result<FeeEstimate, BridgeError> {
        self.address_service.estimate_fees().await
    }

    // ─── Network and balances ────────────────────────────────────────

    /// Switches the connected wallet to the token's chain if needed.
    pub async fn ensure_network(&self, token_id: &str) -> Result<(), BridgeError> {
        let token = self.tokens.get(token_id)?;
        let wallet = self.wallet_for(token)?;
        self.ensure_network_for(token, &wallet).await
    }

    /// Balance of the connected wallet on the token's chain, in base units.
    pub async fn balance(&self, token_id: &str) -> Result<U256, BridgeError> {
        let token = self.tokens.get(token_id)?;
        let wallet = self.wallet_for(token)?;
        self.ensure_network_for(token, &wallet).await?;
        self.chain_balance(token, &wallet).await
    }

    /// Available balance of `user` on the venue ledger, in base units.
    pub async fn venue_balance(&self, token_id: &str, user: &str) -> Result<U256, BridgeError> {
        let token = self.tokens.get(token_id)?;
        self.ledger_balance(token, token.ledger, user).await
    }

    // ─── Deposit ─────────────────────────────────────────────────────

    /// The address a deposit of `token_id` for `venue_address` must go to.
    ///
    /// Bridged assets get a freshly generated address with its guardian
    /// verdict attached; the caller decides nothing from an unverified one.
    pub async fn deposit_address(&self, token_id: &str, venue_address: &str) -> Result<DepositAddress, BridgeError> {
        let token = self.tokens.get(token_id)?;
        self.resolve_deposit_address(token, venue_address).await
    }

    pub async fn deposit(&self, token_id: &str, venue_address: &str, amount: U256) -> Result<TransferReceipt, BridgeError> {
        let token = self.tokens.get(token_id)?;
        check_minimum(token, amount)?;

        let wallet = self.wallet_for(token)?;
        self.ensure_network_for(token, &wallet).await?;
        let balance = self.chain_balance(token, &wallet).await?;
        check_maximum(token, amount, balance)?;

        let deposit = self.resolve_deposit_address(token, venue_address).await?;
        if let Some(verification) = &deposit.verification {
            require_quorum(&deposit.address, verification)?;
        }

        let wallet = self.revalidate(token, &wallet).await?;
        info!(
            token = %token.id,
            from = %wallet.address,
            to = %deposit.address,
            amount = %token.format_amount(amount),
            "submitting deposit"
        );
        let receipt = self.submit_deposit(token, &wallet, &deposit.address, amount).await?;
        info!(hash = %receipt.transaction_hash, "deposit confirmed");
        Ok(receipt)
    }

    async fn resolve_deposit_address(
        &self,
        token: &SupportedToken,
        venue_address: &str,
    ) -> Result<DepositAddress, BridgeError> {
        if !token.requires_guardian_bridging {
            return Ok(DepositAddress {
                address: self.config.bridge_contract_address.clone(),
                verification: None,
            });
        }
        parse_address(venue_address)?;

        let source_chain = source_chain_name(token);
        let (address, verification) = self
            .generate_verified(
                source_chain,
                &self.config.venue_chain_name,
                bridge_asset(token)?,
                venue_address,
            )
            .await?;
        Ok(DepositAddress {
            address,
            verification: Some(verification),
        })
    }

    async fn submit_deposit(
        &self,
        token: &SupportedToken,
        wallet: &ConnectedWallet,
        to: &str,
        amount: U256,
    ) -> Result<TransferReceipt, BridgeError> {
        let hash = match token.family() {
            ChainFamily::Evm => {
                let evm = evm_of(wallet)?;
                let tx = match &token.contract_address {
                    Some(contract) => erc20_transfer(&wallet.address, contract, to, amount)?,
                    None => native_transfer(&wallet.address, to, amount)?,
                };
                let hash = evm.send_transaction(&tx).await.map_err(submission_error)?;
                let status = evm
                    .wait_for_receipt(&hash, self.config.receipt_poll_interval())
                    .await
                    .map_err(submission_error)?;
                if status == ReceiptStatus::Reverted {
                    return Err(BridgeError::ChainSubmissionFailed(format!(
                        "transaction {hash} reverted"
                    )));
                }
                hash
            }
            ChainFamily::Solana => {
                let provider = wallet
                    .provider
                    .as_solana()
                    .ok_or(BridgeError::Wallet(WalletError::NotConnected))?;
                let lamports = u64::try_from(amount).map_err(|_| out_of_range(token, amount, "u64::MAX"))?;
                let from = chain_sol::address_to_bytes(&wallet.address)?;
                let to = chain_sol::address_to_bytes(to)?;
                let blockhash = self.solana.latest_blockhash().await?;
                let tx = chain_sol::build_sol_transfer(&from, &to, lamports, &blockhash)?;

                let signature = provider
                    .sign_and_send_transaction(&chain_sol::serialize_unsigned(&tx))
                    .await
                    .map_err(|e| submission_error(e.into()))?;
                self.await_solana_confirmation(&signature).await?;
                signature
            }
        };

        Ok(TransferReceipt {
            explorer_url: token.chain.tx_url(&hash),
            transaction_hash: hash,
        })
    }

    async fn await_solana_confirmation(&self, signature: &str) -> Result<(), BridgeError> {
        loop {
            match self.solana.signature_status(signature).await? {
                Some(SignatureStatus::Confirmed | SignatureStatus::Finalized) => return Ok(()),
                Some(SignatureStatus::Failed(err)) => {
                    return Err(BridgeError::ChainSubmissionFailed(format!(
                        "transaction {signature} failed: {err}"
                    )));
                }
                Some(SignatureStatus::Processed) | None => {
                    tokio::time::sleep(self.config.receipt_poll_interval()).await;
                }
            }
        }
    }

    // ─── Withdrawal ──────────────────────────────────────────────────

    /// Withdraws from the venue ledger to `destination` on the token's chain.
    ///
    /// The connected wallet must be the venue account itself. For bridged
    /// assets the bridge address is guardian-verified and an unverified one
    /// ends the withdrawal.
    pub async fn withdraw(
        &self,
        token_id: &str,
        venue_address: &str,
        destination: &str,
        amount: U256,
    ) -> Result<WithdrawalReceipt, BridgeError> {
        let token = self.tokens.get(token_id)?;
        check_minimum(token, amount)?;
        self.self_custody_wallet(venue_address)?;

        let available = self.ledger_balance(token, token.ledger, venue_address).await?;
        check_maximum(token, amount, available)?;

        let display_amount = token.format_amount(amount);
        let (action, sent_to, verification) = if token.requires_guardian_bridging {
            validate_destination(token, destination)?;
            let (bridge_address, verification) = self
                .generate_verified(
                    &self.config.venue_chain_name,
                    source_chain_name(token),
                    bridge_asset(token)?,
                    destination,
                )
                .await?;
            require_quorum(&bridge_address, &verification)?;

            let ledger_token = token
                .ledger_token_address
                .clone()
                .ok_or_else(|| BridgeError::UnsupportedToken(token.id.clone()))?;
            let action = LedgerAction::SpotSend {
                destination: bridge_address.clone(),
                token: ledger_token,
                amount: display_amount,
            };
            (action, bridge_address, Some(verification))
        } else {
            parse_address(destination)?;
            let action = LedgerAction::Withdraw {
                destination: destination.to_string(),
                amount: display_amount,
            };
            (action, destination.to_string(), None)
        };

        info!(token = %token.id, to = %sent_to, "submitting withdrawal");
        let ledger = self.sign_and_submit(venue_address, action).await?;
        Ok(WithdrawalReceipt {
            sent_to,
            verification,
            ledger,
        })
    }

    // ─── Intra-venue transfer ────────────────────────────────────────

    /// Moves the settlement asset between the venue's sub-ledgers. No
    /// external chain or guardian is involved.
    pub async fn transfer(
        &self,
        venue_address: &str,
        direction: TransferDirection,
        amount: U256,
    ) -> Result<LedgerReceipt, BridgeError> {
        let token = self
            .tokens
            .settlement_token()
            .ok_or_else(|| BridgeError::Config("no settlement token configured".into()))?;
        self.self_custody_wallet(venue_address)?;

        if amount.is_zero() {
            return Err(transfer_out_of_range(token, amount, "balance"));
        }
        let available = self
            .ledger_balance(token, direction.source(), venue_address)
            .await?;
        if amount > available {
            return Err(transfer_out_of_range(token, amount, &token.format_amount(available)));
        }

        let action = LedgerAction::ClassTransfer {
            amount: token.format_amount(amount),
            to_perp: direction.to_perp(),
        };
        info!(?direction, amount = %token.format_amount(amount), "submitting intra-venue transfer");
        self.sign_and_submit(venue_address, action).await
    }

    // ─── Shared steps ────────────────────────────────────────────────

    async fn generate_verified(
        &self,
        source_chain: &str,
        destination_chain: &str,
        asset: &str,
        destination_address: &str,
    ) -> Result<(String, VerificationResult), BridgeError> {
        let request = AddressRequest {
            source_chain: source_chain.to_string(),
            destination_chain: destination_chain.to_string(),
            asset: asset.to_string(),
            destination_address: destination_address.to_string(),
        };
        let generated = self.address_service.generate_address(&request).await?;
        debug!(address = %generated.address, "address service returned candidate");

        let proposal = Proposal::new(destination_address, destination_chain, asset, &generated.address);
        let verification = self.verifier.verify(&generated.signatures, &proposal).await;
        Ok((generated.address, verification))
    }

    async fn sign_and_submit(&self, venue_address: &str, action: LedgerAction) -> Result<LedgerReceipt, BridgeError> {
        let nonce = self.ledger.next_nonce(venue_address).await?;
        let typed_data = action.typed_data(nonce, self.config.mode, self.config.signing_chain_id);

        // The wallet may have changed while the balance and address were
        // being fetched.
        let wallet = self.self_custody_wallet(venue_address)?;
        // Wallets refuse typed data whose domain chain is not the active one.
        ensure_chain(&wallet, format!("{:#x}", self.config.signing_chain_id)).await?;
        let signature = evm_of(&wallet)?
            .sign_typed_data(&wallet.address, &typed_data)
            .await?;

        let signed = SignedAction::new(action, nonce, &signature, self.config.mode);
        let receipt = self.ledger.submit_action(&signed).await?;
        info!(status = %receipt.status, "ledger action submitted");
        Ok(receipt)
    }

    fn wallet_for(&self, token: &SupportedToken) -> Result<ConnectedWallet, BridgeError> {
        let wallet = self
            .connector
            .current()
            .ok_or(BridgeError::Wallet(WalletError::NotConnected))?;
        if wallet.family != token.family() {
            return Err(BridgeError::NetworkMismatch {
                required: token.chain.chain_id(),
                current: wallet.family.to_string(),
            });
        }
        Ok(wallet)
    }

    fn self_custody_wallet(&self, venue_address: &str) -> Result<ConnectedWallet, BridgeError> {
        let wallet = self
            .connector
            .current()
            .ok_or(BridgeError::Wallet(WalletError::NotConnected))?;
        if wallet.family != ChainFamily::Evm || !addresses_equal(&wallet.address, venue_address) {
            warn!(connected = %wallet.address, account = %venue_address, "self-custody check failed");
            return Err(BridgeError::SelfCustodyMismatch {
                connected: wallet.address,
                account: venue_address.to_string(),
            });
        }
        Ok(wallet)
    }

    async fn ensure_network_for(&self, token: &SupportedToken, wallet: &ConnectedWallet) -> Result<(), BridgeError> {
        let Some(chain) = token.chain.evm_chain() else {
            return Ok(());
        };
        ensure_chain(wallet, chain.chain_id_hex()).await
    }

    /// Re-reads the connection right before submission: same provider,
    /// same account, and on EVM still the token's chain.
    async fn revalidate(&self, token: &SupportedToken, wallet: &ConnectedWallet) -> Result<ConnectedWallet, BridgeError> {
        let current = self.wallet_for(token)?;
        let same_account = match current.family {
            ChainFamily::Evm => addresses_equal(&current.address, &wallet.address),
            ChainFamily::Solana => current.address == wallet.address,
        };
        if !same_account || !current.provider.same_provider(&wallet.provider) {
            return Err(BridgeError::WalletChanged {
                expected: wallet.address.clone(),
                current: current.address,
            });
        }

        if let Some(chain) = token.chain.evm_chain() {
            let active = evm_of(&current)?.chain_id().await?;
            if !same_chain(&active, &chain.chain_id_hex()) {
                return Err(BridgeError::NetworkMismatch {
                    required: chain.chain_id_hex(),
                    current: active,
                });
            }
        }
        Ok(current)
    }

    async fn chain_balance(&self, token: &SupportedToken, wallet: &ConnectedWallet) -> Result<U256, BridgeError> {
        match token.family() {
            ChainFamily::Evm => {
                let evm = evm_of(wallet)?;
                let balance = match &token.contract_address {
                    Some(contract) => evm.token_balance(contract, &wallet.address).await?,
                    None => evm.get_balance(&wallet.address).await?,
                };
                Ok(balance)
            }
            ChainFamily::Solana => Ok(U256::from(self.solana.get_balance(&wallet.address).await?)),
        }
    }

    async fn ledger_balance(&self, token: &SupportedToken, ledger: SubLedger, user: &str) -> Result<U256, BridgeError> {
        let balances = self.ledger.balances(user, ledger).await?;
        let Some(entry) = balances.iter().find(|b| b.asset == token.ledger_asset_name) else {
            return Ok(U256::ZERO);
        };
        token
            .parse_amount(&entry.available)
            .map_err(|e| BridgeError::Service(format!("ledger balance for {}: {e}", token.ledger_asset_name)))
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────

/// One switch request, then a re-read: the wallet must really be on
/// `required` afterwards.
async fn ensure_chain(wallet: &ConnectedWallet, required: String) -> Result<(), BridgeError> {
    let evm = evm_of(wallet)?;
    let current = evm.chain_id().await?;
    if same_chain(&current, &required) {
        return Ok(());
    }

    info!(%current, %required, "requesting network switch");
    if let Err(e) = evm.switch_chain(&required).await {
        warn!(%required, error = %e, "network switch failed");
        return Err(BridgeError::NetworkMismatch { required, current });
    }

    let switched = evm.chain_id().await?;
    if !same_chain(&switched, &required) {
        return Err(BridgeError::NetworkMismatch {
            required,
            current: switched,
        });
    }
    Ok(())
}

fn evm_of(wallet: &ConnectedWallet) -> Result<EvmWallet, BridgeError> {
    wallet.evm().ok_or(BridgeError::Wallet(WalletError::NotConnected))
}

fn source_chain_name(token: &SupportedToken) -> &str {
    token
        .source_chain_name
        .as_deref()
        .unwrap_or_else(|| token.chain.bridge_name())
}

fn bridge_asset(token: &SupportedToken) -> Result<&str, BridgeError> {
    token
        .bridge_asset
        .as_deref()
        .ok_or_else(|| BridgeError::UnsupportedToken(token.id.clone()))
}

fn validate_destination(token: &SupportedToken, destination: &str) -> Result<(), BridgeError> {
    match token.family() {
        ChainFamily::Evm => {
            parse_address(destination)?;
        }
        ChainFamily::Solana => {
            chain_sol::address_to_bytes(destination)?;
        }
    }
    Ok(())
}

fn require_quorum(address: &str, verification: &VerificationResult) -> Result<(), BridgeError> {
    if verification.success {
        return Ok(());
    }
    warn!(%address, verified_count = verification.verified_count, "refusing unverified bridge address");
    Err(BridgeError::GuardianVerificationFailed {
        address: address.to_string(),
        verified_count: verification.verified_count,
    })
}

fn out_of_range(token: &SupportedToken, amount: U256, max: &str) -> BridgeError {
    BridgeError::AmountOutOfRange {
        amount: token.format_amount(amount),
        min: token.format_amount(token.minimum_transfer_amount),
        max: max.to_string(),
    }
}

/// Transfers have no deposit minimum; the smallest unit is the floor.
fn transfer_out_of_range(token: &SupportedToken, amount: U256, max: &str) -> BridgeError {
    BridgeError::AmountOutOfRange {
        amount: token.format_amount(amount),
        min: token.format_amount(U256::from(1u8)),
        max: max.to_string(),
    }
}

/// Lower bound, checked before anything touches the network.
fn check_minimum(token: &SupportedToken, amount: U256) -> Result<(), BridgeError> {
    if amount < token.minimum_transfer_amount {
        return Err(out_of_range(token, amount, "balance"));
    }
    Ok(())
}

fn check_maximum(token: &SupportedToken, amount: U256, balance: U256) -> Result<(), BridgeError> {
    if amount > balance {
        return Err(out_of_range(token, amount, &token.format_amount(balance)));
    }
    Ok(())
}

fn submission_error(e: WalletError) -> BridgeError {
    match e {
        WalletError::UserRejected(message) => BridgeError::UserRejected(message),
        other => BridgeError::ChainSubmissionFailed(other.to_string()),
    }
}
