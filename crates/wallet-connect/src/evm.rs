use std::sync::Arc;
use std::time::Duration;

use chain_eth::abi::{decode_hex_data, decode_uint256, parse_quantity};
use chain_eth::erc20;
use chain_eth::transaction::{receipt_status, ReceiptStatus, TransactionRequest};
use chain_eth::U256;
use serde_json::{json, Value};
use tracing::debug;

use crate::capability::EvmWalletCapability;
use crate::error::WalletError;

/// Typed wrapper over an EIP-1193 provider.
///
/// Every call is a single `request`; nothing is retried here.
#[derive(Clone)]
pub struct EvmWallet {
    provider: Arc<dyn EvmWalletCapability>,
}

impl EvmWallet {
    pub fn new(provider: Arc<dyn EvmWalletCapability>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Arc<dyn EvmWalletCapability> {
        &self.provider
    }

    // -----------------------------------------------------------------------
    // Accounts and network
    // -----------------------------------------------------------------------

    /// `eth_requestAccounts`: prompts the user for account access.
    pub async fn request_accounts(&self) -> Result<Vec<String>, WalletError> {
        let result = self.provider.request("eth_requestAccounts", json!([])).await?;
        parse_accounts(result)
    }

    /// `eth_accounts`: already-authorized accounts, never prompts.
    pub async fn accounts(&self) -> Result<Vec<String>, WalletError> {
        let result = self.provider.request("eth_accounts", json!([])).await?;
        parse_accounts(result)
    }

    /// Active chain as the wallet reports it (`0x`-prefixed hex).
    pub async fn chain_id(&self) -> Result<String, WalletError> {
        let result = self.provider.request("eth_chainId", json!([])).await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| WalletError::InvalidResponse("eth_chainId did not return a string".into()))
    }

    pub async fn switch_chain(&self, chain_id_hex: &str) -> Result<(), WalletError> {
        debug!(chain_id = chain_id_hex, "requesting network switch");
        self.provider
            .request(
                "wallet_switchEthereumChain",
                json!([{ "chainId": chain_id_hex }]),
            )
            .await?;
        Ok(())
    }

    /// Best-effort `wallet_revokePermissions` for `eth_accounts`.
    pub async fn revoke_permissions(&self) -> Result<(), WalletError> {
        self.provider
            .request("wallet_revokePermissions", json!([{ "eth_accounts": {} }]))
            .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Signing
    // -----------------------------------------------------------------------

    /// EIP-191 `personal_sign`; returns the 65-byte signature.
    pub async fn personal_sign(&self, address: &str, message: &[u8]) -> Result<Vec<u8>, WalletError> {
        let data = format!("0x{}", hex::encode(message));
        let result = self
            .provider
            .request("personal_sign", json!([data, address]))
            .await?;
        decode_signature(&result)
    }

    /// EIP-712 `eth_signTypedData_v4`; returns the 65-byte signature.
    pub async fn sign_typed_data(&self, address: &str, typed_data: &Value) -> Result<Vec<u8>, WalletError> {
        let payload = serde_json::to_string(typed_data)
            .map_err(|e| WalletError::InvalidResponse(e.to_string()))?;
        let result = self
            .provider
            .request("eth_signTypedData_v4", json!([address, payload]))
            .await?;
        decode_signature(&result)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Native balance in wei at the latest block.
    pub async fn get_balance(&self, address: &str) -> Result<U256, WalletError> {
        let result = self
            .provider
            .request("eth_getBalance", json!([address, "latest"]))
            .await?;
        let quantity = result
            .as_str()
            .ok_or_else(|| WalletError::InvalidResponse("eth_getBalance did not return a string".into()))?;
        Ok(parse_quantity(quantity)?)
    }

    /// ERC-20 `balanceOf(owner)` in token base units.
    pub async fn token_balance(&self, token: &str, owner: &str) -> Result<U256, WalletError> {
        let call = erc20::balance_of_call(token, owner)?;
        let result = self.provider.request("eth_call", json!([call, "latest"])).await?;
        let data = result
            .as_str()
            .ok_or_else(|| WalletError::InvalidResponse("eth_call did not return a string".into()))?;
        Ok(decode_uint256(&decode_hex_data(data)?)?)
    }

    // -----------------------------------------------------------------------
    // Transactions
    // -----------------------------------------------------------------------

    /// Hands an unsigned request to the wallet; returns the transaction hash.
    pub async fn send_transaction(&self, tx: &TransactionRequest) -> Result<String, WalletError> {
        let params = serde_json::to_value(tx).map_err(|e| WalletError::InvalidResponse(e.to_string()))?;
        let result = self
            .provider
            .request("eth_sendTransaction", json!([params]))
            .await?;
        let hash = result
            .as_str()
            .ok_or_else(|| WalletError::InvalidResponse("eth_sendTransaction did not return a hash".into()))?;
        debug!(hash, "transaction submitted");
        Ok(hash.to_string())
    }

    /// Receipt status, or `None` while the transaction is pending.
    pub async fn transaction_receipt(&self, hash: &str) -> Result<Option<ReceiptStatus>, WalletError> {
        let result = self
            .provider
            .request("eth_getTransactionReceipt", json!([hash]))
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        Ok(Some(receipt_status(&result)?))
    }

    /// Polls for the receipt until the transaction is mined. No timeout of
    /// its own; a wallet that never answers leaves this pending.
    pub async fn wait_for_receipt(&self, hash: &str, poll_interval: Duration) -> Result<ReceiptStatus, WalletError> {
        loop {
            if let Some(status) = self.transaction_receipt(hash).await? {
                return Ok(status);
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}

fn parse_accounts(value: Value) -> Result<Vec<String>, WalletError> {
    serde_json::from_value(value).map_err(|e| WalletError::InvalidResponse(format!("accounts: {e}")))
}

fn decode_signature(value: &Value) -> Result<Vec<u8>, WalletError> {
    let hex_sig = value
        .as_str()
        .ok_or_else(|| WalletError::InvalidResponse("signature is not a string".into()))?;
    let bytes = decode_hex_data(hex_sig)?;
    if bytes.len() != 65 {
        return Err(WalletError::InvalidResponse(format!(
            "expected 65-byte signature, got {}",
            bytes.len()
        )));
    }
    Ok(bytes)
}
