//! reqwest-backed collaborators.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::BridgeError;
use crate::services::{AddressRequest, AddressService, FeeEstimate, GeneratedAddress, SignatureStatus, SolanaRpc};

// ─── Address service ─────────────────────────────────────────────────

/// REST client for the address-generation and fee service.
#[derive(Debug, Clone)]
pub struct HttpAddressService {
    base_url: String,
    client: reqwest::Client,
}

impl HttpAddressService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// `GET {base}/gen/{src}/{dst}/{asset}/{destination}`.
    pub fn generate_url(&self, request: &AddressRequest) -> String {
        format!(
            "{}/gen/{}/{}/{}/{}",
            self.base_url,
            request.source_chain,
            request.destination_chain,
            request.asset,
            request.destination_address
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, BridgeError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| BridgeError::Service(format!("request to {url} failed: {e}")))?;

        if !response.status().is_success() {
            return Err(BridgeError::Service(format!(
                "{url} returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| BridgeError::Service(format!("invalid JSON from {url}: {e}")))
    }
}

#[async_trait]
impl AddressService for HttpAddressService {
    async fn generate_address(&self, request: &AddressRequest) -> Result<GeneratedAddress, BridgeError> {
        let url = self.generate_url(request);
        debug!(%url, "requesting bridge address");
        self.get_json(&url).await
    }

    async fn estimate_fees(&self) -> Result<FeeEstimate, BridgeError> {
        self.get_json(&format!("{}/v2/estimate-fees", self.base_url)).await
    }
}

// ─── Solana JSON-RPC ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// Minimal Solana JSON-RPC client: balance, blockhash, signature status.
#[derive(Debug, Clone)]
pub struct HttpSolanaRpc {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpSolanaRpc {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, BridgeError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let response: RpcResponse = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| BridgeError::Service(format!("{method}: {e}")))?
            .json()
            .await
            .map_err(|e| BridgeError::Service(format!("{method}: invalid JSON: {e}")))?;

        if let Some(err) = response.error {
            return Err(BridgeError::Service(format!(
                "{method}: {} ({})",
                err.message, err.code
            )));
        }
        response
            .result
            .ok_or_else(|| BridgeError::Service(format!("{method}: empty result")))
    }
}

#[async_trait]
impl SolanaRpc for HttpSolanaRpc {
    async fn get_balance(&self, address: &str) -> Result<u64, BridgeError> {
        let result = self
            .call("getBalance", json!([address, { "commitment": "confirmed" }]))
            .await?;
        result["value"]
            .as_u64()
            .ok_or_else(|| BridgeError::Service("getBalance: missing value".into()))
    }

    async fn latest_blockhash(&self) -> Result<[u8; 32], BridgeError> {
        let result = self
            .call("getLatestBlockhash", json!([{ "commitment": "finalized" }]))
            .await?;
        let hash = result["value"]["blockhash"]
            .as_str()
            .ok_or_else(|| BridgeError::Service("getLatestBlockhash: missing blockhash".into()))?;
        decode_blockhash(hash)
    }

    async fn signature_status(&self, signature: &str) -> Result<Option<SignatureStatus>, BridgeError> {
        let result = self
            .call(
                "getSignatureStatuses",
                json!([[signature], { "searchTransactionHistory": true }]),
            )
            .await?;
        Ok(parse_signature_status(&result["value"][0]))
    }
}

/// Decodes a Base58 blockhash into its 32 bytes.
pub fn decode_blockhash(hash: &str) -> Result<[u8; 32], BridgeError> {
    let bytes = bs58::decode(hash)
        .into_vec()
        .map_err(|e| BridgeError::Service(format!("invalid blockhash: {e}")))?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| BridgeError::Service(format!("blockhash is {} bytes", b.len())))
}

/// Reads one entry of a `getSignatureStatuses` result.
pub fn parse_signature_status(entry: &Value) -> Option<SignatureStatus> {
    if entry.is_null() {
        return None;
    }
    if let Some(err) = entry.get("err").filter(|e| !e.is_null()) {
        return Some(SignatureStatus::Failed(err.to_string()));
    }
    match entry.get("confirmationStatus").and_then(Value::as_str) {
        Some("finalized") => Some(SignatureStatus::Finalized),
        Some("confirmed") => Some(SignatureStatus::Confirmed),
        _ => Some(SignatureStatus::Processed),
    }
}
