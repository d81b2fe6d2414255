use alloy_primitives::U256;
use serde::Serialize;

use crate::abi::format_quantity;
use crate::address::parse_address;
use crate::erc20;
use crate::error::EthError;

/// An unsigned transaction handed to the wallet via `eth_sendTransaction`.
///
/// The wallet fills nonce, gas and fees, signs and broadcasts; we only ever
/// see the resulting hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRequest {
    pub from: String,
    pub to: String,
    /// Hex quantity; omitted for token transfers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// `0x`-prefixed calldata; omitted for native sends.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// Builds a native-asset send of `value_wei` from `from` to `to`.
pub fn native_transfer(from: &str, to: &str, value_wei: U256) -> Result<TransactionRequest, EthError> {
    parse_address(from)?;
    parse_address(to)?;

    Ok(TransactionRequest {
        from: from.to_string(),
        to: to.to_string(),
        value: Some(format_quantity(value_wei)),
        data: None,
    })
}

/// Builds an ERC-20 `transfer(to, amount)` call against `token_contract`.
pub fn erc20_transfer(
    from: &str,
    token_contract: &str,
    to: &str,
    amount: U256,
) -> Result<TransactionRequest, EthError> {
    parse_address(from)?;
    parse_address(token_contract)?;
    let calldata = erc20::encode_transfer(to, amount)?;

    Ok(TransactionRequest {
        from: from.to_string(),
        to: token_contract.to_string(),
        value: None,
        data: Some(format!("0x{}", hex::encode(calldata))),
    })
}

/// Status of a mined transaction, read from `eth_getTransactionReceipt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    Success,
    Reverted,
}

/// Interprets the `status` field of a receipt object. Pre-Byzantium
/// receipts have no status; none of the supported chains produce those.
pub fn receipt_status(receipt: &serde_json::Value) -> Result<ReceiptStatus, EthError> {
    let status = receipt
        .get("status")
        .and_then(|s| s.as_str())
        .ok_or_else(|| EthError::EncodingError("receipt has no status".into()))?;
    match crate::abi::parse_quantity(status)? {
        s if s == U256::from(1u8) => Ok(ReceiptStatus::Success),
        _ => Ok(ReceiptStatus::Reverted),
    }
}
