use alloy_primitives::U256;

use crate::abi::{encode_function_call, AbiParam};
use crate::address::parse_address;
use crate::error::EthError;

/// Function selector for `transfer(address,uint256)`: `0xa9059cbb`.
const TRANSFER_SELECTOR: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];

/// Function selector for `balanceOf(address)`: `0x70a08231`.
const BALANCE_OF_SELECTOR: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];

/// Encodes an ERC-20 `transfer(address,uint256)` call.
pub fn encode_transfer(to: &str, amount: U256) -> Result<Vec<u8>, EthError> {
    let to = parse_address(to)?;
    Ok(encode_function_call(
        TRANSFER_SELECTOR,
        &[AbiParam::Address(to), AbiParam::Uint256(amount)],
    ))
}

/// Encodes an ERC-20 `balanceOf(address)` call.
pub fn encode_balance_of(owner: &str) -> Result<Vec<u8>, EthError> {
    let owner = parse_address(owner)?;
    Ok(encode_function_call(
        BALANCE_OF_SELECTOR,
        &[AbiParam::Address(owner)],
    ))
}

/// Builds the `{to, data}` call object for an `eth_call` of `balanceOf`.
pub fn balance_of_call(token: &str, owner: &str) -> Result<serde_json::Value, EthError> {
    parse_address(token)?;
    let data = encode_balance_of(owner)?;
    Ok(serde_json::json!({
        "to": token,
        "data": format!("0x{}", hex::encode(data)),
    }))
}
