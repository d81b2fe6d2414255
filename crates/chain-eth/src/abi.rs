//! Minimal ABI encoding for the two ERC-20 calls the bridge makes.
//!
//! Only static 32-byte words are needed (`address`, `uint256`), so there is
//! no dynamic-type head/tail handling here.

use alloy_primitives::{Address, U256};

use crate::error::EthError;

/// A single static ABI parameter.
#[derive(Debug, Clone, Copy)]
pub enum AbiParam {
    /// Left-padded to 32 bytes.
    Address(Address),
    /// Big-endian 32 bytes.
    Uint256(U256),
}

impl AbiParam {
    fn to_word(self) -> [u8; 32] {
        match self {
            AbiParam::Address(addr) => {
                let mut word = [0u8; 32];
                word[12..].copy_from_slice(addr.as_slice());
                word
            }
            AbiParam::Uint256(value) => value.to_be_bytes::<32>(),
        }
    }
}

/// Encodes `selector || word(params[0]) || word(params[1]) || ...`.
pub fn encode_function_call(selector: [u8; 4], params: &[AbiParam]) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + params.len() * 32);
    data.extend_from_slice(&selector);
    for param in params {
        data.extend_from_slice(&param.to_word());
    }
    data
}

/// Reads the first 32-byte word of return data as a uint256.
pub fn decode_uint256(data: &[u8]) -> Result<U256, EthError> {
    if data.len() < 32 {
        return Err(EthError::EncodingError(format!(
            "expected at least 32 bytes for uint256, got {}",
            data.len()
        )));
    }
    Ok(U256::from_be_slice(&data[..32]))
}

/// Decodes a `0x`-prefixed hex blob (as returned by `eth_call`).
pub fn decode_hex_data(data: &str) -> Result<Vec<u8>, EthError> {
    let digits = data.strip_prefix("0x").unwrap_or(data);
    hex::decode(digits).map_err(|e| EthError::EncodingError(format!("invalid hex data: {e}")))
}

/// Parses a JSON-RPC hex quantity (`"0x1bc16d674ec80000"`).
pub fn parse_quantity(quantity: &str) -> Result<U256, EthError> {
    let digits = quantity
        .strip_prefix("0x")
        .ok_or_else(|| EthError::EncodingError(format!("quantity {quantity} is not 0x-prefixed")))?;
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 16)
        .map_err(|e| EthError::EncodingError(format!("invalid quantity {quantity}: {e}")))
}

/// Formats a value as a JSON-RPC hex quantity (no leading zeros).
pub fn format_quantity(value: U256) -> String {
    format!("0x{value:x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_word_is_left_padded() {
        let mut raw = [0u8; 20];
        raw[0] = 0xde;
        raw[19] = 0xad;
        let word = AbiParam::Address(Address::from(raw)).to_word();

        assert_eq!(&word[..12], &[0u8; 12]);
        assert_eq!(&word[12..], &raw);
    }

    #[test]
    fn uint_word_is_big_endian() {
        let word = AbiParam::Uint256(U256::from(42u64)).to_word();
        assert_eq!(word[31], 42);
        assert_eq!(&word[..31], &[0u8; 31]);
    }

    #[test]
    fn call_with_two_params_is_68_bytes() {
        let params = [
            AbiParam::Address(Address::ZERO),
            AbiParam::Uint256(U256::from(100u64)),
        ];
        let data = encode_function_call([0xa9, 0x05, 0x9c, 0xbb], &params);
        assert_eq!(data.len(), 68);
        assert_eq!(data[67], 100);
    }

    #[test]
    fn decode_uint256_reads_first_word_only() {
        let mut data = vec![0u8; 64];
        data[31] = 7;
        data[63] = 99;
        assert_eq!(decode_uint256(&data).unwrap(), U256::from(7u64));
    }

    #[test]
    fn decode_uint256_short_data_errors() {
        assert!(decode_uint256(&[0u8; 16]).is_err());
    }

    #[test]
    fn quantity_parsing() {
        assert_eq!(
            parse_quantity("0xde0b6b3a7640000").unwrap(),
            U256::from(1_000_000_000_000_000_000u128)
        );
        assert_eq!(parse_quantity("0x").unwrap(), U256::ZERO);
        assert!(parse_quantity("1234").is_err());
        assert!(parse_quantity("0xzz").is_err());
    }

    #[test]
    fn quantity_formatting_has_no_leading_zeros() {
        assert_eq!(format_quantity(U256::from(255u64)), "0xff");
        assert_eq!(format_quantity(U256::ZERO), "0x0");
    }

    #[test]
    fn hex_data_accepts_prefix() {
        assert_eq!(decode_hex_data("0x0102").unwrap(), vec![1, 2]);
        assert!(decode_hex_data("0xg1").is_err());
    }
}
