use thiserror::Error;

/// Ethereum chain operation errors.
#[derive(Debug, Error)]
pub enum EthError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("unsupported chain: {0}")]
    UnsupportedChain(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_address() {
        let err = EthError::InvalidAddress("bad checksum".into());
        assert_eq!(err.to_string(), "invalid address: bad checksum");
    }

    #[test]
    fn display_invalid_public_key() {
        let err = EthError::InvalidPublicKey("not on curve".into());
        assert_eq!(err.to_string(), "invalid public key: not on curve");
    }

    #[test]
    fn display_invalid_signature() {
        let err = EthError::InvalidSignature("expected 65 bytes".into());
        assert_eq!(err.to_string(), "invalid signature: expected 65 bytes");
    }

    #[test]
    fn display_encoding_error() {
        let err = EthError::EncodingError("short return data".into());
        assert_eq!(err.to_string(), "encoding error: short return data");
    }

    #[test]
    fn display_unsupported_chain() {
        let err = EthError::UnsupportedChain("0x89".into());
        assert_eq!(err.to_string(), "unsupported chain: 0x89");
    }

    #[test]
    fn error_trait_is_implemented() {
        let err: Box<dyn std::error::Error> = Box::new(EthError::InvalidAddress("test".into()));
        assert!(err.to_string().contains("test"));
    }
}
