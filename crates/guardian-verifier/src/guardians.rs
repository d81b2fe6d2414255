//! Guardian public-key tables.
//!
//! Each network mode has a fixed, versioned table of exactly three guardian
//! nodes. Rotating a key means shipping a new table.

use std::collections::HashSet;

use p256::ecdsa::VerifyingKey;

use crate::error::GuardianError;
use crate::GUARDIAN_COUNT;

/// One guardian: its node id and uncompressed SEC1 P-256 public key (hex).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardianKey {
    pub node_id: String,
    pub public_key_hex: String,
}

impl GuardianKey {
    pub fn new(node_id: impl Into<String>, public_key_hex: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            public_key_hex: public_key_hex.into(),
        }
    }

    /// Imports the key. Only the 65-byte uncompressed form is accepted.
    pub fn verifying_key(&self) -> Result<VerifyingKey, GuardianError> {
        let invalid = |reason: String| GuardianError::InvalidPublicKey {
            node_id: self.node_id.clone(),
            reason,
        };

        let bytes = hex::decode(&self.public_key_hex).map_err(|e| invalid(e.to_string()))?;
        if bytes.len() != 65 || bytes[0] != 0x04 {
            return Err(invalid("expected 65-byte uncompressed point".into()));
        }
        VerifyingKey::from_sec1_bytes(&bytes).map_err(|e| invalid(e.to_string()))
    }
}

/// Table version shipped with this build.
pub const GUARDIAN_TABLE_VERSION: u32 = 1;

const MAINNET_GUARDIANS: [(&str, &str); 3] = [
    (
        "unit-node",
        "04fea520e1e4b0e5acbd1e1dea93a3568cc85dc8b3da585851de647475086fd9dc4b62087075946851290b89c6276946a52d8279f113a2b6fcf630e30eeeca72fe",
    ),
    (
        "hl-node",
        "042942c4479abdea4e866bbe12915d84ba82a6501c9d48d46ab508b3ec637341871a86093a9d19e04fe73b5367e62a735c9b1d62a76fb39f907c457079a08baa28",
    ),
    (
        "field-node",
        "0474d08c87a864ca09c572874b4c3bb201d0e256b520b0486428061c1b540b13a5cd5d1665516cbfebb2b2072f8698086e6dee867286f6f62aaa80c793c5f8d71a",
    ),
];

const TESTNET_GUARDIANS: [(&str, &str); 3] = [
    (
        "unit-node",
        "04b1271bbad6294bda78d8a3bc144bf5895fa24d1b71b2020ce837a902182d5fe06614d9bebbc093ac9dda9789cc40b70461d09bdaee573b15158bf28d4fc7aad0",
    ),
    (
        "hl-node",
        "04e7f1f97d246f6c3458b9f80d0279303400b079879f9a28f2d1fcae77a6cceac638764390dcfed6660c70b7221139950595914c481795ff5a53581ffbf43bd28f",
    ),
    (
        "field-node",
        "04dd2a24098868e76040bd51d871739f64aae7c104c3b9bf940fb396d8681d4ecff4b997a6ed06637f03ae873ee7831bfb6a202df42070013a68ec0355ee3f6f91",
    ),
];

/// A set of guardians with distinct node ids and distinct keys.
#[derive(Debug, Clone)]
pub struct GuardianSet {
    nodes: Vec<GuardianKey>,
}

impl GuardianSet {
    /// Builds a set of exactly [`GUARDIAN_COUNT`] nodes, rejecting duplicate
    /// node ids or keys.
    pub fn new(nodes: Vec<GuardianKey>) -> Result<Self, GuardianError> {
        if nodes.len() != GUARDIAN_COUNT {
            return Err(GuardianError::WrongGuardianCount {
                count: nodes.len(),
                expected: GUARDIAN_COUNT,
            });
        }

        let mut ids = HashSet::new();
        let mut keys = HashSet::new();
        for node in &nodes {
            if !ids.insert(node.node_id.as_str()) {
                return Err(GuardianError::DuplicateGuardian(node.node_id.clone()));
            }
            if !keys.insert(node.public_key_hex.to_ascii_lowercase()) {
                return Err(GuardianError::DuplicateGuardian(node.node_id.clone()));
            }
        }

        Ok(Self { nodes })
    }

    pub fn mainnet() -> Self {
        Self::from_table(&MAINNET_GUARDIANS)
    }

    pub fn testnet() -> Self {
        Self::from_table(&TESTNET_GUARDIANS)
    }

    pub fn for_network(is_mainnet: bool) -> Self {
        if is_mainnet {
            Self::mainnet()
        } else {
            Self::testnet()
        }
    }

    // Compiled-in tables are checked by the tests below.
    fn from_table(table: &[(&str, &str)]) -> Self {
        Self {
            nodes: table
                .iter()
                .map(|(id, key)| GuardianKey::new(*id, *key))
                .collect(),
        }
    }

    pub fn nodes(&self) -> &[GuardianKey] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
