use std::collections::{BTreeMap, HashMap};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use futures::future::join_all;
use p256::ecdsa::signature::hazmat::PrehashVerifier;
use p256::ecdsa::Signature;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::GuardianError;
use crate::guardians::{GuardianKey, GuardianSet};
use crate::proposal::Proposal;
use crate::THRESHOLD;

/// Outcome of checking one proposal against the guardian set.
///
/// `success` is true iff `verified_count >= THRESHOLD`. Produced fresh per
/// proposal and never reused for another address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub success: bool,
    pub verified_count: usize,
    pub per_guardian_result: BTreeMap<String, bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

/// Verifies guardian signatures for generated bridge addresses.
#[derive(Debug, Clone)]
pub struct GuardianVerifier {
    guardians: GuardianSet,
}

impl GuardianVerifier {
    pub fn new(guardians: GuardianSet) -> Self {
        Self { guardians }
    }

    pub fn for_network(is_mainnet: bool) -> Self {
        Self::new(GuardianSet::for_network(is_mainnet))
    }

    pub fn guardians(&self) -> &GuardianSet {
        &self.guardians
    }

    /// Checks every configured guardian concurrently and tallies the quorum.
    ///
    /// Signatures keyed by ids outside the set are ignored; a missing or
    /// malformed signature counts as a failure for that guardian and is
    /// reported in `errors`. Never fails as a whole.
    pub async fn verify(
        &self,
        signatures: &HashMap<String, String>,
        proposal: &Proposal,
    ) -> VerificationResult {
        let checks = self.guardians.nodes().iter().map(|node| {
            let signature = signatures.get(&node.node_id).map(String::as_str);
            async move { (node.node_id.clone(), check_guardian(node, signature, proposal)) }
        });
        let outcomes = join_all(checks).await;

        let mut per_guardian_result = BTreeMap::new();
        let mut errors = Vec::new();
        for (node_id, outcome) in outcomes {
            let valid = match outcome {
                Ok(valid) => valid,
                Err(e) => {
                    errors.push(format!("{node_id}: {e}"));
                    false
                }
            };
            debug!(guardian = %node_id, valid, "guardian signature checked");
            per_guardian_result.insert(node_id, valid);
        }

        let verified_count = per_guardian_result.values().filter(|v| **v).count();
        let success = verified_count >= THRESHOLD;

        if success {
            info!(address = %proposal.address, verified_count, "guardian quorum reached");
        } else {
            warn!(address = %proposal.address, verified_count, "guardian quorum not reached");
        }

        VerificationResult {
            success,
            verified_count,
            per_guardian_result,
            errors: if errors.is_empty() { None } else { Some(errors) },
        }
    }
}

/// `verify(signatures, proposal, isMainnet)` against the shipped tables.
pub async fn verify(
    signatures: &HashMap<String, String>,
    proposal: &Proposal,
    is_mainnet: bool,
) -> VerificationResult {
    GuardianVerifier::for_network(is_mainnet)
        .verify(signatures, proposal)
        .await
}

fn check_guardian(
    node: &GuardianKey,
    signature_b64: Option<&str>,
    proposal: &Proposal,
) -> Result<bool, GuardianError> {
    let key = node.verifying_key()?;
    let signature_b64 = signature_b64.ok_or(GuardianError::MissingSignature)?;

    let raw = STANDARD
        .decode(signature_b64.trim())
        .map_err(|e| GuardianError::MalformedSignature(e.to_string()))?;
    if raw.len() != 64 {
        return Err(GuardianError::SignatureLength(raw.len()));
    }
    let signature =
        Signature::from_slice(&raw).map_err(|e| GuardianError::MalformedSignature(e.to_string()))?;

    let digest = Sha256::digest(proposal.canonical_message(&node.node_id).as_bytes());
    Ok(key.verify_prehash(&digest, &signature).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use p256::ecdsa::signature::hazmat::PrehashSigner;
    use p256::ecdsa::SigningKey;

    const IDS: [&str; 3] = ["unit-node", "hl-node", "field-node"];

    fn signing_keys() -> Vec<SigningKey> {
        (1u8..=3)
            .map(|i| SigningKey::from_slice(&[i; 32]).unwrap())
            .collect()
    }

    fn verifier() -> GuardianVerifier {
        let nodes = IDS
            .iter()
            .zip(signing_keys())
            .map(|(id, key)| {
                let point = key.verifying_key().to_encoded_point(false);
                GuardianKey::new(*id, hex::encode(point.as_bytes()))
            })
            .collect();
        GuardianVerifier::new(GuardianSet::new(nodes).unwrap())
    }

    fn proposal() -> Proposal {
        Proposal::new(
            "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf",
            "hyperliquid",
            "eth",
            "0x3f1Cb2b2D1b3b2F1A9dE3c1A0b2c3d4e5f60718a",
        )
    }

    fn sign(index: usize, proposal: &Proposal) -> String {
        let key = &signing_keys()[index];
        let digest = Sha256::digest(proposal.canonical_message(IDS[index]).as_bytes());
        let sig: Signature = key.sign_prehash(&digest).unwrap();
        STANDARD.encode(sig.to_bytes())
    }

    fn signatures(indices: &[usize], proposal: &Proposal) -> HashMap<String, String> {
        indices
            .iter()
            .map(|&i| (IDS[i].to_string(), sign(i, proposal)))
            .collect()
    }

    #[tokio::test]
    async fn all_three_valid() {
        let p = proposal();
        let result = verifier().verify(&signatures(&[0, 1, 2], &p), &p).await;
        assert!(result.success);
        assert_eq!(result.verified_count, 3);
        assert!(result.errors.is_none());
    }

    #[tokio::test]
    async fn two_of_three_is_enough() {
        let p = proposal();
        let result = verifier().verify(&signatures(&[0, 1], &p), &p).await;

        assert!(result.success);
        assert_eq!(result.verified_count, 2);
        assert!(result.per_guardian_result["unit-node"]);
        assert!(result.per_guardian_result["hl-node"]);
        assert!(!result.per_guardian_result["field-node"]);
        let errors = result.errors.unwrap();
        assert_eq!(errors, vec!["field-node: missing signature".to_string()]);
    }

    #[tokio::test]
    async fn one_of_three_fails() {
        let p = proposal();
        let result = verifier().verify(&signatures(&[0], &p), &p).await;
        assert!(!result.success);
        assert_eq!(result.verified_count, 1);
    }

    #[tokio::test]
    async fn no_signatures_fails_closed() {
        let result = verifier().verify(&HashMap::new(), &proposal()).await;
        assert!(!result.success);
        assert_eq!(result.verified_count, 0);
        assert_eq!(result.per_guardian_result.len(), 3);
        assert_eq!(result.errors.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn one_guardian_cannot_sign_for_another() {
        let p = proposal();
        let mut sigs = signatures(&[0], &p);
        // unit-node's signature replayed under hl-node's id.
        sigs.insert("hl-node".into(), sign(0, &p));
        let result = verifier().verify(&sigs, &p).await;
        assert!(!result.success);
        assert_eq!(result.verified_count, 1);
    }

    #[tokio::test]
    async fn unknown_guardian_ids_are_ignored() {
        let p = proposal();
        let mut sigs = signatures(&[0], &p);
        sigs.insert("rogue-node".into(), sign(1, &p));
        let result = verifier().verify(&sigs, &p).await;
        assert!(!result.success);
        assert!(!result.per_guardian_result.contains_key("rogue-node"));
    }

    #[tokio::test]
    async fn tampering_any_field_invalidates_every_guardian() {
        let p = proposal();
        let sigs = signatures(&[0, 1, 2], &p);

        let mut tampered = Vec::new();
        let mut t = p.clone();
        t.destination_address.replace_range(2..3, "8");
        tampered.push(t);
        let mut t = p.clone();
        t.asset = "eti".into();
        tampered.push(t);
        let mut t = p.clone();
        t.address.replace_range(2..3, "4");
        tampered.push(t);

        for t in tampered {
            let result = verifier().verify(&sigs, &t).await;
            assert!(!result.success);
            assert_eq!(result.verified_count, 0);
            assert!(result.per_guardian_result.values().all(|v| !v));
        }
    }

    #[tokio::test]
    async fn malformed_signatures_are_recorded_not_thrown() {
        let p = proposal();
        let mut sigs = signatures(&[0], &p);
        sigs.insert("hl-node".into(), "***not base64***".into());
        sigs.insert("field-node".into(), STANDARD.encode([7u8; 63]));

        let result = verifier().verify(&sigs, &p).await;
        assert!(!result.success);
        assert_eq!(result.verified_count, 1);

        let errors = result.errors.unwrap();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.starts_with("hl-node: malformed signature")));
        assert!(errors
            .iter()
            .any(|e| e == "field-node: signature must be 64 bytes, got 63"));
    }

    #[tokio::test]
    async fn zero_scalar_signature_is_malformed() {
        let p = proposal();
        let mut sigs = signatures(&[0, 1], &p);
        sigs.insert("field-node".into(), STANDARD.encode([0u8; 64]));
        let result = verifier().verify(&sigs, &p).await;
        assert!(result.success);
        assert!(!result.per_guardian_result["field-node"]);
        assert!(result.errors.unwrap()[0].starts_with("field-node: malformed signature"));
    }

    #[tokio::test]
    async fn bad_guardian_key_counts_as_failure() {
        let keys = signing_keys();
        let mut nodes: Vec<GuardianKey> = IDS
            .iter()
            .zip(&keys)
            .map(|(id, key)| {
                let point = key.verifying_key().to_encoded_point(false);
                GuardianKey::new(*id, hex::encode(point.as_bytes()))
            })
            .collect();
        nodes[2].public_key_hex = format!("04{}", "11".repeat(64));
        let verifier = GuardianVerifier::new(GuardianSet::new(nodes).unwrap());

        let p = proposal();
        let result = verifier.verify(&signatures(&[0, 2], &p), &p).await;
        assert!(!result.success);
        assert_eq!(result.verified_count, 1);
        let errors = result.errors.unwrap();
        assert!(errors.contains(&"hl-node: missing signature".to_string()));
        assert!(errors
            .iter()
            .any(|e| e.starts_with("field-node: invalid public key for guardian field-node")));
    }

    #[tokio::test]
    async fn shipped_tables_reject_test_signatures() {
        let p = proposal();
        let sigs = signatures(&[0, 1, 2], &p);
        assert!(!verify(&sigs, &p, true).await.success);
        assert!(!verify(&sigs, &p, false).await.success);
    }

    #[tokio::test]
    async fn result_serializes_for_display() {
        let p = proposal();
        let result = verifier().verify(&signatures(&[0, 1, 2], &p), &p).await;
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["verifiedCount"], 3);
        assert_eq!(json["perGuardianResult"]["hl-node"], true);
        assert!(json.get("errors").is_none());
    }
}
