//! Ed25519 signature verification over event hashes.

use std::sync::Arc;

use ed25519_dalek::{Signature, VerifyingKey};

use crate::domain::VerifierError;
use crate::ports::outbound::{BytesSignatureVerifier, VerifierFactory};

/// Verifier bound to one member's key.
#[derive(Debug, Clone)]
pub struct Ed25519Verifier {
    key: VerifyingKey,
}

impl BytesSignatureVerifier for Ed25519Verifier {
    fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        match Signature::from_slice(signature) {
            // Strict verification rejects malleable and small-order signatures.
            Ok(sig) => self.key.verify_strict(data, &sig).is_ok(),
            Err(_) => false,
        }
    }
}

/// Builds [`Ed25519Verifier`]s from 32-byte roster keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519VerifierFactory;

impl VerifierFactory for Ed25519VerifierFactory {
    fn create(&self, public_key: &[u8]) -> Result<Arc<dyn BytesSignatureVerifier>, VerifierError> {
        let bytes: [u8; 32] = public_key
            .try_into()
            .map_err(|_| VerifierError::InvalidKeyLength(public_key.len()))?;
        let key = VerifyingKey::from_bytes(&bytes).map_err(|_| VerifierError::InvalidKey)?;
        Ok(Arc::new(Ed25519Verifier { key }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::Signer;
    use shared_types::testing::signing_key;
    use shared_types::NodeId;

    #[test]
    fn test_verifies_own_signature_only() {
        let key = signing_key(NodeId(3));
        let verifier = Ed25519VerifierFactory
            .create(key.verifying_key().as_bytes())
            .unwrap();
        let sig = key.sign(b"event hash").to_bytes();

        assert!(verifier.verify(b"event hash", &sig));
        assert!(!verifier.verify(b"other hash", &sig));
        assert!(!verifier.verify(b"event hash", &sig[..63]));
    }

    #[test]
    fn test_rejects_bad_key_length() {
        let err = Ed25519VerifierFactory.create(&[1; 31]).err();
        assert_eq!(err, Some(VerifierError::InvalidKeyLength(31)));
    }
}
