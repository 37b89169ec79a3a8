//! Per-request Ed25519 signing of outbound oracle calls (C3, spec §4.3).

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use chrono::Utc;
use ed25519_dalek::{Signature, Signer as _};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::key_material::HubKeys;

#[derive(Debug, thiserror::Error)]
pub enum SignError {
    #[error("current key has no private key material — this process cannot sign requests")]
    NoSigningKey,
}

/// The `X-Hub-*` headers attached to every outbound signed request.
#[derive(Clone, Debug)]
pub struct SignedHeaders {
    pub hub_id: String,
    pub key_id: String,
    pub timestamp: String,
    pub nonce: String,
    pub body_hash: String,
    pub signature: String,
}

impl SignedHeaders {
    /// `(name, value)` pairs ready to hand to an HTTP client.
    pub fn as_pairs(&self) -> [(&'static str, String); 6] {
        [
            ("X-Hub-Id", self.hub_id.clone()),
            ("X-Key-Id", self.key_id.clone()),
            ("X-Timestamp", self.timestamp.clone()),
            ("X-Nonce", self.nonce.clone()),
            ("X-Body-Hash", self.body_hash.clone()),
            ("X-Signature", self.signature.clone()),
        ]
    }
}

pub struct RequestSigner {
    keys: Arc<HubKeys>,
}

impl RequestSigner {
    pub fn new(keys: Arc<HubKeys>) -> Self {
        Self { keys }
    }

    /// Signs `method url` with an empty body (a GET).
    pub fn sign_get(&self, method: &str, url: &str) -> Result<SignedHeaders, SignError> {
        self.sign(method, url, &[])
    }

    /// Signs `method url` against the current key snapshot, following the
    /// canonical string exactly as spec §4.3 defines it:
    ///
    /// ```text
    /// <METHOD>\n<URL>\nhubId=<hubId>\ntimestamp=<unixSeconds>\nnonce=<16-byte base64>\nbodyhash=<sha256 hex>\n
    /// ```
    pub fn sign(&self, method: &str, url: &str, body: &[u8]) -> Result<SignedHeaders, SignError> {
        let key = self.keys.current();
        let signing_key = key.signing_key.as_ref().ok_or(SignError::NoSigningKey)?;

        let timestamp = Utc::now().timestamp().to_string();
        let nonce = fresh_nonce();
        let body_hash = hex::encode(Sha256::digest(body));

        let canonical = canonical_string(method, url, &self.keys.hub_id, &timestamp, &nonce, &body_hash);
        let signature: Signature = signing_key.sign(canonical.as_bytes());

        Ok(SignedHeaders {
            hub_id: self.keys.hub_id.clone(),
            key_id: key.kid.clone(),
            timestamp,
            nonce,
            body_hash,
            signature: B64.encode(signature.to_bytes()),
        })
    }
}

fn canonical_string(
    method: &str,
    url: &str,
    hub_id: &str,
    timestamp: &str,
    nonce: &str,
    body_hash: &str,
) -> String {
    format!(
        "{method}\n{url}\nhubId={hub_id}\ntimestamp={timestamp}\nnonce={nonce}\nbodyhash={body_hash}\n"
    )
}

/// A fresh, random 16-byte nonce, base64-encoded. Freshness is the caller's
/// responsibility to use once per request (spec §4.3 "Nonces must be fresh
/// per call") — we never cache or reuse a nonce across calls.
fn fresh_nonce() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    B64.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key_material::{HubKeys, KeyMaterial};
    use ed25519_dalek::pkcs8::{EncodePrivateKey, EncodePublicKey};
    use ed25519_dalek::SigningKey;
    use ed25519_dalek::Verifier;
    use ed25519_dalek::VerifyingKey;
    use rand::rngs::OsRng;

    fn build_keys() -> Arc<HubKeys> {
        let signing_key = SigningKey::generate(&mut OsRng);
        let private_pem = signing_key.to_pkcs8_pem(Default::default()).unwrap().to_string();
        let public_pem = signing_key
            .verifying_key()
            .to_public_key_pem(Default::default())
            .unwrap();
        let file = hub_types::KeyMaterialFile {
            kid: "k1".into(),
            public_key_pem: public_pem,
            private_key_pem: Some(private_pem),
        };
        let dir = std::env::temp_dir().join(format!("hub-signer-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("keys.json");
        std::fs::write(
            &path,
            serde_json::to_vec(&hub_types::HubKeysFile {
                hub_id: "hub-1".into(),
                current: file,
                next: None,
            })
            .unwrap(),
        )
        .unwrap();
        Arc::new(HubKeys::load(&path).unwrap())
    }

    #[test]
    fn produces_a_signature_the_public_key_verifies() {
        let keys = build_keys();
        let signer = RequestSigner::new(keys.clone());
        let headers = signer.sign("GET", "http://oracle.example/api/health", b"").unwrap();

        let canonical = canonical_string(
            "GET",
            "http://oracle.example/api/health",
            &keys.hub_id,
            &headers.timestamp,
            &headers.nonce,
            &headers.body_hash,
        );
        let sig_bytes = B64.decode(&headers.signature).unwrap();
        let sig = Signature::from_slice(&sig_bytes).unwrap();
        let key: std::sync::Arc<KeyMaterial> = keys.current();
        key.verifying_key.verify(canonical.as_bytes(), &sig).unwrap();
    }

    #[test]
    fn nonces_are_fresh_each_call() {
        let a = fresh_nonce();
        let b = fresh_nonce();
        assert_ne!(a, b);
    }

    #[test]
    fn rejects_signing_without_private_key() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let verifying_key: VerifyingKey = signing_key.verifying_key();
        let public_only = KeyMaterial {
            kid: "pub-only".into(),
            verifying_key,
            signing_key: None,
            public_key_pem: String::new(),
        };
        let keys = HubKeys::load_with(
            "hub-1".into(),
            public_only,
            None,
        );
        let signer = RequestSigner::new(Arc::new(keys));
        assert!(matches!(signer.sign_get("GET", "x"), Err(SignError::NoSigningKey)));
    }
}
