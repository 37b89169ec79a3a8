//! Immutable key snapshots and the hub keys file loader (spec §3 HubKeys,
//! §6 "Hub keys file").
//!
//! Key material is never mutated in place — rotation publishes a brand new
//! snapshot behind an `ArcSwap`, so in-flight signers always see a
//! consistent `(kid, key)` pair and never tear a signature across two keys.

use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use ed25519_dalek::pkcs8::{DecodePrivateKey, DecodePublicKey};
use ed25519_dalek::{SigningKey, VerifyingKey};
use hub_types::{HubKeysFile, KeyMaterialFile};

#[derive(Debug, thiserror::Error)]
pub enum KeyLoadError {
    #[error("failed to read hub keys file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse hub keys file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid public key pem for kid {kid}: {source}")]
    PublicKey {
        kid: String,
        #[source]
        source: ed25519_dalek::pkcs8::spki::Error,
    },
    #[error("invalid private key pem for kid {kid}: {source}")]
    PrivateKey {
        kid: String,
        #[source]
        source: ed25519_dalek::pkcs8::Error,
    },
}

/// One key's material: always has a public key, only has a private key
/// when this process is allowed to sign with it.
#[derive(Clone)]
pub struct KeyMaterial {
    pub kid: String,
    pub verifying_key: VerifyingKey,
    pub signing_key: Option<Arc<SigningKey>>,
    /// The PEM text exactly as loaded, retained verbatim because
    /// `GET /api/keys`'s `fingerprint` is `sha256hex` of this exact string,
    /// not of the decoded key bytes (spec §6).
    pub public_key_pem: String,
}

impl KeyMaterial {
    fn from_file(file: &KeyMaterialFile) -> Result<Self, KeyLoadError> {
        let verifying_key =
            VerifyingKey::from_public_key_pem(&file.public_key_pem).map_err(|source| {
                KeyLoadError::PublicKey {
                    kid: file.kid.clone(),
                    source,
                }
            })?;
        let signing_key = match &file.private_key_pem {
            Some(pem) => {
                let key = SigningKey::from_pkcs8_pem(pem).map_err(|source| KeyLoadError::PrivateKey {
                    kid: file.kid.clone(),
                    source,
                })?;
                Some(Arc::new(key))
            }
            None => None,
        };
        Ok(Self {
            kid: file.kid.clone(),
            verifying_key,
            signing_key,
            public_key_pem: file.public_key_pem.clone(),
        })
    }

    /// sha256 hex fingerprint of the public key PEM text, matching
    /// `GET /api/keys`'s `fingerprint = sha256hex(publicKeyPem)` (spec §6).
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        hex::encode(Sha256::digest(self.public_key_pem.as_bytes()))
    }
}

/// Process-wide hub identity: immutable after load except for `rotate`,
/// which atomically publishes a new `current`/`next` pair.
pub struct HubKeys {
    pub hub_id: String,
    current: ArcSwap<KeyMaterial>,
    next: ArcSwap<Option<KeyMaterial>>,
}

impl HubKeys {
    /// Builds a `HubKeys` directly from already-loaded key material,
    /// bypassing the file loader. Used by tests and by callers that
    /// source keys from somewhere other than a local file (e.g. a secrets
    /// manager) but still want rotation semantics.
    pub fn load_with(hub_id: String, current: KeyMaterial, next: Option<KeyMaterial>) -> Self {
        Self {
            hub_id,
            current: ArcSwap::from_pointee(current),
            next: ArcSwap::from_pointee(next),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, KeyLoadError> {
        let path_ref = path.as_ref();
        let raw = std::fs::read_to_string(path_ref).map_err(|source| KeyLoadError::Io {
            path: path_ref.display().to_string(),
            source,
        })?;
        let file: HubKeysFile = serde_json::from_str(&raw)?;
        let current = KeyMaterial::from_file(&file.current)?;
        let next = match &file.next {
            Some(n) => Some(KeyMaterial::from_file(n)?),
            None => None,
        };
        Ok(Self {
            hub_id: file.hub_id,
            current: ArcSwap::from_pointee(current),
            next: ArcSwap::from_pointee(next),
        })
    }

    pub fn current(&self) -> Arc<KeyMaterial> {
        self.current.load_full()
    }

    pub fn next(&self) -> Option<Arc<KeyMaterial>> {
        self.next.load_full().as_ref().clone().map(Arc::new)
    }

    /// Publishes `new_current` as the signing key from this point forward.
    /// Any in-flight `sign` calls that already captured the old snapshot
    /// finish with it; every new call observes the rotation.
    pub fn rotate(&self, new_current: KeyMaterial, new_next: Option<KeyMaterial>) {
        self.current.store(Arc::new(new_current));
        self.next.store(Arc::new(new_next));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::pkcs8::EncodePrivateKey;
    use ed25519_dalek::pkcs8::EncodePublicKey;
    use rand::rngs::OsRng;

    fn sample_pems() -> (String, String) {
        let signing_key = SigningKey::generate(&mut OsRng);
        let private_pem = signing_key
            .to_pkcs8_pem(Default::default())
            .unwrap()
            .to_string();
        let public_pem = signing_key
            .verifying_key()
            .to_public_key_pem(Default::default())
            .unwrap();
        (private_pem, public_pem)
    }

    #[test]
    fn loads_and_rotates_keys() {
        let (priv_pem, pub_pem) = sample_pems();
        let dir = std::env::temp_dir().join(format!("hub-keys-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("keys.json");
        let file = HubKeysFile {
            hub_id: "hub-1".into(),
            current: KeyMaterialFile {
                kid: "k1".into(),
                public_key_pem: pub_pem,
                private_key_pem: Some(priv_pem),
            },
            next: None,
        };
        std::fs::write(&path, serde_json::to_vec(&file).unwrap()).unwrap();

        let keys = HubKeys::load(&path).unwrap();
        assert_eq!(keys.hub_id, "hub-1");
        assert_eq!(keys.current().kid, "k1");
        assert!(keys.next().is_none());

        let (priv2, pub2) = sample_pems();
        let new_current = KeyMaterial::from_file(&KeyMaterialFile {
            kid: "k2".into(),
            public_key_pem: pub2,
            private_key_pem: Some(priv2),
        })
        .unwrap();
        keys.rotate(new_current, None);
        assert_eq!(keys.current().kid, "k2");
    }
}
