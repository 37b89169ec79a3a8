//! Hub keys file schema (spec §6 "Hub keys file").

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeyMaterialFile {
    pub kid: String,
    pub public_key_pem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key_pem: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HubKeysFile {
    pub hub_id: String,
    pub current: KeyMaterialFile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<KeyMaterialFile>,
}
