//! Chain identifiers and the wire strings they map to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the two chains this hub bridges between.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChainId {
    ChainS,
    ChainQ,
}

impl ChainId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainId::ChainS => "chainS",
            ChainId::ChainQ => "chainQ",
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown chain id: {0}")]
pub struct ParseChainIdError(String);

impl FromStr for ChainId {
    type Err = ParseChainIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chainS" => Ok(ChainId::ChainS),
            "chainQ" => Ok(ChainId::ChainQ),
            other => Err(ParseChainIdError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_wire_strings() {
        assert_eq!(ChainId::from_str("chainS").unwrap(), ChainId::ChainS);
        assert_eq!(ChainId::ChainQ.as_str(), "chainQ");
        assert!(ChainId::from_str("chainX").is_err());
    }
}
