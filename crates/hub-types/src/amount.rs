//! Arbitrary-precision, non-negative monetary values.
//!
//! All monetary arithmetic in the hub goes through this type so that the
//! wire representation is always a decimal string and no monetary value
//! ever touches a float.

use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;
use num_traits::Zero;
use serde::{de::Error as DeError, Deserialize, Deserializer, Serialize, Serializer};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Amount(BigUint);

impl Amount {
    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    pub fn from_u64(v: u64) -> Self {
        Self(BigUint::from(v))
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    pub fn into_biguint(self) -> BigUint {
        self.0
    }

    /// Non-panicking subtraction; `None` if it would underflow.
    pub fn checked_sub(&self, other: &Amount) -> Option<Amount> {
        if self.0 < other.0 {
            None
        } else {
            Some(Amount(&self.0 - &other.0))
        }
    }

    pub fn checked_add(&self, other: &Amount) -> Amount {
        Amount(&self.0 + &other.0)
    }
}

impl From<BigUint> for Amount {
    fn from(v: BigUint) -> Self {
        Self(v)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = num_bigint::ParseBigIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Amount(BigUint::from_str(s)?))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Amount::from_str(&s).map_err(|e| DeError::custom(format!("invalid decimal amount: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_json_as_a_string() {
        let a = Amount::from_u64(1_000_000);
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, "\"1000000\"");
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
    }

    #[test]
    fn checked_sub_rejects_underflow_instead_of_panicking() {
        let a = Amount::from_u64(5);
        let b = Amount::from_u64(10);
        assert!(a.checked_sub(&b).is_none());
        assert_eq!(b.checked_sub(&a), Some(Amount::from_u64(5)));
    }

    #[test]
    fn parses_arbitrarily_large_values() {
        let huge = "115792089237316195423570985008687907853269984665640564039457584007913129639935";
        let a: Amount = huge.parse().unwrap();
        assert_eq!(a.to_string(), huge);
    }
}
