//! Identifier types for courts, disputes and on-chain accounts
//!
//! Court and dispute identifiers are the sequential numeric ids assigned by
//! the arbitrator contract. Accounts and hashes are fixed-size byte arrays that
//! serialize as `0x`-prefixed hex strings.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Errors from parsing hex identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdParseError {
    /// The input was not valid hex.
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// The decoded input had the wrong length.
    #[error("expected {expected} bytes, got {actual}")]
    WrongLength {
        /// Expected byte length
        expected: usize,
        /// Decoded byte length
        actual: usize,
    },
}

/// Court identifier
///
/// Court ids are dense and start at the root court, whose parent is itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourtId(pub u64);

impl CourtId {
    /// Create a court id
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the inner value
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CourtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CourtId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Dispute identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisputeId(pub u64);

impl DisputeId {
    /// Create a dispute id
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the inner value
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DisputeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for DisputeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

fn decode_fixed<const N: usize>(input: &str) -> Result<[u8; N], IdParseError> {
    let stripped = input.strip_prefix("0x").unwrap_or(input);
    let bytes = hex::decode(stripped).map_err(|e| IdParseError::InvalidHex(e.to_string()))?;
    let actual = bytes.len();
    bytes.try_into().map_err(|_| IdParseError::WrongLength {
        expected: N,
        actual,
    })
}

macro_rules! hex_bytes_id {
    ($(#[$doc:meta])* $name:ident, $len:expr) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            /// Byte length of this identifier
            pub const LEN: usize = $len;

            /// Create from raw bytes
            pub const fn from_bytes(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// Create an identifier with every byte set to `byte`
            pub const fn repeat_byte(byte: u8) -> Self {
                Self([byte; $len])
            }

            /// The all-zero identifier
            pub const fn zero() -> Self {
                Self([0u8; $len])
            }

            /// Get the raw bytes
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                decode_fixed::<$len>(s).map(Self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

hex_bytes_id!(
    /// Account address (jurors, dispute creators, arbitrable contracts)
    Address,
    20
);

hex_bytes_id!(
    /// 32-byte hash (transaction hashes, vote commitments, salts)
    H256,
    32
);
