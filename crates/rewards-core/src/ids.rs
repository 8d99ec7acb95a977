//! Identifier types for the rewards ledger.
//!
//! This module provides strongly-typed identifiers for users, ledger entries,
//! and shareable referral codes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, OnceLock, PoisonError};
use ulid::{Generator, Ulid};

/// Maximum length of a user identifier in bytes.
pub const MAX_USER_ID_LEN: usize = 128;

/// Length of a generated referral code.
pub const REFERRAL_CODE_LEN: usize = 6;

const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// A user identifier issued by the identity provider.
///
/// The value is opaque to this service. It is restricted to URL-safe
/// characters (`A-Z a-z 0-9 _ -`) so it can be embedded in a referral
/// link without escaping.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Generate a new random `UserId` (for testing).
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Return the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the bytes of the identifier.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl FromStr for UserId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(IdError::Empty);
        }
        if s.len() > MAX_USER_ID_LEN {
            return Err(IdError::TooLong { len: s.len() });
        }
        if !s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
        {
            return Err(IdError::InvalidCharacter);
        }
        Ok(Self(s.to_string()))
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for UserId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl AsRef<[u8]> for UserId {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

/// A ledger entry identifier using ULID for time-ordering.
///
/// Entry IDs come from one process-wide monotonic generator: an id is
/// strictly greater than every id generated before it, including ids made in
/// the same millisecond. Per-user index keys built from them therefore
/// iterate in creation order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntryId(Ulid);

impl EntryId {
    /// Generate a new `EntryId` with the current timestamp.
    ///
    /// # Errors
    ///
    /// Returns `IdError::Exhausted` if the random part of the current
    /// millisecond has overflowed.
    pub fn generate() -> Result<Self, IdError> {
        static GENERATOR: OnceLock<Mutex<Generator>> = OnceLock::new();

        let mut generator = GENERATOR
            .get_or_init(|| Mutex::new(Generator::new()))
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        generator
            .generate()
            .map(Self)
            .map_err(|_| IdError::Exhausted)
    }

    /// Return the bytes of the ULID (16 bytes).
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 16] {
        self.0.to_bytes()
    }

    /// Create an `EntryId` from bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Ulid::from_bytes(bytes))
    }
}

impl FromStr for EntryId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ulid = Ulid::from_string(s).map_err(|_| IdError::InvalidUlid)?;
        Ok(Self(ulid))
    }
}

impl fmt::Debug for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryId({})", self.0)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for EntryId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EntryId> for String {
    fn from(id: EntryId) -> Self {
        id.0.to_string()
    }
}

/// A short shareable code stored on each account.
///
/// Six uppercase base-36 characters, generated once at account creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferralCode(String);

impl ReferralCode {
    /// Generate a new random referral code.
    #[must_use]
    pub fn generate() -> Self {
        let bytes = uuid::Uuid::new_v4().into_bytes();
        let code = bytes
            .iter()
            .take(REFERRAL_CODE_LEN)
            .map(|b| char::from(BASE36[usize::from(*b) % BASE36.len()]))
            .collect();
        Self(code)
    }

    /// Return the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReferralCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The identifier is empty.
    #[error("identifier is empty")]
    Empty,

    /// The identifier exceeds the maximum length.
    #[error("identifier too long: {len} bytes")]
    TooLong {
        /// Actual length in bytes.
        len: usize,
    },

    /// The identifier contains a character outside `A-Z a-z 0-9 _ -`.
    #[error("identifier contains an invalid character")]
    InvalidCharacter,

    /// The input is not a valid ULID.
    #[error("invalid ULID format")]
    InvalidUlid,

    /// No more ids can be generated in the current millisecond.
    #[error("entry id space exhausted for the current millisecond")]
    Exhausted,
}
