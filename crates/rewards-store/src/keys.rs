//! Key encoding utilities.
//!
//! User ids are variable length, so every key that starts with a user id
//! starts with a one-byte length prefix. This keeps one user's prefix from
//! matching another user whose id happens to extend it.

use rewards_core::{EntryId, UserId};

/// Length in bytes of an encoded `EntryId`.
pub const ENTRY_ID_LEN: usize = 16;

/// Create an account key from a user ID.
#[must_use]
pub fn account_key(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Create a ledger entry key from an entry ID.
#[must_use]
pub fn entry_key(entry_id: &EntryId) -> Vec<u8> {
    entry_id.to_bytes().to_vec()
}

/// Create a referral event key from the referred user's ID.
#[must_use]
pub fn referral_key(referred_id: &UserId) -> Vec<u8> {
    referred_id.as_bytes().to_vec()
}

/// Create the prefix shared by every index key of a user.
///
/// Format: `len (1 byte) || user_id`.
#[must_use]
pub fn user_prefix(user_id: &UserId) -> Vec<u8> {
    let bytes = user_id.as_bytes();
    let mut key = Vec::with_capacity(1 + bytes.len() + ENTRY_ID_LEN);
    // MAX_USER_ID_LEN is 128, so the length always fits in a byte.
    key.push(u8::try_from(bytes.len()).unwrap_or(u8::MAX));
    key.extend_from_slice(bytes);
    key
}

/// Create a user-scoped index key.
///
/// Format: `len || user_id || entry_id (16 bytes)`.
///
/// Since ULIDs are time-ordered, a user's keys sort by time.
#[must_use]
pub fn user_entry_key(user_id: &UserId, entry_id: &EntryId) -> Vec<u8> {
    let mut key = user_prefix(user_id);
    key.extend_from_slice(&entry_id.to_bytes());
    key
}

/// Extract the entry ID from the tail of a user-scoped index key.
///
/// Returns `None` if the key is shorter than an entry ID.
#[must_use]
pub fn extract_entry_id(key: &[u8]) -> Option<EntryId> {
    let start = key.len().checked_sub(ENTRY_ID_LEN)?;
    let bytes: [u8; ENTRY_ID_LEN] = key[start..].try_into().ok()?;
    Some(EntryId::from_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_is_length_delimited() {
        let short: UserId = "abc".parse().unwrap();
        let long: UserId = "abcd".parse().unwrap();
        let entry = EntryId::generate().unwrap();

        let key = user_entry_key(&long, &entry);
        assert!(!key.starts_with(&user_prefix(&short)));
        assert!(key.starts_with(&user_prefix(&long)));
    }

    #[test]
    fn user_entry_key_format() {
        let user_id: UserId = "abc123".parse().unwrap();
        let entry = EntryId::generate().unwrap();
        let key = user_entry_key(&user_id, &entry);

        assert_eq!(key.len(), 1 + 6 + ENTRY_ID_LEN);
        assert_eq!(key[0], 6);
        assert_eq!(&key[1..7], b"abc123");
        assert_eq!(&key[7..], entry.to_bytes());
    }

    #[test]
    fn extract_entry_id_roundtrip() {
        let user_id = UserId::generate();
        let entry = EntryId::generate().unwrap();
        let key = user_entry_key(&user_id, &entry);

        assert_eq!(extract_entry_id(&key), Some(entry));
        assert_eq!(extract_entry_id(&[1, 2, 3]), None);
    }
}
