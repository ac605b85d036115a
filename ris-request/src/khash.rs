//! Payment token encoding
//!
//! Two independent encodings are supported:
//! - KHASH: one-way hash through a [`TokenHasher`]
//! - MASK: first 6 / last 4 characters kept, the rest replaced with `X`

use sha2::{Digest, Sha256};
use thiserror::Error;

/// Alphabet used for the hashed part of a KHASH token
const KHASH_ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Number of characters produced by the hashed part of a KHASH token
const KHASH_DIGEST_CHARS: usize = 14;

/// Characters of the raw token kept in front of a KHASH token
const KHASH_PREFIX_CHARS: usize = 6;

/// Token hashing failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HashError {
    /// Hashing cannot be performed right now (no salt, algorithm missing, ...)
    #[error("KHASH unavailable: {0}")]
    Unavailable(String),

    /// The token itself cannot be hashed
    #[error("Malformed payment token: {0}")]
    MalformedInput(String),
}

/// External hashing collaborator for KHASH encoding
///
/// Hashing is not idempotent: callers must not feed an already hashed token
/// back in.
pub trait TokenHasher: Send + Sync {
    /// Hash a standard payment token
    fn hash(&self, token: &str) -> Result<String, HashError>;

    /// Hash a gift card number. The merchant id is mixed in so the same card
    /// hashes differently per merchant.
    fn hash_gift_card(&self, merchant_id: u64, token: &str) -> Result<String, HashError>;
}

/// SHA-256 based KHASH implementation keyed by a configured salt
#[derive(Debug, Clone, Default)]
pub struct Khash {
    salt: Option<String>,
}

impl Khash {
    /// Create hasher with salt
    pub fn new(salt: impl Into<String>) -> Self {
        Self {
            salt: Some(salt.into()),
        }
    }

    /// Hasher without a salt; every call reports [`HashError::Unavailable`]
    pub fn unconfigured() -> Self {
        Self { salt: None }
    }

    fn digest(&self, data: &str) -> Result<String, HashError> {
        let salt = match self.salt.as_deref() {
            Some(salt) if !salt.is_empty() => salt,
            _ => return Err(HashError::Unavailable("no KHASH salt configured".into())),
        };
        if data.is_empty() {
            return Err(HashError::MalformedInput("empty token".into()));
        }

        let mut hasher = Sha256::new();
        hasher.update(data.as_bytes());
        hasher.update(b".");
        hasher.update(salt.as_bytes());
        let hex_digest = hex::encode(hasher.finalize());

        let mut encoded = String::with_capacity(KHASH_DIGEST_CHARS);
        for i in (0..KHASH_DIGEST_CHARS * 2).step_by(2) {
            let chunk = u64::from_str_radix(&hex_digest[i..i + 7], 16)
                .map_err(|e| HashError::Unavailable(format!("digest decode failed: {}", e)))?;
            encoded.push(KHASH_ALPHABET[(chunk % 36) as usize] as char);
        }

        Ok(encoded)
    }
}

impl TokenHasher for Khash {
    fn hash(&self, token: &str) -> Result<String, HashError> {
        let digest = self.digest(token)?;
        let prefix: String = token.chars().take(KHASH_PREFIX_CHARS).collect();
        Ok(format!("{}{}", prefix, digest))
    }

    fn hash_gift_card(&self, merchant_id: u64, token: &str) -> Result<String, HashError> {
        let digest = self.digest(token)?;
        Ok(format!("{}{}", merchant_id, digest))
    }
}

/// Encode a token with the MASK scheme.
///
/// Keeps the first 6 and last 4 characters and replaces everything between
/// with `X`. Tokens of 10 characters or fewer have no middle run and are
/// returned unchanged.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    let len = chars.len();

    if len <= 10 {
        return token.to_string();
    }

    let mut encoded = String::with_capacity(token.len());
    encoded.extend(&chars[..6]);
    encoded.extend(std::iter::repeat('X').take(len - 10));
    encoded.extend(&chars[len - 4..]);
    encoded
}
