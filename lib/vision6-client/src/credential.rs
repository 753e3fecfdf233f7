use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Secure wrapper for the API key that zeroes its memory on drop.
///
/// The key is opaque and immutable for the lifetime of a client instance.
/// `Debug` and `Display` never reveal the full value.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecureString(String);

impl SecureString {
    /// Creates a new secure string from the provided value.
    pub fn new(value: String) -> Self {
        Self(value)
    }

    /// Returns a reference to the inner value.
    ///
    /// The returned reference should not be stored for extended periods.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the wrapped value is empty or whitespace-only.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Consumes the wrapper and returns the inner `String`.
    pub fn into_string(mut self) -> String {
        std::mem::take(&mut self.0)
    }

    fn mask(value: &str) -> String {
        if value.len() <= 4 {
            "****".to_owned()
        } else {
            let prefix: String = value.chars().take(2).collect();
            format!("{prefix}****")
        }
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureString")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

impl fmt::Display for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Self::mask(&self.0))
    }
}

impl From<String> for SecureString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecureString {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl Serialize for SecureString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecureString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self::new)
    }
}
