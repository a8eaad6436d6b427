//! API key handling.
//!
//! Keys live in a `secrecy::SecretBox` from the moment they are read, so
//! neither `Debug` formatting nor tracing fields can leak them. The raw
//! value is only reachable through [`SecretString::expose`], which the
//! OpenAI client calls at the request-building site and nowhere else.

use std::fmt;

use secrecy::{ExposeSecret, SecretBox};

/// An API key or other credential that must never appear in logs.
///
/// Both `Debug` and `Display` render `[REDACTED]`, so the wrapper is safe to
/// embed in structs that derive `Debug` or feed tracing spans.
pub struct SecretString(SecretBox<str>);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretBox::new(value.into().into_boxed_str()))
    }

    /// The raw secret. Call only where the value is actually sent.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

// SecretBox is deliberately not Clone; re-wrap the exposed value.
impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_debug_redact() {
        let key = SecretString::new("sk-very-secret");
        assert_eq!(key.to_string(), "[REDACTED]");
        assert_eq!(format!("{key:?}"), "[REDACTED]");
    }

    #[test]
    fn test_expose_returns_raw_value() {
        let key = SecretString::from("sk-abc123");
        assert_eq!(key.expose(), "sk-abc123");
        assert_eq!(key.clone().expose(), "sk-abc123");
    }

    #[test]
    fn test_derived_debug_on_containing_struct_is_safe() {
        #[derive(Debug)]
        struct Holder {
            key: SecretString,
        }
        let holder = Holder {
            key: SecretString::new("sk-should-not-leak"),
        };
        assert!(!format!("{holder:?}").contains("sk-should-not-leak"));
    }
}
