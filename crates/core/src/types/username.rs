//! Username type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Username`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UsernameError {
    /// The input string is empty.
    #[error("username cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("username must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains whitespace or a control character.
    #[error("username cannot contain spaces or control characters")]
    InvalidCharacter,
}

/// A login name.
///
/// Usernames are compared exactly (case-sensitive) and are unique across the
/// shop.
///
/// ## Constraints
///
/// - Length: 1-64 characters
/// - No whitespace and no control characters
///
/// ## Examples
///
/// ```
/// use bazaar_core::Username;
///
/// assert!(Username::parse("buyer_01").is_ok());
/// assert!(Username::parse("hoa.nguyen").is_ok());
///
/// assert!(Username::parse("").is_err());
/// assert!(Username::parse("two words").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Maximum length of a username, in characters.
    pub const MAX_LENGTH: usize = 64;

    /// Parse a `Username` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, longer than 64 characters, or
    /// contains whitespace or control characters.
    pub fn parse(s: &str) -> Result<Self, UsernameError> {
        if s.is_empty() {
            return Err(UsernameError::Empty);
        }

        if s.chars().count() > Self::MAX_LENGTH {
            return Err(UsernameError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(UsernameError::InvalidCharacter);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the username as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Username` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Username {
    type Err = UsernameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Username {
    type Error = UsernameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Username> for String {
    fn from(username: Username) -> Self {
        username.0
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let username = Username::parse("shop_admin").unwrap();
        assert_eq!(username.as_str(), "shop_admin");
    }

    #[test]
    fn test_parse_keeps_unicode() {
        let username = Username::parse("quỳnh").unwrap();
        assert_eq!(username.to_string(), "quỳnh");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(Username::parse(""), Err(UsernameError::Empty));
    }

    #[test]
    fn test_parse_too_long() {
        let long = "a".repeat(Username::MAX_LENGTH + 1);
        assert!(matches!(
            Username::parse(&long),
            Err(UsernameError::TooLong { .. })
        ));
    }

    #[test]
    fn test_parse_at_max_length() {
        let exact = "a".repeat(Username::MAX_LENGTH);
        assert!(Username::parse(&exact).is_ok());
    }

    #[test]
    fn test_parse_rejects_whitespace() {
        assert_eq!(
            Username::parse(" padded"),
            Err(UsernameError::InvalidCharacter)
        );
        assert_eq!(
            Username::parse("tab\tname"),
            Err(UsernameError::InvalidCharacter)
        );
    }

    #[test]
    fn test_deserialize_validates() {
        let parsed: Result<Username, _> = serde_json::from_str("\"has space\"");
        assert!(parsed.is_err());

        let parsed: Username = serde_json::from_str("\"buyer\"").unwrap();
        assert_eq!(parsed.as_str(), "buyer");
    }

    #[test]
    fn test_from_str() {
        let username: Username = "buyer".parse().unwrap();
        assert_eq!(username.as_ref(), "buyer");
    }
}
