//! Non-blank text type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing [`NonEmptyText`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TextError {
    /// The input is empty or whitespace only.
    #[error("cannot be empty")]
    Blank,
}

/// Text that contains at least one non-whitespace character.
///
/// The original text is preserved as written; only the emptiness check looks
/// past surrounding whitespace.
///
/// ```
/// use bazaar_core::NonEmptyText;
///
/// assert!(NonEmptyText::parse("hello").is_ok());
/// assert!(NonEmptyText::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Parse non-blank text.
    ///
    /// # Errors
    ///
    /// Returns `TextError::Blank` if the input is empty or whitespace only.
    pub fn parse(s: &str) -> Result<Self, TextError> {
        if s.trim().is_empty() {
            return Err(TextError::Blank);
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the text as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper and returns the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for NonEmptyText {
    type Error = TextError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<NonEmptyText> for String {
    fn from(text: NonEmptyText) -> Self {
        text.0
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
