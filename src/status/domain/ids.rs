//! Identifier and validated scalar types for the status domain.

use super::StatusDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusId(Uuid);

impl StatusId {
    /// Creates a new random status identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a status identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for StatusId {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<Uuid> for StatusId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for StatusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display name of a status, trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusName(String);

impl StatusName {
    /// Longest name accepted by the persisted schema.
    pub const MAX_LENGTH: usize = 100;

    /// Creates a validated status name.
    ///
    /// # Errors
    ///
    /// Returns [`StatusDomainError::EmptyName`] when the trimmed value is
    /// empty, or [`StatusDomainError::NameTooLong`] when it exceeds
    /// [`Self::MAX_LENGTH`] characters.
    pub fn new(value: impl Into<String>) -> Result<Self, StatusDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(StatusDomainError::EmptyName);
        }
        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(StatusDomainError::NameTooLong(trimmed.to_owned()));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the name as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for StatusName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for StatusName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Presentation colour of a status in `#rrggbb` form.
///
/// The engine never interprets the colour; it is carried through for the
/// presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusColor(String);

impl StatusColor {
    /// Neutral grey used when no colour is supplied.
    pub const DEFAULT_HEX: &'static str = "#6c757d";

    /// Creates a validated hex colour, normalised to lower case.
    ///
    /// # Errors
    ///
    /// Returns [`StatusDomainError::InvalidColor`] if the value is not a
    /// `#` followed by exactly six hexadecimal digits.
    pub fn new(value: impl Into<String>) -> Result<Self, StatusDomainError> {
        let raw = value.into();
        let normalized = raw.trim().to_ascii_lowercase();
        let is_valid = normalized
            .strip_prefix('#')
            .is_some_and(|digits| digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit()));

        if !is_valid {
            return Err(StatusDomainError::InvalidColor(raw));
        }
        Ok(Self(normalized))
    }

    /// Returns the colour as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for StatusColor {
    fn default() -> Self {
        Self(Self::DEFAULT_HEX.to_owned())
    }
}

impl fmt::Display for StatusColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
