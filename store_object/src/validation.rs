//! Validation module
//!
//! Entity names become URL path segments and cache key namespaces, so they are
//! validated once when a repository is created.

use std::fmt;

/// Validation errors for entity names
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Name contains invalid characters (only alphanumerics, `-` and `_` allowed)
    InvalidCharacters(String),
    /// Name is too long
    TooLong {
        name: String,
        length: usize,
        max_length: usize,
    },
    /// Name is empty
    Empty,
    /// Name starts with invalid character (must start with letter or underscore)
    InvalidStartCharacter(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidCharacters(name) => {
                write!(
                    f,
                    "Invalid characters in name '{}': only alphanumeric characters, '-' and '_' are allowed",
                    name
                )
            }
            ValidationError::TooLong {
                name,
                length,
                max_length,
            } => {
                write!(
                    f,
                    "Name '{}' is too long: {} characters (max {})",
                    name, length, max_length
                )
            }
            ValidationError::Empty => {
                write!(f, "Name cannot be empty")
            }
            ValidationError::InvalidStartCharacter(name) => {
                write!(f, "Name '{}' must start with a letter or underscore", name)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// A validated entity name, safe to use as a path segment and key namespace
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValidatedEntityName(String);

impl ValidatedEntityName {
    pub const MAX_LENGTH: usize = 128;

    /// Create a new validated entity name
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        Self::validate(name)?;
        Ok(Self(name.to_string()))
    }

    /// Get the validated name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the validated name as a String
    pub fn into_string(self) -> String {
        self.0
    }

    fn validate(name: &str) -> Result<(), ValidationError> {
        let first_char = name.chars().next().ok_or(ValidationError::Empty)?;

        if name.len() > Self::MAX_LENGTH {
            return Err(ValidationError::TooLong {
                name: name.to_string(),
                length: name.len(),
                max_length: Self::MAX_LENGTH,
            });
        }

        if !first_char.is_ascii_alphabetic() && first_char != '_' {
            return Err(ValidationError::InvalidStartCharacter(name.to_string()));
        }

        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(ValidationError::InvalidCharacters(name.to_string()));
        }

        Ok(())
    }
}

impl fmt::Display for ValidatedEntityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ValidatedEntityName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_entity_names() {
        let long = "a".repeat(ValidatedEntityName::MAX_LENGTH);
        let valid_names = ["users", "test-entities", "_internal", "blog_posts2", long.as_str()];

        for name in valid_names {
            assert!(
                ValidatedEntityName::new(name).is_ok(),
                "Should accept valid name: {}",
                name
            );
        }
    }

    #[test]
    fn test_invalid_entity_names() {
        let test_cases = [
            ("", ValidationError::Empty),
            (
                "1users",
                ValidationError::InvalidStartCharacter("1users".to_string()),
            ),
            (
                "-users",
                ValidationError::InvalidStartCharacter("-users".to_string()),
            ),
            (
                "users/1",
                ValidationError::InvalidCharacters("users/1".to_string()),
            ),
            (
                "user name",
                ValidationError::InvalidCharacters("user name".to_string()),
            ),
            (
                "users?x=1",
                ValidationError::InvalidCharacters("users?x=1".to_string()),
            ),
        ];

        for (name, expected_error) in test_cases {
            let result = ValidatedEntityName::new(name);
            assert_eq!(result, Err(expected_error), "Should reject invalid name: {}", name);
        }
    }

    #[test]
    fn test_too_long_name() {
        let long_name = "a".repeat(ValidatedEntityName::MAX_LENGTH + 1);
        match ValidatedEntityName::new(&long_name) {
            Err(ValidationError::TooLong {
                length, max_length, ..
            }) => {
                assert_eq!(length, 129);
                assert_eq!(max_length, 128);
            }
            other => panic!("Expected TooLong error, got {:?}", other),
        }
    }
}
