//! Allow-list validation for table and column names.

use crate::error::StoreError;

/// How a [`crate::Store`] treats table and column names it interpolates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentifierPolicy {
    /// Names are interpolated as given. The caller vouches for them.
    #[default]
    Trusted,
    /// Every table and column name must pass [`validate_identifier`].
    Validated,
}

impl IdentifierPolicy {
    pub(crate) fn check(self, name: &str) -> Result<(), StoreError> {
        match self {
            Self::Trusted => Ok(()),
            Self::Validated => validate_identifier(name).map(|_| ()),
        }
    }

    pub(crate) fn check_all<'a>(
        self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), StoreError> {
        if self == Self::Trusted {
            return Ok(());
        }
        names.into_iter().try_for_each(|name| self.check(name))
    }
}

/// Checks that `name` is a plain SQL identifier, optionally qualified once
/// (`schema.table`).
///
/// Each part must start with an ASCII letter or underscore and continue with
/// ASCII letters, digits, underscores or `$`. Quoting, whitespace and any
/// other punctuation are rejected.
///
/// # Errors
///
/// Returns `StoreError::InvalidIdentifier` if the name does not match.
pub fn validate_identifier(name: &str) -> Result<&str, StoreError> {
    let mut parts = name.split('.');
    let valid = match (parts.next(), parts.next(), parts.next()) {
        (Some(single), None, _) => is_plain(single),
        (Some(schema), Some(object), None) => is_plain(schema) && is_plain(object),
        _ => false,
    };

    if valid {
        Ok(name)
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}

fn is_plain(part: &str) -> bool {
    let mut chars = part.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
