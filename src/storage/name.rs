//! Key name validation.

use crate::error::NameError;

/// Separator that may not appear in a key name.
pub const NAME_SEPARATOR: char = '/';

/// Check that `name` is usable as a key identifier.
///
/// Rules are checked in order and the first failure wins: the name must be
/// non-empty, must not contain `/`, and must not begin with `.`.
///
/// # Example
///
/// ```
/// use keyvault::error::NameError;
/// use keyvault::storage::name::validate_name;
///
/// assert!(validate_name("node-1").is_ok());
/// assert_eq!(validate_name(".cfg"), Err(NameError::BeginsWithPeriod));
/// ```
pub fn validate_name(name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::Empty);
    }
    if name.contains(NAME_SEPARATOR) {
        return Err(NameError::ContainsSeparator);
    }
    if name.starts_with('.') {
        return Err(NameError::BeginsWithPeriod);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        for name in ["k", "node-1", "b6ec4a647a7738ef", "a.b", "trailing.", "with space"] {
            assert!(validate_name(name).is_ok(), "{} should be valid", name);
        }
    }

    #[test]
    fn test_empty_name() {
        assert_eq!(validate_name(""), Err(NameError::Empty));
    }

    #[test]
    fn test_separator() {
        assert_eq!(validate_name("a/b"), Err(NameError::ContainsSeparator));
        assert_eq!(validate_name("/"), Err(NameError::ContainsSeparator));
        assert_eq!(validate_name("trailing/"), Err(NameError::ContainsSeparator));
    }

    #[test]
    fn test_leading_period() {
        assert_eq!(validate_name(".cfg"), Err(NameError::BeginsWithPeriod));
        assert_eq!(validate_name("."), Err(NameError::BeginsWithPeriod));
        assert_eq!(validate_name(".."), Err(NameError::BeginsWithPeriod));
    }

    #[test]
    fn test_first_failure_wins() {
        // Both a separator and a leading period: separator is checked first
        assert_eq!(validate_name("./x"), Err(NameError::ContainsSeparator));
    }
}
