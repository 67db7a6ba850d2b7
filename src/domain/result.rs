//! Result type alias for the migration library

use super::errors::MigrationError;

/// Result type alias for migration operations
///
/// # Examples
///
/// ```
/// use papers3_zotero::domain::result::Result;
/// use papers3_zotero::domain::errors::MigrationError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(MigrationError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, MigrationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> Result<i32> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }

    #[test]
    fn test_result_err() {
        let result: Result<i32> = Err(MigrationError::Validation("test error".to_string()));
        assert!(result.is_err());
    }
}
