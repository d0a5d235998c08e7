//! Result type alias for Custodia
//!
//! This module provides a convenient Result type alias that uses
//! `CustodiaError` as the error type.

use super::errors::CustodiaError;

/// Result type alias for Custodia operations
///
/// # Examples
///
/// ```
/// use custodia::domain::result::Result;
/// use custodia::domain::errors::CustodiaError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(CustodiaError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, CustodiaError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::CustodiaError;

    #[test]
    fn test_result_ok() {
        let result: Result<i32> = Ok(42);
        assert!(result.is_ok());
    }

    #[test]
    fn test_result_err() {
        let result: Result<i32> = Err(CustodiaError::Validation("test error".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> Result<i32> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }
}
