//! Validation helpers for DTOs.

use validator::ValidationError;

/// Rejects strings that are empty once surrounding whitespace is removed.
///
/// # Examples
///
/// ```ignore
/// validate_not_blank("Capitals") // Ok
/// validate_not_blank("   ")      // Err
/// ```
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("value must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Score actions move a player by exactly one point in either direction.
pub fn validate_score_delta(delta: &i64) -> Result<(), ValidationError> {
    if *delta != 1 && *delta != -1 {
        let mut err = ValidationError::new("score_delta");
        err.message = Some(format!("score delta must be +1 or -1 (got {delta})").into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_are_rejected() {
        assert!(validate_not_blank("Capitals").is_ok());
        assert!(validate_not_blank(" a ").is_ok());
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank(" \t\n").is_err());
    }

    #[test]
    fn score_delta_is_plus_or_minus_one() {
        assert!(validate_score_delta(&1).is_ok());
        assert!(validate_score_delta(&-1).is_ok());
        assert!(validate_score_delta(&0).is_err());
        assert!(validate_score_delta(&5).is_err());
    }
}
