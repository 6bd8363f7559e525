use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingRequiredField(&'static str),
}

/// A required text field must contain something other than whitespace
pub fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingRequiredField(field));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("\n\t")]
    fn blank_text_is_missing(#[case] value: &str) {
        assert_eq!(
            require_text("name", value),
            Err(ValidationError::MissingRequiredField("name"))
        );
    }

    #[test]
    fn present_text_passes() {
        assert_eq!(require_text("name", "Acme"), Ok(()));
    }
}
