use thiserror::Error;

pub const MAX_CABINET_NAME_LEN: usize = 50;

const FORBIDDEN_CHARS: &[char] = &['/', '\\', '.', '<', '>', '$', '"', '&'];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CabinetNameError {
    #[error("Cabinet name cannot be empty")]
    Empty,
    #[error("Cabinet name must be {MAX_CABINET_NAME_LEN} characters or less")]
    TooLong,
    #[error("Cabinet name contains invalid characters")]
    InvalidCharacters,
}

/// Checks a cabinet name and returns it trimmed.
pub fn validate_cabinet_name(name: &str) -> Result<String, CabinetNameError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CabinetNameError::Empty);
    }

    if trimmed.chars().count() > MAX_CABINET_NAME_LEN {
        return Err(CabinetNameError::TooLong);
    }

    if trimmed.chars().any(is_forbidden) {
        return Err(CabinetNameError::InvalidCharacters);
    }

    Ok(trimmed.to_string())
}

fn is_forbidden(c: char) -> bool {
    FORBIDDEN_CHARS.contains(&c) || matches!(c, '\u{00}'..='\u{1F}' | '\u{7F}'..='\u{9F}')
}
