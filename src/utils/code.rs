// src/utils/code.rs

use crate::{
    config::{MAX_QUIZ_CODE_LEN, MIN_QUIZ_CODE_LEN},
    error::AppError,
};

/// Normalizes a hand-typed quiz code for lookup.
///
/// Trims and uppercases the input, then rejects codes with the wrong length
/// so they never reach the store.
pub fn normalize_quiz_code(raw: &str) -> Result<String, AppError> {
    let code = raw.trim().to_uppercase();

    if code.is_empty() {
        return Err(AppError::BadRequest("Please enter a quiz code".to_string()));
    }

    let len = code.chars().count();
    if !(MIN_QUIZ_CODE_LEN..=MAX_QUIZ_CODE_LEN).contains(&len) {
        return Err(AppError::BadRequest(format!(
            "Quiz code must be between {} and {} characters",
            MIN_QUIZ_CODE_LEN, MAX_QUIZ_CODE_LEN
        )));
    }

    Ok(code)
}
