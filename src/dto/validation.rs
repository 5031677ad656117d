//! Validation helpers for DTOs.

use indexmap::IndexMap;
use validator::ValidationError;

use crate::dao::{
    codes::{MAX_MEMBER_ID_LENGTH, is_valid_member_id, is_valid_session_code},
    models::{MAX_NOTE_CHARS, is_known_subject},
};

/// Longest nickname accepted on join, in characters after trimming.
pub const MAX_NICKNAME_CHARS: usize = 20;

/// Validates that a nickname is 1 to [`MAX_NICKNAME_CHARS`] characters once trimmed.
pub fn validate_nickname(nickname: &str) -> Result<(), ValidationError> {
    let length = nickname.trim().chars().count();
    if length == 0 {
        let mut err = ValidationError::new("nickname_empty");
        err.message = Some("Nickname must not be blank".into());
        return Err(err);
    }
    if length > MAX_NICKNAME_CHARS {
        let mut err = ValidationError::new("nickname_length");
        err.message = Some(
            format!("Nickname must be at most {MAX_NICKNAME_CHARS} characters (got {length})")
                .into(),
        );
        return Err(err);
    }
    Ok(())
}

/// Validates a client-supplied member id.
///
/// ```ignore
/// validate_member_id("k3j9x0abc") // Ok
/// validate_member_id("a/b")       // Err - not a single path segment
/// ```
pub fn validate_member_id(id: &str) -> Result<(), ValidationError> {
    if is_valid_member_id(id) {
        return Ok(());
    }
    let mut err = ValidationError::new("member_id_format");
    err.message = Some(
        format!(
            "Member ID must be 1 to {MAX_MEMBER_ID_LENGTH} characters of letters, digits, '-' or '_'"
        )
        .into(),
    );
    Err(err)
}

/// Validates an already normalised session code.
pub fn validate_session_code(code: &str) -> Result<(), ValidationError> {
    if is_valid_session_code(code) {
        return Ok(());
    }
    let mut err = ValidationError::new("session_code_format");
    err.message = Some("Session code must be 6 letters or digits".into());
    Err(err)
}

/// Validates that every subject is known and every note fits [`MAX_NOTE_CHARS`].
pub fn validate_notes(notes: &IndexMap<String, String>) -> Result<(), ValidationError> {
    for (subject, note) in notes {
        validate_subject(subject)?;
        let length = note.chars().count();
        if length > MAX_NOTE_CHARS {
            let mut err = ValidationError::new("note_length");
            err.message = Some(
                format!(
                    "Note for `{subject}` must be at most {MAX_NOTE_CHARS} characters (got {length})"
                )
                .into(),
            );
            return Err(err);
        }
    }
    Ok(())
}

/// Validates that `subject` is one of the tracked subjects.
pub fn validate_subject(subject: &str) -> Result<(), ValidationError> {
    if is_known_subject(subject) {
        return Ok(());
    }
    let mut err = ValidationError::new("unknown_subject");
    err.message = Some(format!("Unknown subject `{subject}`").into());
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_nickname() {
        assert!(validate_nickname("Rafi").is_ok());
        assert!(validate_nickname("  Rafi  ").is_ok());
        assert!(validate_nickname(&"é".repeat(20)).is_ok());
        assert!(validate_nickname("").is_err());
        assert!(validate_nickname("   ").is_err());
        assert!(validate_nickname(&"a".repeat(21)).is_err());
    }

    #[test]
    fn test_validate_member_id() {
        assert!(validate_member_id("k3j9x0abc").is_ok());
        assert!(validate_member_id("a.b").is_err());
        assert!(validate_member_id("").is_err());
    }

    #[test]
    fn test_validate_session_code() {
        assert!(validate_session_code("A8X2K4").is_ok());
        assert!(validate_session_code("a8x2k4").is_err());
        assert!(validate_session_code("A8X2").is_err());
    }

    #[test]
    fn test_validate_notes() {
        let mut notes = IndexMap::new();
        notes.insert("math".to_string(), "algebra".to_string());
        assert!(validate_notes(&notes).is_ok());

        notes.insert("science".to_string(), "x".repeat(201));
        let err = validate_notes(&notes).unwrap_err();
        assert_eq!(err.code, "note_length");

        let mut unknown = IndexMap::new();
        unknown.insert("art".to_string(), String::new());
        assert_eq!(validate_notes(&unknown).unwrap_err().code, "unknown_subject");
    }
}
