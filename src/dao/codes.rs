//! Session codes and member ids.

use rand::{Rng, rng};

/// Length of every session code.
pub const SESSION_CODE_LENGTH: usize = 6;
/// Alphabet used for new codes; `O` and `0` are left out to avoid confusing them.
const SESSION_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNPQRSTUVWXYZ123456789";
/// Length of generated member ids.
const MEMBER_ID_LENGTH: usize = 9;
const MEMBER_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
/// Upper bound for client-supplied member ids.
pub const MAX_MEMBER_ID_LENGTH: usize = 64;

/// Draw a fresh session code. Collisions with existing sessions are not checked.
pub fn generate_session_code() -> String {
    random_string(SESSION_CODE_ALPHABET, SESSION_CODE_LENGTH)
}

/// Draw a fresh member id (lowercase base 36).
pub fn generate_member_id() -> String {
    random_string(MEMBER_ID_ALPHABET, MEMBER_ID_LENGTH)
}

/// Trim and upper-case a code typed by a user.
pub fn normalize_session_code(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// Accepts any six uppercase letters or digits, so codes drawn from the full
/// alphabet (including `O` and `0`) stay joinable.
pub fn is_valid_session_code(code: &str) -> bool {
    code.len() == SESSION_CODE_LENGTH
        && code
            .bytes()
            .all(|byte| byte.is_ascii_uppercase() || byte.is_ascii_digit())
}

/// Member ids double as store keys, so they are limited to `[A-Za-z0-9_-]`.
pub fn is_valid_member_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_MEMBER_ID_LENGTH
        && id
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_')
}

fn random_string(alphabet: &[u8], length: usize) -> String {
    let mut rng = rng();
    (0..length)
        .map(|_| char::from(alphabet[rng.random_range(0..alphabet.len())]))
        .collect()
}
