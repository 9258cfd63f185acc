//! Session id generation and user input normalization.
//!
//! # Responsibility
//! - Generate short, pronounceable session ids (two proquint words).
//! - Normalize ids and roster input typed by people.
//!
//! # Invariants
//! - Generated ids always match `is_valid_session_id`.
//! - Parsed rosters keep input order and never contain blank names.

use crate::model::session::SessionId;
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

const PROQUINT_CONSONANTS: &[u8; 16] = b"bdfghjklmnprstvz";
const PROQUINT_VOWELS: &[u8; 4] = b"aiou";

static SESSION_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([bdfghjklmnprstvz][aiou]){2}[bdfghjklmnprstvz]-([bdfghjklmnprstvz][aiou]){2}[bdfghjklmnprstvz]$")
        .expect("valid session id regex")
});
static NAME_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*,\s*").expect("valid name separator regex"));

/// Generates a fresh session id such as `lusab-babad`.
///
/// Uses 32 random bits taken from a v4 UUID.
pub fn generate_session_id() -> SessionId {
    let bytes = Uuid::new_v4().into_bytes();
    let first = u16::from_be_bytes([bytes[0], bytes[1]]);
    let second = u16::from_be_bytes([bytes[2], bytes[3]]);
    format!("{}-{}", proquint_word(first), proquint_word(second))
}

/// Encodes 16 bits as one consonant-vowel-consonant-vowel-consonant word.
pub fn proquint_word(value: u16) -> String {
    let consonant = |shift: u16| PROQUINT_CONSONANTS[usize::from((value >> shift) & 0x0f)] as char;
    let vowel = |shift: u16| PROQUINT_VOWELS[usize::from((value >> shift) & 0x03)] as char;

    [consonant(12), vowel(10), consonant(6), vowel(4), consonant(0)]
        .into_iter()
        .collect()
}

/// Trims and lowercases an id typed by a person.
pub fn normalize_session_id(input: &str) -> SessionId {
    input.trim().to_ascii_lowercase()
}

/// Returns whether `value` has the generated proquint id shape.
pub fn is_valid_session_id(value: &str) -> bool {
    SESSION_ID_RE.is_match(value)
}

/// Splits comma-separated roster input into trimmed, non-empty names.
pub fn parse_participant_names(input: &str) -> Vec<String> {
    NAME_SEPARATOR_RE
        .split(input.trim())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
