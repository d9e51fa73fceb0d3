//! Content checks applied to every generated message pack.

use crate::config::Settings;
use crate::message::MessagePack;
use thiserror::Error;

/// Highest code point accepted in generated copy (`~`).
const MAX_ALLOWED_CHAR: char = '\u{7e}';

/// Reason a message pack was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    /// A field is empty or whitespace only.
    #[error("missing value for {field}")]
    MissingField {
        /// Wire name of the field
        field: &'static str,
    },

    /// A body has more words than allowed.
    #[error("{field} exceeds word limit ({words} > {limit})")]
    WordLimit {
        /// Wire name of the body field
        field: &'static str,
        /// Counted words
        words: usize,
        /// Configured ceiling
        limit: usize,
    },

    /// The copy contains an emoji or other non-ASCII character.
    #[error("non-ASCII character {ch:?} detected")]
    NonAscii {
        /// First offending character
        ch: char,
    },

    /// The copy contains a banned term.
    #[error("banned term '{term}' detected")]
    BannedTerm {
        /// The configured term that matched
        term: String,
    },
}

/// Checks a message pack against the content constraints in `settings`.
///
/// Checks run in a fixed order and the first failure is returned:
/// 1. every field is non-empty
/// 2. `body_A` and `body_B` stay within `word_limit`
/// 3. no character above `~` anywhere in the copy
/// 4. no banned term anywhere in the copy (case-insensitive)
///
/// # Errors
///
/// Returns the [`ValidationError`] of the first failing check.
pub fn validate_message_pack(pack: &MessagePack, settings: &Settings) -> Result<(), ValidationError> {
    for (field, value) in pack.fields() {
        if value.trim().is_empty() {
            return Err(ValidationError::MissingField { field });
        }
    }

    for (field, body) in [("body_A", &pack.body_a), ("body_B", &pack.body_b)] {
        let words = word_count(body);
        if words > settings.word_limit {
            return Err(ValidationError::WordLimit {
                field,
                words,
                limit: settings.word_limit,
            });
        }
    }

    let text = pack.full_text();

    if let Some(ch) = text.chars().find(|&c| c > MAX_ALLOWED_CHAR) {
        return Err(ValidationError::NonAscii { ch });
    }

    if let Some(term) = find_banned_term(&text, &settings.buzzwords) {
        return Err(ValidationError::BannedTerm {
            term: term.to_string(),
        });
    }

    Ok(())
}

/// Counts words as maximal runs of alphanumeric characters or underscores.
///
/// Punctuation splits words, so "don't" counts as two.
#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|word| !word.is_empty())
        .count()
}

fn find_banned_term<'a>(text: &str, terms: &'a [String]) -> Option<&'a str> {
    let lower = text.to_lowercase();
    terms
        .iter()
        .filter(|term| !term.trim().is_empty())
        .find(|term| lower.contains(&term.to_lowercase()))
        .map(String::as_str)
}
