//! Single-occurrence patch (spec.md §4.7): every successful patch has an
//! unambiguous target, or it fails without touching the content.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchError {
    #[error("old_string not found")]
    NotFound,
    #[error("{0} matches for old_string, expected 1")]
    Ambiguous(usize),
}

/// Replaces the single occurrence of `old` in `content` with `new`.
pub fn single_occurrence_patch(content: &str, old: &str, new: &str) -> Result<String, PatchError> {
    let count = content.matches(old).count();
    match count {
        0 => Err(PatchError::NotFound),
        1 => Ok(content.replacen(old, new, 1)),
        n => Err(PatchError::Ambiguous(n)),
    }
}
