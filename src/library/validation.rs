//! Name validation for folders and files.
//!
//! Both validators trim surrounding whitespace and return the normalized
//! name on success. Nothing here touches the store.

use thiserror::Error;

use super::{MAX_FILENAME_LENGTH, MAX_FOLDER_NAME_LENGTH};

/// Characters that are never allowed in a folder or file name.
const RESERVED_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*'];

/// Reasons a folder or file name is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    /// Name is empty after trimming.
    #[error("name must not be empty")]
    Empty,

    /// Name exceeds the length cap.
    #[error("name must be at most {max} characters")]
    TooLong {
        /// The cap that was exceeded.
        max: usize,
    },

    /// Name is `.` or `..`.
    #[error("name must not be '.' or '..'")]
    DotName,

    /// Name contains `..`.
    #[error("name must not contain '..'")]
    Traversal,

    /// Name contains `/` or `\`.
    #[error("name must not contain path separators")]
    PathSeparator,

    /// Name contains one of `< > : " | ? *`.
    #[error("name must not contain '{0}'")]
    ReservedChar(char),

    /// Name contains an ASCII control character.
    #[error("name must not contain control characters")]
    ControlChar,
}

/// Validate and normalize a folder name.
///
/// # Examples
///
/// ```
/// use folio::library::validate_folder_name;
///
/// assert_eq!(validate_folder_name("  Drawings ").unwrap(), "Drawings");
/// assert!(validate_folder_name("..").is_err());
/// assert!(validate_folder_name("a/b").is_err());
/// ```
pub fn validate_folder_name(raw: &str) -> Result<String, NameError> {
    validate_name(raw, MAX_FOLDER_NAME_LENGTH)
}

/// Validate and normalize a file display name.
///
/// Same rules as folder names with a longer cap.
pub fn validate_filename(raw: &str) -> Result<String, NameError> {
    validate_name(raw, MAX_FILENAME_LENGTH)
}

fn validate_name(raw: &str, max: usize) -> Result<String, NameError> {
    let name = raw.trim();

    if name.is_empty() {
        return Err(NameError::Empty);
    }
    if name.chars().count() > max {
        return Err(NameError::TooLong { max });
    }
    if name == "." || name == ".." {
        return Err(NameError::DotName);
    }
    if name.contains("..") {
        return Err(NameError::Traversal);
    }
    if name.contains(['/', '\\']) {
        return Err(NameError::PathSeparator);
    }
    if let Some(c) = name.chars().find(|c| RESERVED_CHARS.contains(c)) {
        return Err(NameError::ReservedChar(c));
    }
    if name.chars().any(|c| (c as u32) < 0x20) {
        return Err(NameError::ControlChar);
    }

    Ok(name.to_string())
}
