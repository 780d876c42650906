//! Entry file name format using nom
//!
//! Every cached value lives in its own file:
//! ```text
//! (<recency tag>) <logical name>
//! ```
//!
//! The recency tag is a decimal `u64` (unix millis, bumped to stay strictly
//! increasing). The logical name is whatever the key-to-name strategy produced.

use std::path::{Path, PathBuf};

use nom::{
    bytes::complete::tag,
    character::complete::{char, digit1},
    combinator::{all_consuming, map_res, rest, verify},
    sequence::{delimited, pair},
    IResult,
};

use crate::error::{Error, Result};

/// A parsed cache entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Recency tag, larger is newer
    pub tag: u64,
    /// Logical name with the tag prefix stripped
    pub name: String,
    /// Full path of the entry file
    pub path: PathBuf,
}

impl Entry {
    /// Parse the entry stored at `path`
    pub fn from_path(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::MalformedEntry(path.display().to_string()))?;

        let (recency, name) = parse_entry_name(file_name)?;

        Ok(Entry {
            tag: recency,
            name: name.to_string(),
            path: path.to_path_buf(),
        })
    }
}

/// Build the physical file name for a logical name
pub fn format_entry_name(tag: u64, name: &str) -> String {
    format!("({}) {}", tag, name)
}

/// Split a physical file name into `(tag, logical name)`
pub fn parse_entry_name(input: &str) -> Result<(u64, &str)> {
    let (_, parsed) = all_consuming(entry_name)(input)?;
    Ok(parsed)
}

fn entry_name(input: &str) -> IResult<&str, (u64, &str)> {
    pair(
        delimited(char('('), map_res(digit1, |digits: &str| digits.parse::<u64>()), tag(") ")),
        verify(rest, |name: &str| !name.is_empty()),
    )(input)
}

/// Check that a logical name can be used as a single file name component
pub fn validate_logical_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::configuration("logical name is empty"));
    }
    if name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Err(Error::configuration(format!(
            "logical name {:?} is not a valid file name",
            name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_entry_name() {
        assert_eq!(format_entry_name(1700000000123, "users"), "(1700000000123) users");
    }

    #[test]
    fn test_parse_entry_name() {
        let (tag, name) = parse_entry_name("(1700000000123) test_file.txt").unwrap();
        assert_eq!(tag, 1700000000123);
        assert_eq!(name, "test_file.txt");
    }

    #[test]
    fn test_parse_keeps_inner_parens_and_spaces() {
        let (tag, name) = parse_entry_name("(42) (7) a b").unwrap();
        assert_eq!(tag, 42);
        assert_eq!(name, "(7) a b");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for input in ["", "users", "() users", "(12)users", "(12) ", "(abc) users", "(-1) users"] {
            let result = parse_entry_name(input);
            assert!(
                matches!(result, Err(Error::MalformedEntry(_))),
                "{:?} should be malformed",
                input
            );
        }
    }

    #[test]
    fn test_parse_rejects_tag_overflow() {
        let result = parse_entry_name("(99999999999999999999999) users");
        assert!(result.is_err());
    }

    #[test]
    fn test_entry_from_path() {
        let path = Path::new("/tmp/simple_storage/bucket/(5) A");
        let entry = Entry::from_path(path).unwrap();

        assert_eq!(entry.tag, 5);
        assert_eq!(entry.name, "A");
        assert_eq!(entry.path, path);
    }

    #[test]
    fn test_validate_logical_name() {
        assert!(validate_logical_name("test_file").is_ok());
        assert!(validate_logical_name("AF53B123C223F136").is_ok());

        for bad in ["", ".", "..", "a/b", "a\\b", "a\0b"] {
            assert!(
                matches!(validate_logical_name(bad), Err(Error::Configuration(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }
}
