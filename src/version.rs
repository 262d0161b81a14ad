//! # Ebuild Version Recognition
//!
//! This module recognizes ebuild version strings and splits installed
//! package identifiers (`category/name-version`) into their parts. It is the
//! piece every other tool leans on: vdb directory names, emerge log entries
//! and queued rebuild atoms all pass through [`split_package_identifier`].
//!
//! ## Grammar
//!
//! ```text
//! version := digits ('.' digits)* letter? ('_' suffix)* ('-r' digits?)?
//! suffix  := ('alpha' | 'beta' | 'pre' | 'rc' | 'p') digits?
//! ```
//!
//! [`is_version`] walks the input once with a byte cursor. A bare `-r` with
//! no revision number is accepted, and suffix numbers are not range checked.
//!
//! ## Splitting
//!
//! Package names may themselves contain hyphens (`gentoo-sources`), so the
//! split point is found by trying every hyphen left to right and keeping the
//! first one whose suffix is a valid version. An identifier with no such
//! hyphen is not an error: it comes back with `name` and `version` unset so
//! the caller can skip it.

use std::str::FromStr;

use serde::Serialize;

use crate::error::{Error, Result};

/// Suffix keywords allowed after `_`.
const SUFFIX_KEYWORDS: [&str; 5] = ["alpha", "beta", "pre", "rc", "p"];

/// A package identifier decomposed into category, name and version.
///
/// `name` and `version` are either both set or both unset. They are unset
/// when no hyphen in the identifier is followed by a valid version string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ParsedPackage {
    /// Category, e.g. `sys-kernel`.
    pub category: String,
    /// Package name, e.g. `gentoo-sources`.
    pub name: Option<String>,
    /// Version including any revision, e.g. `5.15.30-r1`.
    pub version: Option<String>,
}

impl ParsedPackage {
    fn versioned(category: &str, name: &str, version: &str) -> Self {
        Self {
            category: category.to_string(),
            name: Some(name.to_string()),
            version: Some(version.to_string()),
        }
    }

    fn unversioned(category: &str) -> Self {
        Self {
            category: category.to_string(),
            name: None,
            version: None,
        }
    }

    /// Whether a version was recognized.
    pub fn is_versioned(&self) -> bool {
        self.version.is_some()
    }

    /// `category/name`, the key used to group builds of the same package.
    pub fn key(&self) -> Option<String> {
        self.name
            .as_ref()
            .map(|name| format!("{}/{}", self.category, name))
    }

    /// `=category/name-version`, suitable for passing to the package manager.
    pub fn atom(&self) -> Option<String> {
        match (&self.name, &self.version) {
            (Some(name), Some(version)) => {
                Some(format!("={}/{}-{}", self.category, name, version))
            }
            _ => None,
        }
    }
}

impl FromStr for ParsedPackage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        split_package_identifier(s)
    }
}

/// Byte cursor used by [`is_version`].
struct Cursor<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Consume `expected` if it is the next byte.
    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consume bytes while `pred` holds and return them.
    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a [u8] {
        let input = self.input;
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        &input[start..self.pos]
    }

    /// Consume a run of ASCII digits, returning how many were consumed.
    fn digits(&mut self) -> usize {
        self.take_while(|b| b.is_ascii_digit()).len()
    }
}

/// Returns `true` if `s` is a complete, valid ebuild version string.
///
/// # Examples
///
/// ```
/// use portage_admin::version::is_version;
///
/// assert!(is_version("1.2.3a_pre4-r2"));
/// assert!(is_version("1-r"));
/// assert!(!is_version("1.2.3_foo"));
/// assert!(!is_version("1."));
/// ```
pub fn is_version(s: &str) -> bool {
    let mut cursor = Cursor::new(s);

    // Leading number, then any `.number` components.
    if cursor.digits() == 0 {
        return false;
    }
    if cursor.at_end() {
        return true;
    }
    while cursor.eat(b'.') {
        if cursor.digits() == 0 {
            return false;
        }
        if cursor.at_end() {
            return true;
        }
    }

    // Optional single letter.
    if cursor.take_while(|b| b.is_ascii_lowercase()).len() > 1 {
        return false;
    }
    if cursor.at_end() {
        return true;
    }

    // `_keyword[digits]` groups.
    while cursor.eat(b'_') {
        let keyword = cursor.take_while(|b| b.is_ascii_lowercase());
        if !SUFFIX_KEYWORDS.iter().any(|k| k.as_bytes() == keyword) {
            return false;
        }
        cursor.digits();
        if cursor.at_end() {
            return true;
        }
    }

    // `-r[digits]` revision.
    if !cursor.eat(b'-') || cursor.at_end() {
        return false;
    }
    if !cursor.eat(b'r') {
        return false;
    }
    cursor.digits();
    cursor.at_end()
}

/// Splits `category/name-version` into its components.
///
/// The leftmost hyphen whose suffix satisfies [`is_version`] separates the
/// name from the version. When no hyphen qualifies the result carries only
/// the category.
///
/// # Errors
///
/// Returns [`Error::InvalidIdentifier`] if `id` does not contain exactly one
/// `/`.
///
/// # Examples
///
/// ```
/// use portage_admin::version::split_package_identifier;
///
/// let pkg = split_package_identifier("sys-kernel/gentoo-sources-5.15.30").unwrap();
/// assert_eq!(pkg.category, "sys-kernel");
/// assert_eq!(pkg.name.as_deref(), Some("gentoo-sources"));
/// assert_eq!(pkg.version.as_deref(), Some("5.15.30"));
///
/// let pkg = split_package_identifier("app-misc/foo").unwrap();
/// assert!(pkg.version.is_none());
/// ```
pub fn split_package_identifier(id: &str) -> Result<ParsedPackage> {
    let (category, rest) = match id.split_once('/') {
        Some((category, rest)) if !rest.contains('/') => (category, rest),
        _ => {
            return Err(Error::InvalidIdentifier { id: id.to_string() });
        }
    };

    let split = rest
        .match_indices('-')
        .map(|(index, _)| index)
        .find(|&index| is_version(&rest[index + 1..]));

    Ok(match split {
        Some(index) => ParsedPackage::versioned(category, &rest[..index], &rest[index + 1..]),
        None => ParsedPackage::unversioned(category),
    })
}
