//! Splitting an input line into an argument vector.
//!
//! There is no quoting or escaping: a token is any maximal run of
//! non-delimiter bytes. Lines are split as bytes, so tokens reach `execvp`
//! exactly as they were typed, whatever their encoding.

use crate::error::ShellError;
use std::ffi::OsStr;
use std::fmt;
use std::ops::Index;
use std::os::unix::ffi::OsStrExt;

/// Bytes that separate tokens: space, tab, carriage return, newline, bell.
pub const DELIMITERS: [u8; 5] = [b' ', b'\t', b'\r', b'\n', 0x07];

/// Initial size of the token table, and the amount it grows by when full.
pub const TOKEN_CHUNK: usize = 64;

/// Ordered, whitespace-delimited tokens of one input line.
///
/// Tokens borrow from the line they were split from, so the vector cannot
/// outlive it. Every token is non-empty. The first token is the command name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Argv<'a> {
    tokens: Vec<&'a OsStr>,
}

impl<'a> Argv<'a> {
    /// Number of tokens, command name included.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The command name, if the line was not blank.
    pub fn command(&self) -> Option<&'a OsStr> {
        self.tokens.first().copied()
    }

    /// Tokens after the command name.
    pub fn args(&self) -> &[&'a OsStr] {
        self.tokens.get(1..).unwrap_or(&[])
    }

    pub fn as_slice(&self) -> &[&'a OsStr] {
        &self.tokens
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a OsStr> + '_ {
        self.tokens.iter().copied()
    }

    /// Capacity of the token table; grows in steps of [`TOKEN_CHUNK`].
    pub fn capacity(&self) -> usize {
        self.tokens.capacity()
    }
}

impl<'a> Index<usize> for Argv<'a> {
    type Output = &'a OsStr;

    fn index(&self, index: usize) -> &Self::Output {
        &self.tokens[index]
    }
}

/// Tokens joined by single spaces; bytes that are not UTF-8 are shown as U+FFFD.
impl fmt::Display for Argv<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", token.to_string_lossy())?;
        }
        Ok(())
    }
}

fn is_delimiter(byte: &u8) -> bool {
    DELIMITERS.contains(byte)
}

/// Split `line` into tokens.
///
/// Runs of delimiters collapse, so no empty tokens are produced; a blank
/// line yields an empty [`Argv`]. The token table starts at
/// [`TOKEN_CHUNK`] slots and grows by the same fixed amount. Failing to
/// grow it is reported as [`ShellError::Allocation`].
pub fn split_line(line: &[u8]) -> Result<Argv<'_>, ShellError> {
    let mut tokens: Vec<&OsStr> = Vec::new();
    tokens.try_reserve_exact(TOKEN_CHUNK)?;

    for token in line.split(is_delimiter).filter(|t| !t.is_empty()) {
        if tokens.len() == tokens.capacity() {
            tokens.try_reserve_exact(TOKEN_CHUNK)?;
        }
        tokens.push(OsStr::from_bytes(token));
    }

    Ok(Argv { tokens })
}
