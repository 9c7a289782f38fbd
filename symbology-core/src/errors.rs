// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `errors` module defines the common error type.

use std::error;
use std::fmt;
use std::result;

/// `Error` provides an enumeration of all possible errors reported by Symbology.
///
/// Every error is recoverable only at the call boundary: a decoder aborts the current symbol, an
/// encoder rejects the current request. No error crosses the core as control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The bit stream or module matrix violates the symbology's grammar: an unknown mode, an
    /// impossible character count, a truncated segment, an invalid application identifier, and so
    /// on.
    FormatError(&'static str),
    /// Error correction could not recover valid codewords for at least one block.
    ChecksumError(&'static str),
    /// The symbol uses a feature that is valid per the governing standard but not implemented.
    Unsupported(&'static str),
    /// The caller asked for an impossible configuration.
    InvalidArgument(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::FormatError(msg) => {
                write!(f, "malformed symbol: {}", msg)
            }
            Error::ChecksumError(msg) => {
                write!(f, "checksum failure: {}", msg)
            }
            Error::Unsupported(feature) => {
                write!(f, "unsupported feature: {}", feature)
            }
            Error::InvalidArgument(msg) => {
                write!(f, "invalid argument: {}", msg)
            }
        }
    }
}

impl error::Error for Error {}

pub type Result<T> = result::Result<T, Error>;

/// Convenience function to create a format error.
pub fn format_error<T>(desc: &'static str) -> Result<T> {
    Err(Error::FormatError(desc))
}

/// Convenience function to create a checksum error.
pub fn checksum_error<T>(desc: &'static str) -> Result<T> {
    Err(Error::ChecksumError(desc))
}

/// Convenience function to create an unsupported feature error.
pub fn unsupported_error<T>(feature: &'static str) -> Result<T> {
    Err(Error::Unsupported(feature))
}

/// Convenience function to create an invalid argument error.
pub fn invalid_argument_error<T>(desc: &'static str) -> Result<T> {
    Err(Error::InvalidArgument(desc))
}
