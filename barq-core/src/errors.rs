// Barq
// Copyright (c) 2024 The Barq Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `errors` module defines the closed error taxonomy shared by every detector and decoder in
//! the barq crate family.

use std::error::Error as StdError;
use std::fmt;

/// The kind of failure that occurred while locating or decoding a symbol.
///
/// This is a closed set by design: a detector or decoder never panics on malformed or adversarial
/// input, it converts the failure into one of these four kinds instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No error occurred.
    None,
    /// The bitstream or pattern sequence did not decode to a valid message.
    Format,
    /// Reed-Solomon error correction failed, or a check digit did not match.
    Checksum,
    /// A recognized feature is not implemented.
    Unsupported,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::None => "no error",
            ErrorKind::Format => "format error",
            ErrorKind::Checksum => "checksum error",
            ErrorKind::Unsupported => "unsupported",
        };
        write!(f, "{}", s)
    }
}

/// `Error` is the error type returned internally by detectors and decoders.
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    message: &'static str,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &'static str {
        self.message
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl StdError for Error {}

pub type Result<T> = std::result::Result<T, Error>;

/// Convenience function to create a format error.
pub fn format_error<T>(desc: &'static str) -> Result<T> {
    Err(Error { kind: ErrorKind::Format, message: desc })
}

/// Convenience function to create a checksum error.
pub fn checksum_error<T>(desc: &'static str) -> Result<T> {
    Err(Error { kind: ErrorKind::Checksum, message: desc })
}

/// Convenience function to create an unsupported-feature error.
pub fn unsupported_error<T>(desc: &'static str) -> Result<T> {
    Err(Error { kind: ErrorKind::Unsupported, message: desc })
}

impl Error {
    /// Construct a `None`-kind placeholder error, used as the default for a valid `Barcode`.
    pub fn none() -> Error {
        Error { kind: ErrorKind::None, message: "" }
    }

    /// Build a bare format error, for call sites that need the `Error` value itself (e.g. to hand
    /// to `Option::ok_or`) rather than an already-wrapped `Result`.
    pub fn format(desc: &'static str) -> Error {
        Error { kind: ErrorKind::Format, message: desc }
    }
}

impl Default for Error {
    fn default() -> Self {
        Error::none()
    }
}
