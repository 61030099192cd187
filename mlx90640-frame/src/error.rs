// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
#[cfg(feature = "std")]
extern crate std;

use core::fmt;

/// Errors that don't involve the bus.
#[derive(Clone, Debug, PartialEq)]
pub enum LibraryError {
    /// When a value from the camera is malformed in some way.
    InvalidData(&'static str),

    Other(&'static str),
}

impl fmt::Display for LibraryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LibraryError::InvalidData(msg) => write!(f, "{}", msg),
            LibraryError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LibraryError {}

/// Errors from accessing the camera, generic over the error type of the bus.
#[derive(Clone, PartialEq)]
pub enum Error<E> {
    /// A write on the bus failed. This includes writing the register address before a read.
    BusWrite(E),

    /// Reading data back from the bus failed.
    BusRead(E),

    /// Errors originating from within this library (or the frame processor).
    Library(LibraryError),
}

impl<E> Error<E> {
    /// Collapse this error to the status code used by C-style callers.
    ///
    /// Success is 0, every failure is 1.
    pub fn code(&self) -> i32 {
        1
    }
}

// Custom Debug implementation so the wrapped bus error is all that needs to implement Debug.
impl<E: fmt::Debug> fmt::Debug for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BusWrite(bus_error) => {
                f.debug_tuple("Error::BusWrite").field(bus_error).finish()
            }
            Error::BusRead(bus_error) => f.debug_tuple("Error::BusRead").field(bus_error).finish(),
            Error::Library(err) => f.debug_tuple("Error::Library").field(err).finish(),
        }
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BusWrite(bus_error) => write!(f, "I2C write error: {:?}", bus_error),
            Error::BusRead(bus_error) => write!(f, "I2C read error: {:?}", bus_error),
            Error::Library(err) => write!(f, "Library error: {}", err),
        }
    }
}

#[cfg(feature = "std")]
impl<E> std::error::Error for Error<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::BusWrite(bus_error) | Error::BusRead(bus_error) => Some(bus_error),
            Error::Library(lib_err) => Some(lib_err),
        }
    }
}

impl<E> From<LibraryError> for Error<E> {
    fn from(lib_err: LibraryError) -> Self {
        Self::Library(lib_err)
    }
}

/// Collapse a result to the status code used by C-style callers, 0 for success.
pub fn status_code<T, E>(result: &Result<T, Error<E>>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(err) => err.code(),
    }
}
