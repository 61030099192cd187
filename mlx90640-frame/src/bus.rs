// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
//! Raw I²C transport.
//!
//! Reading from the camera requires writing the register address *without* a stop condition, then
//! reading the data back after a repeated start. [`BusTransport`] exposes that stop control
//! directly, and [`HalBus`] provides it on top of the blocking [`embedded-hal`][embedded-hal] I²C
//! traits.
//!
//! [embedded-hal]: https://docs.rs/embedded-hal/0.2/embedded_hal/blocking/i2c/index.html
#[cfg(feature = "std")]
extern crate std;

use core::fmt;

use arrayvec::ArrayVec;
use embedded_hal::blocking::i2c;

/// The raw bus operations needed to talk to the camera.
pub trait BusTransport {
    type Error;

    /// Write `bytes` to the device at `address`, ending the transaction with a stop condition if
    /// `send_stop` is set.
    fn write(&mut self, address: u8, bytes: &[u8], send_stop: bool) -> Result<(), Self::Error>;

    /// Fill `buffer` from the device at `address`, ending the transaction with a stop condition if
    /// `send_stop` is set.
    fn read(&mut self, address: u8, buffer: &mut [u8], send_stop: bool) -> Result<(), Self::Error>;
}

/// The most bytes [`HalBus`] will hold waiting for the rest of a transaction.
///
/// The camera only ever needs a 16-bit register address written before a repeated start, this
/// leaves some slack.
const PENDING_CAPACITY: usize = 4;

/// Errors from [`HalBus`].
#[derive(Clone, PartialEq)]
pub enum HalBusError<E> {
    /// Errors originating from the I²C implementation.
    I2c(E),

    /// The requested sequence of operations can't be expressed with the `embedded-hal` traits.
    Sequence(&'static str),
}

impl<E: fmt::Debug> fmt::Debug for HalBusError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HalBusError::I2c(err) => f.debug_tuple("HalBusError::I2c").field(err).finish(),
            HalBusError::Sequence(msg) => {
                f.debug_tuple("HalBusError::Sequence").field(msg).finish()
            }
        }
    }
}

impl<E: fmt::Debug> fmt::Display for HalBusError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HalBusError::I2c(err) => write!(f, "I2C Error: {:?}", err),
            HalBusError::Sequence(msg) => write!(f, "Unsupported bus sequence: {}", msg),
        }
    }
}

#[cfg(feature = "std")]
impl<E> std::error::Error for HalBusError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HalBusError::I2c(err) => Some(err),
            HalBusError::Sequence(_) => None,
        }
    }
}

/// A [`BusTransport`] on top of an `embedded-hal` blocking I²C bus.
///
/// A write without a stop condition is held until the next read to the same device, and then both
/// are issued together as a single [`write_read`][i2c::WriteRead::write_read]. Writes with a stop
/// condition and reads with nothing pending map directly onto [`write`][i2c::Write::write] and
/// [`read`][i2c::Read::read].
#[derive(Clone, Debug)]
pub struct HalBus<I2C> {
    i2c: I2C,
    pending_address: u8,
    pending: ArrayVec<u8, PENDING_CAPACITY>,
}

impl<I2C> HalBus<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            pending_address: 0,
            pending: ArrayVec::new(),
        }
    }

    /// Give back the underlying bus, dropping any held write.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C, E> BusTransport for HalBus<I2C>
where
    I2C: i2c::Write<Error = E> + i2c::WriteRead<Error = E> + i2c::Read<Error = E>,
{
    type Error = HalBusError<E>;

    fn write(&mut self, address: u8, bytes: &[u8], send_stop: bool) -> Result<(), Self::Error> {
        if !self.pending.is_empty() {
            self.pending.clear();
            return Err(HalBusError::Sequence(
                "A write without a stop condition must be followed by a read",
            ));
        }
        if send_stop {
            self.i2c.write(address, bytes).map_err(HalBusError::I2c)
        } else {
            self.pending
                .try_extend_from_slice(bytes)
                .map_err(|_| HalBusError::Sequence("Too many bytes written before a read"))?;
            self.pending_address = address;
            Ok(())
        }
    }

    fn read(&mut self, address: u8, buffer: &mut [u8], send_stop: bool) -> Result<(), Self::Error> {
        if !send_stop {
            self.pending.clear();
            return Err(HalBusError::Sequence("Reads must end with a stop condition"));
        }
        if self.pending.is_empty() {
            return self.i2c.read(address, buffer).map_err(HalBusError::I2c);
        }
        if self.pending_address != address {
            self.pending.clear();
            return Err(HalBusError::Sequence("A repeated start must address the same device"));
        }
        let result = self.i2c.write_read(address, &self.pending, buffer);
        self.pending.clear();
        result.map_err(HalBusError::I2c)
    }
}
