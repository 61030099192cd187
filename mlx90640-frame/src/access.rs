// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
//! Word-level register access.
//!
//! The camera addresses 16-bit words with 16-bit addresses, and sends both most significant byte
//! first. [`RegisterAccess`] turns those into the two raw bus operations, and converts the words
//! into host order.
use log::{debug, trace};
use paste::paste;
use zerocopy::AsBytes;

use crate::bus::BusTransport;
use crate::common::Address;
use crate::error::Error;
use crate::register::*;
use crate::util::merge_masked;

/// DRY macro for the set_* methods in `RegisterAccess` that modify a control register field.
///
/// Every setter is a full read-modify-write of the register, even when the field already has the
/// requested value.
macro_rules! set_control_field {
    { $field:ident, $typ:ty, $doc:literal } => {
    paste! {
        #[doc = $doc]
        pub fn [< set_ $field >](&mut self, new_value: $typ) -> Result<(), Error<B::Error>> {
            debug!(
                "Setting {} to {:?} on {:#04X}",
                stringify!($field),
                new_value,
                self.address
            );
            self.modify_register(|register: &mut ControlRegister| {
                register.[< set_ $field >](new_value)
            })?;
            Ok(())
        }
    }};
}

/// Register reads and writes for a single camera on a bus.
#[derive(Clone, Debug)]
pub struct RegisterAccess<B> {
    /// The bus this camera is accessible on.
    bus: B,

    /// The I²C address this camera is accessible at.
    address: u8,
}

impl<B> RegisterAccess<B>
where
    B: BusTransport,
{
    /// Create a `RegisterAccess` for the camera at the given I²C address.
    ///
    /// MLX90640s can be configured to use any I²C address (except 0x00), but the default address
    /// is [0x33][crate::common::DEFAULT_ADDRESS].
    pub fn new(bus: B, address: u8) -> Self {
        Self { bus, address }
    }

    /// The I²C address of the camera.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Give back the underlying bus.
    pub fn release(self) -> B {
        self.bus
    }

    /// Read `destination.len()` words, starting at `start`.
    ///
    /// The register address is written without a stop condition, then all of the data is read in
    /// one transfer ending with a stop condition. If writing the address fails, no read is
    /// attempted.
    pub fn read(&mut self, start: Address, destination: &mut [u16]) -> Result<(), Error<B::Error>> {
        trace!(
            "Reading {} words from {:?} on {:#04X}",
            destination.len(),
            start,
            self.address
        );
        self.bus
            .write(self.address, &start.as_bytes(), false)
            .map_err(Error::BusWrite)?;
        self.bus
            .read(self.address, destination.as_bytes_mut(), true)
            .map_err(Error::BusRead)?;
        // The bytes landed in memory in wire order (big endian), swap them into host order.
        for word in destination.iter_mut() {
            *word = u16::from_be(*word);
        }
        Ok(())
    }

    /// Write a single word to `register`.
    ///
    /// The address and the value go out in one four byte write, with a stop condition.
    pub fn write(&mut self, register: Address, value: u16) -> Result<(), Error<B::Error>> {
        trace!(
            "Writing {:#06X} to {:?} on {:#04X}",
            value,
            register,
            self.address
        );
        let address_bytes = register.as_bytes();
        let value_bytes = value.to_be_bytes();
        let combined: [u8; 4] = [
            address_bytes[0],
            address_bytes[1],
            value_bytes[0],
            value_bytes[1],
        ];
        self.bus
            .write(self.address, &combined, true)
            .map_err(Error::BusWrite)
    }

    /// Read a typed register.
    pub fn read_register<R: Register>(&mut self) -> Result<R, Error<B::Error>> {
        let mut raw = [0u16; 1];
        self.read(R::address(), &mut raw)?;
        Ok(R::from(raw[0]))
    }

    /// Write a typed register.
    ///
    /// Bits outside of the register's write mask are not trusted from `register`, the values
    /// from `current` are kept for those bits.
    pub fn write_register<R: Register>(
        &mut self,
        current: u16,
        register: R,
    ) -> Result<(), Error<B::Error>> {
        let value = merge_masked(current, register.into(), R::write_mask());
        self.write(R::address(), value)
    }

    /// Read a register, modify it with `update`, and write it back.
    ///
    /// The write always happens, even if `update` did not change anything.
    pub fn modify_register<R, F>(&mut self, update: F) -> Result<R, Error<B::Error>>
    where
        R: Register,
        F: FnOnce(&mut R),
    {
        let mut raw = [0u16; 1];
        self.read(R::address(), &mut raw)?;
        let mut register = R::from(raw[0]);
        update(&mut register);
        self.write_register(raw[0], register)?;
        Ok(register)
    }

    set_control_field! {
        use_subpages,
        bool,
        "Enable (or disable) measuring the two subpages separately."
    }

    set_control_field! {
        subpage_repeat,
        bool,
        "Enable (or disable) repeatedly measuring the selected subpage."
    }

    set_control_field! {
        subpage,
        Subpage,
        "Select the subpage to measure when repeating a subpage."
    }

    set_control_field! {
        frame_rate,
        FrameRate,
        "Set the camera's refresh rate."
    }

    set_control_field! {
        resolution,
        Resolution,
        "Set the resolution of the camera's ADC."
    }

    set_control_field! {
        access_pattern,
        AccessPattern,
        "Set the pixel access pattern."
    }
}
