// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
//! Memory map and sizes for the MLX90640.
//!
//! The camera exposes a single 16-bit address space with 16-bit words: the factory EEPROM lives
//! at 0x2400 through 0x273F, the measurement RAM at 0x0400 through 0x073F, and the handful of
//! configuration registers start at 0x8000. Every address and every word goes over the wire most
//! significant byte first.
use core::fmt;

/// The height of the image captured by sensor in pixels.
pub const HEIGHT: usize = 24;

/// The width of the image captured by the sensor in pixels.
pub const WIDTH: usize = 32;

/// The total number of pixels an MLX90640 has.
pub const NUM_PIXELS: usize = HEIGHT * WIDTH;

/// The number of 16-bit words in the EEPROM.
pub const EEPROM_WORDS: usize = 832;

/// The number of 16-bit words of RAM read for each frame.
///
/// This covers the 768 pixels along with 64 auxiliary words (half of which are reserved).
pub const RAM_WORDS: usize = 832;

/// The number of words in a raw frame.
///
/// A raw frame is the RAM contents followed by the value of control register 1 and the subpage
/// the data was measured for.
pub const RAW_FRAME_WORDS: usize = RAM_WORDS + 2;

/// The default I²C address for the MLX90640.
pub const DEFAULT_ADDRESS: u8 = 0x33;

/// Index in a raw frame holding the control register value at the time of the read.
pub const RAW_FRAME_CONTROL_INDEX: usize = RAM_WORDS;

/// Index in a raw frame holding the subpage the frame was measured for.
pub const RAW_FRAME_SUBPAGE_INDEX: usize = RAM_WORDS + 1;

/// The factory calibration data, as read from the camera.
pub type EepromTable = [u16; EEPROM_WORDS];

/// Raw measurement data, see [`RAW_FRAME_WORDS`] for the layout.
pub type RawFrame = [u16; RAW_FRAME_WORDS];

/// Per-pixel temperatures in degrees Celsius.
///
/// The first [`WIDTH`] values are the first row, the next [`WIDTH`] the second row and so on.
pub type TemperatureFrame = [f32; NUM_PIXELS];

/// Start of the measurement RAM.
pub const RAM_BASE: Address = Address::new(0x0400);

/// Start of the EEPROM.
pub const EEPROM_BASE: Address = Address::new(0x2400);

/// A 16-bit register address on the camera.
#[derive(Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Address(u16);

impl Address {
    /// Wrap the given address in an `Address`.
    ///
    /// This function is intended to be used in const contexts, in other cases the
    /// [`From`][core::convert::From] implementation is probably easier to use.
    pub const fn new(address: u16) -> Self {
        Self(address)
    }

    /// The address as it goes over the wire, most significant byte first.
    pub fn as_bytes(&self) -> [u8; 2] {
        self.0.to_be_bytes()
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({:#X})", self.0)
    }
}

impl From<u16> for Address {
    fn from(raw_address: u16) -> Self {
        Self::new(raw_address)
    }
}

impl From<Address> for u16 {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl From<Address> for usize {
    fn from(address: Address) -> Self {
        address.0 as usize
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn address_bytes_big_endian() {
        assert_eq!(Address::new(0x800D).as_bytes(), [0x80, 0x0D]);
        assert_eq!(EEPROM_BASE.as_bytes(), [0x24, 0x00]);
    }

    #[test]
    fn raw_frame_layout() {
        assert_eq!(RAW_FRAME_WORDS, 834);
        assert_eq!(RAW_FRAME_CONTROL_INDEX, 832);
        assert_eq!(RAW_FRAME_SUBPAGE_INDEX, 833);
        assert_eq!(NUM_PIXELS, 768);
    }
}
