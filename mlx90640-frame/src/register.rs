// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
use num_enum::IntoPrimitive;
use paste::paste;

use crate::common::Address;
use crate::error::LibraryError;
use crate::util::is_bit_set;

/// Trait for common register functionality.
pub trait Register: Into<u16> + From<u16> + Copy {
    /// A bit mask of which bits can be modified by the controller.
    ///
    /// When changing register values on the camera, the current value should be read, then
    /// bitwise-ANDed with the complement of this mask, then bitwise-ORd with the new value. This
    /// preserves the values of any reserved bits in the registers.
    fn write_mask() -> u16;

    /// The address of this register in the camera's memory map.
    fn address() -> Address;
}

/// Generate a getter and a setter for a register field.
macro_rules! register_field {
    { $field:ident, $typ:ty, $doc:literal } => {
        paste! {
            #[doc = $doc]
            pub fn $field(&self) -> $typ {
                self.$field
            }

            #[doc = $doc]
            pub fn [< set_ $field >](&mut self, new_value: $typ) {
                self.$field = new_value;
            }
        }
    };
}

/// Represents the possible states of the status register (0x8000).
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub struct StatusRegister {
    /// The subpage which was last updated by the camera. Read-only.
    last_updated_subpage: Subpage,

    /// Set when there is new data available in RAM. Read-write.
    ///
    /// This flag is set to true by the camera, and can only be reset by the controller.
    new_data: bool,

    /// Whether data in RAM can be overwritten.
    overwrite_enabled: bool,

    /// Start a measurement.
    ///
    /// This value is set by the controller, and is reset by the camera once the measurement is
    /// complete.
    start_measurement: bool,
}

impl StatusRegister {
    /// The subpage which was last measured.
    pub fn last_updated_subpage(&self) -> Subpage {
        self.last_updated_subpage
    }

    /// Whether there is new data available in RAM.
    pub fn new_data(&self) -> bool {
        self.new_data
    }

    /// Request a new measurement.
    pub fn set_start_measurement(&mut self) {
        self.start_measurement = true;
    }

    register_field! {
        overwrite_enabled,
        bool,
        "Whether the camera may overwrite data in RAM with new measurements."
    }
}

impl Register for StatusRegister {
    fn write_mask() -> u16 {
        // The three least significant bits are read-only.
        0x0038
    }

    fn address() -> Address {
        Address::new(0x8000)
    }
}

impl From<u16> for StatusRegister {
    fn from(raw: u16) -> Self {
        // Only the first bit is used, the other two bits for this value are "Melexis" reserved
        let last_updated_subpage = if is_bit_set(raw, 0) {
            Subpage::One
        } else {
            Subpage::Zero
        };
        Self {
            last_updated_subpage,
            new_data: is_bit_set(raw, 3),
            overwrite_enabled: is_bit_set(raw, 4),
            start_measurement: is_bit_set(raw, 5),
        }
    }
}

impl From<StatusRegister> for u16 {
    fn from(status: StatusRegister) -> Self {
        let subpage_int: usize = status.last_updated_subpage.into();
        let mut register = subpage_int as u16;
        register |= (status.new_data as u16) << 3;
        register |= (status.overwrite_enabled as u16) << 4;
        register |= (status.start_measurement as u16) << 5;
        register
    }
}

/// Represents the possible states of control register 1 (0x800D).
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
// skip formatting in here as rustfmt will remove the extra blank lines around the "extra" bit
// comments.
#[rustfmt::skip]
pub struct ControlRegister {
    // The fields in this struct are laid out in least to most significant bits they occupy in the
    // control register.

    /// Whether or not to use subpages.
    ///
    /// If subpages are disabled, only one page will be updated. The default is enabled.
    use_subpages: bool,

    /// Enable "step mode".
    ///
    /// This mode is documented in older versions of the datasheet, but was later removed.
    step_mode: bool,

    /// Enable data hold.
    ///
    /// When enabled, data is only written into RAM when the
    /// [overwrite flag][StatusRegister::overwrite_enabled] is set.
    data_hold: bool,

    /// Whether or not to repeat the selected subpage instead of alternating.
    ///
    /// This value only has an effect when `use_subpages` is enabled. The default is disabled.
    subpage_repeat: bool,

    /// Which subpage to measure when `subpage_repeat` is enabled.
    subpage: Subpage,

    // `subpage` takes up three bits.

    /// The frame rate the camera should run at.
    ///
    /// See the note on `FrameRate` for I²C bus clock rate requirements. The default is
    /// [2Hz][FrameRate::Two].
    frame_rate: FrameRate,

    // `frame_rate` takes up three bits

    /// The resolution to run the internal ADC at.
    ///
    /// The default is [18 bits][Resolution::Eighteen].
    resolution: Resolution,

    // `resolution` takes up two bits.

    /// Which access pattern to use. The default is [chess][AccessPattern::Chess].
    access_pattern: AccessPattern,

    // The rest of the bits are reserved.
}

impl ControlRegister {
    register_field! { use_subpages, bool, "Whether subpages are used." }
    register_field! { step_mode, bool, "Whether step mode is enabled." }
    register_field! { data_hold, bool, "Whether data hold is enabled." }
    register_field! { subpage_repeat, bool, "Whether the selected subpage is repeated." }
    register_field! { subpage, Subpage, "The subpage measured when repeating a subpage." }
    register_field! { frame_rate, FrameRate, "The refresh rate of the camera." }
    register_field! { resolution, Resolution, "The resolution of the internal ADC." }
    register_field! { access_pattern, AccessPattern, "The pixel access pattern." }
}

impl Default for ControlRegister {
    /// The default settings (as documented in the datasheet).
    fn default() -> Self {
        Self {
            use_subpages: true,
            step_mode: false,
            data_hold: false,
            subpage_repeat: false,
            subpage: Subpage::Zero,
            frame_rate: FrameRate::default(),
            resolution: Resolution::default(),
            access_pattern: AccessPattern::Chess,
        }
    }
}

impl Register for ControlRegister {
    fn write_mask() -> u16 {
        // *Technically* it's 0x1FFD, but the second bit is documented to always be 0
        0x1FFF
    }

    fn address() -> Address {
        Address::new(0x800D)
    }
}

impl From<u16> for ControlRegister {
    fn from(raw: u16) -> Self {
        // Only the lowest of the three subpage bits selects a subpage, the others are reserved.
        let subpage = if is_bit_set(raw, 4) {
            Subpage::One
        } else {
            Subpage::Zero
        };
        let access_pattern = if is_bit_set(raw, 12) {
            AccessPattern::Chess
        } else {
            AccessPattern::Interleave
        };
        Self {
            use_subpages: is_bit_set(raw, 0),
            step_mode: is_bit_set(raw, 1),
            data_hold: is_bit_set(raw, 2),
            subpage_repeat: is_bit_set(raw, 3),
            subpage,
            frame_rate: FrameRate::from_masked((raw & 0x0380) >> 7),
            resolution: Resolution::from_masked((raw & 0x0C00) >> 10),
            access_pattern,
        }
    }
}

impl From<ControlRegister> for u16 {
    fn from(register: ControlRegister) -> Self {
        let mut raw = register.use_subpages as u16;
        raw |= (register.step_mode as u16) << 1;
        raw |= (register.data_hold as u16) << 2;
        raw |= (register.subpage_repeat as u16) << 3;
        let subpage_int: usize = register.subpage.into();
        raw |= (subpage_int as u16) << 4;
        raw |= register.frame_rate.as_raw() << 7;
        raw |= register.resolution.as_raw() << 10;
        let access_pattern: u8 = register.access_pattern.into();
        raw |= (access_pattern as u16) << 12;
        raw
    }
}

/// Identify which subpage to access.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, IntoPrimitive)]
#[repr(usize)]
pub enum Subpage {
    Zero = 0,
    One = 1,
}

/// The possible refresh rates supported by the camera. Before using the higher refresh rates,
/// ensure your I²C bus is fast enough. A quick rundown of the the maximum frame rate some common
/// I²C bus speeds can support:
///
/// * 100kHz: [4Hz][FrameRate::Four]
/// * 400kHz: [16Hz][FrameRate::Sixteen]
/// * 1MHz: [64Hz][FrameRate::SixtyFour] (barely, [32Hz][FrameRate::ThirtyTwo] is safer)
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub enum FrameRate {
    /// 0.5 Hz, one frame every two seconds.
    Half,

    /// 1Hz.
    One,

    /// 2Hz, which is also the default.
    Two,

    // 4Hz.
    Four,

    // 8Hz.
    Eight,

    // 16 Hz.
    Sixteen,

    // 32Hz.
    ThirtyTwo,

    // 64Hz.
    SixtyFour,
}

impl FrameRate {
    /// Only the low three bits of `raw_value` are considered.
    fn from_masked(raw_value: u16) -> Self {
        match raw_value & 0x07 {
            0 => Self::Half,
            1 => Self::One,
            2 => Self::Two,
            3 => Self::Four,
            4 => Self::Eight,
            5 => Self::Sixteen,
            6 => Self::ThirtyTwo,
            _ => Self::SixtyFour,
        }
    }

    /// Map a frame rate variant into the representation used by the camera.
    pub fn as_raw(&self) -> u16 {
        match self {
            Self::Half => 0,
            Self::One => 1,
            Self::Two => 2,
            Self::Four => 3,
            Self::Eight => 4,
            Self::Sixteen => 5,
            Self::ThirtyTwo => 6,
            Self::SixtyFour => 7,
        }
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::Two
    }
}

impl TryFrom<u8> for FrameRate {
    type Error = LibraryError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        // No way to say 0.5, so skipping it
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            4 => Ok(Self::Four),
            8 => Ok(Self::Eight),
            16 => Ok(Self::Sixteen),
            32 => Ok(Self::ThirtyTwo),
            64 => Ok(Self::SixtyFour),
            _ => Err(LibraryError::InvalidData(
                "The given number does not match a valid frame rate",
            )),
        }
    }
}

/// The resolution of the internal [ADC][adc].
///
/// [adc]: https://en.wikipedia.org/wiki/Analog-to-digital_converter
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Resolution {
    /// 16-bit.
    Sixteen,

    /// 17-bit.
    Seventeen,

    /// 18-bit, which is also the default.
    Eighteen,

    /// 19-bit.
    Nineteen,
}

impl Resolution {
    /// Only the low two bits of `raw_value` are considered.
    pub(crate) fn from_masked(raw_value: u16) -> Self {
        match raw_value & 0x03 {
            0 => Self::Sixteen,
            1 => Self::Seventeen,
            2 => Self::Eighteen,
            _ => Self::Nineteen,
        }
    }

    /// Map a resolution variant into the representation used by the camera.
    pub fn as_raw(&self) -> u16 {
        match self {
            Self::Sixteen => 0,
            Self::Seventeen => 1,
            Self::Eighteen => 2,
            Self::Nineteen => 3,
        }
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::Eighteen
    }
}

/// The pixel access pattern used by the camera.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, IntoPrimitive)]
#[repr(u8)]
pub enum AccessPattern {
    /// Pixels alternate between subpages, resulting in a chess or checker board pattern.
    ///
    /// This is the default (and strongly recommended value) for the MLX90640.
    Chess = 1,

    /// Each row of pixels is in the same subpage, with the rows alternating between subpages.
    Interleave = 0,
}

#[cfg(test)]
mod test {
    use super::*;

    macro_rules! assert_register_field {
        ($register:ty, $value:literal, $field:ident, $expected:expr) => {
            // backdoor type annotation for the macro
            let value: u16 = $value;
            let packed: $register = From::from(value);
            assert_eq!(packed.$field(), $expected);
            let unpacked: u16 = packed.into();
            assert_eq!(unpacked, value);
        };
    }

    #[test]
    fn status_register_masked() {
        // The last updated subpage is read-only, so the write mask doesn't cover the three least
        // significant bits.
        let all_on = StatusRegister::from(0xFFF8);
        let masked_on = StatusRegister::from(StatusRegister::write_mask());
        assert_eq!(all_on, masked_on);
    }

    #[test]
    fn status_register_last_updated_subpage() {
        assert_register_field!(StatusRegister, 0x0001, last_updated_subpage, Subpage::One);
        assert_register_field!(StatusRegister, 0x0000, last_updated_subpage, Subpage::Zero);
    }

    #[test]
    fn status_register_new_data() {
        assert_register_field!(StatusRegister, 0x0008, new_data, true);
        assert_register_field!(StatusRegister, 0x0000, new_data, false);
    }

    #[test]
    fn status_register_overwrite() {
        assert_register_field!(StatusRegister, 0x0010, overwrite_enabled, true);
        assert_register_field!(StatusRegister, 0x0000, overwrite_enabled, false);
    }

    #[test]
    fn status_register_start_frame_request() {
        // Measured subpage 1, new data already acknowledged.
        let mut status = StatusRegister::from(0x0001);
        status.set_overwrite_enabled(true);
        status.set_start_measurement();
        // The subpage bit is read-only, the camera ignores it on writes.
        assert_eq!(u16::from(status) & StatusRegister::write_mask(), 0x0030);
    }

    #[test]
    fn control_register_masked() {
        let all_on = ControlRegister::from(0xFFFF);
        // The write mask is also a mask for which bits are relevant to the structure, except for
        // the two reserved subpage bits.
        let masked_on = ControlRegister::from(ControlRegister::write_mask());
        assert_eq!(all_on, masked_on);
    }

    #[test]
    fn control_register_default() {
        // 0x1901 is the power-on value from the datasheet.
        assert_eq!(ControlRegister::from(0x1901), ControlRegister::default());
        assert_eq!(u16::from(ControlRegister::default()), 0x1901);
    }

    #[test]
    fn control_register_use_subpages() {
        assert_register_field!(ControlRegister, 0x0001, use_subpages, true);
        assert_register_field!(ControlRegister, 0x0000, use_subpages, false);
    }

    #[test]
    fn control_register_step_mode() {
        assert_register_field!(ControlRegister, 0x0002, step_mode, true);
        assert_register_field!(ControlRegister, 0x0000, step_mode, false);
    }

    #[test]
    fn control_register_data_hold() {
        assert_register_field!(ControlRegister, 0x0004, data_hold, true);
        assert_register_field!(ControlRegister, 0x0000, data_hold, false);
    }

    #[test]
    fn control_register_subpage_repeat() {
        assert_register_field!(ControlRegister, 0x0008, subpage_repeat, true);
        assert_register_field!(ControlRegister, 0x0000, subpage_repeat, false);
    }

    #[test]
    fn control_register_subpage() {
        assert_register_field!(ControlRegister, 0x0000, subpage, Subpage::Zero);
        assert_register_field!(ControlRegister, 0x0010, subpage, Subpage::One);
    }

    #[test]
    fn control_register_frame_rate() {
        assert_register_field!(ControlRegister, 0x0000, frame_rate, FrameRate::Half);
        assert_register_field!(ControlRegister, 0x0080, frame_rate, FrameRate::One);
        assert_register_field!(ControlRegister, 0x0100, frame_rate, FrameRate::Two);
        assert_register_field!(ControlRegister, 0x0180, frame_rate, FrameRate::Four);
        assert_register_field!(ControlRegister, 0x0200, frame_rate, FrameRate::Eight);
        assert_register_field!(ControlRegister, 0x0280, frame_rate, FrameRate::Sixteen);
        assert_register_field!(ControlRegister, 0x0300, frame_rate, FrameRate::ThirtyTwo);
        assert_register_field!(ControlRegister, 0x0380, frame_rate, FrameRate::SixtyFour);
    }

    #[test]
    fn control_register_resolution() {
        assert_register_field!(ControlRegister, 0x0000, resolution, Resolution::Sixteen);
        assert_register_field!(ControlRegister, 0x0400, resolution, Resolution::Seventeen);
        assert_register_field!(ControlRegister, 0x0800, resolution, Resolution::Eighteen);
        assert_register_field!(ControlRegister, 0x0C00, resolution, Resolution::Nineteen);
    }

    #[test]
    fn control_register_access_mode() {
        assert_register_field!(
            ControlRegister,
            0x0000,
            access_pattern,
            AccessPattern::Interleave
        );
        assert_register_field!(
            ControlRegister,
            0x1000,
            access_pattern,
            AccessPattern::Chess
        );
    }

    #[test]
    fn control_register_setters() {
        let mut register = ControlRegister::default();
        register.set_use_subpages(false);
        register.set_frame_rate(FrameRate::SixtyFour);
        register.set_resolution(Resolution::Sixteen);
        assert_eq!(u16::from(register), 0x1380);
    }

    #[test]
    fn frame_rate_from_u8() {
        // No fractions in integer-land
        assert_eq!(FrameRate::try_from(1u8).unwrap(), FrameRate::One);
        assert_eq!(FrameRate::try_from(2u8).unwrap(), FrameRate::Two);
        assert_eq!(FrameRate::try_from(4u8).unwrap(), FrameRate::Four);
        assert_eq!(FrameRate::try_from(8u8).unwrap(), FrameRate::Eight);
        assert_eq!(FrameRate::try_from(16u8).unwrap(), FrameRate::Sixteen);
        assert_eq!(FrameRate::try_from(32u8).unwrap(), FrameRate::ThirtyTwo);
        assert_eq!(FrameRate::try_from(64u8).unwrap(), FrameRate::SixtyFour);
        assert!(FrameRate::try_from(0u8).is_err());
        assert!(FrameRate::try_from(3u8).is_err());
    }
}
