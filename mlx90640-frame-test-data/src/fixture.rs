// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
use mlx90640_frame::common::*;
use mlx90640_frame::{EepromTable, FrameProcessor, LibraryError, RawFrame, TemperatureFrame};

use crate::i2c_mock::{MockCameraBus, DEFAULT_CONTROL_REGISTER};

/// The EEPROM word (relative to the start of the EEPROM) the fixture offset is stored in.
pub const OFFSET_WORD: usize = 0x0010;

/// The offset stored in the fixture EEPROM, in hundredths of a degree.
pub const FIXTURE_OFFSET: u16 = 100;

/// Pixel calibration data starts this many words into the EEPROM.
const PIXEL_CALIBRATION_START: usize = 0x0040;

/// The RAM word (relative to the start of RAM) holding the PTAT measurement.
pub const PTAT_WORD: usize = 0x0320;

/// The PTAT value in the fixture RAM.
pub const FIXTURE_PTAT: u16 = 0x0100;

/// A pixel flagged as broken in the fixture EEPROM.
pub const BROKEN_PIXEL: usize = 5 * WIDTH + 7;

/// The garbage value the broken pixel reports in the fixture RAM.
pub const BROKEN_PIXEL_VALUE: u16 = 0x7FFF;

/// EEPROM contents with a recognizable header, a calibration offset and one broken pixel.
pub fn fixture_eeprom() -> EepromTable {
    let mut eeprom = [0u16; EEPROM_WORDS];
    for (index, word) in eeprom.iter_mut().enumerate().take(PIXEL_CALIBRATION_START) {
        *word = 0x4000 | index as u16;
    }
    eeprom[OFFSET_WORD] = FIXTURE_OFFSET;
    for word in eeprom[PIXEL_CALIBRATION_START..].iter_mut() {
        *word = 0x08A0;
    }
    eeprom[PIXEL_CALIBRATION_START + BROKEN_PIXEL] = 0x0000;
    eeprom
}

/// The value the fixture RAM has for a (working) pixel.
pub fn fixture_pixel_value(pixel: usize) -> u16 {
    (pixel as u16 * 3) % 500
}

/// RAM contents for a single fixture frame.
pub fn fixture_ram() -> [u16; RAM_WORDS] {
    let mut ram = [0u16; RAM_WORDS];
    for (pixel, word) in ram.iter_mut().enumerate().take(NUM_PIXELS) {
        *word = fixture_pixel_value(pixel);
    }
    ram[BROKEN_PIXEL] = BROKEN_PIXEL_VALUE;
    ram[PTAT_WORD] = FIXTURE_PTAT;
    ram
}

/// A mock camera loaded with the fixture EEPROM and RAM, with the power-on control register and no
/// data available yet.
pub fn fixture_mlx90640_at_address(i2c_address: u8) -> MockCameraBus {
    MockCameraBus::new(
        i2c_address,
        &fixture_eeprom(),
        &fixture_ram(),
        DEFAULT_CONTROL_REGISTER,
        0x0000,
    )
}

/// A mock camera with an erased (all ones) EEPROM.
pub fn blank_mlx90640_at_address(i2c_address: u8) -> MockCameraBus {
    MockCameraBus::new(
        i2c_address,
        &[0xFFFF; EEPROM_WORDS],
        &fixture_ram(),
        DEFAULT_CONTROL_REGISTER,
        0x0000,
    )
}

/// Calibration parameters for [`FixtureProcessor`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixtureParameters {
    /// Added to every ambient temperature, in degrees Celsius.
    pub offset: f32,
}

/// A simple, deterministic [`FrameProcessor`].
///
/// The math has nothing to do with the real camera, it just makes the results of every step easy
/// to predict:
/// * The parameters are the offset word of the EEPROM, in hundredths of a degree.
/// * Pixels with a zero calibration word are replaced with the mean of their horizontal
///   neighbors.
/// * T<sub>a</sub> is 20℃ plus the offset plus PTAT / 64.
/// * T<sub>o</sub> is the reflected temperature plus the emissivity times a hundredth of the raw
///   pixel value, for the pixels in the frame's subpage (chess pattern).
#[derive(Clone, Copy, Debug, Default)]
pub struct FixtureProcessor;

impl FixtureProcessor {
    /// The T<sub>o</sub> the processor calculates for a raw pixel value.
    pub fn object_temperature(raw: u16, emissivity: f32, reflected_temperature: f32) -> f32 {
        reflected_temperature + emissivity * (raw as i16 as f32) * 0.01
    }

    /// Whether `pixel` belongs to `subpage` in the chess pattern.
    pub fn in_subpage(pixel: usize, subpage: u16) -> bool {
        let row = pixel / WIDTH;
        let column = pixel % WIDTH;
        (row + column) % 2 == subpage as usize
    }
}

impl FrameProcessor for FixtureProcessor {
    type Parameters = FixtureParameters;

    fn extract_parameters(&self, eeprom: &EepromTable) -> Result<FixtureParameters, LibraryError> {
        if eeprom.iter().all(|word| *word == 0xFFFF) {
            return Err(LibraryError::InvalidData("EEPROM is blank"));
        }
        Ok(FixtureParameters {
            offset: eeprom[OFFSET_WORD] as i16 as f32 / 100.0,
        })
    }

    fn interpolate_outliers(&self, frame: &mut RawFrame, eeprom: &EepromTable) {
        let calibration = &eeprom[PIXEL_CALIBRATION_START..];
        for pixel in 0..NUM_PIXELS {
            if calibration[pixel] != 0 {
                continue;
            }
            let column = pixel % WIDTH;
            let mut sum = 0i32;
            let mut count = 0i32;
            if column > 0 {
                sum += frame[pixel - 1] as i16 as i32;
                count += 1;
            }
            if column < WIDTH - 1 {
                sum += frame[pixel + 1] as i16 as i32;
                count += 1;
            }
            frame[pixel] = (sum / count) as i16 as u16;
        }
    }

    fn ambient_temperature(&self, frame: &RawFrame, parameters: &FixtureParameters) -> f32 {
        20.0 + parameters.offset + (frame[PTAT_WORD] as i16 as f32) / 64.0
    }

    fn calculate_to(
        &self,
        frame: &RawFrame,
        _parameters: &FixtureParameters,
        emissivity: f32,
        reflected_temperature: f32,
        destination: &mut TemperatureFrame,
    ) {
        let subpage = frame[RAW_FRAME_SUBPAGE_INDEX];
        for (pixel, temperature) in destination.iter_mut().enumerate() {
            if Self::in_subpage(pixel, subpage) {
                *temperature =
                    Self::object_temperature(frame[pixel], emissivity, reflected_temperature);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn broken_pixel_interpolated() {
        let mut frame = [0u16; RAW_FRAME_WORDS];
        frame[..RAM_WORDS].copy_from_slice(&fixture_ram());
        FixtureProcessor.interpolate_outliers(&mut frame, &fixture_eeprom());
        let expected =
            (fixture_pixel_value(BROKEN_PIXEL - 1) + fixture_pixel_value(BROKEN_PIXEL + 1)) / 2;
        assert_eq!(frame[BROKEN_PIXEL], expected);
        assert_eq!(frame[BROKEN_PIXEL - 1], fixture_pixel_value(BROKEN_PIXEL - 1));
    }

    #[test]
    fn blank_eeprom_rejected() {
        let result = FixtureProcessor.extract_parameters(&[0xFFFF; EEPROM_WORDS]);
        assert!(matches!(result, Err(LibraryError::InvalidData(_))));
    }

    #[test]
    fn fixture_parameters() {
        let params = FixtureProcessor.extract_parameters(&fixture_eeprom()).unwrap();
        assert_eq!(params.offset, 1.0);
    }

    #[test]
    fn chess_subpages() {
        assert!(FixtureProcessor::in_subpage(0, 0));
        assert!(FixtureProcessor::in_subpage(1, 1));
        assert!(FixtureProcessor::in_subpage(WIDTH, 1));
        assert!(FixtureProcessor::in_subpage(WIDTH + 1, 0));
    }
}
