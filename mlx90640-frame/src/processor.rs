// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
use crate::common::{EepromTable, RawFrame, TemperatureFrame};
use crate::error::LibraryError;

/// The signal processing needed to turn raw camera data into temperatures.
///
/// Each MLX90640 has calibration data from the factory stored on its EEPROM, and that data has to
/// be pre-processed into a set of parameters before any raw measurement can be turned into a
/// temperature. This crate only moves the data on and off the camera; the calculations
/// themselves (parameter extraction, bad pixel handling, ambient and object temperature) come from
/// an implementation of this trait, usually a wrapper around the manufacturer's library or a
/// port of the datasheet formulas.
///
/// Every method works on the buffers owned by [`Mlx90640Camera`][crate::Mlx90640Camera], laid out
/// as described in [`common`][crate::common].
pub trait FrameProcessor {
    /// Calibration parameters derived from the EEPROM.
    type Parameters;

    /// Derive the calibration parameters from a camera's EEPROM contents.
    ///
    /// This is only called once per camera, during initialization.
    fn extract_parameters(&self, eeprom: &EepromTable) -> Result<Self::Parameters, LibraryError>;

    /// Replace the values of pixels flagged as broken or outliers in the EEPROM with values
    /// interpolated from their neighbors.
    fn interpolate_outliers(&self, frame: &mut RawFrame, eeprom: &EepromTable);

    /// Calculate the ambient temperature (T<sub>a</sub>) in degrees Celsius for a frame.
    fn ambient_temperature(&self, frame: &RawFrame, parameters: &Self::Parameters) -> f32;

    /// Calculate the object temperature (T<sub>o</sub>) of every pixel measured in `frame`,
    /// storing them into `destination`.
    ///
    /// Only the pixels in the subpage recorded in the frame are expected to be updated.
    /// `reflected_temperature` is the temperature of the surroundings reflected by the objects
    /// being measured.
    fn calculate_to(
        &self,
        frame: &RawFrame,
        parameters: &Self::Parameters,
        emissivity: f32,
        reflected_temperature: f32,
        destination: &mut TemperatureFrame,
    );
}
