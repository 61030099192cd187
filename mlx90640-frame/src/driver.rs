// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
use core::fmt::Debug;

use log::{debug, info, warn};

use crate::access::RegisterAccess;
use crate::bus::BusTransport;
use crate::common::*;
use crate::config::Config;
use crate::error::{Error, LibraryError};
use crate::processor::FrameProcessor;
use crate::register::*;

/// How many times a frame is re-read if the camera reports new data arriving during the read.
const MAX_FRAME_ATTEMPTS: usize = 5;

/// The camera driver for the MLX90640.
///
/// A `Mlx90640Camera` owns the bus, the EEPROM contents, the calibration parameters derived from
/// them, and the buffers frames are read into. It only exists once the camera has been configured
/// and its calibration loaded, so every frame access is against an initialized camera.
///
/// Frames are returned as a borrow of the driver's own temperature buffer, meaning the previous
/// frame has to be dropped before the next one can be requested.
pub struct Mlx90640Camera<B, P>
where
    P: FrameProcessor,
{
    registers: RegisterAccess<B>,

    /// The signal processing implementation.
    processor: P,

    /// The calibration parameters derived from `eeprom`.
    parameters: P::Parameters,

    /// The factory calibration data for this camera.
    eeprom: EepromTable,

    /// Buffer for reading frames off of the camera.
    raw_frame: RawFrame,

    /// The most recently calculated temperatures.
    temperatures: TemperatureFrame,

    /// The most recent observed ambient temperature.
    ///
    /// The ambient temperature is calculated during image processing step. Save it for those
    /// applications that want the ambient temperature so a full recalculation isn't necessary.
    ambient_temperature: Option<f32>,

    /// The emissivity value to use when calculating pixel temperature.
    emissivity: f32,
}

impl<B, P> Mlx90640Camera<B, P>
where
    B: BusTransport,
    P: FrameProcessor,
{
    /// Configure the camera and load its calibration data.
    ///
    /// The camera is set up in order: subpage mode off, subpage repeat off, subpage 0 selected,
    /// the configured refresh rate, the configured ADC resolution and finally the chess access
    /// pattern. An fps value in `config` without a matching refresh rate skips the refresh rate
    /// step and leaves the camera's current rate alone. The EEPROM is then read out and handed to
    /// the `processor` to derive the calibration parameters.
    ///
    /// The first failure stops initialization and is returned.
    pub fn init(bus: B, processor: P, config: &Config) -> Result<Self, Error<B::Error>> {
        let mut registers = RegisterAccess::new(bus, config.i2c_address);
        configure(&mut registers, config)?;
        let mut eeprom = [0u16; EEPROM_WORDS];
        registers.read(EEPROM_BASE, &mut eeprom)?;
        debug!("Read {} words of EEPROM", eeprom.len());
        let parameters = processor.extract_parameters(&eeprom)?;
        info!(
            "MLX90640 at {:#04X} initialization complete",
            config.i2c_address
        );
        Ok(Self {
            registers,
            processor,
            parameters,
            eeprom,
            raw_frame: [0u16; RAW_FRAME_WORDS],
            temperatures: [0f32; NUM_PIXELS],
            ambient_temperature: None,
            emissivity: 1f32,
        })
    }

    /// Read the next frame from the camera and calculate temperatures for it.
    ///
    /// This blocks until the camera has new data. The returned slice is row-major, with
    /// [`WIDTH`] pixels per row and [`HEIGHT`] rows, in degrees Celsius. Only the pixels in the
    /// subpage just measured are updated, the rest keep their values from earlier frames.
    pub fn frame(&mut self) -> Result<&TemperatureFrame, Error<B::Error>> {
        self.update()?;
        Ok(&self.temperatures)
    }

    /// Like [`frame`][Mlx90640Camera::frame], but failures are only logged.
    ///
    /// The temperature buffer is returned regardless, which means the data may be stale (or only
    /// partially updated) if something went wrong.
    pub fn frame_or_stale(&mut self) -> &TemperatureFrame
    where
        B::Error: Debug,
    {
        if let Err(err) = self.update() {
            warn!("Returning stale MLX90640 frame: {:?}", err);
        }
        &self.temperatures
    }

    fn update(&mut self) -> Result<(), Error<B::Error>> {
        let subpage = read_raw_frame(&mut self.registers, &mut self.raw_frame)?;
        self.processor
            .interpolate_outliers(&mut self.raw_frame, &self.eeprom);
        let t_a = self
            .processor
            .ambient_temperature(&self.raw_frame, &self.parameters);
        self.processor.calculate_to(
            &self.raw_frame,
            &self.parameters,
            self.emissivity,
            t_a,
            &mut self.temperatures,
        );
        self.ambient_temperature = Some(t_a);
        debug!("Processed subpage {:?} with T_a {}", subpage, t_a);
        Ok(())
    }

    /// The temperatures from the most recent frame, without reading a new one.
    pub fn temperatures(&self) -> &TemperatureFrame {
        &self.temperatures
    }

    /// The raw data from the most recent frame.
    pub fn raw_frame(&self) -> &RawFrame {
        &self.raw_frame
    }

    /// Get the most recent ambient temperature calculation.
    ///
    /// If no frame has been processed yet, this method will return `None`.
    pub fn ambient_temperature(&self) -> Option<f32> {
        self.ambient_temperature
    }

    /// Get the emissivity value that is being used for calculations currently.
    ///
    /// The default emissivity is 1.
    pub fn emissivity(&self) -> f32 {
        self.emissivity
    }

    /// Override the emissivity value used in temperature calculations.
    pub fn set_emissivity(&mut self, new_value: f32) {
        self.emissivity = new_value;
    }

    /// The EEPROM contents read during initialization.
    pub fn eeprom(&self) -> &EepromTable {
        &self.eeprom
    }

    /// The calibration parameters derived during initialization.
    pub fn parameters(&self) -> &P::Parameters {
        &self.parameters
    }

    /// Direct register access, for settings not covered by initialization.
    pub fn registers(&mut self) -> &mut RegisterAccess<B> {
        &mut self.registers
    }

    /// The height of the thermal image, in pixels.
    pub fn height(&self) -> usize {
        HEIGHT
    }

    /// The width of the thermal image, in pixels.
    pub fn width(&self) -> usize {
        WIDTH
    }

    /// Give back the bus and the processor.
    pub fn release(self) -> (B, P) {
        (self.registers.release(), self.processor)
    }
}

fn configure<B: BusTransport>(
    registers: &mut RegisterAccess<B>,
    config: &Config,
) -> Result<(), Error<B::Error>> {
    registers.set_use_subpages(false)?;
    registers.set_subpage_repeat(false)?;
    registers.set_subpage(Subpage::Zero)?;
    match config.frame_rate() {
        Some(frame_rate) => registers.set_frame_rate(frame_rate)?,
        None => warn!(
            "No refresh rate for {} FPS, leaving the refresh rate unchanged",
            config.fps
        ),
    }
    registers.set_resolution(config.resolution())?;
    registers.set_access_pattern(AccessPattern::Chess)?;
    Ok(())
}

/// The status register value that requests a new measurement.
///
/// This also clears the "new data" flag, and allows the camera to overwrite the RAM contents.
fn start_measurement_request() -> StatusRegister {
    let mut request = StatusRegister::from(0);
    request.set_overwrite_enabled(true);
    request.set_start_measurement();
    request
}

/// Read a full frame of raw data into `frame`, returning the subpage it was measured for.
///
/// This spins until the camera reports new data. If the camera reports new data again after the
/// RAM was read, the read is retried, up to [`MAX_FRAME_ATTEMPTS`] times.
fn read_raw_frame<B: BusTransport>(
    registers: &mut RegisterAccess<B>,
    frame: &mut RawFrame,
) -> Result<Subpage, Error<B::Error>> {
    let mut status: StatusRegister = registers.read_register()?;
    while !status.new_data() {
        core::hint::spin_loop();
        status = registers.read_register()?;
    }
    let mut attempts = 0;
    while status.new_data() {
        if attempts == MAX_FRAME_ATTEMPTS {
            return Err(
                LibraryError::InvalidData("Frame data kept changing while being read").into(),
            );
        }
        registers.write_register(0, start_measurement_request())?;
        registers.read(RAM_BASE, &mut frame[..RAM_WORDS])?;
        status = registers.read_register()?;
        attempts += 1;
    }
    registers.read(
        ControlRegister::address(),
        &mut frame[RAW_FRAME_CONTROL_INDEX..=RAW_FRAME_CONTROL_INDEX],
    )?;
    let subpage = status.last_updated_subpage();
    let subpage_index: usize = subpage.into();
    frame[RAW_FRAME_SUBPAGE_INDEX] = subpage_index as u16;
    Ok(subpage)
}
