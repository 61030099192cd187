// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
//! Register access, configuration and frame polling for the Melexis MLX90640 thermal camera.
//!
//! The MLX90640 is a 32x24 thermopile array on an I²C bus. Getting temperatures out of it takes
//! two very different kinds of work: moving words on and off the camera (configuration registers,
//! the factory calibration EEPROM and the measurement RAM), and a fairly involved set of
//! calculations to turn the calibration data and raw measurements into temperatures. This crate
//! does the first part, and leaves the second to an implementation of [`FrameProcessor`].
//!
//! The bus is abstracted by [`BusTransport`], which exposes explicit control over stop conditions.
//! Any [`embedded-hal`][embedded-hal] blocking I²C implementation can be used through
//! [`HalBus`]. This library is also `no_std` compatible.
//!
//! [embedded-hal]: https://docs.rs/embedded-hal/0.2/embedded_hal/blocking/i2c/index.html
//!
//! # Example
//! ```no_run
//! use linux_embedded_hal::I2cdev;
//! use mlx90640_frame::{Config, HalBus, Mlx90640Camera};
//! # use mlx90640_frame::{EepromTable, FrameProcessor, LibraryError, RawFrame, TemperatureFrame};
//! # struct Melexis;
//! # impl FrameProcessor for Melexis {
//! #     type Parameters = ();
//! #     fn extract_parameters(&self, _: &EepromTable) -> Result<(), LibraryError> { Ok(()) }
//! #     fn interpolate_outliers(&self, _: &mut RawFrame, _: &EepromTable) {}
//! #     fn ambient_temperature(&self, _: &RawFrame, _: &()) -> f32 { 25.0 }
//! #     fn calculate_to(&self, _: &RawFrame, _: &(), _: f32, _: f32, _: &mut TemperatureFrame) {}
//! # }
//!
//! let i2c_bus = I2cdev::new("/dev/i2c-1").expect("/dev/i2c-1 needs to be an I2C controller");
//! // Default address for these cameras is 0x33, at 2 FPS with an 18-bit ADC.
//! let config = Config::default();
//! let mut camera = Mlx90640Camera::init(HalBus::new(i2c_bus), Melexis, &config)?;
//! // Each frame covers one subpage, so it takes two for every pixel to be updated.
//! camera.frame()?;
//! let temperatures = camera.frame()?;
//! println!("Center pixel: {}℃", temperatures[12 * 32 + 16]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Subpages
//! The camera does not update the whole image at once. The pixels are divided into two subpages,
//! and every frame read from the camera only has new data for one of them. This crate configures
//! the chess [access pattern][AccessPattern], where the pixels alternate subpages in both the X
//! and Y axes:
//! ```text
//! 0 1 0 1 0 1 0 1
//! 1 0 1 0 1 0 1 0
//! 0 1 0 1 0 1 0 1
//! 1 0 1 0 1 0 1 0
//! ```

#![no_std]
#![allow(clippy::float_cmp)]

pub mod access;
pub mod bus;
pub mod common;
pub mod config;
#[doc(hidden)]
pub mod driver;
#[doc(hidden)]
pub mod error;
pub mod processor;
pub mod register;
mod util;

pub use access::RegisterAccess;
pub use bus::{BusTransport, HalBus, HalBusError};
pub use common::{Address, EepromTable, RawFrame, TemperatureFrame};
pub use config::Config;
#[doc(inline)]
pub use driver::Mlx90640Camera;
#[doc(inline)]
pub use error::{status_code, Error, LibraryError};
pub use processor::FrameProcessor;
pub use register::*;
