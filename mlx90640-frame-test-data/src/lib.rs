// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
mod fixture;
mod i2c_mock;

pub use fixture::{
    blank_mlx90640_at_address, fixture_eeprom, fixture_mlx90640_at_address, fixture_pixel_value,
    fixture_ram, FixtureParameters, FixtureProcessor, BROKEN_PIXEL, BROKEN_PIXEL_VALUE,
    FIXTURE_OFFSET, FIXTURE_PTAT, OFFSET_WORD, PTAT_WORD,
};
pub use i2c_mock::{BusOperation, MockCameraBus, MockError, DEFAULT_CONTROL_REGISTER};
