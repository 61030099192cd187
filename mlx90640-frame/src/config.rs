// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::common::DEFAULT_ADDRESS;
use crate::register::{FrameRate, Resolution};

/// Camera settings applied once, when the camera is initialized.
///
/// The fields are the raw selectors a host configuration system hands out, see
/// [`frame_rate`][Config::frame_rate] and [`resolution`][Config::resolution] for how they are
/// interpreted.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// The I²C address of the camera.
    pub i2c_address: u8,

    /// Frames per second. 0 selects 0.5 FPS.
    pub fps: u8,

    /// Raw ADC resolution code, 0 through 3 for 16 through 19 bits.
    pub adc_bits: u8,
}

impl Config {
    /// The refresh rate for the configured frames per second.
    ///
    /// Only 0 (meaning 0.5), 1, 2, 4, 8, 16, 32 and 64 are valid, anything else is `None` and
    /// the camera's refresh rate is left alone.
    pub fn frame_rate(&self) -> Option<FrameRate> {
        match self.fps {
            0 => Some(FrameRate::Half),
            fps => FrameRate::try_from(fps).ok(),
        }
    }

    /// The ADC resolution for the configured code.
    ///
    /// The register field is two bits wide, so only the low two bits of the code are used.
    pub fn resolution(&self) -> Resolution {
        Resolution::from_masked(self.adc_bits as u16)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            i2c_address: DEFAULT_ADDRESS,
            fps: 2,
            adc_bits: Resolution::Eighteen.as_raw() as u8,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn with_fps(fps: u8) -> Config {
        Config {
            fps,
            ..Config::default()
        }
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.i2c_address, 0x33);
        assert_eq!(config.frame_rate(), Some(FrameRate::Two));
        assert_eq!(config.resolution(), Resolution::Eighteen);
    }

    #[test]
    fn fps_selectors() {
        assert_eq!(with_fps(0).frame_rate(), Some(FrameRate::Half));
        assert_eq!(with_fps(1).frame_rate(), Some(FrameRate::One));
        assert_eq!(with_fps(2).frame_rate(), Some(FrameRate::Two));
        assert_eq!(with_fps(4).frame_rate(), Some(FrameRate::Four));
        assert_eq!(with_fps(8).frame_rate(), Some(FrameRate::Eight));
        assert_eq!(with_fps(16).frame_rate(), Some(FrameRate::Sixteen));
        assert_eq!(with_fps(32).frame_rate(), Some(FrameRate::ThirtyTwo));
        assert_eq!(with_fps(64).frame_rate(), Some(FrameRate::SixtyFour));
    }

    #[test]
    fn unmapped_fps_is_none() {
        for fps in [3u8, 5, 7, 63, 65, 128, u8::MAX] {
            assert_eq!(with_fps(fps).frame_rate(), None, "fps = {}", fps);
        }
    }

    #[test]
    fn resolution_codes() {
        let resolutions = [
            Resolution::Sixteen,
            Resolution::Seventeen,
            Resolution::Eighteen,
            Resolution::Nineteen,
        ];
        for (code, expected) in resolutions.iter().enumerate() {
            let config = Config {
                adc_bits: code as u8,
                ..Config::default()
            };
            assert_eq!(config.resolution(), *expected);
        }
        // Only two bits wide
        let config = Config {
            adc_bits: 0x05,
            ..Config::default()
        };
        assert_eq!(config.resolution(), Resolution::Seventeen);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize_partial() {
        let config: Config = toml::from_str("i2c_address = 0x34\nfps = 8\n").unwrap();
        assert_eq!(config.i2c_address, 0x34);
        assert_eq!(config.frame_rate(), Some(FrameRate::Eight));
        // Missing fields fall back to the defaults
        assert_eq!(config.resolution(), Resolution::Eighteen);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_round_trip() {
        let config = Config {
            i2c_address: 0x30,
            fps: 0,
            adc_bits: 3,
        };
        let text = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
