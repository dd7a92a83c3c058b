use std::f32::consts::PI;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read preset file: {0}")]
    Io(#[from] std::io::Error),
    #[error("preset file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("zoom factor must be finite and non-zero")]
    BadZoom,
    #[error("{parity} rows: scales[{index}] must be finite and non-zero")]
    BadScale { parity: &'static str, index: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    Hsv,
    Grayscale,
    /// Any color mode this renderer does not understand. Shades to opaque
    /// black instead of failing the frame.
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HsvTone {
    pub saturation: f32,
    pub brightness: f32,
    pub brightness_var: f32,
    pub hue_cycle_speed: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GrayscaleTone {
    pub red_coeff: f32,
    pub green_coeff: f32,
    pub blue_coeff: f32,
    pub contrast: f32,
    pub brightness: f32,
}

/// Full parameter set for one row-parity class.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveRecipe {
    /// Spatial frequency of the horizontal, vertical, diagonal and radial
    /// terms. Smaller values, tighter ripples.
    pub scales: [f32; 4],
    pub speeds: [f32; 4],
    pub phase_offset: f32,
    pub color_mode: ColorMode,
    pub hsv: HsvTone,
    pub grayscale: GrayscaleTone,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GlobalParams {
    pub zoom_factor: f32,
    pub wave_amplitude: f32,
    pub wave_offset: f32,
    pub base_speed: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlasmaConfig {
    pub globals: GlobalParams,
    pub even_rows: WaveRecipe,
    pub odd_rows: WaveRecipe,
}

impl PlasmaConfig {
    pub fn classic() -> Self {
        Self {
            globals: GlobalParams {
                zoom_factor: 10.0,
                wave_amplitude: 32.0,
                wave_offset: 128.0,
                base_speed: 0.05,
            },
            even_rows: WaveRecipe {
                scales: [20.6, 10.4, 20.8, 7.9],
                speeds: [-0.72, -1.28, 1.5, 2.0],
                phase_offset: PI / 2.1,
                color_mode: ColorMode::Hsv,
                hsv: HsvTone {
                    saturation: 85.0,
                    brightness: 65.0,
                    brightness_var: 15.0,
                    hue_cycle_speed: 0.35,
                },
                grayscale: GrayscaleTone {
                    red_coeff: 0.587,
                    green_coeff: 0.587,
                    blue_coeff: 0.587,
                    contrast: 0.8,
                    brightness: 1.25,
                },
            },
            odd_rows: WaveRecipe {
                scales: [5.2, 10.0, 15.4, 9.0],
                speeds: [1.37, 0.76, 0.56, 2.1],
                phase_offset: PI / 1.7,
                color_mode: ColorMode::Hsv,
                hsv: HsvTone {
                    saturation: 85.0,
                    brightness: 65.0,
                    brightness_var: 25.0,
                    hue_cycle_speed: 0.25,
                },
                grayscale: GrayscaleTone {
                    red_coeff: 0.3,
                    green_coeff: 0.3,
                    blue_coeff: 0.3,
                    contrast: 0.9,
                    brightness: 1.2,
                },
            },
        }
    }

    pub fn monochrome() -> Self {
        let mut config = Self::classic();
        config.even_rows.color_mode = ColorMode::Grayscale;
        config.odd_rows.color_mode = ColorMode::Grayscale;
        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let zoom = self.globals.zoom_factor;
        if !zoom.is_finite() || zoom == 0.0 {
            return Err(ConfigError::BadZoom);
        }
        validate_recipe(&self.even_rows, "even")?;
        validate_recipe(&self.odd_rows, "odd")
    }
}

fn validate_recipe(recipe: &WaveRecipe, parity: &'static str) -> Result<(), ConfigError> {
    for (index, scale) in recipe.scales.iter().enumerate() {
        if !scale.is_finite() || *scale == 0.0 {
            return Err(ConfigError::BadScale { parity, index });
        }
    }
    Ok(())
}

pub fn load_preset(path: impl AsRef<Path>) -> Result<PlasmaConfig, ConfigError> {
    let raw = fs::read_to_string(path)?;
    let config: PlasmaConfig = serde_json::from_str(&raw)?;
    config.validate()?;
    Ok(config)
}
