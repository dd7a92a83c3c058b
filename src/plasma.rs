use thiserror::Error;

use crate::config::{ColorMode, ConfigError, GlobalParams, PlasmaConfig, WaveRecipe};
use crate::trig;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("output surface has no area ({width}x{height})")]
    EmptySurface { width: u32, height: u32 },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to spawn render thread: {0}")]
    WorkerSpawn(#[from] std::io::Error),
    #[error("render worker exited before startup")]
    WorkerGone,
}

/// All mutable state of one render session: animation clock, zoom-scaled
/// coordinate tables and the output pixel buffer. Owned exclusively by the
/// render thread once handed over.
pub struct PlasmaField {
    width: usize,
    height: usize,
    config: PlasmaConfig,
    col_x: Vec<f32>,
    row_y: Vec<f32>,
    rgba: Vec<u8>,
    clock: f32,
}

impl PlasmaField {
    pub fn new(config: PlasmaConfig, width: u32, height: u32) -> Result<Self, RenderError> {
        config.validate()?;
        if width == 0 || height == 0 {
            return Err(RenderError::EmptySurface { width, height });
        }

        let width = width as usize;
        let height = height as usize;
        let zoom = config.globals.zoom_factor;

        Ok(Self {
            col_x: (0..width).map(|x| x as f32 / zoom).collect(),
            row_y: (0..height).map(|y| y as f32 / zoom).collect(),
            rgba: vec![0; width * height * 4],
            clock: 0.0,
            width,
            height,
            config,
        })
    }

    pub fn dimensions(&self) -> [usize; 2] {
        [self.width, self.height]
    }

    pub fn clock(&self) -> f32 {
        self.clock
    }

    pub fn frame_rgba(&self) -> &[u8] {
        &self.rgba
    }

    /// One full-buffer recompute, then the clock advances by `base_speed`.
    pub fn render_frame(&mut self) {
        let globals = self.config.globals;

        for y in 0..self.height {
            let recipe = if y % 2 == 0 {
                self.config.even_rows
            } else {
                self.config.odd_rows
            };
            let zy = self.row_y[y] + recipe.phase_offset;

            for x in 0..self.width {
                let zx = self.col_x[x] + recipe.phase_offset;
                let value = wave_value(&globals, &recipe, zx, zy, self.clock, trig::fast_sin);
                let pixel = shade(value, &recipe, self.clock);
                let idx = (y * self.width + x) * 4;
                self.rgba[idx..idx + 4].copy_from_slice(&pixel);
            }
        }

        self.clock += globals.base_speed;
    }
}

/// Superposition of a horizontal, a vertical, a diagonal and a radial wave.
/// The radial term is phase-subtracted, so it travels against the others.
pub fn wave_value(
    globals: &GlobalParams,
    recipe: &WaveRecipe,
    zx: f32,
    zy: f32,
    clock: f32,
    sin: impl Fn(f32) -> f32,
) -> f32 {
    globals.wave_offset
        + globals.wave_amplitude
            * (sin(zx / recipe.scales[0] + clock * recipe.speeds[0])
                + sin(zy / recipe.scales[1] + clock * recipe.speeds[1])
                + sin((zx + zy) / recipe.scales[2] + clock * recipe.speeds[2])
                + sin(zx.hypot(zy) / recipe.scales[3] - clock * recipe.speeds[3]))
}

fn shade(value: f32, recipe: &WaveRecipe, clock: f32) -> [u8; 4] {
    match recipe.color_mode {
        ColorMode::Grayscale => {
            let tone = recipe.grayscale;
            // Single clamp here; the per-channel multiply below is allowed
            // to push past 255 and saturate on the byte cast.
            let gray = (value * tone.contrast * tone.brightness).clamp(0.0, 255.0);
            [
                (gray * tone.red_coeff) as u8,
                (gray * tone.green_coeff) as u8,
                (gray * tone.blue_coeff) as u8,
                255,
            ]
        }
        ColorMode::Hsv => {
            let tone = recipe.hsv;
            let hue = value + clock * tone.hue_cycle_speed * 100.0;
            let brightness = tone.brightness + trig::exact_sin(clock) * tone.brightness_var;
            hsv_to_rgb(hue, tone.saturation, brightness)
        }
        ColorMode::Unknown => [0, 0, 0, 255],
    }
}

fn hsv_to_rgb(hue: f32, saturation: f32, value: f32) -> [u8; 4] {
    let h = hue.rem_euclid(360.0) / 60.0; // sector 0-5
    let s = saturation / 100.0;
    let v = value / 100.0;

    let i = h.floor();
    let f = h - i;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    let (r, g, b) = match i as u32 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };

    [
        (r * 255.0).round() as u8,
        (g * 255.0).round() as u8,
        (b * 255.0).round() as u8,
        255,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GrayscaleTone, HsvTone};
    use std::f32::consts::FRAC_PI_2;

    fn unit_recipe(color_mode: ColorMode) -> WaveRecipe {
        WaveRecipe {
            scales: [1.0; 4],
            speeds: [0.0; 4],
            phase_offset: 0.0,
            color_mode,
            hsv: HsvTone {
                saturation: 85.0,
                brightness: 65.0,
                brightness_var: 0.0,
                hue_cycle_speed: 0.0,
            },
            grayscale: GrayscaleTone {
                red_coeff: 1.0,
                green_coeff: 1.0,
                blue_coeff: 1.0,
                contrast: 1.0,
                brightness: 1.0,
            },
        }
    }

    fn flat_config(color_mode: ColorMode, wave_offset: f32) -> PlasmaConfig {
        PlasmaConfig {
            globals: GlobalParams {
                zoom_factor: 1.0,
                wave_amplitude: 0.0,
                wave_offset,
                base_speed: 0.05,
            },
            even_rows: unit_recipe(color_mode),
            odd_rows: unit_recipe(color_mode),
        }
    }

    #[test]
    fn wave_value_is_deterministic() {
        let globals = PlasmaConfig::classic().globals;
        let recipe = PlasmaConfig::classic().even_rows;
        let a = wave_value(&globals, &recipe, 3.7, 1.2, 42.5, f32::sin);
        let b = wave_value(&globals, &recipe, 3.7, 1.2, 42.5, f32::sin);
        assert_eq!(a, b);

        let fast_a = wave_value(&globals, &recipe, 3.7, 1.2, 42.5, trig::fast_sin);
        let fast_b = wave_value(&globals, &recipe, 3.7, 1.2, 42.5, trig::fast_sin);
        assert_eq!(fast_a, fast_b);
    }

    #[test]
    fn wave_value_sums_four_terms() {
        let globals = GlobalParams {
            zoom_factor: 1.0,
            wave_amplitude: 1.0,
            wave_offset: 0.0,
            base_speed: 0.0,
        };
        let recipe = unit_recipe(ColorMode::Grayscale);

        // At the origin all four sines are sin(0).
        assert_eq!(wave_value(&globals, &recipe, 0.0, 0.0, 0.0, f32::sin), 0.0);

        // zx = pi/2, zy = 0: horizontal, diagonal and radial terms all see
        // pi/2, the vertical term sees 0.
        let value = wave_value(&globals, &recipe, FRAC_PI_2, 0.0, 0.0, f32::sin);
        assert!((value - 3.0).abs() < 1.0e-6);
    }

    #[test]
    fn radial_term_runs_against_the_clock() {
        let globals = GlobalParams {
            zoom_factor: 1.0,
            wave_amplitude: 1.0,
            wave_offset: 0.0,
            base_speed: 0.0,
        };
        let mut recipe = unit_recipe(ColorMode::Grayscale);
        recipe.speeds = [0.0, 0.0, 0.0, 1.0];

        let clock = 0.8;
        let value = wave_value(&globals, &recipe, 0.0, 0.0, clock, f32::sin);
        assert!((value - (-clock).sin()).abs() < 1.0e-6);
    }

    #[test]
    fn hsv_fixed_points() {
        assert_eq!(hsv_to_rgb(0.0, 0.0, 100.0), [255, 255, 255, 255]);
        assert_eq!(hsv_to_rgb(0.0, 100.0, 100.0), [255, 0, 0, 255]);
        assert_eq!(hsv_to_rgb(120.0, 100.0, 100.0), [0, 255, 0, 255]);
        assert_eq!(hsv_to_rgb(240.0, 100.0, 100.0), [0, 0, 255, 255]);
    }

    #[test]
    fn hsv_normalizes_out_of_range_hue() {
        assert_eq!(hsv_to_rgb(-360.0, 100.0, 100.0), [255, 0, 0, 255]);
        assert_eq!(hsv_to_rgb(480.0, 100.0, 100.0), [0, 255, 0, 255]);
        assert_eq!(hsv_to_rgb(-240.0, 100.0, 100.0), [0, 255, 0, 255]);
    }

    #[test]
    fn grayscale_maps_and_clamps() {
        let recipe = unit_recipe(ColorMode::Grayscale);
        assert_eq!(shade(200.0, &recipe, 0.0), [200, 200, 200, 255]);
        assert_eq!(shade(-50.0, &recipe, 0.0), [0, 0, 0, 255]);
        assert_eq!(shade(300.0, &recipe, 0.0), [255, 255, 255, 255]);
    }

    #[test]
    fn grayscale_clamp_happens_before_coefficients() {
        let mut recipe = unit_recipe(ColorMode::Grayscale);
        recipe.grayscale.red_coeff = 0.5;
        recipe.grayscale.green_coeff = 2.0;

        // 1000 clamps to 255 first: red is 127 (not 255 * something re-clamped
        // earlier), green saturates on the byte cast.
        assert_eq!(shade(1000.0, &recipe, 0.0), [127, 255, 255, 255]);
    }

    #[test]
    fn unknown_mode_rows_shade_black() {
        let mut config = flat_config(ColorMode::Unknown, 128.0);
        config.odd_rows.color_mode = ColorMode::Grayscale;

        let mut field = PlasmaField::new(config, 4, 3).unwrap();
        field.render_frame();

        let frame = field.frame_rgba();
        let row = |y: usize| &frame[y * 4 * 4..(y + 1) * 4 * 4];
        for y in [0, 2] {
            assert!(
                row(y).chunks_exact(4).all(|px| px == [0, 0, 0, 255]),
                "even row {y} should be opaque black"
            );
        }
        assert!(row(1).chunks_exact(4).all(|px| px == [128, 128, 128, 255]));
    }

    #[test]
    fn coordinate_tables_are_scaled_once() {
        let mut field = PlasmaField::new(PlasmaConfig::classic(), 16, 9).unwrap();
        let zoom = PlasmaConfig::classic().globals.zoom_factor;

        for (x, col) in field.col_x.iter().enumerate() {
            assert_eq!(*col, x as f32 / zoom);
        }
        for (y, row) in field.row_y.iter().enumerate() {
            assert_eq!(*row, y as f32 / zoom);
        }

        let cols = field.col_x.clone();
        let rows = field.row_y.clone();
        field.render_frame();
        field.render_frame();
        assert_eq!(field.col_x, cols);
        assert_eq!(field.row_y, rows);
    }

    #[test]
    fn empty_surface_is_rejected() {
        assert!(matches!(
            PlasmaField::new(PlasmaConfig::classic(), 0, 10),
            Err(RenderError::EmptySurface {
                width: 0,
                height: 10
            })
        ));
        assert!(PlasmaField::new(PlasmaConfig::classic(), 10, 0).is_err());
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let mut config = PlasmaConfig::classic();
        config.even_rows.scales[3] = 0.0;
        assert!(matches!(
            PlasmaField::new(config, 8, 8),
            Err(RenderError::Config(_))
        ));
    }

    #[test]
    fn flat_field_renders_black_with_opaque_alpha() {
        let mut field = PlasmaField::new(flat_config(ColorMode::Grayscale, 0.0), 2, 2).unwrap();
        field.render_frame();
        assert_eq!(field.frame_rgba().len(), 2 * 2 * 4);
        for pixel in field.frame_rgba().chunks_exact(4) {
            assert_eq!(pixel, [0, 0, 0, 255]);
        }
    }

    #[test]
    fn clock_advances_by_base_speed_per_frame() {
        let config = flat_config(ColorMode::Grayscale, 0.0);
        let mut field = PlasmaField::new(config, 2, 2).unwrap();
        assert_eq!(field.clock(), 0.0);

        let mut expected = 0.0f32;
        for _ in 0..5 {
            field.render_frame();
            expected += config.globals.base_speed;
            assert_eq!(field.clock(), expected);
        }
    }
}
