use std::f32::consts::TAU;

use once_cell::sync::Lazy;

const TABLE_SIZE: usize = 2048;

static SINE_TABLE: Lazy<Vec<f32>> = Lazy::new(|| {
    (0..TABLE_SIZE)
        .map(|i| (i as f32 * TAU / TABLE_SIZE as f32).sin())
        .collect()
});

/// Nearest-entry lookup into one precomputed sine period.
pub fn fast_sin(x: f32) -> f32 {
    let pos = x.rem_euclid(TAU) * (TABLE_SIZE as f32 / TAU);
    let idx = (pos + 0.5) as usize % TABLE_SIZE;
    SINE_TABLE[idx]
}

/// Same signature as [`fast_sin`], no approximation.
pub fn exact_sin(x: f32) -> f32 {
    x.sin()
}
