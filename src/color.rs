use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

// ---------------------------------------------------------------------------
// Condition palette
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn condition_palette(n: usize) -> Vec<[u8; 3]> {
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            let rgb: Srgb<u8> = rgb.into_format();
            [rgb.red, rgb.green, rgb.blue]
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Statistic colormap
// ---------------------------------------------------------------------------

/// Diverging map for a signed statistic scaled to `[-1, 1]`.
///
/// Positive values run dark red → yellow, negative values dark blue → cyan,
/// so the sign stays visible against a light background.
pub fn cold_hot(t: f64) -> [u8; 3] {
    let t = if t.is_finite() { t.clamp(-1.0, 1.0) } else { 0.0 };
    let (low, high) = if t >= 0.0 {
        (LinSrgb::new(0.35, 0.0, 0.0), LinSrgb::new(1.0, 1.0, 0.0))
    } else {
        (LinSrgb::new(0.0, 0.0, 0.35), LinSrgb::new(0.0, 1.0, 1.0))
    };
    let lin = low.mix(high, t.abs() as f32);
    let rgb: Srgb<f32> = Srgb::from_linear(lin);
    let rgb: Srgb<u8> = rgb.into_format();
    [rgb.red, rgb.green, rgb.blue]
}

/// Colour of a value relative to the symmetric range `[-vmax, vmax]`.
pub fn color_for(value: f64, vmax: f64) -> [u8; 3] {
    if vmax > 0.0 {
        cold_hot(value / vmax)
    } else {
        cold_hot(0.0)
    }
}
