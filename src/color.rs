use eframe::egui::Color32;
use palette::white_point::D65;
use palette::{Hsl, IntoColor, Lab, Srgb};

use crate::data::model::Group;

// ---------------------------------------------------------------------------
// Series palette
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            to_color32(rgb)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Measured colour → screen colour
// ---------------------------------------------------------------------------

/// Approximate on-screen colour of a CIELAB (D65) measurement.
/// Out-of-gamut values are clamped per component.
pub fn lab_to_color32(l: f64, a: f64, b: f64) -> Color32 {
    let lab: Lab<D65, f32> = Lab::new(l as f32, a as f32, b as f32);
    let rgb: Srgb = lab.into_color();
    to_color32(rgb)
}

/// Swatch for a group: the centre of its bounding box.
pub fn group_swatch(group: &Group) -> Color32 {
    let bounds = group.bounds();
    lab_to_color32(
        bounds.l.midpoint(),
        bounds.a.midpoint(),
        bounds.b.midpoint(),
    )
}

fn to_color32(rgb: Srgb) -> Color32 {
    let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color32::from_rgb(channel(rgb.red), channel(rgb.green), channel(rgb.blue))
}
