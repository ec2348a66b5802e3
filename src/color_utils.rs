//! Class color palette shared by the compositor and anything drawing overlays.
//!
//! Colors are assigned by class id modulo the palette length, so the same
//! class always renders in the same color across images and sessions.

/// An sRGB color with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channels as floats in range 0.0-1.0.
    pub fn to_f32(self) -> [f32; 3] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        ]
    }
}

/// Fixed class palette. Order and values are stable across releases.
pub const PALETTE: [Rgb; 10] = [
    Rgb::new(255, 0, 0),     // red
    Rgb::new(0, 255, 0),     // green
    Rgb::new(0, 0, 255),     // blue
    Rgb::new(255, 255, 0),   // yellow
    Rgb::new(255, 0, 255),   // magenta
    Rgb::new(0, 255, 255),   // cyan
    Rgb::new(128, 0, 128),   // purple
    Rgb::new(255, 165, 0),   // orange
    Rgb::new(0, 128, 128),   // teal
    Rgb::new(128, 128, 0),   // olive
];

/// Resolve the display color for a class id.
///
/// Negative ids wrap with the Euclidean remainder so they still land in the palette.
pub fn class_color(class_id: i64) -> Rgb {
    let len = PALETTE.len() as i64;
    PALETTE[class_id.rem_euclid(len) as usize]
}
