//! Colors and the two output color models.

use serde::{Deserialize, Serialize};

/// Which device color space text, strokes and images are written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Rgb,
    Cmyk,
}

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64, // 0.0 - 1.0
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`. Unparseable input is black.
    pub fn hex(hex: &str) -> Self {
        let hex = hex.trim().trim_start_matches('#');
        let channel = |s: &str| u8::from_str_radix(s, 16).unwrap_or(0) as f64 / 255.0;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Color::BLACK;
        }
        match hex.len() {
            3 => Self::rgb(
                channel(&hex[0..1].repeat(2)),
                channel(&hex[1..2].repeat(2)),
                channel(&hex[2..3].repeat(2)),
            ),
            6 | 8 => Self {
                r: channel(&hex[0..2]),
                g: channel(&hex[2..4]),
                b: channel(&hex[4..6]),
                a: if hex.len() == 8 { channel(&hex[6..8]) } else { 1.0 },
            },
            _ => Color::BLACK,
        }
    }

    /// `[c, m, y, k]`, each 0.0 - 1.0.
    pub fn to_cmyk(&self) -> [f64; 4] {
        let k = 1.0 - self.r.max(self.g).max(self.b);
        if k >= 1.0 {
            return [0.0, 0.0, 0.0, 1.0];
        }
        [
            (1.0 - self.r - k) / (1.0 - k),
            (1.0 - self.g - k) / (1.0 - k),
            (1.0 - self.b - k) / (1.0 - k),
            k,
        ]
    }

    /// Channel values in the given color model: three for RGB, four for CMYK.
    pub fn rgb_or_cmyk(&self, mode: ColorMode) -> Vec<f64> {
        match mode {
            ColorMode::Rgb => vec![self.r, self.g, self.b],
            ColorMode::Cmyk => self.to_cmyk().to_vec(),
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// Byte-level RGB → CMYK for pixel data.
pub fn rgb_to_cmyk_bytes(r: u8, g: u8, b: u8) -> [u8; 4] {
    let color = Color::rgb(r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0);
    color.to_cmyk().map(|v| (v * 255.0).round().clamp(0.0, 255.0) as u8)
}
