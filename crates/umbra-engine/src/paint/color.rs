use thiserror::Error;

/// Straight-alpha RGBA color with `f32` channels in `[0, 1]`.
///
/// Light colors are additive, so no premultiplication happens here; the light shader
/// scales by falloff and intensity itself.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Rejected hex color string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid hex color {input:?}: expected six hex digits (RRGGBB)")]
pub struct ParseColorError {
    pub input: String,
}

impl Color {
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    #[inline]
    pub const fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }

    #[inline]
    pub const fn white() -> Self {
        Self::rgb(1.0, 1.0, 1.0)
    }

    /// Creates an opaque color from 8-bit channels.
    #[inline]
    pub fn from_rgb_u8(r: u8, g: u8, b: u8) -> Self {
        Self::rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    /// Decodes `RRGGBB` or `#RRGGBB` into normalized RGB.
    pub fn from_hex(hex: &str) -> Result<Self, ParseColorError> {
        let err = || ParseColorError { input: hex.to_string() };

        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(err());
        }

        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| err());
        Ok(Self::from_rgb_u8(channel(0)?, channel(2)?, channel(4)?))
    }

    #[inline]
    pub fn to_rgb_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    #[inline]
    pub fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r as f64,
            g: self.g as f64,
            b: self.b as f64,
            a: self.a as f64,
        }
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── from_hex ──────────────────────────────────────────────────────────

    #[test]
    fn hex_without_hash() {
        let c = Color::from_hex("ff8000").unwrap();
        assert_eq!(c.r, 1.0);
        assert!((c.g - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(c.b, 0.0);
        assert_eq!(c.a, 1.0);
    }

    #[test]
    fn hex_with_hash_and_uppercase() {
        assert_eq!(Color::from_hex("#FFFFFF").unwrap(), Color::white());
    }

    #[test]
    fn hex_wrong_length_rejected() {
        assert!(Color::from_hex("fff").is_err());
        assert!(Color::from_hex("#ff00ff00").is_err());
    }

    #[test]
    fn hex_non_hex_digit_rejected() {
        let err = Color::from_hex("zz0000").unwrap_err();
        assert_eq!(err.input, "zz0000");
    }

    #[test]
    fn hex_multibyte_rejected_without_panic() {
        assert!(Color::from_hex("ééé").is_err());
    }
}
