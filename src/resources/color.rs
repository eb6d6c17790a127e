use std::fmt;
use std::str::FromStr;

use glam::{Vec3, Vec4};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{PeopleError, Result};

/// Linear RGB color.
///
/// Hex values and CSS names are authored in sRGB and converted on the way in,
/// matching how artists pick colors in a web page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

// Small CSS subset, sRGB hex
const NAMED_COLORS: &[(&str, u32)] = &[
    ("black", 0x00_0000),
    ("white", 0xff_ffff),
    ("red", 0xff_0000),
    ("green", 0x00_8000),
    ("blue", 0x00_00ff),
    ("yellow", 0xff_ff00),
    ("cyan", 0x00_ffff),
    ("magenta", 0xff_00ff),
    ("gray", 0x80_8080),
    ("grey", 0x80_8080),
    ("silver", 0xc0_c0c0),
    ("orange", 0xff_a500),
    ("pink", 0xff_c0cb),
    ("hotpink", 0xff_69b4),
    ("purple", 0x80_0080),
    ("brown", 0xa5_2a2a),
    ("skyblue", 0x87_ceeb),
];

#[inline]
fn srgb_to_linear(c: f32) -> f32 {
    if c < 0.04045 {
        c * 0.077_399_38
    } else {
        ((c * 0.947_867_3) + 0.052_132_7).powf(2.4)
    }
}

#[inline]
fn linear_to_srgb(c: f32) -> f32 {
    if c < 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(0.416_666_66) - 0.055
    }
}

impl Color {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);

    /// Linear components, no conversion.
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// `0xrrggbb` in sRGB.
    #[must_use]
    pub fn from_hex(hex: u32) -> Self {
        let r = ((hex >> 16) & 0xff) as f32 / 255.0;
        let g = ((hex >> 8) & 0xff) as f32 / 255.0;
        let b = (hex & 0xff) as f32 / 255.0;
        Self::from_srgb(r, g, b)
    }

    #[must_use]
    pub fn from_srgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b))
    }

    /// Back to `0xrrggbb` sRGB, rounded.
    #[must_use]
    pub fn to_hex(&self) -> u32 {
        let q = |c: f32| (linear_to_srgb(c).clamp(0.0, 1.0) * 255.0).round() as u32;
        (q(self.r) << 16) | (q(self.g) << 8) | q(self.b)
    }

    /// Parses `#rrggbb`, `0xrrggbb`, a decimal integer or a CSS color name.
    pub fn parse(input: &str) -> Result<Self> {
        let s = input.trim();
        let invalid = || PeopleError::InvalidColor(input.to_string());

        let hex_digits = s
            .strip_prefix('#')
            .or_else(|| s.strip_prefix("0x"))
            .or_else(|| s.strip_prefix("0X"));

        if let Some(digits) = hex_digits {
            if digits.len() != 6 {
                return Err(invalid());
            }
            let value = u32::from_str_radix(digits, 16).map_err(|_| invalid())?;
            return Ok(Self::from_hex(value));
        }

        if let Ok(value) = s.parse::<u32>() {
            if value > 0xff_ffff {
                return Err(invalid());
            }
            return Ok(Self::from_hex(value));
        }

        let lower = s.to_ascii_lowercase();
        NAMED_COLORS
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|&(_, hex)| Self::from_hex(hex))
            .ok_or_else(invalid)
    }

    #[inline]
    #[must_use]
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.r, self.g, self.b)
    }

    #[inline]
    #[must_use]
    pub fn to_vec4(self, alpha: f32) -> Vec4 {
        Vec4::new(self.r, self.g, self.b, alpha)
    }

    #[must_use]
    pub fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: f64::from(self.r),
            g: f64::from(self.g),
            b: f64::from(self.b),
            a: 1.0,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<Vec3> for Color {
    fn from(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl FromStr for Color {
    type Err = PeopleError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.to_hex())
    }
}

// Config files carry colors either as strings or as plain integers.
#[derive(Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Hex(u32),
    Text(String),
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match ColorRepr::deserialize(deserializer)? {
            ColorRepr::Hex(v) if v <= 0xff_ffff => Ok(Self::from_hex(v)),
            ColorRepr::Hex(v) => Err(serde::de::Error::custom(format!("color out of range: {v:#x}"))),
            ColorRepr::Text(s) => Self::parse(&s).map_err(serde::de::Error::custom),
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}
