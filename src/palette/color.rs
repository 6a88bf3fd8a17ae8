//! 24-bit RGB colors and their hex text form.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::{Error, Result};

/// Opaque RGB color packed as `0xRRGGBB`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb(u32);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0x000000);
    pub const WHITE: Rgb = Rgb(0xFFFFFF);

    /// Create from a packed value. Any alpha byte is dropped.
    pub const fn from_u32(value: u32) -> Self {
        Self(value & 0xFFFFFF)
    }

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    pub const fn to_u32(self) -> u32 {
        self.0
    }

    pub const fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn b(self) -> u8 {
        self.0 as u8
    }

    /// Parse a hex color such as `"3FA2C0"` or `"#3fa2c0"`.
    ///
    /// Short input is right-padded with `0`, so `"FF"` reads as `FF0000`
    /// and the empty string reads as black.
    pub fn from_hex(text: &str) -> Result<Self> {
        let digits = text.trim().trim_start_matches('#');
        if digits.len() > 6 {
            return Err(Error::Parse(format!("Color code too long: {:?}", text)));
        }
        let padded = format!("{:0<6}", digits);
        u32::from_str_radix(&padded, 16)
            .map(Self::from_u32)
            .map_err(|_| Error::Parse(format!("Invalid color code: {:?}", text)))
    }

    /// Upper-case six digit hex, no prefix
    pub fn to_hex(self) -> String {
        format!("{:06X}", self.0)
    }

    /// Squared euclidean distance in RGB space
    pub fn distance_sq(self, other: Rgb) -> u32 {
        let dr = self.r() as i32 - other.r() as i32;
        let dg = self.g() as i32 - other.g() as i32;
        let db = self.b() as i32 - other.b() as i32;
        (dr * dr + dg * dg + db * db) as u32
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.to_hex())
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Rgb::from_hex(&text).map_err(serde::de::Error::custom)
    }
}
