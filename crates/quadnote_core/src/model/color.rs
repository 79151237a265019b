//! Packed 24-bit RGB colors.
//!
//! Layer nodes store colors as `0xRRGGBB` integers where `0` means empty.
//! Text payloads store their color as an `[r, g, b]` triple.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

static HEX_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#?([0-9a-fA-F]{6})$").expect("valid hex color regex"));

/// Packed node value for an empty cell.
pub const EMPTY: u32 = 0;

/// One RGB color, serialized as a three-element array.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);

    /// Packs into the `0xRRGGBB` node representation.
    pub fn pack(self) -> u32 {
        (u32::from(self.0) << 16) | (u32::from(self.1) << 8) | u32::from(self.2)
    }

    /// Unpacks a node value. Bits above 24 are ignored.
    pub fn from_packed(value: u32) -> Self {
        Self(
            ((value >> 16) & 0xFF) as u8,
            ((value >> 8) & 0xFF) as u8,
            (value & 0xFF) as u8,
        )
    }

    /// Parses `#rrggbb` or `rrggbb`.
    pub fn parse_hex(value: &str) -> Option<Self> {
        let captures = HEX_COLOR_RE.captures(value.trim())?;
        let packed = u32::from_str_radix(&captures[1], 16).ok()?;
        Some(Self::from_packed(packed))
    }
}

impl Display for Rgb {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

#[cfg(test)]
mod tests {
    use super::Rgb;

    #[test]
    fn pack_and_unpack_are_inverse() {
        let color = Rgb(0x4b, 0x53, 0x20);
        assert_eq!(color.pack(), 0x4b5320);
        assert_eq!(Rgb::from_packed(0x4b5320), color);
    }

    #[test]
    fn parse_hex_accepts_optional_hash() {
        assert_eq!(Rgb::parse_hex("#ff0080"), Some(Rgb(255, 0, 128)));
        assert_eq!(Rgb::parse_hex(" FF0080 "), Some(Rgb(255, 0, 128)));
        assert_eq!(Rgb::parse_hex("#fff"), None);
        assert_eq!(Rgb::parse_hex("red"), None);
    }

    #[test]
    fn display_renders_lowercase_hex() {
        assert_eq!(Rgb(1, 171, 255).to_string(), "#01abff");
    }

    #[test]
    fn serializes_as_triple() {
        let json = serde_json::to_value(Rgb(1, 2, 3)).expect("rgb should serialize");
        assert_eq!(json, serde_json::json!([1, 2, 3]));
    }
}
