//! Cell payload model.
//!
//! # Responsibility
//! - Define the closed set of rich contents a cell can carry.
//! - Own the wire shape (`type` discriminator, base64 image data).
//!
//! # Invariants
//! - Every consumer matches `Payload` exhaustively; there is no open variant.
//! - Image bytes are raw in memory and base64 only on the wire.

use crate::model::color::Rgb;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Wire value of the `type` field for text payloads.
pub const PAYLOAD_TYPE_TEXT: &str = "text";
/// Wire value of the `type` field for code payloads.
pub const PAYLOAD_TYPE_CODE: &str = "code";
/// Wire value of the `type` field for image payloads.
pub const PAYLOAD_TYPE_IMAGE: &str = "image";

/// Rich content attached to one cell key.
///
/// Cloning produces an independent value, which is what subdivision relies on
/// when copying a parent payload into its children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Payload {
    /// Label rendered centered in the cell.
    Text { text: String, color: Rgb },
    /// Embedded source executed through the code sandbox.
    Code { code: String, language: String },
    /// Embedded image file contents.
    Image {
        #[serde(rename = "data", with = "base64_data")]
        bytes: Vec<u8>,
    },
}

/// Discriminator of a `Payload` without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    Text,
    Code,
    Image,
}

impl PayloadKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => PAYLOAD_TYPE_TEXT,
            Self::Code => PAYLOAD_TYPE_CODE,
            Self::Image => PAYLOAD_TYPE_IMAGE,
        }
    }

    /// Parses a wire `type` value. Unknown values return `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            PAYLOAD_TYPE_TEXT => Some(Self::Text),
            PAYLOAD_TYPE_CODE => Some(Self::Code),
            PAYLOAD_TYPE_IMAGE => Some(Self::Image),
            _ => None,
        }
    }
}

impl Display for PayloadKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Payload {
    pub fn text(text: impl Into<String>, color: Rgb) -> Self {
        Self::Text {
            text: text.into(),
            color,
        }
    }

    /// Creates a code payload. The language id is stored lowercase.
    pub fn code(code: impl Into<String>, language: impl AsRef<str>) -> Self {
        Self::Code {
            code: code.into(),
            language: language.as_ref().trim().to_ascii_lowercase(),
        }
    }

    pub fn image(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Image {
            bytes: bytes.into(),
        }
    }

    pub fn kind(&self) -> PayloadKind {
        match self {
            Self::Text { .. } => PayloadKind::Text,
            Self::Code { .. } => PayloadKind::Code,
            Self::Image { .. } => PayloadKind::Image,
        }
    }

    /// Returns `(code, language)` for code payloads.
    pub fn as_code(&self) -> Option<(&str, &str)> {
        match self {
            Self::Code { code, language } => Some((code.as_str(), language.as_str())),
            Self::Text { .. } | Self::Image { .. } => None,
        }
    }

    /// Short metadata-only description, safe for logs and listings.
    pub fn summary(&self) -> String {
        match self {
            Self::Text { text, color } => {
                format!("text chars={} color={color}", text.chars().count())
            }
            Self::Code { code, language } => {
                format!("code language={language} lines={}", code.lines().count())
            }
            Self::Image { bytes } => format!("image bytes={}", bytes.len()),
        }
    }
}

mod base64_data {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.trim())
            .map_err(|err| serde::de::Error::custom(format!("invalid base64 image data: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::{Payload, PayloadKind};
    use crate::model::color::Rgb;
    use serde_json::json;

    #[test]
    fn text_payload_uses_wire_fields() {
        let payload = Payload::text("north", Rgb(10, 20, 30));
        let json = serde_json::to_value(&payload).expect("text should serialize");
        assert_eq!(
            json,
            json!({"type": "text", "text": "north", "color": [10, 20, 30]})
        );
    }

    #[test]
    fn image_payload_is_base64_on_the_wire() {
        let payload = Payload::image(vec![0x89, b'P', b'N', b'G']);
        let json = serde_json::to_value(&payload).expect("image should serialize");
        assert_eq!(json, json!({"type": "image", "data": "iVBORw=="}));

        let decoded: Payload = serde_json::from_value(json).expect("image should decode");
        assert_eq!(decoded, payload);
    }

    #[test]
    fn rejects_invalid_base64() {
        let err = serde_json::from_value::<Payload>(json!({"type": "image", "data": "***"}))
            .expect_err("bad base64 must fail");
        assert!(err.to_string().contains("base64"), "unexpected error: {err}");
    }

    #[test]
    fn code_language_is_normalized() {
        let payload = Payload::code("print(1)", " Python ");
        assert_eq!(payload.as_code(), Some(("print(1)", "python")));
        assert_eq!(payload.kind(), PayloadKind::Code);
    }

    #[test]
    fn kind_parse_rejects_unknown_values() {
        assert_eq!(PayloadKind::parse("image"), Some(PayloadKind::Image));
        assert_eq!(PayloadKind::parse("video"), None);
        assert_eq!(PayloadKind::parse("Text"), None);
    }

    #[test]
    fn summary_never_contains_content() {
        let payload = Payload::text("secret label", Rgb::BLACK);
        assert!(!payload.summary().contains("secret"));
    }
}
