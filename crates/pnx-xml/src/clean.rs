//! Text-level pre-pass applied before the document reaches the parser.
//!
//! Exports produced by some engineering tools contain numeric character
//! references such as `&#x0;` that no conforming parser accepts. The pass has
//! no structural awareness: it works on the raw text only.

use std::borrow::Cow;
use std::sync::OnceLock;

use encoding_rs::GBK;
use regex::Regex;
use tracing::{debug, warn};

use crate::XmlError;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

static CHAR_REF: OnceLock<Option<Regex>> = OnceLock::new();

fn char_ref_pattern() -> Option<&'static Regex> {
    CHAR_REF
        .get_or_init(|| Regex::new(r"&#(?:[xX][0-9a-fA-F]+|[0-9]+);").ok())
        .as_ref()
}

/// Decode raw file bytes into text.
///
/// A UTF-8 byte order mark is dropped and UTF-16 byte order marks select the
/// matching decoder. Input that is not valid UTF-8 is tried as GBK, the
/// usual encoding of exports from Chinese-language tools, and otherwise read
/// as ISO-8859-1 so that decoding never rejects a file outright.
pub fn decode(bytes: &[u8]) -> Result<String, XmlError> {
    if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        return decode_8bit(rest);
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_LE_BOM) {
        return decode_utf16(rest, u16::from_le_bytes);
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_BE_BOM) {
        return decode_utf16(rest, u16::from_be_bytes);
    }
    decode_8bit(bytes)
}

fn decode_8bit(bytes: &[u8]) -> Result<String, XmlError> {
    let err = match std::str::from_utf8(bytes) {
        Ok(text) => return Ok(text.to_string()),
        Err(err) => err,
    };
    if let Some(text) = GBK.decode_without_bom_handling_and_without_replacement(bytes) {
        warn!(
            offset = err.valid_up_to(),
            "input is not valid UTF-8; decoded as GBK"
        );
        return Ok(text.into_owned());
    }
    warn!(
        offset = err.valid_up_to(),
        "input is neither UTF-8 nor GBK; decoding as ISO-8859-1"
    );
    Ok(bytes.iter().map(|&b| char::from(b)).collect())
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Result<String, XmlError> {
    if bytes.len() % 2 != 0 {
        return Err(XmlError::Encoding(format!(
            "UTF-16 input has odd length {}",
            bytes.len()
        )));
    }
    let units = bytes.chunks_exact(2).map(|pair| unit([pair[0], pair[1]]));
    char::decode_utf16(units)
        .collect::<Result<String, _>>()
        .map_err(|err| XmlError::Encoding(format!("invalid UTF-16: {err}")))
}

/// Remove every numeric character reference (`&#123;`, `&#x1F;`).
///
/// The referenced characters are dropped, never substituted.
pub fn strip_char_refs(text: &str) -> Cow<'_, str> {
    let Some(pattern) = char_ref_pattern() else {
        return Cow::Borrowed(text);
    };
    let stripped = pattern.replace_all(text, "");
    if let Cow::Owned(_) = stripped {
        debug!(
            removed = pattern.find_iter(text).count(),
            "stripped numeric character references"
        );
    }
    stripped
}

/// Remove the C0 control characters that XML 1.0 forbids, keeping tab, line
/// feed and carriage return, and a leading byte order mark.
pub fn strip_control_chars(text: &str) -> Cow<'_, str> {
    let is_dropped = |c: char| c < '\u{20}' && !matches!(c, '\t' | '\n' | '\r');
    let body = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    if !body.chars().any(is_dropped) {
        return Cow::Borrowed(body);
    }
    Cow::Owned(body.chars().filter(|&c| !is_dropped(c)).collect())
}

/// Full pre-pass: character references first, then control characters.
pub fn clean(text: &str) -> String {
    let without_refs = strip_char_refs(text);
    strip_control_chars(&without_refs).into_owned()
}
