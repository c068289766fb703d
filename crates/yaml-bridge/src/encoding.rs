//! Input normalization ahead of the engine reader.
//!
//! The engine only understands UTF-8 and UTF-16. Input is classified by, in
//! order: byte order mark, a BOM-less UTF-16 heuristic, strict UTF-8
//! validation, and finally a Windows-1252 fallback that transcodes to UTF-8.

use tracing::debug;
use yaml_engine::Encoding;

/// Which rule classified the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Detection {
    Utf16LeBom,
    Utf16BeBom,
    Utf8Bom,
    Utf16LeHeuristic,
    Utf16BeHeuristic,
    Utf8,
    Windows1252,
}

/// Bytes ready for the engine, with the encoding it must assume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedInput {
    pub bytes: Vec<u8>,
    pub encoding: Encoding,
    pub detection: Detection,
}

const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

pub fn normalize(mut input: Vec<u8>) -> NormalizedInput {
    let (encoding, detection) = if input.starts_with(UTF16_LE_BOM) {
        input.drain(..UTF16_LE_BOM.len());
        (Encoding::Utf16Le, Detection::Utf16LeBom)
    } else if input.starts_with(UTF16_BE_BOM) {
        input.drain(..UTF16_BE_BOM.len());
        (Encoding::Utf16Be, Detection::Utf16BeBom)
    } else if input.starts_with(UTF8_BOM) {
        input.drain(..UTF8_BOM.len());
        (Encoding::Utf8, Detection::Utf8Bom)
    } else if looks_like_utf16(&input, u16::from_le_bytes) {
        (Encoding::Utf16Le, Detection::Utf16LeHeuristic)
    } else if looks_like_utf16(&input, u16::from_be_bytes) {
        (Encoding::Utf16Be, Detection::Utf16BeHeuristic)
    } else if std::str::from_utf8(&input).is_ok() {
        (Encoding::Utf8, Detection::Utf8)
    } else {
        input = windows_1252_to_utf8(&input).into_bytes();
        (Encoding::Utf8, Detection::Windows1252)
    };
    debug!(?detection, len = input.len(), "normalized YAML input");
    NormalizedInput {
        bytes: input,
        encoding,
        detection,
    }
}

fn looks_like_utf16(input: &[u8], unit: fn([u8; 2]) -> u16) -> bool {
    if input.is_empty() || input.len() % 2 != 0 {
        return false;
    }
    let units: Vec<u16> = input
        .chunks_exact(2)
        .map(|pair| unit([pair[0], pair[1]]))
        .collect();

    if units.iter().all(|&u| (1..0x80).contains(&u)) {
        return true;
    }

    let high_zero = units.iter().filter(|&&u| u >> 8 == 0).count();
    let low_zero = units.iter().filter(|&&u| u & 0xFF == 0).count();
    let has_whitespace = units
        .iter()
        .any(|&u| matches!(u, 0x09 | 0x0A | 0x0D | 0x20));
    high_zero * 2 >= units.len() && low_zero * 4 < units.len() && has_whitespace
}

/// Code points for 0x80..=0x9F; the five undefined bytes map to themselves.
const WINDOWS_1252_HIGH: [char; 32] = [
    '\u{20AC}', '\u{81}', '\u{201A}', '\u{192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{2C6}', '\u{2030}', '\u{160}', '\u{2039}', '\u{152}', '\u{8D}', '\u{17D}', '\u{8F}',
    '\u{90}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{2DC}', '\u{2122}', '\u{161}', '\u{203A}', '\u{153}', '\u{9D}', '\u{17E}', '\u{178}',
];

fn windows_1252_to_utf8(input: &[u8]) -> String {
    input
        .iter()
        .map(|&byte| match byte {
            0x80..=0x9F => WINDOWS_1252_HIGH[usize::from(byte - 0x80)],
            _ => char::from(byte),
        })
        .collect()
}
