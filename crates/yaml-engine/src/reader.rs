//! Decoding of the raw input into the text handed to the scanner.
//!
//! The reader accepts UTF-8 and UTF-16 (either byte order). With
//! [`Encoding::Any`] the encoding is taken from a leading BOM and defaults to
//! UTF-8. Malformed sequences and non-printable characters are reported as
//! reader errors carrying the byte offset and the offending value.

use crate::{EngineError, Result};

/// Input or output text encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// Let the engine decide (BOM sniffing on input, UTF-8 on output)
    #[default]
    Any,
    Utf8,
    Utf16Le,
    Utf16Be,
}

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Decode `input` as `encoding`, validating that every character is printable.
pub fn decode(input: &[u8], encoding: Encoding) -> Result<String> {
    let (encoding, skip) = match encoding {
        Encoding::Any => sniff(input),
        other => (other, 0),
    };
    let bytes = &input[skip..];
    let text = match encoding {
        Encoding::Utf16Le => decode_utf16(bytes, skip, u16::from_le_bytes)?,
        Encoding::Utf16Be => decode_utf16(bytes, skip, u16::from_be_bytes)?,
        Encoding::Utf8 | Encoding::Any => decode_utf8(bytes, skip)?,
    };
    Ok(text)
}

fn sniff(input: &[u8]) -> (Encoding, usize) {
    if input.starts_with(UTF16LE_BOM) {
        (Encoding::Utf16Le, UTF16LE_BOM.len())
    } else if input.starts_with(UTF16BE_BOM) {
        (Encoding::Utf16Be, UTF16BE_BOM.len())
    } else if input.starts_with(UTF8_BOM) {
        (Encoding::Utf8, UTF8_BOM.len())
    } else {
        (Encoding::Utf8, 0)
    }
}

fn decode_utf8(bytes: &[u8], base: usize) -> Result<String> {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => return Err(utf8_error(bytes, base, &err)),
    };
    for (index, ch) in text.char_indices() {
        check_printable(ch, base + index)?;
    }
    Ok(text.to_string())
}

fn utf8_error(bytes: &[u8], base: usize, err: &std::str::Utf8Error) -> EngineError {
    let offset = err.valid_up_to();
    let lead = bytes[offset];
    if !(0xC2..=0xF4).contains(&lead) {
        return EngineError::reader("invalid leading UTF-8 octet", base + offset, u32::from(lead));
    }
    if err.error_len().is_none() {
        return EngineError::reader(
            "incomplete UTF-8 octet sequence",
            base + offset,
            u32::from(lead),
        );
    }
    // The lead byte is fine, so one of the following octets is not.
    let trailing = (offset + 1..bytes.len().min(offset + 4))
        .find(|&i| bytes[i] & 0xC0 != 0x80)
        .unwrap_or(offset + 1)
        .min(bytes.len() - 1);
    EngineError::reader(
        "invalid trailing UTF-8 octet",
        base + trailing,
        u32::from(bytes[trailing]),
    )
}

fn decode_utf16(bytes: &[u8], base: usize, unit: fn([u8; 2]) -> u16) -> Result<String> {
    let mut text = String::with_capacity(bytes.len() / 2);
    let mut offset = 0;
    while offset < bytes.len() {
        if offset + 2 > bytes.len() {
            return Err(EngineError::reader(
                "incomplete UTF-16 character",
                base + offset,
                u32::from(bytes[offset]),
            ));
        }
        let first = unit([bytes[offset], bytes[offset + 1]]);
        let (value, width) = match first {
            0xDC00..=0xDFFF => {
                return Err(EngineError::reader(
                    "unexpected low surrogate area",
                    base + offset,
                    u32::from(first),
                ));
            }
            0xD800..=0xDBFF => {
                if offset + 4 > bytes.len() {
                    return Err(EngineError::reader(
                        "incomplete UTF-16 surrogate pair",
                        base + offset,
                        u32::from(first),
                    ));
                }
                let second = unit([bytes[offset + 2], bytes[offset + 3]]);
                if !(0xDC00..=0xDFFF).contains(&second) {
                    return Err(EngineError::reader(
                        "expected low surrogate area",
                        base + offset + 2,
                        u32::from(second),
                    ));
                }
                let value =
                    0x10000 + ((u32::from(first) & 0x3FF) << 10) + (u32::from(second) & 0x3FF);
                (value, 4)
            }
            _ => (u32::from(first), 2),
        };
        // Surrogates were handled above, so every value here is a scalar value.
        let ch = char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER);
        check_printable(ch, base + offset)?;
        text.push(ch);
        offset += width;
    }
    Ok(text)
}

/// The characters YAML allows in a stream.
pub fn is_printable(ch: char) -> bool {
    matches!(
        ch,
        '\t' | '\n'
            | '\r'
            | '\u{20}'..='\u{7E}'
            | '\u{85}'
            | '\u{A0}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

fn check_printable(ch: char, offset: usize) -> Result<()> {
    if is_printable(ch) {
        Ok(())
    } else {
        Err(EngineError::reader(
            "control characters are not allowed",
            offset,
            u32::from(ch),
        ))
    }
}
