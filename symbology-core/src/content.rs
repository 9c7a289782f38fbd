// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `content` module provides the decoded payload model shared by all symbologies.
//!
//! A decoder accumulates raw bytes into a [`Content`] together with a list of character-set
//! spans; the text view is assembled only when the caller asks for it.

use crate::charset::CharacterSet;
use crate::errors::{format_error, Result};

/// How the payload's application identifiers are flagged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AiFlag {
    #[default]
    None,
    /// FNC1 in first position: GS1 formatted data.
    Gs1,
    /// FNC1 in second position: AIM application indicator present.
    Aim,
}

/// Structured-append position of this symbol within a multi-symbol payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructuredAppendInfo {
    /// Zero-based index of this symbol.
    pub index: u16,
    /// Total symbol count.
    pub count: u16,
    /// Parity or file id tying the set together.
    pub id: String,
}

/// The AIM symbology identifier reported ahead of transmitted data, `]` + code letter +
/// modifier digit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SymbologyIdentifier {
    pub code: char,
    pub modifier: char,
    /// Added to `modifier` when the payload carries an explicit ECI.
    pub eci_modifier_offset: u8,
}

impl Default for SymbologyIdentifier {
    fn default() -> Self {
        SymbologyIdentifier { code: 'z', modifier: '0', eci_modifier_offset: 0 }
    }
}

impl SymbologyIdentifier {
    pub fn render(&self, has_eci: bool) -> String {
        let offset = if has_eci { self.eci_modifier_offset } else { 0 };
        let modifier = char::from(self.modifier as u8 + offset);
        format!("]{}{}", self.code, modifier)
    }
}

/// The decoded payload of one symbol plus its transport metadata.
///
/// Bytes are appended in decode order; every byte belongs to exactly one `(offset, charset)`
/// span, switches are monotonic in offset, and the final span extends to the end.
#[derive(Clone, Debug, Default)]
pub struct Content {
    bytes: Vec<u8>,
    encodings: Vec<(usize, CharacterSet)>,
    has_eci: bool,
    pub symbology: SymbologyIdentifier,
    pub ai_flag: AiFlag,
    pub structured_append: Option<StructuredAppendInfo>,
    pub reader_init: bool,
    pub ec_level: Option<String>,
    pub data_mask: Option<u8>,
    pub version_number: Option<u32>,
    pub is_mirrored: bool,
}

impl Content {
    pub fn new() -> Content {
        Content::default()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn push_byte(&mut self, byte: u8) {
        self.bytes.push(byte);
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Appends characters already known to be single-byte safe (digits, ASCII text emitted by
    /// the numeric and alphanumeric modes).
    pub fn push_str(&mut self, text: &str) {
        debug_assert!(text.is_ascii());
        self.bytes.extend_from_slice(text.as_bytes());
    }

    /// Inserts bytes at an arbitrary offset, keeping later character-set spans aligned. The
    /// inserted bytes take on the character set in effect at the insertion point.
    pub fn insert_bytes(&mut self, offset: usize, bytes: &[u8]) {
        assert!(offset <= self.bytes.len(), "insert offset out of range");
        self.bytes.splice(offset..offset, bytes.iter().copied());
        for span in self.encodings.iter_mut() {
            if span.0 >= offset.max(1) {
                span.0 += bytes.len();
            }
        }
    }

    /// Switches the character set for all subsequently appended bytes.
    pub fn switch_charset(&mut self, charset: CharacterSet) {
        match self.encodings.last_mut() {
            // No bytes arrived under the previous switch; it never took effect.
            Some(last) if last.0 == self.bytes.len() => last.1 = charset,
            _ => self.encodings.push((self.bytes.len(), charset)),
        }
    }

    /// Applies an in-stream ECI designator: validates the value, records that an ECI was seen,
    /// and switches the character set.
    pub fn apply_eci(&mut self, value: u32) -> Result<()> {
        if value >= crate::charset::ECI_RESERVED_START {
            return format_error("reserved eci value");
        }
        match CharacterSet::from_eci(value) {
            Some(cs) => {
                self.has_eci = true;
                self.switch_charset(cs);
                Ok(())
            }
            None => format_error("unknown eci value"),
        }
    }

    pub fn has_eci(&self) -> bool {
        self.has_eci
    }

    /// The raw payload bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The payload rendered as UTF-8, each span converted with its character set.
    ///
    /// Spans before the first switch use ISO 8859-1, the default interpretation for byte-mode
    /// data with no ECI in effect.
    pub fn text(&self) -> String {
        let mut out = String::new();
        let mut charset = CharacterSet::ISO8859_1;
        let mut start = 0;
        for &(offset, next) in &self.encodings {
            out.push_str(&charset.decode(&self.bytes[start..offset]));
            charset = next;
            start = offset;
        }
        out.push_str(&charset.decode(&self.bytes[start..]));
        out
    }

    /// The symbology identifier string, e.g. `]Q1`.
    pub fn symbology_identifier(&self) -> String {
        self.symbology.render(self.has_eci)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_default_latin1_text() {
        let mut content = Content::new();
        content.push_bytes(b"caf\xe9");
        assert_eq!(content.text(), "café");
        assert_eq!(content.bytes(), b"caf\xe9");
    }

    #[test]
    fn verify_eci_spans() {
        let mut content = Content::new();
        content.push_bytes(b"abc");
        content.apply_eci(26).unwrap();
        content.push_bytes("пример".as_bytes());
        content.apply_eci(3).unwrap();
        content.push_bytes(b"\xffz");
        assert_eq!(content.text(), "abcпример\u{ff}z");
        assert!(content.has_eci());
    }

    #[test]
    fn verify_unused_switch_is_replaced() {
        let mut content = Content::new();
        content.switch_charset(CharacterSet::UTF8);
        content.switch_charset(CharacterSet::Cp1251);
        content.push_bytes(&[0xc0]);
        // Only the last switch before any bytes takes effect.
        assert_eq!(content.text(), "А");
    }

    #[test]
    fn verify_reserved_and_unknown_eci() {
        let mut content = Content::new();
        assert!(content.apply_eci(999_899).is_err());
        assert!(content.apply_eci(14).is_err());
        assert!(content.apply_eci(899).is_ok());
    }

    #[test]
    fn verify_symbology_identifier() {
        let mut content = Content::new();
        content.symbology =
            SymbologyIdentifier { code: 'Q', modifier: '1', eci_modifier_offset: 1 };
        assert_eq!(content.symbology_identifier(), "]Q1");
        content.apply_eci(26).unwrap();
        assert_eq!(content.symbology_identifier(), "]Q2");
    }
}
