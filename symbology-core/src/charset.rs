// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `charset` module provides the character-set register used by Extended Channel
//! Interpretation (ECI) and byte-mode segments.
//!
//! The core stores decoded payloads as raw bytes tagged with a `CharacterSet`; conversion to
//! UTF-8 happens only at the output boundary.

/// A named character set from the AIM ECI register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharacterSet {
    Cp437,
    ISO8859_1,
    ISO8859_2,
    ISO8859_3,
    ISO8859_4,
    ISO8859_5,
    ISO8859_6,
    ISO8859_7,
    ISO8859_8,
    ISO8859_9,
    ISO8859_10,
    ISO8859_11,
    ISO8859_13,
    ISO8859_14,
    ISO8859_15,
    ISO8859_16,
    ShiftJIS,
    Cp1250,
    Cp1251,
    Cp1252,
    Cp1256,
    /// UTF-16 big-endian, no byte-order mark.
    UnicodeBig,
    UTF8,
    ASCII,
    Big5,
    GB2312,
    GB18030,
    EucKr,
    /// Raw bytes, no character semantics.
    Binary,
}

/// ECI values at or above this are reserved by the AIM register.
pub const ECI_RESERVED_START: u32 = 999_899;

impl CharacterSet {
    /// Looks up a character set by name.
    ///
    /// Matching is ASCII case-insensitive and ignores `-`, `_`, and spaces, so `"Shift_JIS"`,
    /// `"shift-jis"`, and `"SJIS"` all resolve to the same set.
    pub fn from_name(name: &str) -> Option<CharacterSet> {
        let normalized: String = name
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let cs = match normalized.as_str() {
            "cp437" | "ibm437" => CharacterSet::Cp437,
            "iso88591" | "latin1" => CharacterSet::ISO8859_1,
            "iso88592" => CharacterSet::ISO8859_2,
            "iso88593" => CharacterSet::ISO8859_3,
            "iso88594" => CharacterSet::ISO8859_4,
            "iso88595" => CharacterSet::ISO8859_5,
            "iso88596" => CharacterSet::ISO8859_6,
            "iso88597" => CharacterSet::ISO8859_7,
            "iso88598" => CharacterSet::ISO8859_8,
            "iso88599" => CharacterSet::ISO8859_9,
            "iso885910" => CharacterSet::ISO8859_10,
            "iso885911" => CharacterSet::ISO8859_11,
            "iso885913" => CharacterSet::ISO8859_13,
            "iso885914" => CharacterSet::ISO8859_14,
            "iso885915" => CharacterSet::ISO8859_15,
            "iso885916" => CharacterSet::ISO8859_16,
            "sjis" | "shiftjis" => CharacterSet::ShiftJIS,
            "cp1250" | "windows1250" => CharacterSet::Cp1250,
            "cp1251" | "windows1251" => CharacterSet::Cp1251,
            "cp1252" | "windows1252" => CharacterSet::Cp1252,
            "cp1256" | "windows1256" => CharacterSet::Cp1256,
            "unicodebig" | "unicodebigunmarked" | "utf16be" | "utf16" => CharacterSet::UnicodeBig,
            "utf8" => CharacterSet::UTF8,
            "ascii" | "usascii" => CharacterSet::ASCII,
            "big5" => CharacterSet::Big5,
            "gb2312" => CharacterSet::GB2312,
            "gb18030" | "gbk" | "euccn" => CharacterSet::GB18030,
            "euckr" => CharacterSet::EucKr,
            "binary" => CharacterSet::Binary,
            _ => return None,
        };
        Some(cs)
    }

    /// Maps an in-stream ECI designator value to its character set.
    pub fn from_eci(value: u32) -> Option<CharacterSet> {
        let cs = match value {
            0 | 2 => CharacterSet::Cp437,
            1 | 3 => CharacterSet::ISO8859_1,
            4 => CharacterSet::ISO8859_2,
            5 => CharacterSet::ISO8859_3,
            6 => CharacterSet::ISO8859_4,
            7 => CharacterSet::ISO8859_5,
            8 => CharacterSet::ISO8859_6,
            9 => CharacterSet::ISO8859_7,
            10 => CharacterSet::ISO8859_8,
            11 => CharacterSet::ISO8859_9,
            12 => CharacterSet::ISO8859_10,
            13 => CharacterSet::ISO8859_11,
            15 => CharacterSet::ISO8859_13,
            16 => CharacterSet::ISO8859_14,
            17 => CharacterSet::ISO8859_15,
            18 => CharacterSet::ISO8859_16,
            20 => CharacterSet::ShiftJIS,
            21 => CharacterSet::Cp1250,
            22 => CharacterSet::Cp1251,
            23 => CharacterSet::Cp1252,
            24 => CharacterSet::Cp1256,
            25 => CharacterSet::UnicodeBig,
            26 => CharacterSet::UTF8,
            27 | 170 => CharacterSet::ASCII,
            28 => CharacterSet::Big5,
            29 => CharacterSet::GB2312,
            30 => CharacterSet::EucKr,
            31 | 32 => CharacterSet::GB18030,
            899 => CharacterSet::Binary,
            _ => return None,
        };
        Some(cs)
    }

    /// The canonical ECI designator value for this character set.
    pub fn eci(&self) -> u32 {
        match *self {
            CharacterSet::Cp437 => 2,
            CharacterSet::ISO8859_1 => 3,
            CharacterSet::ISO8859_2 => 4,
            CharacterSet::ISO8859_3 => 5,
            CharacterSet::ISO8859_4 => 6,
            CharacterSet::ISO8859_5 => 7,
            CharacterSet::ISO8859_6 => 8,
            CharacterSet::ISO8859_7 => 9,
            CharacterSet::ISO8859_8 => 10,
            CharacterSet::ISO8859_9 => 11,
            CharacterSet::ISO8859_10 => 12,
            CharacterSet::ISO8859_11 => 13,
            CharacterSet::ISO8859_13 => 15,
            CharacterSet::ISO8859_14 => 16,
            CharacterSet::ISO8859_15 => 17,
            CharacterSet::ISO8859_16 => 18,
            CharacterSet::ShiftJIS => 20,
            CharacterSet::Cp1250 => 21,
            CharacterSet::Cp1251 => 22,
            CharacterSet::Cp1252 => 23,
            CharacterSet::Cp1256 => 24,
            CharacterSet::UnicodeBig => 25,
            CharacterSet::UTF8 => 26,
            CharacterSet::ASCII => 27,
            CharacterSet::Big5 => 28,
            CharacterSet::GB2312 => 29,
            CharacterSet::EucKr => 30,
            CharacterSet::GB18030 => 32,
            CharacterSet::Binary => 899,
        }
    }

    fn encoding(&self) -> Option<&'static encoding_rs::Encoding> {
        use encoding_rs::*;
        let enc = match *self {
            CharacterSet::ISO8859_2 => ISO_8859_2,
            CharacterSet::ISO8859_3 => ISO_8859_3,
            CharacterSet::ISO8859_4 => ISO_8859_4,
            CharacterSet::ISO8859_5 => ISO_8859_5,
            CharacterSet::ISO8859_6 => ISO_8859_6,
            CharacterSet::ISO8859_7 => ISO_8859_7,
            CharacterSet::ISO8859_8 => ISO_8859_8,
            // The web encoding for the Turkish and Thai sets are the windows supersets.
            CharacterSet::ISO8859_9 => WINDOWS_1254,
            CharacterSet::ISO8859_10 => ISO_8859_10,
            CharacterSet::ISO8859_11 => WINDOWS_874,
            CharacterSet::ISO8859_13 => ISO_8859_13,
            CharacterSet::ISO8859_14 => ISO_8859_14,
            CharacterSet::ISO8859_15 => ISO_8859_15,
            CharacterSet::ISO8859_16 => ISO_8859_16,
            CharacterSet::ShiftJIS => SHIFT_JIS,
            CharacterSet::Cp1250 => WINDOWS_1250,
            CharacterSet::Cp1251 => WINDOWS_1251,
            CharacterSet::Cp1252 => WINDOWS_1252,
            CharacterSet::Cp1256 => WINDOWS_1256,
            CharacterSet::UnicodeBig => UTF_16BE,
            CharacterSet::UTF8 => UTF_8,
            CharacterSet::Big5 => BIG5,
            CharacterSet::GB2312 | CharacterSet::GB18030 => GB18030,
            CharacterSet::EucKr => EUC_KR,
            _ => return None,
        };
        Some(enc)
    }

    /// Decodes `bytes` to a UTF-8 string. Bytes with no mapping decode to U+FFFD.
    pub fn decode(&self, bytes: &[u8]) -> String {
        match *self {
            // True Latin-1 (not the windows-1252 superset): bytes are code points. Binary
            // payloads render the same way so the text view stays lossless and reversible.
            CharacterSet::ISO8859_1 | CharacterSet::Binary => {
                bytes.iter().map(|&b| char::from(b)).collect()
            }
            CharacterSet::ASCII => {
                bytes.iter().map(|&b| if b < 0x80 { char::from(b) } else { '\u{fffd}' }).collect()
            }
            CharacterSet::Cp437 => {
                bytes
                    .iter()
                    .map(|&b| {
                        if b < 0x80 {
                            char::from(b)
                        }
                        else {
                            CP437_HIGH[usize::from(b - 0x80)]
                        }
                    })
                    .collect()
            }
            _ => {
                let (text, _, _) = self.encoding().unwrap().decode(bytes);
                text.into_owned()
            }
        }
    }

    /// Encodes `text` into this character set, or `None` if it is not representable.
    pub fn encode(&self, text: &str) -> Option<Vec<u8>> {
        match *self {
            CharacterSet::ISO8859_1 | CharacterSet::Binary => {
                text.chars().map(|c| u8::try_from(u32::from(c)).ok()).collect()
            }
            CharacterSet::ASCII => {
                if text.is_ascii() {
                    Some(text.as_bytes().to_vec())
                }
                else {
                    None
                }
            }
            CharacterSet::Cp437 => {
                text.chars()
                    .map(|c| {
                        if c.is_ascii() {
                            Some(c as u8)
                        }
                        else {
                            CP437_HIGH.iter().position(|&h| h == c).map(|i| 0x80 + i as u8)
                        }
                    })
                    .collect()
            }
            CharacterSet::UnicodeBig => {
                let mut out = Vec::with_capacity(text.len() * 2);
                for unit in text.encode_utf16() {
                    out.extend_from_slice(&unit.to_be_bytes());
                }
                Some(out)
            }
            CharacterSet::UTF8 => Some(text.as_bytes().to_vec()),
            _ => {
                let (bytes, _, had_errors) = self.encoding().unwrap().encode(text);
                if had_errors {
                    None
                }
                else {
                    Some(bytes.into_owned())
                }
            }
        }
    }
}

/// The upper half of code page 437.
const CP437_HIGH: [char; 128] = [
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å',
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', '¢', '£', '¥', '₧', 'ƒ',
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '⌐', '¬', '½', '¼', '¡', '«', '»',
    '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛', '┐',
    '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦', '╠', '═', '╬', '╧',
    '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀',
    'α', 'ß', 'Γ', 'π', 'Σ', 'σ', 'µ', 'τ', 'Φ', 'Θ', 'Ω', 'δ', '∞', 'φ', 'ε', '∩',
    '≡', '±', '≥', '≤', '⌠', '⌡', '÷', '≈', '°', '∙', '·', '√', 'ⁿ', '²', '■', '\u{a0}',
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_name_matching() {
        assert_eq!(CharacterSet::from_name("Shift_JIS"), Some(CharacterSet::ShiftJIS));
        assert_eq!(CharacterSet::from_name("shift-jis"), Some(CharacterSet::ShiftJIS));
        assert_eq!(CharacterSet::from_name("SJIS"), Some(CharacterSet::ShiftJIS));
        assert_eq!(CharacterSet::from_name("ISO-8859-1"), Some(CharacterSet::ISO8859_1));
        assert_eq!(CharacterSet::from_name("iso8859_15"), Some(CharacterSet::ISO8859_15));
        assert_eq!(CharacterSet::from_name("windows-1251"), Some(CharacterSet::Cp1251));
        assert_eq!(CharacterSet::from_name("UTF-8"), Some(CharacterSet::UTF8));
        assert_eq!(CharacterSet::from_name("no-such-set"), None);
        // ISO 8859-12 was never assigned.
        assert_eq!(CharacterSet::from_name("ISO-8859-12"), None);
    }

    #[test]
    fn verify_eci_round_trip() {
        for value in [2u32, 3, 4, 9, 13, 15, 18, 20, 22, 25, 26, 27, 28, 29, 30, 899] {
            let cs = CharacterSet::from_eci(value).unwrap();
            assert_eq!(CharacterSet::from_eci(cs.eci()), Some(cs));
        }
        assert_eq!(CharacterSet::from_eci(14), None);
        assert_eq!(CharacterSet::from_eci(1000), None);
    }

    #[test]
    fn verify_latin1_decode_is_not_windows1252() {
        // 0x80..0x9f are C1 controls in Latin-1, printable in windows-1252.
        assert_eq!(CharacterSet::ISO8859_1.decode(&[0x80]), "\u{80}");
        assert_eq!(CharacterSet::Cp1252.decode(&[0x80]), "€");
    }

    #[test]
    fn verify_shift_jis_round_trip() {
        let bytes = CharacterSet::ShiftJIS.encode("日本").unwrap();
        assert_eq!(bytes, [0x93, 0xfa, 0x96, 0x7b]);
        assert_eq!(CharacterSet::ShiftJIS.decode(&bytes), "日本");
        assert_eq!(CharacterSet::ShiftJIS.encode("ψ♥"), None);
    }

    #[test]
    fn verify_cp437_high_half() {
        assert_eq!(CharacterSet::Cp437.decode(&[0x80, 0xe1, 0xfd]), "Çß²");
        assert_eq!(CharacterSet::Cp437.encode("Çß²").unwrap(), vec![0x80, 0xe1, 0xfd]);
    }
}
