// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The MaxiCode decoder: a 30x33 grid to 144 six-bit codewords, interleaved Reed-Solomon
//! blocks over GF(64), then the five-charset message with the structured carrier splice.
//! See ISO/IEC 16023.

use log::debug;

use symbology_core::barcode::{BarcodeFormat, DecodeOptions, Reader, ReaderDescriptor};
use symbology_core::content::{Content, StructuredAppendInfo, SymbologyIdentifier};
use symbology_core::ecc::{reed_solomon_decode, MAXICODE_FIELD_64};
use symbology_core::errors::{format_error, Result};
use symbology_core::matrix::BitMatrix;
use symbology_core::support_reader;

use crate::parser;

/// Which half of an interleaved block a correction pass works on.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Interleave {
    All,
    Even,
    Odd,
}

/// Meta-codes above the 6-bit character range.
const SHI0: u16 = 0x100;
const SHI1: u16 = 0x101;
const SHI2: u16 = 0x102;
const SHI3: u16 = 0x103;
const SHI4: u16 = 0x104;
/// Two shift A.
const TWSA: u16 = 0x105;
/// Three shift A.
const TRSA: u16 = 0x106;
const LCHA: u16 = 0x107;
const LCHB: u16 = 0x108;
const LOCK: u16 = 0x109;
const ECI: u16 = 0x10a;
/// Numeric shift: nine digits in five codewords.
const NS: u16 = 0x10b;
const PAD: u16 = 0x10c;

const FS: u16 = 0x1c;
const GS: u16 = 0x1d;
const RS: u16 = 0x1e;

/// The five 64-entry character sets A through E. See ISO/IEC 16023 Table 2.
#[rustfmt::skip]
const CHARSETS: [[u16; 64]; 5] = [
    [ // set A
        b'\r' as u16, b'A' as u16, b'B' as u16, b'C' as u16, b'D' as u16, b'E' as u16, b'F' as u16, b'G' as u16,
        b'H' as u16, b'I' as u16, b'J' as u16, b'K' as u16, b'L' as u16, b'M' as u16, b'N' as u16, b'O' as u16,
        b'P' as u16, b'Q' as u16, b'R' as u16, b'S' as u16, b'T' as u16, b'U' as u16, b'V' as u16, b'W' as u16,
        b'X' as u16, b'Y' as u16, b'Z' as u16, ECI, FS, GS, RS, NS,
        b' ' as u16, PAD, b'"' as u16, b'#' as u16, b'$' as u16, b'%' as u16, b'&' as u16, b'\'' as u16,
        b'(' as u16, b')' as u16, b'*' as u16, b'+' as u16, b',' as u16, b'-' as u16, b'.' as u16, b'/' as u16,
        b'0' as u16, b'1' as u16, b'2' as u16, b'3' as u16, b'4' as u16, b'5' as u16, b'6' as u16, b'7' as u16,
        b'8' as u16, b'9' as u16, b':' as u16, SHI1, SHI2, SHI3, SHI4, LCHB,
    ],
    [ // set B
        b'`' as u16, b'a' as u16, b'b' as u16, b'c' as u16, b'd' as u16, b'e' as u16, b'f' as u16, b'g' as u16,
        b'h' as u16, b'i' as u16, b'j' as u16, b'k' as u16, b'l' as u16, b'm' as u16, b'n' as u16, b'o' as u16,
        b'p' as u16, b'q' as u16, b'r' as u16, b's' as u16, b't' as u16, b'u' as u16, b'v' as u16, b'w' as u16,
        b'x' as u16, b'y' as u16, b'z' as u16, ECI, FS, GS, RS, NS,
        b'{' as u16, PAD, b'}' as u16, b'~' as u16, 0x7f, b';' as u16, b'<' as u16, b'=' as u16,
        b'>' as u16, b'?' as u16, b'[' as u16, b'\\' as u16, b']' as u16, b'^' as u16, b'_' as u16, b' ' as u16,
        b',' as u16, b'.' as u16, b'/' as u16, b':' as u16, b'@' as u16, b'!' as u16, b'|' as u16, PAD,
        TWSA, TRSA, PAD, SHI0, SHI2, SHI3, SHI4, LCHA,
    ],
    [ // set C
        0xc0, 0xc1, 0xc2, 0xc3, 0xc4, 0xc5, 0xc6, 0xc7, 0xc8, 0xc9, 0xca, 0xcb, 0xcc, 0xcd, 0xce, 0xcf,
        0xd0, 0xd1, 0xd2, 0xd3, 0xd4, 0xd5, 0xd6, 0xd7, 0xd8, 0xd9, 0xda, ECI, FS, GS, RS, NS,
        0xdb, 0xdc, 0xdd, 0xde, 0xdf, 0xaa, 0xac, 0xb1, 0xb2, 0xb3, 0xb5, 0xb9, 0xba, 0xbc, 0xbd, 0xbe,
        0x80, 0x81, 0x82, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89, LCHA, 0x20, LOCK, SHI3, SHI4, LCHB,
    ],
    [ // set D
        0xe0, 0xe1, 0xe2, 0xe3, 0xe4, 0xe5, 0xe6, 0xe7, 0xe8, 0xe9, 0xea, 0xeb, 0xec, 0xed, 0xee, 0xef,
        0xf0, 0xf1, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8, 0xf9, 0xfa, ECI, FS, GS, RS, NS,
        0xfb, 0xfc, 0xfd, 0xfe, 0xff, 0xa1, 0xa8, 0xab, 0xaf, 0xb0, 0xb4, 0xb7, 0xb8, 0xbb, 0xbf, 0x8a,
        0x8b, 0x8c, 0x8d, 0x8e, 0x8f, 0x90, 0x91, 0x92, 0x93, 0x94, LCHA, 0x20, SHI2, LOCK, SHI4, LCHB,
    ],
    [ // set E
        0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f,
        0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1a, ECI, PAD, PAD, 0x1b, NS,
        FS, GS, RS, 0x1f, 0x9f, 0xa0, 0xa2, 0xa3, 0xa4, 0xa5, 0xa6, 0xa7, 0xa9, 0xad, 0xae, 0xb6,
        0x95, 0x96, 0x97, 0x98, 0x99, 0x9a, 0x9b, 0x9c, 0x9d, 0x9e, LCHA, 0x20, SHI2, SHI3, LOCK, LCHB,
    ],
];

/// Error-corrects one interleaved sub-block of the codeword array in place.
fn correct_errors(
    codewords: &mut [u8],
    start: usize,
    data_codewords: usize,
    ec_codewords: usize,
    interleave: Interleave,
) -> Result<()> {
    let total = data_codewords + ec_codewords;
    let divisor = if interleave == Interleave::All { 1 } else { 2 };
    let parity = match interleave {
        Interleave::All => 0,
        Interleave::Even => 0,
        Interleave::Odd => 1,
    };

    let mut message = vec![0u16; total / divisor];
    for i in 0..total {
        if interleave == Interleave::All || i % 2 == parity {
            message[i / divisor] = u16::from(codewords[i + start]);
        }
    }

    reed_solomon_decode(&MAXICODE_FIELD_64, &mut message, ec_codewords / divisor)?;

    // Only the data codewords need copying back.
    for i in 0..data_codewords {
        if interleave == Interleave::All || i % 2 == parity {
            codewords[i + start] = message[i / divisor] as u8;
        }
    }
    Ok(())
}

/// Reads one postal-field bit; bit numbering is 1-based within the six-bit datawords.
fn get_bit(bit: u32, bytes: &[u8]) -> u32 {
    let bit = bit - 1;
    u32::from(bytes[(bit / 6) as usize] >> (5 - bit % 6) & 1)
}

fn get_int(bytes: &[u8], bits: &[u32]) -> u32 {
    let mut value = 0;
    for (i, &bit) in bits.iter().enumerate() {
        value += get_bit(bit, bytes) << (bits.len() - i - 1);
    }
    value
}

fn get_country(bytes: &[u8]) -> u32 {
    get_int(bytes, &[53, 54, 43, 44, 45, 46, 47, 48, 37, 38]).min(999)
}

fn get_service_class(bytes: &[u8]) -> u32 {
    get_int(bytes, &[55, 56, 57, 58, 59, 60, 49, 50, 51, 52]).min(999)
}

fn get_postcode2_length(bytes: &[u8]) -> u32 {
    get_int(bytes, &[39, 40, 41, 42, 31, 32]).min(9)
}

/// The numeric postcode of a mode 2 symbol, zero-padded to its declared length.
fn get_postcode2(bytes: &[u8]) -> String {
    let value = get_int(
        bytes,
        &[33, 34, 35, 36, 25, 26, 27, 28, 29, 30, 19, 20, 21, 22, 23, 24, 13, 14, 15, 16, 17,
          18, 7, 8, 9, 10, 11, 12, 1, 2],
    );
    let length = get_postcode2_length(bytes) as usize;
    let digits = format!("{:0width$}", value, width = length);
    digits[..length.min(digits.len())].to_string()
}

/// The six-character alphanumeric postcode of a mode 3 symbol.
fn get_postcode3(bytes: &[u8]) -> String {
    [
        get_int(bytes, &[39, 40, 41, 42, 31, 32]),
        get_int(bytes, &[33, 34, 35, 36, 25, 26]),
        get_int(bytes, &[27, 28, 29, 30, 19, 20]),
        get_int(bytes, &[21, 22, 23, 24, 13, 14]),
        get_int(bytes, &[15, 16, 17, 18, 7, 8]),
        get_int(bytes, &[9, 10, 11, 12, 1, 2]),
    ]
    .iter()
    .map(|&code| char::from(CHARSETS[0][code as usize] as u8))
    .collect()
}

/// The variable-length ECI value of ISO/IEC 16023 Table 3: one to four six-bit codewords.
fn parse_eci_value(bytes: &[u8], i: &mut usize) -> u32 {
    *i += 1;
    let first = u32::from(bytes[*i]);
    if first & 0x20 == 0 {
        return first;
    }
    *i += 1;
    let second = u32::from(bytes[*i]);
    if first & 0x10 == 0 {
        return ((first & 0x0f) << 6) | second;
    }
    *i += 1;
    let third = u32::from(bytes[*i]);
    if first & 0x08 == 0 {
        return ((first & 0x07) << 12) | (second << 6) | third;
    }
    *i += 1;
    let fourth = u32::from(bytes[*i]);
    ((first & 0x03) << 18) | (second << 12) | (third << 6) | fourth
}

/// Structured append: index and count packed into the codeword after the PAD marker.
/// See ISO/IEC 16023 Table 5.
fn parse_structured_append(byte: u8) -> Option<StructuredAppendInfo> {
    let index = u16::from((byte >> 3) & 0x07);
    let mut count = u16::from(byte & 0x07) + 1;
    if count == 1 || count <= index {
        // The declared count makes no sense; mark it unknown.
        count = 0;
    }
    Some(StructuredAppendInfo { index, count, id: String::new() })
}

/// Decodes the message codewords through the five-charset state machine.
fn get_message(bytes: &[u8], start: usize, len: usize, content: &mut Content) -> Result<()> {
    let mut shift: i32 = -1;
    let mut set = 0usize;
    let mut last_set = 0usize;

    let mut i = start;
    let end = start + len;
    let mut message_start = true;
    while i < end {
        let code = CHARSETS[set][usize::from(bytes[i])];
        match code {
            LCHA => {
                set = 0;
                shift = -1;
            }
            LCHB => {
                set = 1;
                shift = -1;
            }
            SHI0 | SHI1 | SHI2 | SHI3 | SHI4 => {
                last_set = set;
                set = usize::from(code - SHI0);
                shift = 1;
            }
            TWSA => {
                last_set = set;
                set = 0;
                shift = 2;
            }
            TRSA => {
                last_set = set;
                set = 0;
                shift = 3;
            }
            NS => {
                // Nine decimal digits packed into the next five codewords.
                if i + 5 >= end {
                    return format_error("truncated numeric shift");
                }
                let value = (u32::from(bytes[i + 1]) << 24)
                    + (u32::from(bytes[i + 2]) << 18)
                    + (u32::from(bytes[i + 3]) << 12)
                    + (u32::from(bytes[i + 4]) << 6)
                    + u32::from(bytes[i + 5]);
                i += 5;
                content.push_str(&format!("{:09}", value));
            }
            LOCK => shift = -1,
            ECI => {
                if i + 1 >= end {
                    return format_error("truncated eci designator");
                }
                let value = parse_eci_value(bytes, &mut i);
                content.apply_eci(value)?;
            }
            PAD => {
                if message_start {
                    // A leading pad pair carries the structured append descriptor.
                    if i + 1 >= end {
                        return format_error("truncated structured append");
                    }
                    i += 1;
                    content.structured_append = parse_structured_append(bytes[i]);
                }
                shift = -1;
            }
            _ => content.push_byte(code as u8),
        }
        message_start = false;
        i += 1;
        // The shift counter is checked before it ticks down, so a restore lands after the
        // final shifted character.
        if shift == 0 {
            set = last_set;
        }
        shift -= 1;
    }

    Ok(())
}

/// MaxiCode decoder for the fixed 30x33 module grid.
pub struct MaxiCodeReader {}

impl Reader for MaxiCodeReader {
    fn try_new(_format: BarcodeFormat, _options: &DecodeOptions) -> Result<MaxiCodeReader> {
        Ok(MaxiCodeReader {})
    }

    fn supported_formats() -> &'static [ReaderDescriptor] {
        &[support_reader!(BarcodeFormat::MaxiCode, "maxicode", "MaxiCode")]
    }

    fn decode(&self, matrix: &BitMatrix) -> Result<Content> {
        let mut codewords = parser::read_codewords(matrix)?;

        // The primary message: 10 data + 10 EC codewords, corrected as one block.
        correct_errors(&mut codewords, 0, 10, 10, Interleave::All)?;

        let mode = codewords[0] & 0x0f;
        debug!("maxicode decode: mode {}", mode);

        // The secondary message: interleaved even and odd sub-blocks, each corrected on its
        // own. Codewords 10 through 19 are the primary EC and drop out of the data stream.
        let datawords_len = match mode {
            2 | 3 | 4 | 6 => {
                correct_errors(&mut codewords, 20, 84, 40, Interleave::Even)?;
                correct_errors(&mut codewords, 20, 84, 40, Interleave::Odd)?;
                94
            }
            5 => {
                correct_errors(&mut codewords, 20, 68, 56, Interleave::Even)?;
                correct_errors(&mut codewords, 20, 68, 56, Interleave::Odd)?;
                78
            }
            _ => return format_error("invalid mode"),
        };

        let mut datawords = vec![0u8; datawords_len];
        datawords[..10].copy_from_slice(&codewords[..10]);
        datawords[10..].copy_from_slice(&codewords[20..20 + datawords_len - 10]);

        let mut content = Content::new();
        content.symbology = SymbologyIdentifier {
            code: 'U',
            modifier: if mode == 2 || mode == 3 { '1' } else { '0' },
            eci_modifier_offset: 2,
        };
        content.ec_level = Some(mode.to_string());
        content.reader_init = mode == 6;

        match mode {
            2 | 3 => {
                let postcode = if mode == 2 { get_postcode2(&datawords) } else { get_postcode3(&datawords) };
                let country = format!("{:03}", get_country(&datawords));
                let service = format!("{:03}", get_service_class(&datawords));
                get_message(&datawords, 10, 84, &mut content)?;

                let header: &[u8] = b"[)>\x1e01\x1d";
                let splice = format!("{}\x1d{}\x1d{}\x1d", postcode, country, service);
                if content.bytes().starts_with(header) {
                    content.insert_bytes(9, splice.as_bytes());
                }
                else {
                    content.insert_bytes(0, splice.as_bytes());
                }
            }
            4 | 6 => get_message(&datawords, 1, 93, &mut content)?,
            5 => get_message(&datawords, 1, 77, &mut content)?,
            _ => unreachable!(),
        }

        Ok(content)
    }
}
