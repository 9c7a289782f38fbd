// Symbology
// Copyright (c) 2025 The Project Symbology Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use symbology_core::io::BitBuffer;

/// One output unit of the high-level encoder: either a literal code of a fixed width, or a
/// binary-shift run referencing a range of the input bytes.
#[derive(Clone, Copy, Debug)]
pub enum Token {
    /// `value` emitted as `bit_count` bits.
    Simple { value: u16, bit_count: u8 },
    /// `byte_count` input bytes starting at `start`, emitted under binary shift.
    BinaryShift { start: u16, byte_count: u16 },
}

impl Token {
    pub fn simple(value: u16, bit_count: u8) -> Token {
        Token::Simple { value, bit_count }
    }

    pub fn binary_shift(start: usize, byte_count: usize) -> Token {
        Token::BinaryShift { start: start as u16, byte_count: byte_count as u16 }
    }

    /// Expands the token into bits. Binary-shift runs longer than 62 bytes use the extended
    /// 16-bit length form; runs longer than 31 but at most 62 bytes split into two headers.
    pub fn append_to(&self, bits: &mut BitBuffer, text: &[u8]) {
        match *self {
            Token::Simple { value, bit_count } => {
                bits.append_bits(u32::from(value), usize::from(bit_count));
            }
            Token::BinaryShift { start, byte_count } => {
                let count = usize::from(byte_count);
                for i in 0..count {
                    if i == 0 || (i == 31 && count <= 62) {
                        // A header before the first byte, and before byte 31 when the total
                        // count fits two short runs.
                        bits.append_bits(31, 5);
                        if count > 62 {
                            bits.append_bits(count as u32 - 31, 16);
                        }
                        else if i == 0 {
                            bits.append_bits(count.min(31) as u32, 5);
                        }
                        else {
                            bits.append_bits(count as u32 - 31, 5);
                        }
                    }
                    bits.append_bits(u32::from(text[usize::from(start) + i]), 8);
                }
            }
        }
    }
}
